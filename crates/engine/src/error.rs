use thiserror::Error;

/// Failure taxonomy for a single contract's scan pipeline.
///
/// Errors never cross contract boundaries: the batch runner logs the
/// failure and moves on to the next contract, and the assembler only
/// ever sees fully formed per-contract outcomes.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to compile or verify source for {target}: {reason}")]
    Compilation { target: String, reason: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("implementation contract {name} not found among contracts at {address}")]
    Resolution { name: String, address: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("failed to decode storage word: {0}")]
    Decode(String),
}

impl ScanError {
    /// Whether the error came from a transport failure that a caller
    /// with its own retry policy could reasonably retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScanError::Network(_))
    }
}
