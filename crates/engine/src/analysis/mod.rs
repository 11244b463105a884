//! Call-graph-aware permission analysis.
//!
//! Three passes per function, run in order by the gate classifier:
//! modifier collection, caller-identity condition detection, and the
//! gate filter itself. All traversal is one hop deep through internal
//! and library calls; thin wrapper functions get their guard modifiers
//! attributed, wrapper-of-wrapper chains intentionally do not.

pub mod conditions;
pub mod gates;
pub mod modifiers;

pub use conditions::caller_identity_conditions;
pub use gates::{classify_contract, ClassifiedContract};
pub use modifiers::{collect_modifiers, ModifierSet};
