//! 32-byte storage words and packed-field extraction.

use std::fmt;

use crate::error::ScanError;
use crate::model::{TypeDescriptor, VarKind};

/// A raw 32-byte storage word, big-endian as returned by
/// `eth_getStorageAt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Word(pub [u8; 32]);

impl Word {
    pub const ZERO: Word = Word([0u8; 32]);

    /// Word holding a small slot index.
    pub fn from_index(index: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&index.to_be_bytes());
        Word(bytes)
    }

    /// Parses a hex word, with or without `0x` prefix, left-padding
    /// short input to 32 bytes.
    pub fn from_hex(input: &str) -> Result<Self, ScanError> {
        let stripped = input.strip_prefix("0x").unwrap_or(input);
        if stripped.len() > 64 {
            return Err(ScanError::Decode(format!(
                "hex word longer than 32 bytes: {input}"
            )));
        }
        let padded = format!("{stripped:0>64}");
        let raw = hex::decode(&padded)
            .map_err(|e| ScanError::Decode(format!("invalid hex word {input}: {e}")))?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&raw);
        Ok(Word(bytes))
    }

    /// Parses a slot literal: decimal (`"2"`) or hex (`"0x36..."`).
    pub fn from_literal(literal: &str) -> Result<Self, ScanError> {
        if literal.starts_with("0x") || literal.starts_with("0X") {
            Self::from_hex(literal)
        } else {
            let index: u64 = literal.parse().map_err(|_| {
                ScanError::Decode(format!("slot literal is neither hex nor decimal: {literal}"))
            })?;
            Ok(Self::from_index(index))
        }
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Big-endian addition of a small offset, wrapping on overflow of
    /// the full 256-bit space.
    pub fn wrapping_add(&self, offset: u64) -> Word {
        let mut bytes = self.0;
        let mut carry = offset as u128;
        for i in (0..32).rev() {
            if carry == 0 {
                break;
            }
            let sum = bytes[i] as u128 + (carry & 0xff);
            bytes[i] = (sum & 0xff) as u8;
            carry = (carry >> 8) + (sum >> 8);
        }
        Word(bytes)
    }

    /// Decodes the low 160 bits as an address. `None` when the address
    /// is zero, which a caller can treat as "no value stored".
    pub fn as_address(&self) -> Option<String> {
        let tail = &self.0[12..];
        if tail.iter().all(|&b| b == 0) {
            None
        } else {
            Some(format!("0x{}", hex::encode(tail)))
        }
    }

    /// Extracts a packed field described by `ty` and formats it for
    /// the report. Offsets count from the low end of the word.
    pub fn extract(&self, ty: &TypeDescriptor) -> Result<String, ScanError> {
        if ty.bits == 0 || ty.bits > 256 || ty.offset % 8 != 0 || ty.bits % 8 != 0 {
            return Err(ScanError::Decode(format!(
                "unsupported field layout: {} bits at offset {}",
                ty.bits, ty.offset
            )));
        }
        let width = (ty.bits / 8) as usize;
        let shift = (ty.offset / 8) as usize;
        if width + shift > 32 {
            return Err(ScanError::Decode(format!(
                "field of {} bits at offset {} exceeds the word",
                ty.bits, ty.offset
            )));
        }

        let end = 32 - shift;
        let field = &self.0[end - width..end];

        match ty.kind {
            VarKind::Address => Ok(format!("0x{}", hex::encode(field))),
            VarKind::Bool => Ok((field.iter().any(|&b| b != 0)).to_string()),
            VarKind::Bytes => Ok(format!("0x{}", hex::encode(field))),
            VarKind::Integer => {
                if ty.bits <= 128 {
                    let mut value: u128 = 0;
                    for &b in field {
                        value = (value << 8) | b as u128;
                    }
                    Ok(value.to_string())
                } else {
                    Ok(format!("0x{}", hex::encode(field)))
                }
            }
        }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
