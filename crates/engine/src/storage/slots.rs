//! Storage key derivation.
//!
//! Flat variables sit at their literal slot index. Mapping elements
//! live at `keccak256(pad32(key) ++ pad32(base))`; dynamic array
//! elements at `keccak256(pad32(base)) + index`, per the EVM storage
//! layout rules.

use sha3::{Digest, Keccak256};

use crate::error::ScanError;
use crate::model::SlotExpression;
use crate::storage::word::Word;

fn keccak(input: &[u8]) -> Word {
    let digest = Keccak256::digest(input);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Word(bytes)
}

/// Slot of `mapping` element `key` in the mapping declared at `base`.
pub fn mapping_slot(base: u64, key: &Word) -> Word {
    let mut input = [0u8; 64];
    input[..32].copy_from_slice(&key.0);
    input[32..].copy_from_slice(&Word::from_index(base).0);
    keccak(&input)
}

/// Slot of element `index` of the dynamic array declared at `base`.
pub fn dynamic_array_slot(base: u64, index: u64) -> Word {
    keccak(&Word::from_index(base).0).wrapping_add(index)
}

/// Computes the storage key for one declared variable.
pub fn compute_slot(expr: &SlotExpression) -> Result<Word, ScanError> {
    match expr {
        SlotExpression::Literal(literal) => Word::from_literal(literal),
        SlotExpression::Mapping { base, key } => {
            let key = Word::from_literal(key)?;
            Ok(mapping_slot(*base, &key))
        }
        SlotExpression::ArrayElement { base, index } => Ok(dynamic_array_slot(*base, *index)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_slot_passes_through() {
        let slot = compute_slot(&SlotExpression::Literal("0".to_string())).unwrap();
        assert_eq!(slot, Word::ZERO);
    }

    #[test]
    fn mapping_slot_matches_known_derivation() {
        // keccak(pad32(0) ++ pad32(0)): first element of a mapping at
        // slot 0 keyed by the zero address.
        let slot = mapping_slot(0, &Word::ZERO);
        assert_eq!(
            slot.to_hex(),
            "0xad3228b676f7d3cd4284a5443f17f1962b36e491b30a40b2405849e597ba5fb5"
        );
    }

    #[test]
    fn array_elements_are_consecutive_after_hash() {
        let first = dynamic_array_slot(3, 0);
        let second = dynamic_array_slot(3, 1);
        assert_eq!(first.wrapping_add(1), second);
    }

    #[test]
    fn derived_slots_differ_per_key() {
        let a = mapping_slot(1, &Word::from_index(1));
        let b = mapping_slot(1, &Word::from_index(2));
        assert_ne!(a, b);
    }
}
