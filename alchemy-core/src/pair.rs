//! Pair key normalization.
//!
//! Every lookup into the cache, the recipe store, or the hint graph goes
//! through [`normalize`], so `(a, b)` and `(b, a)` always land on the same
//! slot. Callers may pass inputs in either order.

use crate::error::AlchemyError;
use crate::id::ElementId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used in the string form of a pair key.
pub const KEY_SEPARATOR: char = '_';

/// Canonical, order-independent key for an unordered pair of element ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    low: ElementId,
    high: ElementId,
}

impl PairKey {
    /// Build a key from two ids, in any order. Does not validate.
    pub fn from_ordered(a: ElementId, b: ElementId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> ElementId {
        self.low
    }

    pub fn high(&self) -> ElementId {
        self.high
    }

    /// Whether both sides are the same element.
    pub fn is_self_pair(&self) -> bool {
        self.low == self.high
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.low, KEY_SEPARATOR, self.high)
    }
}

/// Canonicalize an unordered pair, rejecting non-positive ids.
pub fn normalize(a: ElementId, b: ElementId) -> Result<PairKey, AlchemyError> {
    for id in [a, b] {
        if !id.is_valid() {
            return Err(AlchemyError::InvalidInput {
                reason: format!("element id must be positive, got {id}"),
            });
        }
    }
    Ok(PairKey::from_ordered(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_orders_inputs() {
        let key = normalize(ElementId(7), ElementId(3)).unwrap();
        assert_eq!(key.low(), ElementId(3));
        assert_eq!(key.high(), ElementId(7));
        assert_eq!(key.to_string(), "3_7");
    }

    #[test]
    fn test_self_pair() {
        let key = normalize(ElementId(2), ElementId(2)).unwrap();
        assert!(key.is_self_pair());
        assert_eq!(key.to_string(), "2_2");
    }

    #[test]
    fn test_rejects_non_positive() {
        assert!(matches!(
            normalize(ElementId(0), ElementId(1)),
            Err(AlchemyError::InvalidInput { .. })
        ));
        assert!(matches!(
            normalize(ElementId(1), ElementId(-4)),
            Err(AlchemyError::InvalidInput { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_normalize_is_commutative(a in 1i64..10_000, b in 1i64..10_000) {
            let ab = normalize(ElementId(a), ElementId(b)).unwrap();
            let ba = normalize(ElementId(b), ElementId(a)).unwrap();
            prop_assert_eq!(ab, ba);
            prop_assert_eq!(ab.to_string(), ba.to_string());
            prop_assert!(ab.low() <= ab.high());
        }
    }
}
