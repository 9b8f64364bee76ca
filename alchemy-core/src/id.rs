//! Type-safe element identifiers.
//!
//! Uses the newtype pattern so element ids can't be mixed up with counts or
//! indices at compile time. Ids are assigned by the store and are positive;
//! raw caller input is accepted as-is and validated by [`crate::pair::normalize`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned handle for an element.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub i64);

impl ElementId {
    /// Wrap a raw id.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Whether this id could have been assigned by a store.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ElementId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl std::str::FromStr for ElementId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}
