//! Transient result cache.
//!
//! Process-local memoization of pair key to resolved element. Entries are
//! never evicted: recipes are immutable once stored, so a cached mapping can't
//! go stale. The cache is always re-derivable from the store.

use crate::element::Element;
use crate::pair::PairKey;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Write-once map from pair key to the element it resolves to.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<PairKey, Element>>,
}

impl ResultCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a resolved element.
    pub fn get(&self, key: &PairKey) -> Option<Element> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Record a resolution. The first writer for a key wins; later writes
    /// are ignored and the retained value is returned.
    pub fn put(&self, key: PairKey, element: Element) -> Element {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(element)
            .clone()
    }

    /// Number of cached pairs.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ElementId;

    fn key(a: i64, b: i64) -> PairKey {
        PairKey::from_ordered(ElementId(a), ElementId(b))
    }

    #[test]
    fn test_get_after_put() {
        let cache = ResultCache::new();
        let steam = Element::base_set()[0].clone();
        assert!(cache.get(&key(1, 2)).is_none());

        cache.put(key(1, 2), steam.clone());
        assert_eq!(cache.get(&key(2, 1)), Some(steam));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_writer_wins() {
        let cache = ResultCache::new();
        let base = Element::base_set();

        let kept = cache.put(key(1, 2), base[0].clone());
        assert_eq!(kept.id, base[0].id);

        let kept = cache.put(key(1, 2), base[1].clone());
        assert_eq!(kept.id, base[0].id);
        assert_eq!(cache.get(&key(1, 2)).map(|e| e.id), Some(base[0].id));
    }
}
