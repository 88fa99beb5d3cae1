//! LRU cache of per-page structure

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use crate::types::PageStructure;

/// Default number of pages kept; covers a typical document
pub const DEFAULT_CACHE_PAGES: usize = 256;

/// Cached outcome of a structure fetch
#[derive(Clone, Debug, PartialEq)]
pub enum CachedStructure {
    /// The page has structure
    Present(Arc<PageStructure>),
    /// The backend said the page has none; do not refetch
    Absent,
}

impl CachedStructure {
    pub fn structure(&self) -> Option<&Arc<PageStructure>> {
        match self {
            Self::Present(s) => Some(s),
            Self::Absent => None,
        }
    }
}

/// Page-number keyed cache. Holds no references to live overlays.
pub struct StructureCache {
    cache: LruCache<usize, CachedStructure>,
}

impl StructureCache {
    /// Create a new cache with the given capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Get a cached page, promoting it in the LRU order
    #[must_use]
    pub fn get(&mut self, page: usize) -> Option<CachedStructure> {
        self.cache.get(&page).cloned()
    }

    #[must_use]
    pub fn contains(&self, page: usize) -> bool {
        self.cache.contains(&page)
    }

    /// Store a fetch result; `None` records a negative entry
    pub fn insert(&mut self, page: usize, structure: Option<PageStructure>) -> CachedStructure {
        let entry = match structure {
            Some(s) => CachedStructure::Present(Arc::new(s)),
            None => CachedStructure::Absent,
        };
        self.cache.put(page, entry.clone());
        entry
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    /// Cached page numbers, most recently used first
    pub fn pages(&self) -> Vec<usize> {
        self.cache.iter().map(|(page, _)| *page).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}

impl Default for StructureCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_PAGES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dimensions;

    fn page(n: usize) -> PageStructure {
        PageStructure {
            page_number: n,
            source_dimensions: Dimensions::new(100.0, 100.0),
            elements: vec![],
        }
    }

    #[test]
    fn insert_and_get() {
        let mut cache = StructureCache::new(4);
        cache.insert(1, Some(page(1)));
        let hit = cache.get(1).unwrap();
        assert_eq!(hit.structure().unwrap().page_number, 1);
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn negative_entries_are_cached() {
        let mut cache = StructureCache::new(4);
        cache.insert(3, None);
        assert!(cache.contains(3));
        assert_eq!(cache.get(3), Some(CachedStructure::Absent));
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = StructureCache::new(2);
        cache.insert(1, Some(page(1)));
        cache.insert(2, Some(page(2)));
        let _ = cache.get(1);
        cache.insert(3, Some(page(3)));

        assert!(cache.contains(1));
        assert!(!cache.contains(2));
        assert!(cache.contains(3));
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let mut cache = StructureCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert(1, None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_clears_everything() {
        let mut cache = StructureCache::new(4);
        cache.insert(1, Some(page(1)));
        cache.insert(2, None);
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
