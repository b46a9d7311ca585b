//! Process-wide (per-scan) directory name/parent cache used for path
//! resolution.

use super::reference::Reference;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct CacheEntry {
    name: String,
    parent: Reference,
}

/// `record_index -> (name, parent_index)` map. Root (index 5) maps to itself
/// and terminates path resolution.
#[derive(Debug, Default)]
pub struct DirectoryCache {
    entries: HashMap<Reference, CacheEntry>,
}

impl DirectoryCache {
    pub fn new() -> DirectoryCache {
        let mut cache = DirectoryCache {
            entries: HashMap::new(),
        };
        cache.insert(Reference::ROOT, ".".to_string(), Reference::ROOT);
        cache
    }

    pub fn insert(&mut self, reference: Reference, name: String, parent: Reference) {
        self.entries.insert(reference, CacheEntry { name, parent });
    }

    pub fn get(&self, reference: Reference) -> Option<(&str, Reference)> {
        self.entries
            .get(&reference)
            .map(|e| (e.name.as_str(), e.parent))
    }

    pub fn contains(&self, reference: Reference) -> bool {
        self.entries.contains_key(&reference)
    }

    /// Clears the cache, used when a new `$MFT` record is observed and the
    /// LBA bias is recomputed.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.insert(Reference::ROOT, ".".to_string(), Reference::ROOT);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
