//! Reconstructs full paths from the directory cache, falling back to
//! on-demand MFT seeks when a parent reference is missing.

use crate::domain::entities::{DirectoryCache, Reference};
use std::collections::HashSet;

pub const RECYCLE_BIN_SEGMENT: &str = "$RECYCLE.BIN";

/// Outcome of a secondary, on-demand record fetch performed when the cache
/// misses a parent reference.
pub struct FetchedRecord {
    pub name: String,
    pub parent: Reference,
    pub is_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: String,
    pub in_recycle_bin: bool,
    pub resolution_failed: bool,
}

/// Resolves the path for `parent`, consulting `cache` and falling back to
/// `fetch` (a seek-and-parse callback supplied by the caller) on a miss.
/// `fetch` is also tried shifted by one sequence-number period (2^16) when
/// the first attempt does not yield a directory, per the original's
/// empirical fallback.
pub fn resolve_path(
    parent: Reference,
    cache: &mut DirectoryCache,
    mut fetch: impl FnMut(Reference) -> Option<FetchedRecord>,
) -> ResolvedPath {
    let mut segments: Vec<String> = Vec::new();
    let mut seen: HashSet<Reference> = HashSet::new();
    let mut current = parent;

    loop {
        if current == Reference::ROOT {
            break;
        }
        if !seen.insert(current) {
            // Any non-root self/cycle reference is corruption (Design Notes,
            // "Cycle in directory chain").
            return finish_with_failure(segments);
        }

        let (name, next_parent) = match cache.get(current) {
            Some((name, parent)) => (name.to_string(), parent),
            None => match fetch_and_cache(current, cache, &mut fetch) {
                Some(pair) => pair,
                None => return finish_with_failure(segments),
            },
        };

        if next_parent == current && current != Reference::ROOT {
            // Self-reference anywhere but root is corruption.
            return finish_with_failure(segments);
        }

        segments.push(name);
        current = next_parent;
    }

    let in_recycle_bin = segments.iter().any(|s| s.eq_ignore_ascii_case(RECYCLE_BIN_SEGMENT));
    segments.reverse();
    let mut path = String::from("/");
    for segment in &segments {
        path.push_str(segment);
        path.push('/');
    }

    ResolvedPath {
        path,
        in_recycle_bin,
        resolution_failed: false,
    }
}

fn fetch_and_cache(
    reference: Reference,
    cache: &mut DirectoryCache,
    fetch: &mut impl FnMut(Reference) -> Option<FetchedRecord>,
) -> Option<(String, Reference)> {
    if let Some(record) = fetch(reference).filter(|r| r.is_directory) {
        cache.insert(reference, record.name.clone(), record.parent);
        return Some((record.name, record.parent));
    }

    let shifted = reference.shifted_by_sequence_period();
    if let Some(record) = fetch(shifted).filter(|r| r.is_directory) {
        cache.insert(reference, record.name.clone(), record.parent);
        return Some((record.name, record.parent));
    }

    None
}

fn finish_with_failure(mut segments: Vec<String>) -> ResolvedPath {
    segments.reverse();
    let joined: String = segments.into_iter().map(|s| format!("{s}/")).collect();
    ResolvedPath {
        path: format!("/{joined}"),
        in_recycle_bin: false,
        resolution_failed: true,
    }
}

/// Builds the synthetic fallback path for a descriptor whose resolution was
/// exhausted.
pub fn synthetic_path(reference: Reference) -> String {
    format!("/@{}/", reference.record_index())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_resolves_to_root() {
        let mut cache = DirectoryCache::new();
        let resolved = resolve_path(Reference::ROOT, &mut cache, |_| None);
        assert!(!resolved.resolution_failed);
        assert_eq!(resolved.path, "/");
    }

    #[test]
    fn resolves_single_level_from_cache() {
        let mut cache = DirectoryCache::new();
        cache.insert(Reference::from(42), "docs".into(), Reference::ROOT);
        let resolved = resolve_path(Reference::from(42), &mut cache, |_| None);
        assert_eq!(resolved.path, "/docs/");
        assert!(!resolved.resolution_failed);
    }

    #[test]
    fn resolution_is_idempotent_given_unchanged_cache() {
        let mut cache = DirectoryCache::new();
        cache.insert(Reference::from(42), "docs".into(), Reference::ROOT);
        let first = resolve_path(Reference::from(42), &mut cache, |_| None);
        let second = resolve_path(Reference::from(42), &mut cache, |_| None);
        assert_eq!(first, second);
    }

    #[test]
    fn cache_miss_falls_back_to_fetch() {
        let mut cache = DirectoryCache::new();
        let resolved = resolve_path(Reference::from(99), &mut cache, |r| {
            if r == Reference::from(99) {
                Some(FetchedRecord {
                    name: "pictures".into(),
                    parent: Reference::ROOT,
                    is_directory: true,
                })
            } else {
                None
            }
        });
        assert_eq!(resolved.path, "/pictures/");
        assert!(cache.contains(Reference::from(99)));
    }

    #[test]
    fn unresolvable_reference_marks_failure() {
        let mut cache = DirectoryCache::new();
        let resolved = resolve_path(Reference::from(123), &mut cache, |_| None);
        assert!(resolved.resolution_failed);
    }

    #[test]
    fn recycle_bin_segment_is_detected() {
        let mut cache = DirectoryCache::new();
        cache.insert(Reference::from(7), "$RECYCLE.BIN".into(), Reference::ROOT);
        let resolved = resolve_path(Reference::from(7), &mut cache, |_| None);
        assert!(resolved.in_recycle_bin);
    }
}
