//! Extension/MIME include-exclude filtering (spec §4.6).
//!
//! Two disjoint token sets drive acceptance: `include`, if non-empty,
//! requires a hit; `exclude`, if non-empty, requires the absence of one. A
//! token matches an extension either directly or through the host's MIME
//! super-type map.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    pub include: HashSet<String>,
    pub exclude: HashSet<String>,
    pub mime_types: HashMap<String, HashSet<String>>,
}

impl FilterEngine {
    pub fn new(
        include: HashSet<String>,
        exclude: HashSet<String>,
        mime_types: HashMap<String, HashSet<String>>,
    ) -> FilterEngine {
        FilterEngine {
            include,
            exclude,
            mime_types,
        }
    }

    /// Whether `token` matches `extension`, either as a direct equality or
    /// because `extension` belongs to the MIME super-type keyed by `token`.
    fn token_hits(&self, token: &str, extension: &str) -> bool {
        if token == extension {
            return true;
        }
        self.mime_types
            .get(token)
            .map(|exts| exts.contains(extension))
            .unwrap_or(false)
    }

    fn any_token_hits(&self, tokens: &HashSet<String>, extension: &str) -> bool {
        tokens.iter().any(|token| self.token_hits(token, extension))
    }

    /// Applies the include/exclude rule to `extension` (already lowercased).
    pub fn accepts(&self, extension: &str) -> bool {
        if !self.include.is_empty() && !self.any_token_hits(&self.include, extension) {
            return false;
        }
        if !self.exclude.is_empty() && self.any_token_hits(&self.exclude, extension) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mime_map() -> HashMap<String, HashSet<String>> {
        let mut map = HashMap::new();
        map.insert(
            "image".to_string(),
            HashSet::from(["jpg".to_string(), "png".to_string()]),
        );
        map
    }

    #[test]
    fn empty_filters_accept_everything() {
        let engine = FilterEngine::default();
        assert!(engine.accepts("pdf"));
    }

    #[test]
    fn include_requires_direct_or_mime_hit() {
        let engine = FilterEngine::new(
            HashSet::from(["image".to_string()]),
            HashSet::new(),
            mime_map(),
        );
        assert!(engine.accepts("jpg"));
        assert!(!engine.accepts("pdf"));
    }

    #[test]
    fn exclude_rejects_direct_or_mime_hit() {
        let engine = FilterEngine::new(HashSet::new(), HashSet::from(["png".to_string()]), mime_map());
        assert!(!engine.accepts("png"));
        assert!(engine.accepts("pdf"));
    }

    #[test]
    fn exclude_via_mime_super_type_rejects_member_extensions() {
        let engine = FilterEngine::new(HashSet::new(), HashSet::from(["image".to_string()]), mime_map());
        assert!(!engine.accepts("jpg"));
        assert!(engine.accepts("pdf"));
    }
}
