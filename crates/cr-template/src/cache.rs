use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use cr_core::{ReportError, TemplateNode};

use crate::parse::parse;

/// Memoizes parse results by source string. Population is idempotent: two
/// racing parses of the same source produce structurally identical trees, so
/// the worst case is redundant work, never a corrupt entry.
#[derive(Debug, Default)]
pub struct TemplateCache {
    parsed: RwLock<HashMap<String, Arc<Vec<TemplateNode>>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_cached(&self, source: &str) -> Result<Arc<Vec<TemplateNode>>, ReportError> {
        if let Ok(guard) = self.parsed.read() {
            if let Some(tree) = guard.get(source) {
                log::debug!("template cache hit ({} bytes of source)", source.len());
                return Ok(Arc::clone(tree));
            }
        }

        let tree = Arc::new(parse(source)?);
        if let Ok(mut guard) = self.parsed.write() {
            let entry = guard
                .entry(source.to_string())
                .or_insert_with(|| Arc::clone(&tree));
            return Ok(Arc::clone(entry));
        }
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cached_reuses_the_same_tree() {
        let cache = TemplateCache::new();
        let first = cache.parse_cached("a {{b}} c").expect("parse");
        let second = cache.parse_cached("a {{b}} c").expect("parse");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn parse_cached_does_not_cache_failures() {
        let cache = TemplateCache::new();
        let error = cache
            .parse_cached("{{#if x}}")
            .expect_err("unclosed section should fail");
        assert_eq!(error.code, "TEMPLATE_UNCLOSED_SECTION");

        let tree = cache.parse_cached("plain").expect("parse");
        assert_eq!(tree.len(), 1);
    }
}
