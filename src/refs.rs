//! `$ref` resolution within a single document.

use std::collections::HashMap;

use serde_json::Value;

/// A `$ref` target inside the current document.
#[derive(Debug, Clone)]
pub struct ResolvedRef<'a> {
    /// Normalized location, e.g. `#/definitions/Tag`. Used as the target's
    /// identity for deduplication.
    pub pointer: String,
    /// The definition's own name: the last pointer segment, unescaped.
    pub name: String,
    pub node: &'a Value,
}

/// Resolves document-local `#/...` pointers.
///
/// Remote and cross-document references never resolve. Each distinct
/// pointer is looked up once per resolver.
pub struct RefResolver<'a> {
    document: &'a Value,
    cache: HashMap<String, Option<ResolvedRef<'a>>>,
}

impl<'a> RefResolver<'a> {
    pub fn new(document: &'a Value) -> Self {
        Self {
            document,
            cache: HashMap::new(),
        }
    }

    /// Returns the node `reference` designates, or `None` if it does not
    /// resolve within the document.
    pub fn resolve(&mut self, reference: &str) -> Option<ResolvedRef<'a>> {
        let document = self.document;
        self.cache
            .entry(reference.to_string())
            .or_insert_with(|| lookup(document, reference))
            .clone()
    }
}

fn lookup<'a>(document: &'a Value, reference: &str) -> Option<ResolvedRef<'a>> {
    let fragment = reference.strip_prefix('#')?;
    if !fragment.is_empty() && !fragment.starts_with('/') {
        return None;
    }

    // Value::pointer takes care of ~0/~1 unescaping.
    let node = document.pointer(fragment)?;
    let name = fragment
        .rsplit('/')
        .next()
        .map(unescape)
        .unwrap_or_default();

    Some(ResolvedRef {
        pointer: format!("#{}", fragment),
        name,
        node,
    })
}

/// Escapes a key for use as a JSON pointer segment.
pub fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Reverses [`escape`].
pub fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
