//! Requiredness merging across `required`, `allOf`, `oneOf` and `anyOf`.
//!
//! A property is unconditionally required if the node itself requires it, an
//! `allOf` member requires it, or every alternative of a `oneOf`/`anyOf`
//! group requires it. Which alternative applies cannot be known in advance,
//! so alternatives contribute only what they all agree on.

use std::collections::BTreeSet;

use serde_json::Value;

/// Required lists gathered from one object node and its branches.
#[derive(Debug, Default, Clone)]
pub struct Requirements {
    /// The node's own `required` list.
    pub own: Vec<String>,
    /// `required` lists of `allOf` members; all of them apply.
    pub all_of: Vec<Vec<String>>,
    /// One entry per `oneOf`/`anyOf` keyword present, holding each
    /// alternative's `required` list (empty if it has none).
    pub alternatives: Vec<Vec<Vec<String>>>,
}

impl Requirements {
    /// The final required set.
    pub fn merge(&self) -> BTreeSet<String> {
        let mut required: BTreeSet<String> = self.own.iter().cloned().collect();
        required.extend(self.all_of.iter().flatten().cloned());
        for group in &self.alternatives {
            if let Some(common) = intersect_branches(group) {
                required.extend(common);
            }
        }
        required
    }
}

/// Names required by every branch.
///
/// `None` when there are no branches at all (nothing to merge), which is not
/// the same as `Some` of an empty set (branches exist but share nothing).
pub fn intersect_branches(branches: &[Vec<String>]) -> Option<BTreeSet<String>> {
    let mut iter = branches.iter();
    let first: BTreeSet<String> = iter.next()?.iter().cloned().collect();
    Some(iter.fold(first, |acc, branch| {
        acc.into_iter().filter(|name| branch.contains(name)).collect()
    }))
}

/// The `required` list of a schema node, ignoring non-string entries.
pub fn required_list(node: &Value) -> Vec<String> {
    node.get("required")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}
