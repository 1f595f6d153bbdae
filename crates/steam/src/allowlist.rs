//! Pruning a tree down to an allow-list template.
//!
//! A template is an ordinary table. A nested table in the template recurses;
//! any scalar leaf keeps the matching subtree as it is. Templates use an
//! empty string for "keep this value" and [`WILDCARD`] for "keep this whole
//! subtree", which behave the same way but read differently.

use crate::node::{Node, Table};

/// Marks a subtree that is kept verbatim.
pub const WILDCARD: &str = "*";

/// Returns a copy of `tree` containing only the paths named in `template`.
///
/// Keys keep the order they have in `tree`. Applying the same template
/// twice gives the same result as applying it once.
pub fn strip_to_allowlist(tree: &Table, template: &Table) -> Table {
    tree.iter()
        .filter_map(|(key, value)| {
            let rule = template.get(key)?;
            let kept = match (rule, value) {
                (Node::Table(rule), Node::Table(child)) => Node::Table(strip_to_allowlist(child, rule)),
                _ => value.clone(),
            };
            Some((key.clone(), kept))
        })
        .collect()
}
