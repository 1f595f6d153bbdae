//! Dotted-path access into a [`Node`] tree.
//!
//! Keys in Steam files may themselves contain dots
//! (`"StartupState.Friends"`), so at each level the whole remaining path is
//! first tried as a literal key before it is split on its first dot.

use crate::node::Node;

/// Returns the node at `path`, or `None` if any segment is missing.
pub fn dot_get<'a>(node: &'a Node, path: &str) -> Option<&'a Node> {
    let table = node.as_table()?;
    if let Some(found) = table.get(path) {
        return Some(found);
    }
    let (head, rest) = path.split_once('.')?;
    dot_get(table.get(head)?, rest)
}

/// Replaces the value at `path`.
///
/// Only existing keys are replaced; missing intermediate or final keys are
/// never created. Returns `true` if a value was written.
pub fn dot_set(node: &mut Node, path: &str, value: Node) -> bool {
    let Some(table) = node.as_table_mut() else {
        return false;
    };
    if let Some(slot) = table.get_mut(path) {
        *slot = value;
        return true;
    }
    let Some((head, rest)) = path.split_once('.') else {
        return false;
    };
    match table.get_mut(head) {
        Some(child) => dot_set(child, rest, value),
        None => false,
    }
}
