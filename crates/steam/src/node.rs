//! The tree both VDF codecs decode into.

use indexmap::IndexMap;
use serde::Serialize;

/// An insertion-ordered mapping of keys to nodes.
///
/// Order is preserved so that a parsed file serializes back in the same
/// key order it was read in.
pub type Table = IndexMap<String, Node>;

/// A value in a configuration tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    String(String),
    Int32(i32),
    UInt64(u64),
    Float32(f32),
    Bool(bool),
    /// Produced by post-processing (e.g. shortcut tags), never by a codec.
    List(Vec<Node>),
    Table(Table),
}

impl Node {
    /// Returns an empty table node.
    pub fn table() -> Self {
        Node::Table(Table::new())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Node::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Node::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Node::Table(_))
    }

    /// Looks up a direct child by key. Returns `None` for scalars.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_table().and_then(|t| t.get(key))
    }

    /// Returns the text form of a scalar, as written by the text codec.
    ///
    /// Booleans render as `"1"`/`"0"`. Returns `None` for tables and lists.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Node::String(s) => Some(s.clone()),
            Node::Int32(v) => Some(v.to_string()),
            Node::UInt64(v) => Some(v.to_string()),
            Node::Float32(v) => Some(v.to_string()),
            Node::Bool(b) => Some(if *b { "1".into() } else { "0".into() }),
            Node::List(_) | Node::Table(_) => None,
        }
    }
}

/// Converts a list into a table keyed by position (`"0"`, `"1"`, ...).
pub fn list_to_table(items: &[Node]) -> Table {
    items
        .iter()
        .enumerate()
        .map(|(i, v)| (i.to_string(), v.clone()))
        .collect()
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<i32> for Node {
    fn from(v: i32) -> Self {
        Node::Int32(v)
    }
}

impl From<u64> for Node {
    fn from(v: u64) -> Self {
        Node::UInt64(v)
    }
}

impl From<bool> for Node {
    fn from(v: bool) -> Self {
        Node::Bool(v)
    }
}

impl From<Table> for Node {
    fn from(t: Table) -> Self {
        Node::Table(t)
    }
}
