//! Generic tree parsed from the bundle dump.
//!
//! `xcresulttool` wraps every value in a typed object (`{"_type": ...,
//! "_value": ...}`), so the dump is walked structurally rather than
//! deserialized into a schema.
//!
//! Dumps have no fixed nesting limit. Parsing, conversion and drop all grow
//! the stack on demand instead of failing on deep but well-formed input.

use serde::Deserialize;
use serde_json::Value;

/// Grow the stack when less than this remains (100KB)
const RED_ZONE: usize = 100 * 1024;

/// Stack space allocated per growth (1MB)
const STACK_PER_RECURSION: usize = 1024 * 1024;

fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// One node of the dump
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Object, entries kept in document order
    Mapping(Vec<(String, Node)>),
    /// Array
    Sequence(Vec<Node>),
    /// String, number, bool or null
    Scalar(Value),
}

impl Node {
    /// Parse dump text into a tree
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let mut de = serde_json::Deserializer::from_str(text);
        de.disable_recursion_limit();
        let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        Ok(Node::from(value))
    }

    /// Value under `key` if this is a mapping
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Follow a chain of mapping keys
    pub fn path(&self, keys: &[&str]) -> Option<&Node> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    /// String content of a scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Child nodes in document order; empty for scalars
    pub fn children(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        match self {
            Node::Mapping(entries) => Box::new(entries.iter().map(|(_, v)| v)),
            Node::Sequence(items) => Box::new(items.iter()),
            Node::Scalar(_) => Box::new(std::iter::empty()),
        }
    }

    /// Whether this is a mapping or a sequence
    pub fn is_container(&self) -> bool {
        !matches!(self, Node::Scalar(_))
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        ensure_sufficient_stack(|| match value {
            Value::Object(map) => {
                Node::Mapping(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
            Value::Array(items) => Node::Sequence(items.into_iter().map(Node::from).collect()),
            scalar => Node::Scalar(scalar),
        })
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        // Children are released inside the grown stack, one level per call
        ensure_sufficient_stack(|| match self {
            Node::Mapping(entries) => drop(std::mem::take(entries)),
            Node::Sequence(items) => drop(std::mem::take(items)),
            Node::Scalar(_) => {}
        })
    }
}
