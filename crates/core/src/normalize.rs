//! Schema normalizer - maps arbitrary document shapes onto canonical nodes and relations
//!
//! Producers disagree on key names, so every canonical field is resolved from
//! an ordered list of candidate keys. The first candidate holding a usable
//! scalar wins; anything that cannot be resolved is skipped by the caller.

use crate::node::{Node, Relation, DEFAULT_NODE_TYPE, DEFAULT_RELATION};
use serde_json::{Map, Value};

const NODE_ID_KEYS: &[&str] = &["id", "label", "name"];
const NODE_LABEL_KEYS: &[&str] = &["label", "name"];
const NODE_TYPE_KEYS: &[&str] = &["type", "class", "label"];
const RELATION_SOURCE_KEYS: &[&str] = &["source", "from", "s"];
const RELATION_TARGET_KEYS: &[&str] = &["target", "to", "t"];
const RELATION_LABEL_KEYS: &[&str] = &["relation", "label", "type"];

/// The shapes a raw node entry can take
#[derive(Debug, Clone, Copy)]
pub enum RawNode<'a> {
    /// A bare string, used as both id and label
    Name(&'a str),
    /// A mapping with loosely named fields
    Fields(&'a Map<String, Value>),
    /// Anything else (null, number, array, ...)
    Unsupported,
}

impl<'a> From<&'a Value> for RawNode<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::String(name) => RawNode::Name(name),
            Value::Object(fields) => RawNode::Fields(fields),
            _ => RawNode::Unsupported,
        }
    }
}

/// Normalize one raw node entry. Returns `None` when no non-empty id can be resolved.
pub fn normalize_node(raw: &Value) -> Option<Node> {
    match RawNode::from(raw) {
        RawNode::Name(name) if !name.is_empty() => {
            Some(Node::new(name, name, DEFAULT_NODE_TYPE))
        }
        RawNode::Name(_) | RawNode::Unsupported => None,
        RawNode::Fields(fields) => {
            let id = first_present(fields, NODE_ID_KEYS)?;
            let label = first_present(fields, NODE_LABEL_KEYS).unwrap_or_else(|| id.clone());
            let node_type = first_present(fields, NODE_TYPE_KEYS)
                .unwrap_or_else(|| DEFAULT_NODE_TYPE.to_string());
            Some(Node {
                id,
                label,
                node_type,
            })
        }
    }
}

/// Normalize one raw relation entry. Returns `None` unless it is a mapping
/// with both a source and a target.
pub fn normalize_relation(raw: &Value) -> Option<Relation> {
    let fields = raw.as_object()?;
    let source = first_present(fields, RELATION_SOURCE_KEYS)?;
    let target = first_present(fields, RELATION_TARGET_KEYS)?;
    let relation = first_present(fields, RELATION_LABEL_KEYS)
        .unwrap_or_else(|| DEFAULT_RELATION.to_string());
    Some(Relation {
        source,
        target,
        relation,
    })
}

/// First key holding a truthy scalar: a non-empty string, a non-zero number, or `true`
fn first_present(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match fields.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some(true.to_string()),
        _ => None,
    })
}
