//! Canonical graph vertices and edges

use serde::{Deserialize, Serialize};

/// Type given to nodes that do not declare one
pub const DEFAULT_NODE_TYPE: &str = "Entity";

/// Label given to relations that do not declare one
pub const DEFAULT_RELATION: &str = "related_to";

/// A canonical graph vertex. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: String,
}

impl Node {
    /// Create a new node
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        node_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type: node_type.into(),
        }
    }

    /// Case-insensitive substring match on id or label.
    ///
    /// `needle` must already be lower-cased.
    pub fn matches(&self, needle: &str) -> bool {
        self.id.to_lowercase().contains(needle) || self.label.to_lowercase().contains(needle)
    }
}

/// A directed, labeled edge. Identity is the `(source, target, relation)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub source: String,
    pub target: String,
    pub relation: String,
}

impl Relation {
    /// Create a new relation
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
        }
    }

    /// Whether both endpoints satisfy `contains`
    pub fn connects(&self, mut contains: impl FnMut(&str) -> bool) -> bool {
        contains(&self.source) && contains(&self.target)
    }
}
