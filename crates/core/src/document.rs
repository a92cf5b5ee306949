//! Ontology documents - raw, schema-less graph fragments

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier assigned to a document by the document store
pub type DocumentId = i64;

/// One stored ontology record.
///
/// The `raw` payload is whatever JSON the producer emitted. Nothing about its
/// shape is guaranteed; the normalizer decides what can be read from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub raw: Value,
}

impl Document {
    /// Create a new document
    pub fn new(id: DocumentId, raw: Value) -> Self {
        Self { id, raw }
    }

    /// Node container: first non-empty array under `nodes` or `entities`
    pub fn raw_nodes(&self) -> &[Value] {
        container(&self.raw, &["nodes", "entities"])
    }

    /// Relation container: first non-empty array under `relations` or `edges`
    pub fn raw_relations(&self) -> &[Value] {
        container(&self.raw, &["relations", "edges"])
    }
}

fn container<'a>(raw: &'a Value, keys: &[&str]) -> &'a [Value] {
    keys.iter()
        .filter_map(|key| raw.get(*key).and_then(Value::as_array))
        .find(|items| !items.is_empty())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
