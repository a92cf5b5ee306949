//! Graph assembler - merges many documents into one deduplicated graph
//!
//! Nodes are keyed by id and the first document to introduce an id decides
//! its label and type. Relations are keyed by the full
//! `(source, target, relation)` triple and keep first-seen order. The graph is
//! built from scratch for every call and holds no state between calls.

use crate::document::{Document, DocumentId};
use crate::node::{Node, Relation};
use crate::normalize::{normalize_node, normalize_relation};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// The deduplicated union of every document in a snapshot
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    relations: Vec<Relation>,
    relation_keys: HashSet<Relation>,
    /// node id -> documents that mentioned it, in encounter order
    provenance: HashMap<String, Vec<DocumentId>>,
    /// document id -> node ids it mentioned, in document order
    contributions: HashMap<DocumentId, Vec<String>>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a graph from a snapshot of documents
    pub fn assemble<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Self {
        let mut graph = Self::new();
        for document in documents {
            graph.merge_document(document);
        }
        debug!(
            "Assembled graph with {} nodes and {} relations",
            graph.nodes.len(),
            graph.relations.len()
        );
        graph
    }

    /// Merge one document's nodes and relations into the graph
    pub fn merge_document(&mut self, document: &Document) {
        let mut skipped = 0usize;

        for raw in document.raw_nodes() {
            match normalize_node(raw) {
                Some(node) => self.insert_node(document.id, node),
                None => skipped += 1,
            }
        }

        for raw in document.raw_relations() {
            match normalize_relation(raw) {
                Some(relation) => {
                    self.insert_relation(relation);
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("Skipped {} malformed entries in document {}", skipped, document.id);
        }
    }

    /// Insert a node unless its id is already known. Provenance is recorded either way.
    pub fn insert_node(&mut self, document_id: DocumentId, node: Node) {
        let sources = self.provenance.entry(node.id.clone()).or_default();
        if !sources.contains(&document_id) {
            sources.push(document_id);
            self.contributions
                .entry(document_id)
                .or_default()
                .push(node.id.clone());
        }

        if !self.index.contains_key(&node.id) {
            self.index.insert(node.id.clone(), self.nodes.len());
            self.nodes.push(node);
        }
    }

    /// Insert a relation unless the same triple is already present.
    ///
    /// Returns `true` when the relation was new.
    pub fn insert_relation(&mut self, relation: Relation) -> bool {
        if self.relation_keys.contains(&relation) {
            return false;
        }
        self.relation_keys.insert(relation.clone());
        self.relations.push(relation);
        true
    }

    /// Nodes in first-seen order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Relations in first-seen order. May reference unknown node ids.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Position of a node in insertion order
    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Documents that mentioned a node; the first one supplied its attributes
    pub fn provenance(&self, id: &str) -> &[DocumentId] {
        self.provenance.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Node ids mentioned by a document
    pub fn contributed_by(&self, document_id: DocumentId) -> &[String] {
        self.contributions
            .get(&document_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relations.is_empty()
    }

    /// Serializable `{nodes, relations}` view of the whole graph
    pub fn to_view(&self) -> GraphView {
        GraphView {
            nodes: self.nodes.clone(),
            relations: self.relations.clone(),
        }
    }
}

/// The JSON shape of the aggregated graph
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<Node>,
    pub relations: Vec<Relation>,
}
