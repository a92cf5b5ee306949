//! Query pipeline - scores documents, picks seed nodes, and expands them into a subgraph
//!
//! The pipeline is pure: it reads one snapshot of documents and builds
//! everything it needs from scratch, so concurrent queries never share state.

use crate::document::{Document, DocumentId};
use crate::graph::{Graph, GraphView};
use crate::node::{Node, Relation};
use crate::normalize::{normalize_node, normalize_relation};
use crate::scorer::{LexicalScorer, ScoredDocument};
use crate::traversal::{traverse, HighlightedNode};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// A traversal origin chosen for a query.
///
/// Node seeds come from node-level matches. When no node matched, each ranked
/// document becomes an anchor instead; anchors live in their own namespace so
/// a document id can never be mistaken for a node id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Seed {
    Node(String),
    Document(DocumentId),
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seed::Node(id) => write!(f, "{}", id),
            Seed::Document(id) => write!(f, "document:{}", id),
        }
    }
}

impl Serialize for Seed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The part of one document that matched the query
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snippet {
    pub nodes: Vec<Node>,
    pub relations: Vec<Relation>,
}

/// Per-document match summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredHit {
    #[serde(rename = "id")]
    pub document_id: DocumentId,
    pub score: f64,
    #[serde(rename = "matchedIds")]
    pub matched_node_ids: Vec<String>,
    pub snippet: Snippet,
}

/// Seeds and depth actually used for the traversal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraversalMeta {
    pub seeds: Vec<Seed>,
    pub hops: usize,
}

/// Response for a non-empty query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub nodes: Vec<HighlightedNode>,
    pub relations: Vec<Relation>,
    pub matches: Vec<ScoredHit>,
    pub traversal: TraversalMeta,
}

/// Either the whole graph (empty query) or a search result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Graph(GraphView),
    Search(SearchResponse),
}

/// Answer a query against a snapshot of documents using the lexical scorer.
///
/// An empty (or whitespace-only) query returns the full aggregated graph.
pub fn run_query(documents: &[Document], query: &str, k: usize, hops: usize) -> QueryResponse {
    if query.trim().is_empty() {
        return QueryResponse::Graph(Graph::assemble(documents).to_view());
    }

    let ranked = LexicalScorer::new(query).top_k(documents, k);
    debug!("Lexical ranking kept {} of {} documents", ranked.len(), documents.len());

    QueryResponse::Search(expand_hits(documents, &ranked, query, hops))
}

/// Build a search response from documents that were already ranked.
///
/// `ranked` may come from the local scorer or from a remote index; the
/// traversal always runs over the graph assembled from `corpus`.
pub fn expand_hits(
    corpus: &[Document],
    ranked: &[ScoredDocument<'_>],
    query: &str,
    hops: usize,
) -> SearchResponse {
    let graph = Graph::assemble(corpus);
    let needle = query.trim().to_lowercase();

    let matches: Vec<ScoredHit> = ranked
        .iter()
        .map(|hit| {
            let (matched_node_ids, snippet) = match_document(hit.document, &needle);
            ScoredHit {
                document_id: hit.document.id,
                score: hit.score,
                matched_node_ids,
                snippet,
            }
        })
        .collect();

    let mut node_seeds: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for id in matches.iter().flat_map(|m| &m.matched_node_ids) {
        if seen.insert(id.clone()) {
            node_seeds.push(id.clone());
        }
    }

    let (seeds, origins): (Vec<Seed>, HashSet<String>) = if node_seeds.is_empty() {
        let anchors: Vec<DocumentId> = matches.iter().map(|m| m.document_id).collect();
        let origins = anchors
            .iter()
            .flat_map(|id| graph.contributed_by(*id))
            .cloned()
            .collect();
        (anchors.into_iter().map(Seed::Document).collect(), origins)
    } else {
        (
            node_seeds.iter().cloned().map(Seed::Node).collect(),
            seen,
        )
    };
    let highlighted: HashSet<&str> = node_seeds.iter().map(String::as_str).collect();

    let traversal = traverse(&graph, &origins, hops);
    debug!(
        "Traversal from {} origins reached {} nodes and {} relations",
        origins.len(),
        traversal.nodes.len(),
        traversal.relations.len()
    );

    let nodes = if traversal.is_empty() {
        graph
            .nodes()
            .iter()
            .map(|node| HighlightedNode {
                highlighted: highlighted.contains(node.id.as_str()),
                node: node.clone(),
            })
            .collect()
    } else {
        traversal
            .nodes
            .into_iter()
            .map(|mut n| {
                n.highlighted = highlighted.contains(n.node.id.as_str());
                n
            })
            .collect()
    };

    let relations = if traversal.relations.is_empty() {
        graph.relations().to_vec()
    } else {
        traversal.relations
    };

    SearchResponse {
        nodes,
        relations,
        matches,
        traversal: TraversalMeta { seeds, hops },
    }
}

/// Node-level substring match inside one document.
///
/// Returns the matched node ids in document order and the snippet built from
/// them: the matched nodes plus relations whose endpoints both matched.
pub fn match_document(document: &Document, needle: &str) -> (Vec<String>, Snippet) {
    let mut matched_ids = Vec::new();
    let mut snippet = Snippet::default();
    if needle.is_empty() {
        return (matched_ids, snippet);
    }

    let mut matched = HashSet::new();
    for node in document.raw_nodes().iter().filter_map(normalize_node) {
        if node.matches(needle) && matched.insert(node.id.clone()) {
            matched_ids.push(node.id.clone());
            snippet.nodes.push(node);
        }
    }

    let mut seen = HashSet::new();
    for relation in document.raw_relations().iter().filter_map(normalize_relation) {
        if relation.connects(|id| matched.contains(id)) && seen.insert(relation.clone()) {
            snippet.relations.push(relation);
        }
    }

    (matched_ids, snippet)
}
