//! Core domain for Ontograph
//!
//! This crate turns loosely structured ontology documents into one
//! deduplicated graph and answers relevance queries against it:
//! normalization, lexical scoring, graph assembly, traversal, and the query
//! pipeline that ties them together. Everything here is synchronous and
//! holds no state between calls.

pub mod document;
pub mod graph;
pub mod node;
pub mod normalize;
pub mod params;
pub mod query;
pub mod scorer;
pub mod traversal;

pub use document::{Document, DocumentId};
pub use graph::{Graph, GraphView};
pub use node::{Node, Relation};
pub use normalize::{normalize_node, normalize_relation};
pub use params::{SearchParams, DEFAULT_HOPS, DEFAULT_K};
pub use query::{
    expand_hits, run_query, QueryResponse, ScoredHit, SearchResponse, Seed, Snippet,
    TraversalMeta,
};
pub use scorer::{LexicalScorer, ScoredDocument};
pub use traversal::{traverse, HighlightedNode, TraversalResult};
