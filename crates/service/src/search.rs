//! Search service - answers graph and search requests against the document store

use crate::remote_index::{IndexHit, RemoteIndex};
use crate::{Result, ServiceError};
use ontograph_core::{
    expand_hits, run_query, Document, Graph, GraphView, LexicalScorer, QueryResponse,
    ScoredDocument, SearchParams,
};
use ontograph_store::DocumentStore;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Query orchestrator over a document store, optionally backed by a remote index
pub struct SearchService<S> {
    store: Arc<S>,
    remote: Option<Arc<RemoteIndex>>,
    prefer_remote: bool,
}

impl<S: DocumentStore> SearchService<S> {
    /// Create a search service using local lexical ranking only
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            remote: None,
            prefer_remote: false,
        }
    }

    /// Attach a remote index. With `prefer_remote`, searches rank remotely first.
    pub fn with_remote(mut self, remote: Arc<RemoteIndex>, prefer_remote: bool) -> Self {
        self.remote = Some(remote);
        self.prefer_remote = prefer_remote;
        self
    }

    /// The full aggregated graph of the current snapshot
    #[instrument(skip(self))]
    pub fn graph(&self) -> Result<GraphView> {
        let documents = self.store.list()?;
        Ok(Graph::assemble(&documents).to_view())
    }

    /// Answer a search request. An empty query returns the full graph.
    #[instrument(skip(self), fields(q = %params.q))]
    pub async fn search(&self, params: &SearchParams) -> Result<QueryResponse> {
        let documents = self.store.list()?;
        info!("Searching {} documents", documents.len());

        if params.is_graph_request() {
            return Ok(QueryResponse::Graph(Graph::assemble(&documents).to_view()));
        }

        if let Some(remote) = self.remote.as_ref().filter(|_| self.prefer_remote) {
            let mut hits = remote.query(&params.q, params.k).await;
            hits.truncate(params.k);
            if !hits.is_empty() {
                debug!("Using {} remote hits", hits.len());
                let ranked: Vec<Document> = hits
                    .iter()
                    .map(|hit| Document::new(hit.id, hit.ontology.clone()))
                    .collect();
                let scored: Vec<ScoredDocument<'_>> = ranked
                    .iter()
                    .zip(&hits)
                    .map(|(document, hit)| ScoredDocument {
                        document,
                        score: hit.score,
                    })
                    .collect();
                let response = expand_hits(&documents, &scored, &params.q, params.hops);
                return Ok(QueryResponse::Search(response));
            }
            debug!("Remote index returned nothing, ranking locally");
        }

        Ok(run_query(&documents, &params.q, params.k, params.hops))
    }

    /// Local top-k ranking with full documents, in the remote `/query` shape
    #[instrument(skip(self))]
    pub fn rank(&self, query: &str, k: usize) -> Result<Vec<IndexHit>> {
        if query.trim().is_empty() {
            return Err(ServiceError::MissingQuery);
        }
        let documents = self.store.list()?;
        let hits = LexicalScorer::new(query)
            .top_k(&documents, k)
            .into_iter()
            .map(|hit| IndexHit {
                id: hit.document.id,
                score: hit.score,
                ontology: hit.document.raw.clone(),
            })
            .collect();
        Ok(hits)
    }
}
