//! Ingest service - saves uploaded ontology documents and pushes them to the remote index

use crate::remote_index::{IngestItem, RemoteIndex};
use crate::Result;
use ontograph_core::DocumentId;
use ontograph_store::{NewDocument, StoredDocument, WritableStore};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of pushing a saved document to the remote index
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RemoteOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest_error: Option<String>,
}

/// The stored record plus what the remote index said about it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    #[serde(flatten)]
    pub document: StoredDocument,
    #[serde(rename = "_remote")]
    pub remote: RemoteOutcome,
}

/// Write path for documents.
///
/// Rebuild scheduling happens through the store's mutation listener, so this
/// service only saves, deletes, and forwards new documents for indexing.
pub struct IngestService<S> {
    store: Arc<S>,
    remote: Option<Arc<RemoteIndex>>,
}

impl<S: WritableStore> IngestService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            remote: None,
        }
    }

    /// Builder: forward new documents to `remote`
    pub fn with_remote(mut self, remote: Arc<RemoteIndex>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Save a document and push it to the remote index if one is attached.
    ///
    /// Remote failures are reported in the result and never fail the save.
    #[instrument(skip(self, document), fields(filename = %document.filename))]
    pub async fn ingest(&self, document: NewDocument) -> Result<IngestReport> {
        let stored = self.store.create(document)?;
        info!("Saved document {}", stored.id);

        let mut outcome = RemoteOutcome::default();
        if let Some(remote) = self.remote.as_ref().filter(|r| r.is_configured()) {
            let item = IngestItem {
                id: stored.id,
                ontology: &stored.ontology,
            };
            match remote.try_ingest(&[item]).await {
                Ok(ack) => outcome.ingest = Some(ack),
                Err(e) => {
                    warn!("Remote ingest of document {} failed: {}", stored.id, e);
                    outcome.ingest_error = Some(e.to_string());
                }
            }
        }

        Ok(IngestReport {
            document: stored,
            remote: outcome,
        })
    }

    /// Delete a document by id
    #[instrument(skip(self))]
    pub fn delete(&self, id: DocumentId) -> Result<()> {
        self.store.delete(id)?;
        info!("Deleted document {}", id);
        Ok(())
    }
}
