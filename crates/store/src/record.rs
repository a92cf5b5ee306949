//! Stored document records and the store interfaces

use crate::Result;
use chrono::{DateTime, Utc};
use ontograph_core::{Document, DocumentId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// A document as the store keeps it, with upload metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: DocumentId,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub ontology: Value,
}

impl StoredDocument {
    /// The read-only view handed to the query core
    pub fn to_document(&self) -> Document {
        Document::new(self.id, self.ontology.clone())
    }
}

/// A document that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub filename: String,
    pub source: String,
    pub ontology: Value,
}

impl NewDocument {
    /// Create a new document payload.
    ///
    /// Upload payloads of the form `{"ontology": ...}` are unwrapped.
    pub fn new(ontology: Value) -> Self {
        let ontology = match ontology {
            Value::Object(mut fields) if fields.contains_key("ontology") => fields
                .remove("ontology")
                .unwrap_or(Value::Null),
            other => other,
        };
        Self {
            filename: String::new(),
            source: String::new(),
            ontology,
        }
    }

    /// Decode an uploaded JSON payload
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(serde_json::from_slice(bytes)?))
    }

    /// Builder: set filename
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Builder: set source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub(crate) fn into_stored(self, id: DocumentId) -> StoredDocument {
        StoredDocument {
            id,
            filename: self.filename,
            source: self.source,
            created_at: Utc::now(),
            ontology: self.ontology,
        }
    }
}

/// Change made to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Saved(DocumentId),
    Deleted(DocumentId),
}

/// Receives a call after every successful write
pub trait MutationListener: Send + Sync {
    fn on_mutation(&self, mutation: Mutation);
}

/// Shared handle to a listener
pub type SharedListener = Arc<dyn MutationListener>;

/// Read access the query core needs: list everything, or fetch by id.
///
/// Every call returns a fresh snapshot.
pub trait DocumentStore: Send + Sync {
    fn list(&self) -> Result<Vec<Document>>;

    fn get(&self, id: DocumentId) -> Result<Option<Document>>;
}

/// Stores that also accept writes
pub trait WritableStore: DocumentStore {
    /// Save a document and return the stored record with its new id
    fn create(&self, document: NewDocument) -> Result<StoredDocument>;

    /// Delete a document. Fails with `NotFound` when it does not exist.
    fn delete(&self, id: DocumentId) -> Result<()>;

    /// All records with metadata, newest first
    fn records(&self) -> Result<Vec<StoredDocument>>;

    /// Register the listener notified after each write
    fn set_listener(&mut self, listener: SharedListener);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_document_unwraps_upload_payload() {
        let doc = NewDocument::new(json!({"ontology": {"nodes": ["a"]}, "filename": "x.json"}));
        assert_eq!(doc.ontology, json!({"nodes": ["a"]}));

        let doc = NewDocument::new(json!({"nodes": ["a"]}));
        assert_eq!(doc.ontology, json!({"nodes": ["a"]}));
    }

    #[test]
    fn test_from_slice() {
        let doc = NewDocument::from_slice(br#"{"ontology": {"nodes": ["a"]}}"#).unwrap();
        assert_eq!(doc.ontology, json!({"nodes": ["a"]}));
        assert!(matches!(
            NewDocument::from_slice(b"{not json"),
            Err(crate::StoreError::Json(_))
        ));
    }

    #[test]
    fn test_stored_document_view() {
        let stored = NewDocument::new(json!({"nodes": ["a"]}))
            .with_filename("a.json")
            .with_source("cli")
            .into_stored(9);
        let document = stored.to_document();
        assert_eq!(document.id, 9);
        assert_eq!(document.raw, json!({"nodes": ["a"]}));
        assert_eq!(stored.filename, "a.json");
    }
}
