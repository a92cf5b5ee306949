//! In-memory document store

use crate::record::{
    DocumentStore, Mutation, NewDocument, SharedListener, StoredDocument, WritableStore,
};
use crate::{Result, StoreError};
use ontograph_core::{Document, DocumentId};
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::{debug, instrument};

/// Documents kept in a map, ids assigned sequentially from 1
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    listener: Option<SharedListener>,
}

#[derive(Default)]
struct Inner {
    next_id: DocumentId,
    records: BTreeMap<DocumentId, StoredDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn notify(&self, mutation: Mutation) {
        if let Some(listener) = &self.listener {
            listener.on_mutation(mutation);
        }
    }
}

impl DocumentStore for MemoryStore {
    fn list(&self) -> Result<Vec<Document>> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.records.values().map(StoredDocument::to_document).collect())
    }

    fn get(&self, id: DocumentId) -> Result<Option<Document>> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.records.get(&id).map(StoredDocument::to_document))
    }
}

impl WritableStore for MemoryStore {
    #[instrument(skip(self, document))]
    fn create(&self, document: NewDocument) -> Result<StoredDocument> {
        let stored = {
            let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
            inner.next_id += 1;
            let stored = document.into_stored(inner.next_id);
            inner.records.insert(stored.id, stored.clone());
            stored
        };
        debug!("Stored document {}", stored.id);
        self.notify(Mutation::Saved(stored.id));
        Ok(stored)
    }

    #[instrument(skip(self))]
    fn delete(&self, id: DocumentId) -> Result<()> {
        let removed = {
            let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
            inner.records.remove(&id)
        };
        if removed.is_none() {
            return Err(StoreError::NotFound(id));
        }
        self.notify(Mutation::Deleted(id));
        Ok(())
    }

    fn records(&self) -> Result<Vec<StoredDocument>> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.records.values().rev().cloned().collect())
    }

    fn set_listener(&mut self, listener: SharedListener) {
        self.listener = Some(listener);
    }
}
