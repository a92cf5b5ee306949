//! Common test utilities

use ontograph_service::{RebuildTrigger, Result};
use ontograph_store::{MemoryStore, NewDocument, WritableStore};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// The two-document Alice/Bob corpus
pub fn alice_and_bob() -> Vec<Value> {
    vec![
        json!({"nodes": [{"id": "a", "label": "Alice"}]}),
        json!({
            "nodes": [{"id": "a", "label": "Alice"}, {"id": "b", "label": "Bob"}],
            "relations": [{"source": "a", "target": "b", "relation": "knows"}]
        }),
    ]
}

/// Save every ontology into `store`, in order
pub fn fill<S: WritableStore>(store: &S, ontologies: Vec<Value>) {
    for ontology in ontologies {
        store
            .create(NewDocument::new(ontology))
            .expect("Failed to save document");
    }
}

/// Create an in-memory store holding the Alice/Bob corpus
pub fn create_test_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    fill(&store, alice_and_bob());
    Arc::new(store)
}

/// Rebuild trigger that only counts its calls
#[derive(Default)]
pub struct CountingTrigger {
    calls: AtomicUsize,
}

impl CountingTrigger {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RebuildTrigger for CountingTrigger {
    async fn rebuild(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
