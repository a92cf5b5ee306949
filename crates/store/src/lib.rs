//! Document stores for Ontograph
//!
//! The query core only needs to list documents and fetch them by id. This
//! crate defines that interface, the write-side hook used to tell the rebuild
//! debouncer about changes, and two implementations: an in-memory store for
//! tests and embedding, and a directory of JSON files for the CLI.

pub mod dir;
pub mod error;
pub mod memory;
pub mod record;

pub use dir::DirStore;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use record::{
    DocumentStore, Mutation, MutationListener, NewDocument, SharedListener, StoredDocument,
    WritableStore,
};
