//! Services for Ontograph
//!
//! This crate wires the query core to a document store:
//! - Search: graph and search requests, optionally ranked by a remote index
//! - Ingest: saves documents and forwards them for indexing
//! - Debounce: coalesces store changes into delayed index rebuilds

pub mod config;
pub mod debounce;
pub mod error;
pub mod ingest;
pub mod remote_index;
pub mod search;

pub use config::{RemoteConfig, ServiceConfig};
pub use debounce::{RebuildDebouncer, RebuildTrigger};
pub use error::{Result, ServiceError};
pub use ingest::{IngestReport, IngestService, RemoteOutcome};
pub use remote_index::{IndexHit, IngestItem, RemoteIndex};
pub use search::SearchService;
