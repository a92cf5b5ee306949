//! Service error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Document store error: {0}")]
    Store(#[from] ontograph_store::StoreError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote index unavailable")]
    RemoteUnavailable,

    #[error("Missing query")]
    MissingQuery,

    #[error("No async runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
