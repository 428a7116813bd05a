//! Persistence errors

use store_assistant_core::Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Table was never bulk-loaded
    #[error("Table not loaded: {0}")]
    NotLoaded(String),

    #[error("Seed error: {0}")]
    Seed(String),

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Artifact I/O error: {0}")]
    ArtifactIo(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for PersistenceError {
    fn from(err: tokio::task::JoinError) -> Self {
        PersistenceError::Task(err.to_string())
    }
}

impl From<PersistenceError> for Error {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::ArtifactNotFound(id) => Error::NotFound(format!("artifact {id}")),
            PersistenceError::ArtifactIo(msg) => Error::ArtifactWrite(msg),
            other => Error::StoreUnavailable(other.to_string()),
        }
    }
}
