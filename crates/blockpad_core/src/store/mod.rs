//! Document persistence contracts and adapters.
//!
//! # Responsibility
//! - Define the async persistence collaborator consumed by the save controller.
//! - Provide a SQLite-backed adapter for local documents.
//!
//! # Invariants
//! - `StoreError::Cancelled` is never treated as a failure by callers.
//! - Stores receive full document snapshots; last write wins.

use crate::db::DbError;
use crate::model::document::Document;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod sqlite;

pub use sqlite::{DocumentSummary, SqliteDocumentStore};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by document stores.
#[derive(Debug)]
pub enum StoreError {
    /// The save was superseded and abandoned.
    Cancelled,
    /// Opaque backend failure.
    Failed(String),
    Db(DbError),
    Serialization(serde_json::Error),
    /// Stored row cannot be decoded into a document.
    InvalidData(String),
}

impl StoreError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "save cancelled"),
            Self::Failed(reason) => write!(f, "save failed: {reason}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "document serialization failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Persistence collaborator for whole-document snapshots.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn save(&self, document: &Document) -> StoreResult<()>;
}
