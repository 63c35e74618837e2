//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist whole-document snapshots as JSON-encoded block lists.
//! - Load documents back through the non-empty sequence repair path.
//!
//! # Invariants
//! - `save` upserts by document id; last write wins.
//! - Listing is deterministic: `updated_at DESC, id ASC`.

use crate::db::{open_db, open_db_in_memory};
use crate::model::block::Block;
use crate::model::document::{Document, DocumentId};
use crate::store::{DocumentStore, StoreError, StoreResult};
use async_trait::async_trait;
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Lightweight listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub title: String,
    pub block_count: usize,
    pub updated_at: i64,
}

/// Document store over one SQLite connection.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Opens (or creates) a store at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already-migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Synchronous upsert of one snapshot.
    pub fn save_document(&self, document: &Document) -> StoreResult<()> {
        let blocks_json = serde_json::to_string(document.blocks())?;
        let block_count = i64::try_from(document.len())
            .map_err(|_| StoreError::InvalidData("block count overflow".to_string()))?;

        self.lock().execute(
            "INSERT INTO documents (id, title, blocks_json, block_count, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                blocks_json = excluded.blocks_json,
                block_count = excluded.block_count,
                updated_at = excluded.updated_at;",
            params![
                document.id.to_string(),
                document.title(),
                blocks_json,
                block_count,
                document.updated_at(),
            ],
        )?;
        Ok(())
    }

    /// Loads one document by id.
    pub fn load(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        let row = self
            .lock()
            .query_row(
                "SELECT title, blocks_json, updated_at FROM documents WHERE id = ?1;",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((title, blocks_json, updated_at)) = row else {
            return Ok(None);
        };
        let blocks: Vec<Block> = serde_json::from_str(&blocks_json)
            .map_err(|err| StoreError::InvalidData(format!("document {id}: {err}")))?;
        Ok(Some(Document::from_parts(id, title, blocks, updated_at)))
    }

    /// Lists stored documents, most recently updated first.
    pub fn list(&self) -> StoreResult<Vec<DocumentSummary>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, title, block_count, updated_at
             FROM documents
             ORDER BY updated_at DESC, id ASC;",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (raw_id, title, block_count, updated_at) = row?;
            let id = Uuid::parse_str(&raw_id)
                .map_err(|err| StoreError::InvalidData(format!("invalid id `{raw_id}`: {err}")))?;
            let block_count = usize::try_from(block_count).map_err(|_| {
                StoreError::InvalidData(format!("negative block count for {raw_id}"))
            })?;
            summaries.push(DocumentSummary {
                id,
                title,
                block_count,
                updated_at,
            });
        }
        Ok(summaries)
    }

    /// Removes one document. Returns whether a row existed.
    pub fn delete(&self, id: DocumentId) -> StoreResult<bool> {
        let changed = self
            .lock()
            .execute("DELETE FROM documents WHERE id = ?1;", params![id.to_string()])?;
        Ok(changed > 0)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn save(&self, document: &Document) -> StoreResult<()> {
        match self.save_document(document) {
            Ok(()) => {
                debug!(
                    "event=document_save module=store status=ok blocks={} updated_at={}",
                    document.len(),
                    document.updated_at()
                );
                Ok(())
            }
            Err(err) => {
                error!("event=document_save module=store status=error error={err}");
                Err(err)
            }
        }
    }
}
