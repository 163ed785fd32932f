//! Persistence Gateway — durable copy of documents.
//!
//! The editing core only talks to `Arc<dyn DocumentStore>`; the backend is
//! picked at startup (Postgres when `DATABASE_URL` is set, memory otherwise).

pub mod autosave;
pub mod snapshots;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::editor::document::Document;
use crate::models::document::DocumentRow;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document {0} has been deleted")]
    Deleted(Uuid),

    #[error("Snapshot upload failed: {0}")]
    Snapshot(String),

    #[error("Autosave unavailable for document {0}")]
    Unavailable(Uuid),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Document {0} not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Save/load contract for the durable copy of a document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn save(&self, id: Uuid, document: &Document) -> Result<(), PersistError>;

    async fn load(&self, id: Uuid) -> Result<Document, LoadError>;

    /// Logical delete. Later loads fail with `NotFound`, later saves are rejected.
    async fn delete(&self, id: Uuid) -> Result<(), PersistError>;
}

// ────────────────────────────────────────────────────────────────────────────
// PgDocumentStore
// ────────────────────────────────────────────────────────────────────────────

/// One JSONB row per document, soft-deleted via `deleted_at`.
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn save(&self, id: Uuid, document: &Document) -> Result<(), PersistError> {
        let data = serde_json::to_value(document)?;

        let result = sqlx::query(
            r#"
            INSERT INTO documents (id, title, template_id, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
                SET title = EXCLUDED.title,
                    data = EXCLUDED.data,
                    updated_at = EXCLUDED.updated_at
                WHERE documents.deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(&document.title)
        .bind(&document.template_id)
        .bind(&data)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistError::Deleted(id));
        }
        debug!("Saved document {id}");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Document, LoadError> {
        let row: Option<DocumentRow> = sqlx::query_as(
            "SELECT * FROM documents WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(LoadError::NotFound(id))?;
        let document: Document = serde_json::from_value(row.data)?;
        Ok(document.normalized())
    }

    async fn delete(&self, id: Uuid) -> Result<(), PersistError> {
        sqlx::query("UPDATE documents SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!("Deleted document {id}");
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryDocumentStore
// ────────────────────────────────────────────────────────────────────────────

/// In-process store. Documents are kept as serialized JSON so that every
/// save/load is a real serialization round trip.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<Uuid, serde_json::Value>>,
    deleted: RwLock<HashSet<Uuid>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn save(&self, id: Uuid, document: &Document) -> Result<(), PersistError> {
        if self.deleted.read().await.contains(&id) {
            return Err(PersistError::Deleted(id));
        }
        let data = serde_json::to_value(document)?;
        self.documents.write().await.insert(id, data);
        debug!("Saved document {id} (memory)");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Document, LoadError> {
        let data = self
            .documents
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(LoadError::NotFound(id))?;
        let document: Document = serde_json::from_value(data)?;
        Ok(document.normalized())
    }

    async fn delete(&self, id: Uuid) -> Result<(), PersistError> {
        self.documents.write().await.remove(&id);
        self.deleted.write().await.insert(id);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::document::{EntryFields, SectionId};
    use crate::editor::reducer;

    #[tokio::test]
    async fn test_memory_round_trip_keeps_entry_ids_and_order() {
        let store = MemoryDocumentStore::new();
        let mut doc = Document::new("CV", "classic");
        for _ in 0..3 {
            doc = reducer::add_entry(&doc, SectionId::Education, EntryFields::new()).unwrap();
        }
        let ids: Vec<_> = doc
            .entries(SectionId::Education)
            .iter()
            .map(|e| e.id.clone())
            .collect();
        doc = reducer::reorder_entries(&doc, SectionId::Education, &ids[2], &ids[0]).unwrap();

        store.save(doc.id, &doc).await.unwrap();
        let loaded = store.load(doc.id).await.unwrap();

        assert_eq!(loaded, doc);
        let loaded_ids: Vec<_> = loaded
            .entries(SectionId::Education)
            .iter()
            .map(|e| e.id.clone())
            .collect();
        assert_eq!(loaded_ids, vec![ids[2].clone(), ids[0].clone(), ids[1].clone()]);
    }

    #[tokio::test]
    async fn test_memory_load_missing_is_not_found() {
        let store = MemoryDocumentStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(store.load(id).await, Err(LoadError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_memory_delete_blocks_later_saves() {
        let store = MemoryDocumentStore::new();
        let doc = Document::new("CV", "classic");
        store.save(doc.id, &doc).await.unwrap();
        store.delete(doc.id).await.unwrap();

        assert!(matches!(store.load(doc.id).await, Err(LoadError::NotFound(_))));
        assert!(matches!(
            store.save(doc.id, &doc).await,
            Err(PersistError::Deleted(_))
        ));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_memory_delete_is_idempotent_and_isolated() {
        let store = MemoryDocumentStore::new();
        let kept = Document::new("Kept", "classic");
        let gone = Document::new("Gone", "classic");
        store.save(kept.id, &kept).await.unwrap();
        store.save(gone.id, &gone).await.unwrap();

        store.delete(gone.id).await.unwrap();
        store.delete(gone.id).await.unwrap();

        assert_eq!(store.deleted.read().await.len(), 1);
        assert!(matches!(
            store.save(gone.id, &gone).await,
            Err(PersistError::Deleted(_))
        ));
        store.save(kept.id, &kept).await.unwrap();
        assert_eq!(store.load(kept.id).await.unwrap().title, "Kept");
    }
}
