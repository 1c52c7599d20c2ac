//! # Draft Store
//!
//! Saved authoring sessions, behind an injectable interface.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Arc<dyn DraftStore>                                                   │
//! │        │                                                                │
//! │        ├── DraftRepository     drafts table, JSON payload (production)  │
//! │        └── InMemoryDraftStore  Vec behind a RwLock (tests, demos)       │
//! │                                                                         │
//! │   save(draft) → DraftId        list() → newest first                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::InvoiceDraft;

pub type DraftId = Uuid;

/// A draft as it was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDraft {
    pub id: DraftId,
    pub draft: InvoiceDraft,
    pub saved_at: DateTime<Utc>,
}

/// Persistence for in-progress drafts.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Stores a copy of the draft and returns its new id.
    async fn save(&self, draft: &InvoiceDraft) -> DbResult<DraftId>;

    /// All saved drafts, newest first.
    async fn list(&self) -> DbResult<Vec<SavedDraft>>;
}

// =============================================================================
// SQLite
// =============================================================================

/// SQLite-backed draft store.
#[derive(Debug, Clone)]
pub struct DraftRepository {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct DraftRow {
    id: String,
    payload: String,
    created_at: DateTime<Utc>,
}

impl DraftRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DraftRepository { pool }
    }
}

#[async_trait]
impl DraftStore for DraftRepository {
    async fn save(&self, draft: &InvoiceDraft) -> DbResult<DraftId> {
        let id = Uuid::new_v4();
        let payload = serde_json::to_string(draft).map_err(|e| DbError::Internal(e.to_string()))?;

        sqlx::query("INSERT INTO drafts (id, customer_name, payload, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(id.to_string())
            .bind(draft.customer.name.trim())
            .bind(payload)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        debug!(id = %id, "Draft saved");
        Ok(id)
    }

    async fn list(&self) -> DbResult<Vec<SavedDraft>> {
        let rows: Vec<DraftRow> =
            sqlx::query_as("SELECT id, payload, created_at FROM drafts ORDER BY created_at DESC, rowid DESC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|row| {
                Ok(SavedDraft {
                    id: Uuid::parse_str(&row.id).map_err(|e| DbError::corrupt("draft", e))?,
                    draft: serde_json::from_str(&row.payload).map_err(|e| DbError::corrupt("draft", e))?,
                    saved_at: row.created_at,
                })
            })
            .collect()
    }
}

// =============================================================================
// In-Memory
// =============================================================================

/// Process-local draft store with an explicit owner.
#[derive(Debug, Default)]
pub struct InMemoryDraftStore {
    drafts: RwLock<Vec<SavedDraft>>,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftStore for InMemoryDraftStore {
    async fn save(&self, draft: &InvoiceDraft) -> DbResult<DraftId> {
        let saved = SavedDraft {
            id: Uuid::new_v4(),
            draft: draft.clone(),
            saved_at: Utc::now(),
        };
        let id = saved.id;
        self.drafts.write().await.push(saved);
        Ok(id)
    }

    async fn list(&self) -> DbResult<Vec<SavedDraft>> {
        Ok(self.drafts.read().await.iter().rev().cloned().collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tally_core::ledger::ItemUpdate;
    use tally_core::{Money, Percentage};

    fn draft(name: &str) -> InvoiceDraft {
        let mut draft = InvoiceDraft::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        draft.customer.name = name.to_string();
        draft.discount = Percentage::from_bps(1250);
        let id = draft.ledger.items()[0].id;
        draft.ledger.update(id, ItemUpdate::Rate(Money::from_cents(4999))).unwrap();
        draft
    }

    async fn exercise(store: Arc<dyn DraftStore>) {
        assert!(store.list().await.unwrap().is_empty());

        let first = store.save(&draft("First")).await.unwrap();
        let second = store.save(&draft("Second")).await.unwrap();
        assert_ne!(first, second);

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second);
        assert_eq!(listed[1].draft, draft("First"));
    }

    #[tokio::test]
    async fn test_sqlite_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        exercise(Arc::new(db.drafts())).await;
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        exercise(Arc::new(InMemoryDraftStore::new())).await;
    }

    #[tokio::test]
    async fn test_stores_are_independent() {
        let a = InMemoryDraftStore::new();
        let b = InMemoryDraftStore::new();
        a.save(&draft("Only in A")).await.unwrap();
        assert!(b.list().await.unwrap().is_empty());
    }
}
