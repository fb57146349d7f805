//! # Sync Queue Repository
//!
//! Manages the deferred-mutation queue for offline-first operation.
//!
//! ## The Queue Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Mutation Queue Lifecycle                            │
//! │                                                                         │
//! │  OFFLINE MUTATION (e.g., gateway.post while offline)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO sync_queue (id, entity, kind, method, url, payload, ...)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            DRAIN (sequential, on reconnect / interval)          │   │
//! │  │                                                                 │   │
//! │  │  1. SELECT ... WHERE abandoned_at IS NULL                      │   │
//! │  │     ORDER BY priority, created_at, seq                         │   │
//! │  │                                                                 │   │
//! │  │  2. For each entry, in order:                                  │   │
//! │  │     a. Replay method/url/payload against the remote API        │   │
//! │  │     b. On success: DELETE the row                              │   │
//! │  │     c. On failure: attempts += 1, last_error recorded          │   │
//! │  │     d. Permanent failure / ceiling: abandoned_at stamped       │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  KEY GUARANTEES:                                                       │
//! │  • A queued mutation is never lost before a confirmed delivery         │
//! │  • Drain order is priority ASC, then strict insertion order            │
//! │  • Offline? Entries queue up. Back online? Drain replays them          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use fieldops_core::{Entity, HttpMethod, MutationKind, QueueItem};

/// Column list shared by every `SELECT` that maps to [`QueueItem`].
///
/// `seq` is deliberately absent: it is a storage-level tie-breaker, not part
/// of the domain record.
const ITEM_COLUMNS: &str = "id, entity, kind, method, url, payload, priority, \
     attempts, last_error, created_at, attempted_at, abandoned_at";

// =============================================================================
// New Queue Item
// =============================================================================

/// Everything the gateway decides about a mutation before it is persisted.
///
/// The repository fills in the generated fields (`id`, `created_at`,
/// zeroed bookkeeping) at enqueue time.
#[derive(Debug, Clone)]
pub struct NewQueueItem {
    /// Category tag for UI grouping.
    pub entity: Entity,

    /// What kind of mutation this is.
    pub kind: MutationKind,

    /// HTTP verb to replay.
    pub method: HttpMethod,

    /// Target resource path.
    pub url: String,

    /// Request body as JSON text. `None` for deletes.
    pub payload: Option<String>,

    /// Drain priority; lower delivers first.
    pub priority: i64,
}

// =============================================================================
// Sync Queue Repository
// =============================================================================

/// Repository for deferred-mutation queue operations.
#[derive(Debug, Clone)]
pub struct SyncQueueRepository {
    pool: SqlitePool,
}

impl SyncQueueRepository {
    /// Creates a new SyncQueueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SyncQueueRepository { pool }
    }

    /// Persists a deferred mutation.
    ///
    /// Assigns the item id (UUID v4) and enqueue timestamp; `attempts`
    /// starts at zero. Insertion order within a priority class is captured
    /// by the table's AUTOINCREMENT sequence.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let item = repo.enqueue(NewQueueItem {
    ///     entity: Entity::WorkOrder,
    ///     kind: MutationKind::Update,
    ///     method: HttpMethod::Patch,
    ///     url: "/work-orders/42".into(),
    ///     payload: Some(r#"{"status":"done"}"#.into()),
    ///     priority: 10,
    /// }).await?;
    /// ```
    pub async fn enqueue(&self, new: NewQueueItem) -> DbResult<QueueItem> {
        let item = QueueItem {
            id: Uuid::new_v4().to_string(),
            entity: new.entity,
            kind: new.kind,
            method: new.method,
            url: new.url,
            payload: new.payload,
            priority: new.priority,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            attempted_at: None,
            abandoned_at: None,
        };

        debug!(
            id = %item.id,
            entity = %item.entity,
            kind = %item.kind,
            url = %item.url,
            priority = item.priority,
            "Enqueuing deferred mutation"
        );

        sqlx::query(
            r#"
            INSERT INTO sync_queue (
                id, entity, kind, method, url, payload,
                priority, attempts, last_error, created_at, attempted_at, abandoned_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&item.id)
        .bind(item.entity)
        .bind(item.kind)
        .bind(item.method)
        .bind(&item.url)
        .bind(&item.payload)
        .bind(item.priority)
        .bind(item.attempts)
        .bind(&item.last_error)
        .bind(item.created_at)
        .bind(item.attempted_at)
        .bind(item.abandoned_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets pending entries in drain order.
    ///
    /// ## Returns
    /// Non-abandoned entries ordered by ascending priority, then enqueue
    /// time, then insertion sequence — the exact order the drain must
    /// replay them in.
    pub async fn get_pending_ordered(&self, limit: u32) -> DbResult<Vec<QueueItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM sync_queue \
             WHERE abandoned_at IS NULL \
             ORDER BY priority ASC, created_at ASC, seq ASC \
             LIMIT ?1"
        );

        let items = sqlx::query_as::<_, QueueItem>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Gets all pending entries, optionally filtered by entity tag.
    ///
    /// Same ordering as [`get_pending_ordered`](Self::get_pending_ordered);
    /// used by the pending-operations view rather than the drain.
    pub async fn all_pending(&self, entity: Option<Entity>) -> DbResult<Vec<QueueItem>> {
        let items = match entity {
            Some(entity) => {
                let sql = format!(
                    "SELECT {ITEM_COLUMNS} FROM sync_queue \
                     WHERE abandoned_at IS NULL AND entity = ?1 \
                     ORDER BY priority ASC, created_at ASC, seq ASC"
                );
                sqlx::query_as::<_, QueueItem>(&sql)
                    .bind(entity)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {ITEM_COLUMNS} FROM sync_queue \
                     WHERE abandoned_at IS NULL \
                     ORDER BY priority ASC, created_at ASC, seq ASC"
                );
                sqlx::query_as::<_, QueueItem>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(items)
    }

    /// Removes an entry after a confirmed successful replay.
    ///
    /// Deletion is the only success path out of the queue: an entry exists
    /// exactly until the remote API has acknowledged it.
    pub async fn mark_delivered(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Removing delivered queue item");

        sqlx::query("DELETE FROM sync_queue WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Records a failed delivery attempt.
    ///
    /// Increments `attempts` and stores the error; the entry stays queued
    /// for the next drain cycle.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE sync_queue SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Permanently gives up on an entry.
    ///
    /// The entry leaves the drain set and the pending counts but stays
    /// queryable via [`all_abandoned`](Self::all_abandoned) until purged.
    pub async fn abandon(&self, id: &str, error: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE sync_queue SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3,
                abandoned_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts pending (non-abandoned) entries.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sync_queue WHERE abandoned_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Counts pending entries per entity tag.
    ///
    /// Entities with no pending entries are absent from the result.
    pub async fn count_pending_by_entity(&self) -> DbResult<Vec<(Entity, i64)>> {
        let counts: Vec<(Entity, i64)> = sqlx::query_as(
            "SELECT entity, COUNT(*) FROM sync_queue \
             WHERE abandoned_at IS NULL \
             GROUP BY entity",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Counts abandoned entries.
    pub async fn count_abandoned(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sync_queue WHERE abandoned_at IS NOT NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Gets all abandoned entries, most recently abandoned first.
    pub async fn all_abandoned(&self) -> DbResult<Vec<QueueItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM sync_queue \
             WHERE abandoned_at IS NOT NULL \
             ORDER BY abandoned_at DESC, seq DESC"
        );

        let items = sqlx::query_as::<_, QueueItem>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Returns the most recent delivery error recorded anywhere in the queue.
    pub async fn latest_error(&self) -> DbResult<Option<String>> {
        let error: Option<String> = sqlx::query_scalar(
            "SELECT last_error FROM sync_queue \
             WHERE last_error IS NOT NULL \
             ORDER BY attempted_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?
        .flatten();

        Ok(error)
    }

    /// Deletes abandoned entries older than the retention window.
    ///
    /// ## Returns
    /// Number of deleted entries.
    pub async fn purge_abandoned(&self, days_old: u32) -> DbResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days_old));

        let result = sqlx::query(
            "DELETE FROM sync_queue \
             WHERE abandoned_at IS NOT NULL AND abandoned_at < ?1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_item(url: &str, priority: i64) -> NewQueueItem {
        NewQueueItem {
            entity: Entity::Customer,
            kind: MutationKind::Create,
            method: HttpMethod::Post,
            url: url.to_string(),
            payload: Some(r#"{"name":"test"}"#.to_string()),
            priority,
        }
    }

    #[tokio::test]
    async fn test_enqueue_assigns_id_and_defaults() {
        let db = test_db().await;
        let repo = db.queue();

        let item = repo.enqueue(new_item("/customers", 5)).await.unwrap();

        assert!(!item.id.is_empty());
        assert_eq!(item.attempts, 0);
        assert!(item.last_error.is_none());
        assert!(item.abandoned_at.is_none());

        let pending = repo.all_pending(None).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, item.id);
        assert_eq!(pending[0].url, "/customers");
        assert_eq!(pending[0].payload.as_deref(), Some(r#"{"name":"test"}"#));
    }

    #[tokio::test]
    async fn test_drain_order_priority_then_insertion() {
        let db = test_db().await;
        let repo = db.queue();

        // Priorities [10, 5, 10, 15] inserted in that order must drain as
        // [5, 10(first), 10(second), 15].
        let a = repo.enqueue(new_item("/a", 10)).await.unwrap();
        let b = repo.enqueue(new_item("/b", 5)).await.unwrap();
        let c = repo.enqueue(new_item("/c", 10)).await.unwrap();
        let d = repo.enqueue(new_item("/d", 15)).await.unwrap();

        let ordered = repo.get_pending_ordered(100).await.unwrap();
        let ids: Vec<&str> = ordered.iter().map(|i| i.id.as_str()).collect();

        assert_eq!(ids, vec![b.id.as_str(), a.id.as_str(), c.id.as_str(), d.id.as_str()]);
    }

    #[tokio::test]
    async fn test_mark_delivered_removes_entry() {
        let db = test_db().await;
        let repo = db.queue();

        let item = repo.enqueue(new_item("/customers", 5)).await.unwrap();
        repo.mark_delivered(&item.id).await.unwrap();

        assert_eq!(repo.count_pending().await.unwrap(), 0);
        assert!(repo.all_pending(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_failed_increments_attempts() {
        let db = test_db().await;
        let repo = db.queue();

        let item = repo.enqueue(new_item("/customers", 5)).await.unwrap();
        repo.mark_failed(&item.id, "connection refused").await.unwrap();
        repo.mark_failed(&item.id, "timed out").await.unwrap();

        let pending = repo.all_pending(None).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].attempts, 2);
        assert_eq!(pending[0].last_error.as_deref(), Some("timed out"));
        assert!(pending[0].attempted_at.is_some());

        assert_eq!(repo.latest_error().await.unwrap().as_deref(), Some("timed out"));
    }

    #[tokio::test]
    async fn test_abandon_excludes_from_pending() {
        let db = test_db().await;
        let repo = db.queue();

        let item = repo.enqueue(new_item("/customers", 5)).await.unwrap();
        repo.abandon(&item.id, "422 validation failed").await.unwrap();

        assert_eq!(repo.count_pending().await.unwrap(), 0);
        assert_eq!(repo.count_abandoned().await.unwrap(), 1);
        assert!(repo.get_pending_ordered(100).await.unwrap().is_empty());

        let abandoned = repo.all_abandoned().await.unwrap();
        assert_eq!(abandoned.len(), 1);
        assert!(abandoned[0].is_abandoned());
        assert_eq!(abandoned[0].last_error.as_deref(), Some("422 validation failed"));
    }

    #[tokio::test]
    async fn test_entity_filter_and_counts() {
        let db = test_db().await;
        let repo = db.queue();

        repo.enqueue(new_item("/customers/1", 10)).await.unwrap();
        repo.enqueue(NewQueueItem {
            entity: Entity::WorkOrder,
            kind: MutationKind::Update,
            method: HttpMethod::Patch,
            url: "/work-orders/1".to_string(),
            payload: Some("{}".to_string()),
            priority: 10,
        })
        .await
        .unwrap();
        repo.enqueue(new_item("/customers/2", 10)).await.unwrap();

        let work_orders = repo.all_pending(Some(Entity::WorkOrder)).await.unwrap();
        assert_eq!(work_orders.len(), 1);
        assert_eq!(work_orders[0].entity, Entity::WorkOrder);

        let counts = repo.count_pending_by_entity().await.unwrap();
        let customers = counts.iter().find(|(e, _)| *e == Entity::Customer).unwrap();
        assert_eq!(customers.1, 2);
    }

    #[tokio::test]
    async fn test_purge_abandoned_respects_retention() {
        let db = test_db().await;
        let repo = db.queue();

        let item = repo.enqueue(new_item("/customers", 5)).await.unwrap();
        repo.abandon(&item.id, "404 gone").await.unwrap();

        // Freshly abandoned: a 30-day window keeps it
        assert_eq!(repo.purge_abandoned(30).await.unwrap(), 0);
        // Zero-day window removes it
        assert_eq!(repo.purge_abandoned(0).await.unwrap(), 1);
        assert_eq!(repo.count_abandoned().await.unwrap(), 0);
    }
}
