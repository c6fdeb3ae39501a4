//! Repository for the sync infrastructure tables and the generic row store
//! backing the sync engine.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use daystack_core::books::{Book, ReadingSession};
use daystack_core::errors::{DatabaseError, Error, Result};
use daystack_core::habits::Habit;
use daystack_core::journal::JournalEntry;
use daystack_core::sync::{
    remote_row_wins, OutboxEntry, OutboxStatus, SyncCollection, SyncEngineStatus, SyncOperation,
    SyncRow, SyncStatus, SyncStore,
};
use daystack_core::transactions::Transaction;

use crate::books::model::{book_row, session_row, to_book, to_session, BookDB, ReadingSessionDB};
use crate::codec::{enum_from_db, enum_to_db};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::habits::model::{habit_row, to_habit, HabitDB};
use crate::journal::model::{entry_row, to_entry, JournalEntryDB};
use crate::schema::{
    books, habits, journal_entries, reading_sessions, sync_engine_state, sync_outbox, transactions,
};
use crate::transactions::model::{to_transaction, transaction_row, TransactionDB};

use super::model::{NewOutboxEntryDB, OutboxEntryDB, SyncEngineStateDB};

/// Failed drains beyond this bound move an entry to dead-letter instead of
/// retrying forever.
pub const OUTBOX_MAX_RETRIES: i32 = 10;

#[derive(Debug, Clone)]
pub struct OutboxWriteRequest {
    pub collection: SyncCollection,
    pub operation: SyncOperation,
    pub entity_id: String,
    /// Full entity snapshot at mutation time.
    pub payload: serde_json::Value,
}

impl OutboxWriteRequest {
    pub fn new(
        collection: SyncCollection,
        entity_id: impl Into<String>,
        operation: SyncOperation,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            collection,
            operation,
            entity_id: entity_id.into(),
            payload,
        }
    }
}

/// Append one outbox row inside the caller's transaction. Repositories call
/// this alongside every entity mutation so the pair commits atomically.
pub fn write_outbox_event(conn: &mut SqliteConnection, request: OutboxWriteRequest) -> Result<()> {
    let row = NewOutboxEntryDB {
        store_name: request.collection.table_name().to_string(),
        operation: enum_to_db(&request.operation)?,
        entity_id: request.entity_id,
        payload: serde_json::to_string(&request.payload)?,
        created_at: Utc::now().to_rfc3339(),
        retry_count: 0,
        last_error: None,
        status: enum_to_db(&OutboxStatus::Pending)?,
    };

    diesel::insert_into(sync_outbox::table)
        .values(&row)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

fn to_outbox_entry(row: OutboxEntryDB) -> Result<OutboxEntry> {
    let collection = SyncCollection::from_table_name(&row.store_name).ok_or_else(|| {
        Error::Database(DatabaseError::Internal(format!(
            "Outbox entry {} references unknown store '{}'",
            row.id, row.store_name
        )))
    })?;
    Ok(OutboxEntry {
        id: row.id,
        collection,
        operation: enum_from_db(&row.operation)?,
        entity_id: row.entity_id,
        payload: row.payload,
        created_at: row.created_at,
        retry_count: row.retry_count,
        last_error: row.last_error,
        status: enum_from_db(&row.status)?,
    })
}

fn snapshot_to_row(snapshot: serde_json::Value) -> Result<SyncRow> {
    SyncRow::from_snapshot(snapshot).ok_or_else(|| {
        Error::Database(DatabaseError::Internal(
            "Entity snapshot is missing lifecycle fields".to_string(),
        ))
    })
}

fn export_collection(conn: &mut SqliteConnection, collection: SyncCollection) -> Result<Vec<SyncRow>> {
    let snapshots: Vec<serde_json::Value> = match collection {
        SyncCollection::Habit => habits::table
            .load::<HabitDB>(conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(|row| Ok(serde_json::to_value(to_habit(row)?)?))
            .collect::<Result<_>>()?,
        SyncCollection::JournalEntry => journal_entries::table
            .load::<JournalEntryDB>(conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(|row| Ok(serde_json::to_value(to_entry(row)?)?))
            .collect::<Result<_>>()?,
        SyncCollection::Transaction => transactions::table
            .load::<TransactionDB>(conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(|row| Ok(serde_json::to_value(to_transaction(row)?)?))
            .collect::<Result<_>>()?,
        SyncCollection::Book => books::table
            .load::<BookDB>(conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(|row| Ok(serde_json::to_value(to_book(row)?)?))
            .collect::<Result<_>>()?,
        SyncCollection::ReadingSession => reading_sessions::table
            .load::<ReadingSessionDB>(conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(|row| Ok(serde_json::to_value(to_session(row)?)?))
            .collect::<Result<_>>()?,
    };

    snapshots.into_iter().map(snapshot_to_row).collect()
}

fn local_updated_at(
    conn: &mut SqliteConnection,
    collection: SyncCollection,
    id: &str,
) -> Result<Option<String>> {
    let value = match collection {
        SyncCollection::Habit => habits::table
            .find(id)
            .select(habits::updated_at)
            .first::<String>(conn)
            .optional(),
        SyncCollection::JournalEntry => journal_entries::table
            .find(id)
            .select(journal_entries::updated_at)
            .first::<String>(conn)
            .optional(),
        SyncCollection::Transaction => transactions::table
            .find(id)
            .select(transactions::updated_at)
            .first::<String>(conn)
            .optional(),
        SyncCollection::Book => books::table
            .find(id)
            .select(books::updated_at)
            .first::<String>(conn)
            .optional(),
        SyncCollection::ReadingSession => reading_sessions::table
            .find(id)
            .select(reading_sessions::updated_at)
            .first::<String>(conn)
            .optional(),
    };
    Ok(value.map_err(StorageError::from)?)
}

/// Apply one remote row with last-write-wins inside a transaction. The row
/// overwrites local state only on a strictly newer `updated_at`; applied rows
/// land with `sync_status = synced`.
fn apply_remote_row_tx(
    conn: &mut SqliteConnection,
    collection: SyncCollection,
    row: SyncRow,
) -> Result<bool> {
    let wins = match local_updated_at(conn, collection, &row.id)? {
        Some(local_ts) => remote_row_wins(&local_ts, &row.updated_at),
        None => true,
    };
    if !wins {
        return Ok(false);
    }

    match collection {
        SyncCollection::Habit => {
            let mut habit: Habit = serde_json::from_value(row.payload)?;
            habit.sync_status = SyncStatus::Synced;
            let db_row = habit_row(&habit)?;
            diesel::insert_into(habits::table)
                .values(&db_row)
                .on_conflict(habits::id)
                .do_update()
                .set(&db_row)
                .execute(conn)
                .map_err(StorageError::from)?;
        }
        SyncCollection::JournalEntry => {
            let mut entry: JournalEntry = serde_json::from_value(row.payload)?;
            entry.sync_status = SyncStatus::Synced;
            let db_row = entry_row(&entry)?;
            diesel::insert_into(journal_entries::table)
                .values(&db_row)
                .on_conflict(journal_entries::id)
                .do_update()
                .set(&db_row)
                .execute(conn)
                .map_err(StorageError::from)?;
        }
        SyncCollection::Transaction => {
            let mut transaction: Transaction = serde_json::from_value(row.payload)?;
            transaction.sync_status = SyncStatus::Synced;
            let db_row = transaction_row(&transaction)?;
            diesel::insert_into(transactions::table)
                .values(&db_row)
                .on_conflict(transactions::id)
                .do_update()
                .set(&db_row)
                .execute(conn)
                .map_err(StorageError::from)?;
        }
        SyncCollection::Book => {
            let mut book: Book = serde_json::from_value(row.payload)?;
            book.sync_status = SyncStatus::Synced;
            let db_row = book_row(&book)?;
            diesel::insert_into(books::table)
                .values(&db_row)
                .on_conflict(books::id)
                .do_update()
                .set(&db_row)
                .execute(conn)
                .map_err(StorageError::from)?;
        }
        SyncCollection::ReadingSession => {
            let mut session: ReadingSession = serde_json::from_value(row.payload)?;
            session.sync_status = SyncStatus::Synced;
            let db_row = session_row(&session)?;
            diesel::insert_into(reading_sessions::table)
                .values(&db_row)
                .on_conflict(reading_sessions::id)
                .do_update()
                .set(&db_row)
                .execute(conn)
                .map_err(StorageError::from)?;
        }
    }

    Ok(true)
}

fn mark_collection_synced(
    conn: &mut SqliteConnection,
    collection: SyncCollection,
    ids: &[String],
) -> Result<()> {
    let synced = enum_to_db(&SyncStatus::Synced)?;
    let affected = match collection {
        SyncCollection::Habit => {
            diesel::update(habits::table.filter(habits::id.eq_any(ids)))
                .set(habits::sync_status.eq(&synced))
                .execute(conn)
        }
        SyncCollection::JournalEntry => {
            diesel::update(journal_entries::table.filter(journal_entries::id.eq_any(ids)))
                .set(journal_entries::sync_status.eq(&synced))
                .execute(conn)
        }
        SyncCollection::Transaction => {
            diesel::update(transactions::table.filter(transactions::id.eq_any(ids)))
                .set(transactions::sync_status.eq(&synced))
                .execute(conn)
        }
        SyncCollection::Book => {
            diesel::update(books::table.filter(books::id.eq_any(ids)))
                .set(books::sync_status.eq(&synced))
                .execute(conn)
        }
        SyncCollection::ReadingSession => {
            diesel::update(reading_sessions::table.filter(reading_sessions::id.eq_any(ids)))
                .set(reading_sessions::sync_status.eq(&synced))
                .execute(conn)
        }
    };
    affected.map_err(StorageError::from)?;
    Ok(())
}

pub struct SyncRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SyncStore for SyncRepository {
    async fn export_rows(&self, collection: SyncCollection) -> Result<Vec<SyncRow>> {
        let mut conn = get_connection(&self.pool)?;
        export_collection(&mut conn, collection)
    }

    async fn apply_remote_row(&self, collection: SyncCollection, row: SyncRow) -> Result<bool> {
        self.writer
            .exec(move |conn| apply_remote_row_tx(conn, collection, row))
            .await
    }

    async fn mark_rows_synced(&self, collection: SyncCollection, ids: Vec<String>) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.writer
            .exec(move |conn| mark_collection_synced(conn, collection, &ids))
            .await
    }

    async fn list_pending_outbox(&self, limit: i64) -> Result<Vec<OutboxEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = sync_outbox::table
            .filter(sync_outbox::status.eq(enum_to_db(&OutboxStatus::Pending)?))
            .order(sync_outbox::id.asc())
            .limit(limit)
            .load::<OutboxEntryDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(to_outbox_entry).collect()
    }

    async fn remove_outbox_entry(&self, entry_id: i64) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::delete(sync_outbox::table.find(entry_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn record_outbox_failure(&self, entry_id: i64, error: &str) -> Result<()> {
        let message = error.to_string();
        self.writer
            .exec(move |conn| {
                let row = sync_outbox::table
                    .find(entry_id)
                    .first::<OutboxEntryDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                let Some(row) = row else {
                    return Ok(());
                };

                let retry_count = row.retry_count + 1;
                let status = if retry_count >= OUTBOX_MAX_RETRIES {
                    OutboxStatus::Dead
                } else {
                    OutboxStatus::Pending
                };
                diesel::update(sync_outbox::table.find(entry_id))
                    .set((
                        sync_outbox::retry_count.eq(retry_count),
                        sync_outbox::last_error.eq(Some(message.clone())),
                        sync_outbox::status.eq(enum_to_db(&status)?),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn mark_outbox_dead(&self, entry_id: i64, error: &str) -> Result<()> {
        let message = error.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(sync_outbox::table.find(entry_id))
                    .set((
                        sync_outbox::last_error.eq(Some(message)),
                        sync_outbox::status.eq(enum_to_db(&OutboxStatus::Dead)?),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn pending_outbox_count(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let count = sync_outbox::table
            .filter(sync_outbox::status.eq(enum_to_db(&OutboxStatus::Pending)?))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count)
    }

    async fn mark_sync_completed(&self) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                diesel::insert_into(sync_engine_state::table)
                    .values(SyncEngineStateDB {
                        id: 1,
                        last_push_at: Some(now.clone()),
                        last_pull_at: Some(now.clone()),
                        last_error: None,
                        consecutive_failures: 0,
                    })
                    .on_conflict(sync_engine_state::id)
                    .do_update()
                    .set((
                        sync_engine_state::last_push_at.eq(Some(now.clone())),
                        sync_engine_state::last_pull_at.eq(Some(now)),
                        sync_engine_state::last_error.eq::<Option<String>>(None),
                        sync_engine_state::consecutive_failures.eq(0),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn mark_sync_error(&self, message: &str) -> Result<()> {
        let message = message.to_string();
        self.writer
            .exec(move |conn| {
                diesel::insert_into(sync_engine_state::table)
                    .values(SyncEngineStateDB {
                        id: 1,
                        last_push_at: None,
                        last_pull_at: None,
                        last_error: Some(message.clone()),
                        consecutive_failures: 1,
                    })
                    .on_conflict(sync_engine_state::id)
                    .do_update()
                    .set((
                        sync_engine_state::last_error.eq(Some(message)),
                        sync_engine_state::consecutive_failures
                            .eq(sync_engine_state::consecutive_failures + 1),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn engine_status(&self) -> Result<SyncEngineStatus> {
        let mut conn = get_connection(&self.pool)?;
        let state = sync_engine_state::table
            .find(1)
            .first::<SyncEngineStateDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        Ok(SyncEngineStatus {
            last_push_at: state.as_ref().and_then(|s| s.last_push_at.clone()),
            last_pull_at: state.as_ref().and_then(|s| s.last_pull_at.clone()),
            last_error: state.as_ref().and_then(|s| s.last_error.clone()),
            consecutive_failures: state.map(|s| s.consecutive_failures).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use daystack_core::habits::{HabitRepositoryTrait, NewHabit};

    use super::*;
    use crate::db::{create_pool, init, run_migrations, spawn_writer};
    use crate::habits::HabitRepository;

    fn setup_db() -> (Arc<DbPool>, WriteHandle) {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        run_migrations(&db_path).expect("migrate db");
        let pool = create_pool(&db_path).expect("create pool");
        let writer = spawn_writer(pool.as_ref().clone());
        (pool, writer)
    }

    fn sync_repo(pool: &Arc<DbPool>, writer: &WriteHandle) -> SyncRepository {
        SyncRepository::new(pool.clone(), writer.clone())
    }

    async fn seed_habit(pool: &Arc<DbPool>, writer: &WriteHandle, name: &str) -> Habit {
        let repo = HabitRepository::new(pool.clone(), writer.clone());
        repo.create_habit(NewHabit {
            name: name.to_string(),
            icon: None,
            color: None,
            target_days: 7,
            reminder_time: None,
        })
        .await
        .expect("create habit")
    }

    fn habit_snapshot(id: &str, name: &str, updated_at: &str) -> SyncRow {
        let payload = serde_json::json!({
            "id": id,
            "userId": "user-1",
            "name": name,
            "icon": null,
            "color": null,
            "targetDays": 7,
            "streakCurrent": 3,
            "streakBest": 5,
            "reminderTime": null,
            "createdAt": "2026-01-01T00:00:00+00:00",
            "updatedAt": updated_at,
            "deletedAt": null,
            "syncStatus": "dirty"
        });
        SyncRow::from_snapshot(payload).expect("snapshot row")
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        run_migrations(&db_path).expect("first run");
        run_migrations(&db_path).expect("second run");
    }

    #[tokio::test]
    async fn outbox_entries_drain_in_fifo_order() {
        let (pool, writer) = setup_db();
        let repo = sync_repo(&pool, &writer);
        seed_habit(&pool, &writer, "first").await;
        seed_habit(&pool, &writer, "second").await;

        let pending = repo.list_pending_outbox(10).await.expect("pending");
        assert_eq!(pending.len(), 2);
        assert!(pending[0].id < pending[1].id);
        assert_eq!(pending[0].operation, SyncOperation::Create);
        assert_eq!(repo.pending_outbox_count().await.expect("count"), 2);
    }

    #[tokio::test]
    async fn remove_outbox_entry_clears_acknowledged_rows() {
        let (pool, writer) = setup_db();
        let repo = sync_repo(&pool, &writer);
        seed_habit(&pool, &writer, "only").await;

        let pending = repo.list_pending_outbox(10).await.expect("pending");
        repo.remove_outbox_entry(pending[0].id).await.expect("remove");
        assert_eq!(repo.pending_outbox_count().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn repeated_failures_dead_letter_the_entry() {
        let (pool, writer) = setup_db();
        let repo = sync_repo(&pool, &writer);
        seed_habit(&pool, &writer, "poison").await;
        let entry_id = repo.list_pending_outbox(10).await.expect("pending")[0].id;

        for _ in 0..(OUTBOX_MAX_RETRIES - 1) {
            repo.record_outbox_failure(entry_id, "remote rejected")
                .await
                .expect("record failure");
        }
        let pending = repo.list_pending_outbox(10).await.expect("pending");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].retry_count, OUTBOX_MAX_RETRIES - 1);
        assert_eq!(pending[0].last_error.as_deref(), Some("remote rejected"));

        repo.record_outbox_failure(entry_id, "remote rejected")
            .await
            .expect("final failure");
        assert!(repo.list_pending_outbox(10).await.expect("pending").is_empty());
        assert_eq!(repo.pending_outbox_count().await.expect("count"), 0);

        // The dead row is retained for inspection, not deleted.
        let mut conn = get_connection(&pool).expect("conn");
        let dead = sync_outbox::table
            .find(entry_id)
            .first::<OutboxEntryDB>(&mut conn)
            .expect("dead row");
        assert_eq!(dead.status, "dead");
    }

    #[tokio::test]
    async fn permanent_failures_skip_the_retry_budget() {
        let (pool, writer) = setup_db();
        let repo = sync_repo(&pool, &writer);
        seed_habit(&pool, &writer, "rejected").await;
        let entry_id = repo.list_pending_outbox(10).await.expect("pending")[0].id;

        repo.mark_outbox_dead(entry_id, "payload rejected")
            .await
            .expect("mark dead");

        assert!(repo.list_pending_outbox(10).await.expect("pending").is_empty());
        assert_eq!(repo.pending_outbox_count().await.expect("count"), 0);

        let mut conn = get_connection(&pool).expect("conn");
        let dead = sync_outbox::table
            .find(entry_id)
            .first::<OutboxEntryDB>(&mut conn)
            .expect("dead row");
        assert_eq!(dead.status, "dead");
        assert_eq!(dead.retry_count, 0);
        assert_eq!(dead.last_error.as_deref(), Some("payload rejected"));
    }

    #[tokio::test]
    async fn export_rows_includes_soft_deleted_entities() {
        let (pool, writer) = setup_db();
        let repo = sync_repo(&pool, &writer);
        let habit_repo = HabitRepository::new(pool.clone(), writer.clone());
        let habit = seed_habit(&pool, &writer, "to delete").await;
        habit_repo.delete_habit(&habit.id).await.expect("delete");

        let rows = repo.export_rows(SyncCollection::Habit).await.expect("export");
        assert_eq!(rows.len(), 1);
        assert!(rows[0].deleted_at.is_some());
    }

    #[tokio::test]
    async fn apply_remote_row_overwrites_only_strictly_newer() {
        let (pool, writer) = setup_db();
        let repo = sync_repo(&pool, &writer);
        let habit = seed_habit(&pool, &writer, "local name").await;

        // Older remote row: local preserved.
        let stale = habit_snapshot(&habit.id, "stale name", "2020-01-01T00:00:00+00:00");
        assert!(!repo
            .apply_remote_row(SyncCollection::Habit, stale)
            .await
            .expect("apply"));

        // Equal timestamp: local preserved.
        let tied = habit_snapshot(&habit.id, "tied name", &habit.updated_at);
        assert!(!repo
            .apply_remote_row(SyncCollection::Habit, tied)
            .await
            .expect("apply"));

        // Strictly newer: overwrites and lands synced.
        let newer = habit_snapshot(&habit.id, "remote name", "2099-01-01T00:00:00+00:00");
        assert!(repo
            .apply_remote_row(SyncCollection::Habit, newer)
            .await
            .expect("apply"));

        let habit_repo = HabitRepository::new(pool.clone(), writer.clone());
        let stored = habit_repo.get_habit(&habit.id).expect("get");
        assert_eq!(stored.name, "remote name");
        assert_eq!(stored.sync_status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn apply_remote_row_inserts_unknown_entities() {
        let (pool, writer) = setup_db();
        let repo = sync_repo(&pool, &writer);

        let row = habit_snapshot("h-remote", "from remote", "2026-02-02T00:00:00+00:00");
        assert!(repo
            .apply_remote_row(SyncCollection::Habit, row)
            .await
            .expect("apply"));

        let habit_repo = HabitRepository::new(pool.clone(), writer.clone());
        let stored = habit_repo.get_habit("h-remote").expect("get");
        assert_eq!(stored.sync_status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn mark_rows_synced_clears_dirtiness() {
        let (pool, writer) = setup_db();
        let repo = sync_repo(&pool, &writer);
        let habit = seed_habit(&pool, &writer, "dirty").await;
        assert_eq!(habit.sync_status, SyncStatus::Dirty);

        repo.mark_rows_synced(SyncCollection::Habit, vec![habit.id.clone()])
            .await
            .expect("mark synced");

        let habit_repo = HabitRepository::new(pool.clone(), writer.clone());
        assert_eq!(
            habit_repo.get_habit(&habit.id).expect("get").sync_status,
            SyncStatus::Synced
        );
    }

    #[tokio::test]
    async fn engine_state_tracks_errors_and_recovery() {
        let (pool, writer) = setup_db();
        let repo = sync_repo(&pool, &writer);

        repo.mark_sync_error("network down").await.expect("error");
        repo.mark_sync_error("still down").await.expect("error");
        let status = repo.engine_status().await.expect("status");
        assert_eq!(status.consecutive_failures, 2);
        assert_eq!(status.last_error.as_deref(), Some("still down"));

        repo.mark_sync_completed().await.expect("completed");
        let status = repo.engine_status().await.expect("status");
        assert_eq!(status.consecutive_failures, 0);
        assert!(status.last_error.is_none());
        assert!(status.last_push_at.is_some());
        assert!(status.last_pull_at.is_some());
    }
}
