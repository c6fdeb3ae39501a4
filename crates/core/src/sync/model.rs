//! Sync domain models and the contracts between storage, remote, and engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Canonical list of local tables that participate in sync.
pub const SYNC_COLLECTIONS: [&str; 5] = [
    "habits",
    "journal_entries",
    "transactions",
    "books",
    "reading_sessions",
];

/// Collections synchronized between the local store and the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCollection {
    Habit,
    JournalEntry,
    Transaction,
    Book,
    ReadingSession,
}

impl SyncCollection {
    /// All syncable collections, in sync order.
    pub const ALL: [SyncCollection; 5] = [
        SyncCollection::Habit,
        SyncCollection::JournalEntry,
        SyncCollection::Transaction,
        SyncCollection::Book,
        SyncCollection::ReadingSession,
    ];

    /// Local table backing this collection.
    pub fn table_name(&self) -> &'static str {
        match self {
            SyncCollection::Habit => "habits",
            SyncCollection::JournalEntry => "journal_entries",
            SyncCollection::Transaction => "transactions",
            SyncCollection::Book => "books",
            SyncCollection::ReadingSession => "reading_sessions",
        }
    }

    /// Resolve a collection from its table name.
    pub fn from_table_name(name: &str) -> Option<SyncCollection> {
        SyncCollection::ALL
            .into_iter()
            .find(|c| c.table_name() == name)
    }
}

/// Supported mutation kinds recorded in the outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
}

/// Per-record divergence marker between local and last-confirmed remote state.
///
/// `Pending` is accepted on read for compatibility with rows written by older
/// clients; new writes use `Dirty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Dirty,
    Pending,
    Synced,
}

impl SyncStatus {
    /// True when local state has diverged from the last confirmed remote state.
    pub fn is_dirty(&self) -> bool {
        !matches!(self, SyncStatus::Synced)
    }
}

/// Outbox entry lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    Pending,
    Dead,
}

/// A pending mutation queued for remote application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    pub id: i64,
    pub collection: SyncCollection,
    pub operation: SyncOperation,
    pub entity_id: String,
    /// Full entity snapshot at mutation time, as JSON.
    pub payload: String,
    pub created_at: String,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub status: OutboxStatus,
}

/// A full entity snapshot exchanged with the remote store.
///
/// The remote schema mirrors the local entity shape field-for-field; `id`,
/// `updated_at` and `deleted_at` are lifted out of the payload so the
/// last-write-wins comparison never has to parse domain fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRow {
    pub id: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
    pub payload: serde_json::Value,
}

impl SyncRow {
    /// Build a row from an entity snapshot that carries `id`/`updatedAt`/
    /// `deletedAt` fields, as every daystack entity does.
    pub fn from_snapshot(payload: serde_json::Value) -> Option<SyncRow> {
        let obj = payload.as_object()?;
        let id = obj.get("id")?.as_str()?.to_string();
        let updated_at = obj.get("updatedAt")?.as_str()?.to_string();
        let deleted_at = obj
            .get("deletedAt")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        Some(SyncRow {
            id,
            updated_at,
            deleted_at,
            payload,
        })
    }
}

/// Last-sync bookkeeping surfaced to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEngineStatus {
    pub last_push_at: Option<String>,
    pub last_pull_at: Option<String>,
    pub last_error: Option<String>,
    pub consecutive_failures: i32,
}

/// Outcome classification for a full sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    Ok,
    NotConfigured,
    NotAuthenticated,
    PushFailed,
    PullFailed,
}

/// Structured result of a full sync. Connectivity failures are represented
/// here as data; the engine never throws across the sync boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub status: SyncRunStatus,
    pub drained_count: usize,
    pub pushed_count: usize,
    pub pulled_count: usize,
    pub error: Option<String>,
}

impl SyncReport {
    /// True only when every push and pull step succeeded.
    pub fn success(&self) -> bool {
        self.status == SyncRunStatus::Ok
    }

    pub(crate) fn skipped(status: SyncRunStatus, message: &str) -> SyncReport {
        SyncReport {
            status,
            drained_count: 0,
            pushed_count: 0,
            pulled_count: 0,
            error: Some(message.to_string()),
        }
    }
}

/// Determines whether a pulled remote row should overwrite local state.
///
/// Rule: the remote wins only on a strictly newer `updated_at`. Equal
/// timestamps preserve local state.
pub fn remote_row_wins(local_updated_at: &str, remote_updated_at: &str) -> bool {
    let local_parsed =
        chrono::DateTime::parse_from_rfc3339(local_updated_at).map(|dt| dt.timestamp_millis());
    let remote_parsed =
        chrono::DateTime::parse_from_rfc3339(remote_updated_at).map(|dt| dt.timestamp_millis());

    if let (Ok(local_ts), Ok(remote_ts)) = (local_parsed, remote_parsed) {
        return remote_ts > local_ts;
    }

    // Fallback to lexical ordering when one/both timestamps are non-RFC3339.
    remote_updated_at > local_updated_at
}

/// Retry policy classification for remote store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteRetryClass {
    Retryable,
    Permanent,
    ReauthRequired,
}

/// Remote store failure carried back to the engine as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStoreError {
    pub message: String,
    pub retry_class: RemoteRetryClass,
}

impl std::fmt::Display for RemoteStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RemoteStoreError {}

/// Local-store contract the sync engine drives. Implemented by the SQLite
/// storage crate; tests substitute in-memory fakes.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Full-table export of a collection, soft-deleted rows included so
    /// deletions propagate.
    async fn export_rows(&self, collection: SyncCollection) -> Result<Vec<SyncRow>>;

    /// Apply one remote row with last-write-wins. Returns true when the row
    /// overwrote local state (applied rows land with `sync_status = synced`).
    async fn apply_remote_row(&self, collection: SyncCollection, row: SyncRow) -> Result<bool>;

    /// Mark rows as confirmed synced after a successful push.
    async fn mark_rows_synced(&self, collection: SyncCollection, ids: Vec<String>) -> Result<()>;

    /// Pending outbox entries in FIFO order, dead entries excluded.
    async fn list_pending_outbox(&self, limit: i64) -> Result<Vec<OutboxEntry>>;

    /// Remove an entry after the remote confirmed its operation.
    async fn remove_outbox_entry(&self, entry_id: i64) -> Result<()>;

    /// Record a failed drain attempt for an error worth retrying; bounded
    /// retries move the entry to dead.
    async fn record_outbox_failure(&self, entry_id: i64, error: &str) -> Result<()>;

    /// Move an entry straight to dead-letter; used for failures that retrying
    /// can never fix. The row is kept for inspection, not deleted.
    async fn mark_outbox_dead(&self, entry_id: i64, error: &str) -> Result<()>;

    /// Cheap pending-entry count for UI indicators.
    async fn pending_outbox_count(&self) -> Result<i64>;

    /// Record a fully successful sync run.
    async fn mark_sync_completed(&self) -> Result<()>;

    /// Record a failed sync run without losing prior bookkeeping.
    async fn mark_sync_error(&self, message: &str) -> Result<()>;

    /// Current engine bookkeeping.
    async fn engine_status(&self) -> Result<SyncEngineStatus>;
}

/// Remote row-level, user-scoped upsert/select interface. Consumed only by
/// the sync engine's push/pull.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn upsert_rows(
        &self,
        user_id: &str,
        collection: SyncCollection,
        rows: Vec<SyncRow>,
    ) -> std::result::Result<(), RemoteStoreError>;

    async fn fetch_rows(
        &self,
        user_id: &str,
        collection: SyncCollection,
    ) -> std::result::Result<Vec<SyncRow>, RemoteStoreError>;
}

/// Current-user identity gate for sync. Absence of an identity is a normal
/// local-only condition, not an error.
pub trait AuthProvider: Send + Sync {
    /// Whether a remote backend is configured at all.
    fn is_configured(&self) -> bool;

    /// Resolved remote user id, when authenticated.
    fn current_user_id(&self) -> Option<String>;

    /// Bearer token for remote store calls, when authenticated.
    fn access_token(&self) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lww_newer_remote_timestamp_wins() {
        assert!(remote_row_wins(
            "2026-01-01T00:00:00.000Z",
            "2026-01-01T00:00:01.000Z"
        ));
    }

    #[test]
    fn lww_equal_timestamps_preserve_local() {
        assert!(!remote_row_wins(
            "2026-01-01T00:00:00.000Z",
            "2026-01-01T00:00:00.000Z"
        ));
    }

    #[test]
    fn lww_older_remote_loses() {
        assert!(!remote_row_wins(
            "2026-01-01T00:00:01.000Z",
            "2026-01-01T00:00:00.000Z"
        ));
    }

    #[test]
    fn lww_uses_timestamp_value_not_lexical_format() {
        // Local 02:00+02:00 is midnight UTC; the remote 01:30Z is ninety
        // minutes newer even though it sorts lower as a string.
        assert!(remote_row_wins(
            "2026-01-01T02:00:00+02:00",
            "2026-01-01T01:30:00Z"
        ));
    }

    #[test]
    fn sync_collection_serialization_matches_table_names() {
        for collection in SyncCollection::ALL {
            let serialized = serde_json::to_string(&collection).expect("serialize collection");
            assert!(SYNC_COLLECTIONS.contains(&collection.table_name()));
            assert_eq!(
                SyncCollection::from_table_name(collection.table_name()),
                Some(collection),
                "round-trip for {}",
                serialized
            );
        }
    }

    #[test]
    fn sync_row_from_snapshot_lifts_lifecycle_fields() {
        let payload = serde_json::json!({
            "id": "b-1",
            "updatedAt": "2026-02-01T10:00:00Z",
            "deletedAt": null,
            "title": "Dune"
        });
        let row = SyncRow::from_snapshot(payload).expect("row");
        assert_eq!(row.id, "b-1");
        assert_eq!(row.updated_at, "2026-02-01T10:00:00Z");
        assert_eq!(row.deleted_at, None);
    }

    #[test]
    fn sync_row_from_snapshot_requires_id_and_updated_at() {
        assert!(SyncRow::from_snapshot(serde_json::json!({ "id": "x" })).is_none());
        assert!(SyncRow::from_snapshot(serde_json::json!("not an object")).is_none());
    }
}
