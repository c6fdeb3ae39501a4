//! Sync engine: outbox drain, full-table push, and last-write-wins pull.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::errors::Result;
use crate::sync::model::{
    AuthProvider, RemoteRetryClass, RemoteStore, RemoteStoreError, SyncCollection, SyncReport,
    SyncRow, SyncRunStatus, SyncStore,
};

/// Upper bound on outbox entries drained per run.
const OUTBOX_DRAIN_BATCH: i64 = 500;

/// Reconciles the local store with the remote store.
///
/// Push uploads every local row of each collection (not only outbox deltas);
/// simple but not bandwidth-efficient, and kept as the documented behavior.
/// The outbox drain that precedes it is the ordering-correct path for
/// per-entity mutation sequences.
pub struct SyncEngine {
    store: Arc<dyn SyncStore>,
    remote: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthProvider>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn SyncStore>,
        remote: Arc<dyn RemoteStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            store,
            remote,
            auth,
        }
    }

    /// Run a full sync: drain the outbox, push every collection, then pull
    /// every collection, in that order.
    ///
    /// Connectivity failures come back as a `SyncReport` status, never as an
    /// error; the outer `Result` is reserved for local storage failures.
    pub async fn sync_all(&self) -> Result<SyncReport> {
        if !self.auth.is_configured() {
            debug!("[Sync] Remote backend not configured; staying local-only");
            return Ok(SyncReport::skipped(
                SyncRunStatus::NotConfigured,
                "Remote backend not configured",
            ));
        }
        let user_id = match self.auth.current_user_id() {
            Some(value) => value,
            None => {
                debug!("[Sync] No authenticated user; staying local-only");
                return Ok(SyncReport::skipped(
                    SyncRunStatus::NotAuthenticated,
                    "No authenticated user",
                ));
            }
        };

        let drained_count = match self.drain_outbox(&user_id).await? {
            Ok(count) => count,
            Err(err) => return self.fail(SyncRunStatus::PushFailed, err).await,
        };

        let mut pushed_count = 0usize;
        for collection in SyncCollection::ALL {
            match self.push_collection(&user_id, collection).await? {
                Ok(count) => pushed_count += count,
                // Abort the whole push on the first remote error.
                Err(err) => return self.fail(SyncRunStatus::PushFailed, err).await,
            }
        }

        let mut pulled_count = 0usize;
        for collection in SyncCollection::ALL {
            match self.pull_collection(&user_id, collection).await? {
                Ok(count) => pulled_count += count,
                Err(err) => return self.fail(SyncRunStatus::PullFailed, err).await,
            }
        }

        self.store.mark_sync_completed().await?;
        info!(
            "[Sync] Completed: drained={} pushed={} pulled={}",
            drained_count, pushed_count, pulled_count
        );
        Ok(SyncReport {
            status: SyncRunStatus::Ok,
            drained_count,
            pushed_count,
            pulled_count,
            error: None,
        })
    }

    /// Cheap pending-mutation count for UI indicators.
    pub async fn pending_count(&self) -> Result<i64> {
        self.store.pending_outbox_count().await
    }

    async fn fail(&self, status: SyncRunStatus, err: RemoteStoreError) -> Result<SyncReport> {
        warn!("[Sync] Run failed ({:?}): {}", status, err);
        self.store.mark_sync_error(&err.message).await?;
        Ok(SyncReport {
            status,
            drained_count: 0,
            pushed_count: 0,
            pulled_count: 0,
            error: Some(err.message),
        })
    }

    /// Apply queued mutations to the remote in FIFO order. The drain halts on
    /// the first failure so later operations on the same entity never
    /// overtake earlier ones. Retryable and reauth failures leave the entry
    /// queued with its error recorded; permanent failures dead-letter it
    /// immediately, since retrying can never fix them.
    async fn drain_outbox(
        &self,
        user_id: &str,
    ) -> Result<std::result::Result<usize, RemoteStoreError>> {
        let pending = self.store.list_pending_outbox(OUTBOX_DRAIN_BATCH).await?;
        let mut drained = 0usize;

        for entry in pending {
            let snapshot: serde_json::Value = match serde_json::from_str(&entry.payload) {
                Ok(value) => value,
                Err(err) => {
                    // A snapshot that no longer parses will never apply.
                    self.store
                        .mark_outbox_dead(entry.id, &format!("Malformed snapshot: {}", err))
                        .await?;
                    return Ok(Err(RemoteStoreError {
                        message: format!("Outbox entry {} has a malformed snapshot", entry.id),
                        retry_class: RemoteRetryClass::Permanent,
                    }));
                }
            };
            let row = match SyncRow::from_snapshot(snapshot) {
                Some(row) => row,
                None => {
                    self.store
                        .mark_outbox_dead(entry.id, "Snapshot is missing lifecycle fields")
                        .await?;
                    return Ok(Err(RemoteStoreError {
                        message: format!("Outbox entry {} is missing lifecycle fields", entry.id),
                        retry_class: RemoteRetryClass::Permanent,
                    }));
                }
            };

            // Deletes travel as upserts of the soft-deleted snapshot; the
            // remote mirrors the local deleted_at convention.
            match self
                .remote
                .upsert_rows(user_id, entry.collection, vec![row])
                .await
            {
                Ok(()) => {
                    self.store.remove_outbox_entry(entry.id).await?;
                    drained += 1;
                }
                Err(err) => {
                    match err.retry_class {
                        RemoteRetryClass::Permanent => {
                            self.store.mark_outbox_dead(entry.id, &err.message).await?;
                        }
                        RemoteRetryClass::Retryable | RemoteRetryClass::ReauthRequired => {
                            self.store
                                .record_outbox_failure(entry.id, &err.message)
                                .await?;
                        }
                    }
                    return Ok(Err(err));
                }
            }
        }

        Ok(Ok(drained))
    }

    async fn push_collection(
        &self,
        user_id: &str,
        collection: SyncCollection,
    ) -> Result<std::result::Result<usize, RemoteStoreError>> {
        let rows = self.store.export_rows(collection).await?;
        if rows.is_empty() {
            return Ok(Ok(0));
        }

        let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
        let count = rows.len();
        debug!(
            "[Sync] Pushing {} rows from '{}'",
            count,
            collection.table_name()
        );
        if let Err(err) = self.remote.upsert_rows(user_id, collection, rows).await {
            return Ok(Err(err));
        }
        self.store.mark_rows_synced(collection, ids).await?;
        Ok(Ok(count))
    }

    async fn pull_collection(
        &self,
        user_id: &str,
        collection: SyncCollection,
    ) -> Result<std::result::Result<usize, RemoteStoreError>> {
        let remote_rows = match self.remote.fetch_rows(user_id, collection).await {
            Ok(rows) => rows,
            Err(err) => return Ok(Err(err)),
        };

        let mut applied = 0usize;
        for row in remote_rows {
            if self.store.apply_remote_row(collection, row).await? {
                applied += 1;
            }
        }
        debug!(
            "[Sync] Pulled '{}': {} rows applied",
            collection.table_name(),
            applied
        );
        Ok(Ok(applied))
    }
}
