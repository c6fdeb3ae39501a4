//! SQLite repository for journal entries.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use uuid::Uuid;

use daystack_core::errors::{Error, Result};
use daystack_core::journal::{
    JournalEntry, JournalEntryUpdate, JournalRepositoryTrait, NewJournalEntry,
};
use daystack_core::sync::{SyncCollection, SyncOperation, SyncStatus};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::journal_entries;
use crate::sync::{write_outbox_event, OutboxWriteRequest};

use super::model::{entry_row, to_entry, JournalEntryDB};

pub struct JournalRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl JournalRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        JournalRepository { pool, writer }
    }
}

fn upsert_entry(conn: &mut SqliteConnection, entry: &JournalEntry) -> Result<()> {
    let row = entry_row(entry)?;
    diesel::insert_into(journal_entries::table)
        .values(&row)
        .on_conflict(journal_entries::id)
        .do_update()
        .set(&row)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

#[async_trait]
impl JournalRepositoryTrait for JournalRepository {
    fn get_all_entries(&self) -> Result<Vec<JournalEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = journal_entries::table
            .filter(journal_entries::deleted_at.is_null())
            .order(journal_entries::created_at.desc())
            .load::<JournalEntryDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(to_entry).collect()
    }

    fn get_entry(&self, entry_id: &str) -> Result<JournalEntry> {
        let mut conn = get_connection(&self.pool)?;
        let row = journal_entries::table
            .find(entry_id)
            .first::<JournalEntryDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(to_entry)
            .transpose()?
            .ok_or_else(|| Error::not_found("journal entry", entry_id))
    }

    fn get_entries_for_date(&self, entry_date: &str) -> Result<Vec<JournalEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = journal_entries::table
            .filter(journal_entries::entry_date.eq(entry_date))
            .filter(journal_entries::deleted_at.is_null())
            .order(journal_entries::created_at.desc())
            .load::<JournalEntryDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(to_entry).collect()
    }

    async fn create_entry(&self, new_entry: NewJournalEntry) -> Result<JournalEntry> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let entry = JournalEntry {
                    id: Uuid::new_v4().to_string(),
                    user_id: None,
                    title: new_entry.title,
                    content: new_entry.content,
                    mood: new_entry.mood,
                    entry_date: new_entry.entry_date,
                    created_at: now.clone(),
                    updated_at: now,
                    deleted_at: None,
                    sync_status: SyncStatus::Dirty,
                };

                diesel::insert_into(journal_entries::table)
                    .values(&entry_row(&entry)?)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                write_outbox_event(
                    conn,
                    OutboxWriteRequest::new(
                        SyncCollection::JournalEntry,
                        entry.id.clone(),
                        SyncOperation::Create,
                        serde_json::to_value(&entry)?,
                    ),
                )?;
                Ok(entry)
            })
            .await
    }

    async fn update_entry(
        &self,
        entry_id: &str,
        update: JournalEntryUpdate,
    ) -> Result<JournalEntry> {
        let entry_id = entry_id.to_string();
        self.writer
            .exec(move |conn| {
                let row = journal_entries::table
                    .find(&entry_id)
                    .first::<JournalEntryDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| Error::not_found("journal entry", &entry_id))?;
                let mut entry = to_entry(row)?;

                if let Some(title) = update.title {
                    entry.title = title;
                }
                if let Some(content) = update.content {
                    entry.content = content;
                }
                if let Some(mood) = update.mood {
                    entry.mood = mood;
                }
                if let Some(entry_date) = update.entry_date {
                    entry.entry_date = entry_date;
                }
                entry.updated_at = Utc::now().to_rfc3339();
                entry.sync_status = SyncStatus::Dirty;

                upsert_entry(conn, &entry)?;
                write_outbox_event(
                    conn,
                    OutboxWriteRequest::new(
                        SyncCollection::JournalEntry,
                        entry.id.clone(),
                        SyncOperation::Update,
                        serde_json::to_value(&entry)?,
                    ),
                )?;
                Ok(entry)
            })
            .await
    }

    async fn delete_entry(&self, entry_id: &str) -> Result<JournalEntry> {
        let entry_id = entry_id.to_string();
        self.writer
            .exec(move |conn| {
                let row = journal_entries::table
                    .find(&entry_id)
                    .first::<JournalEntryDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| Error::not_found("journal entry", &entry_id))?;
                let mut entry = to_entry(row)?;

                let now = Utc::now().to_rfc3339();
                entry.deleted_at = Some(now.clone());
                entry.updated_at = now;
                entry.sync_status = SyncStatus::Dirty;

                upsert_entry(conn, &entry)?;
                write_outbox_event(
                    conn,
                    OutboxWriteRequest::new(
                        SyncCollection::JournalEntry,
                        entry.id.clone(),
                        SyncOperation::Delete,
                        serde_json::to_value(&entry)?,
                    ),
                )?;
                Ok(entry)
            })
            .await
    }
}
