//! Database model for journal entries.

use diesel::prelude::*;

use daystack_core::journal::JournalEntry;
use daystack_core::Result;

use crate::codec::{enum_from_db, enum_to_db};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::journal_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct JournalEntryDB {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub content: String,
    pub mood: Option<String>,
    pub entry_date: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
    pub sync_status: String,
}

pub fn to_entry(row: JournalEntryDB) -> Result<JournalEntry> {
    Ok(JournalEntry {
        id: row.id,
        user_id: row.user_id,
        title: row.title,
        content: row.content,
        mood: row.mood,
        entry_date: row.entry_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
        deleted_at: row.deleted_at,
        sync_status: enum_from_db(&row.sync_status)?,
    })
}

pub fn entry_row(entry: &JournalEntry) -> Result<JournalEntryDB> {
    Ok(JournalEntryDB {
        id: entry.id.clone(),
        user_id: entry.user_id.clone(),
        title: entry.title.clone(),
        content: entry.content.clone(),
        mood: entry.mood.clone(),
        entry_date: entry.entry_date.clone(),
        created_at: entry.created_at.clone(),
        updated_at: entry.updated_at.clone(),
        deleted_at: entry.deleted_at.clone(),
        sync_status: enum_to_db(&entry.sync_status)?,
    })
}
