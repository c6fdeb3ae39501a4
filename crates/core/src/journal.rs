//! Journal domain models and repository contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::sync::SyncStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub content: String,
    pub mood: Option<String>,
    /// Calendar day the entry belongs to, "YYYY-MM-DD".
    pub entry_date: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
    pub sync_status: SyncStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJournalEntry {
    pub title: String,
    pub content: String,
    pub mood: Option<String>,
    pub entry_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntryUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub mood: Option<Option<String>>,
    pub entry_date: Option<String>,
}

#[async_trait]
pub trait JournalRepositoryTrait: Send + Sync {
    /// Entries visible to business logic, newest first; soft-deleted rows
    /// filtered out.
    fn get_all_entries(&self) -> Result<Vec<JournalEntry>>;

    /// Fetch by id; soft-deleted entries are returned.
    fn get_entry(&self, entry_id: &str) -> Result<JournalEntry>;

    /// Entries for one calendar day, soft-deleted rows filtered out.
    fn get_entries_for_date(&self, entry_date: &str) -> Result<Vec<JournalEntry>>;

    async fn create_entry(&self, new_entry: NewJournalEntry) -> Result<JournalEntry>;
    async fn update_entry(&self, entry_id: &str, update: JournalEntryUpdate)
        -> Result<JournalEntry>;
    async fn delete_entry(&self, entry_id: &str) -> Result<JournalEntry>;
}
