//! Book and reading-session domain models.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::sync::SyncStatus;

/// Reading lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Tbr,
    Reading,
    Finished,
    Dnf,
}

/// Unit a book's progress is recorded in. Once any progress exists, every
/// further session must use the same unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressUnit {
    Pages,
    Minutes,
}

impl ProgressUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressUnit::Pages => "pages",
            ProgressUnit::Minutes => "minutes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub cover_url: Option<String>,
    pub status: BookStatus,
    pub progress_unit: ProgressUnit,
    pub progress_current: i32,
    pub progress_total: i32,
    pub is_rereading: bool,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
    pub sync_status: SyncStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub cover_url: Option<String>,
    pub status: BookStatus,
    pub progress_unit: ProgressUnit,
    pub progress_total: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<Option<String>>,
    pub cover_url: Option<Option<String>>,
    pub status: Option<BookStatus>,
    pub progress_unit: Option<ProgressUnit>,
    pub progress_current: Option<i32>,
    pub progress_total: Option<i32>,
    pub is_rereading: Option<bool>,
    pub started_at: Option<Option<String>>,
    pub finished_at: Option<Option<String>>,
}

/// One logged reading session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingSession {
    pub id: String,
    pub user_id: Option<String>,
    pub book_id: String,
    pub delta: i32,
    pub unit: ProgressUnit,
    /// Calendar day the session was logged, "YYYY-MM-DD".
    pub session_date: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
    pub sync_status: SyncStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReadingSession {
    pub book_id: String,
    pub delta: i32,
    pub unit: ProgressUnit,
    pub session_date: String,
}

#[async_trait]
pub trait BookRepositoryTrait: Send + Sync {
    /// Books visible to business logic, newest first; soft-deleted rows
    /// filtered out.
    fn get_all_books(&self) -> Result<Vec<Book>>;

    /// Fetch by id; soft-deleted books are returned (undo path).
    fn get_book(&self, book_id: &str) -> Result<Book>;

    async fn create_book(&self, new_book: NewBook) -> Result<Book>;
    async fn update_book(&self, book_id: &str, update: BookUpdate) -> Result<Book>;
    async fn delete_book(&self, book_id: &str) -> Result<Book>;

    /// Clears `deleted_at` and re-queues the book for sync; backs the
    /// bounded undo window the UI offers after a delete.
    async fn restore_book(&self, book_id: &str) -> Result<Book>;

    /// Sessions for one book, most recent first.
    fn get_sessions_for_book(&self, book_id: &str) -> Result<Vec<ReadingSession>>;

    async fn record_session(&self, new_session: NewReadingSession) -> Result<ReadingSession>;
}
