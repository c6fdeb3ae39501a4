//! SQLite repository for books and reading sessions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use uuid::Uuid;

use daystack_core::books::{
    Book, BookRepositoryTrait, BookUpdate, NewBook, NewReadingSession, ReadingSession,
};
use daystack_core::errors::{Error, Result};
use daystack_core::sync::{SyncCollection, SyncOperation, SyncStatus};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{books, reading_sessions};
use crate::sync::{write_outbox_event, OutboxWriteRequest};

use super::model::{book_row, session_row, to_book, to_session, BookDB, ReadingSessionDB};

pub struct BookRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl BookRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        BookRepository { pool, writer }
    }
}

fn load_book(conn: &mut SqliteConnection, book_id: &str) -> Result<Book> {
    let row = books::table
        .find(book_id)
        .first::<BookDB>(conn)
        .optional()
        .map_err(StorageError::from)?
        .ok_or_else(|| Error::not_found("book", book_id))?;
    to_book(row)
}

fn upsert_book(conn: &mut SqliteConnection, book: &Book) -> Result<()> {
    let row = book_row(book)?;
    diesel::insert_into(books::table)
        .values(&row)
        .on_conflict(books::id)
        .do_update()
        .set(&row)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

fn persist_book_mutation(
    conn: &mut SqliteConnection,
    book: &Book,
    operation: SyncOperation,
) -> Result<()> {
    upsert_book(conn, book)?;
    write_outbox_event(
        conn,
        OutboxWriteRequest::new(
            SyncCollection::Book,
            book.id.clone(),
            operation,
            serde_json::to_value(book)?,
        ),
    )
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    fn get_all_books(&self) -> Result<Vec<Book>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = books::table
            .filter(books::deleted_at.is_null())
            .order(books::created_at.desc())
            .load::<BookDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(to_book).collect()
    }

    fn get_book(&self, book_id: &str) -> Result<Book> {
        let mut conn = get_connection(&self.pool)?;
        load_book(&mut conn, book_id)
    }

    async fn create_book(&self, new_book: NewBook) -> Result<Book> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let book = Book {
                    id: Uuid::new_v4().to_string(),
                    user_id: None,
                    title: new_book.title,
                    author: new_book.author,
                    isbn: new_book.isbn,
                    cover_url: new_book.cover_url,
                    status: new_book.status,
                    progress_unit: new_book.progress_unit,
                    progress_current: 0,
                    progress_total: new_book.progress_total,
                    is_rereading: false,
                    started_at: None,
                    finished_at: None,
                    created_at: now.clone(),
                    updated_at: now,
                    deleted_at: None,
                    sync_status: SyncStatus::Dirty,
                };

                diesel::insert_into(books::table)
                    .values(&book_row(&book)?)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                write_outbox_event(
                    conn,
                    OutboxWriteRequest::new(
                        SyncCollection::Book,
                        book.id.clone(),
                        SyncOperation::Create,
                        serde_json::to_value(&book)?,
                    ),
                )?;
                Ok(book)
            })
            .await
    }

    async fn update_book(&self, book_id: &str, update: BookUpdate) -> Result<Book> {
        let book_id = book_id.to_string();
        self.writer
            .exec(move |conn| {
                let mut book = load_book(conn, &book_id)?;

                if let Some(title) = update.title {
                    book.title = title;
                }
                if let Some(author) = update.author {
                    book.author = author;
                }
                if let Some(isbn) = update.isbn {
                    book.isbn = isbn;
                }
                if let Some(cover_url) = update.cover_url {
                    book.cover_url = cover_url;
                }
                if let Some(status) = update.status {
                    book.status = status;
                }
                if let Some(progress_unit) = update.progress_unit {
                    book.progress_unit = progress_unit;
                }
                if let Some(progress_current) = update.progress_current {
                    book.progress_current = progress_current;
                }
                if let Some(progress_total) = update.progress_total {
                    book.progress_total = progress_total;
                }
                if let Some(is_rereading) = update.is_rereading {
                    book.is_rereading = is_rereading;
                }
                if let Some(started_at) = update.started_at {
                    book.started_at = started_at;
                }
                if let Some(finished_at) = update.finished_at {
                    book.finished_at = finished_at;
                }
                book.updated_at = Utc::now().to_rfc3339();
                book.sync_status = SyncStatus::Dirty;

                persist_book_mutation(conn, &book, SyncOperation::Update)?;
                Ok(book)
            })
            .await
    }

    async fn delete_book(&self, book_id: &str) -> Result<Book> {
        let book_id = book_id.to_string();
        self.writer
            .exec(move |conn| {
                let mut book = load_book(conn, &book_id)?;

                let now = Utc::now().to_rfc3339();
                book.deleted_at = Some(now.clone());
                book.updated_at = now;
                book.sync_status = SyncStatus::Dirty;

                persist_book_mutation(conn, &book, SyncOperation::Delete)?;
                Ok(book)
            })
            .await
    }

    async fn restore_book(&self, book_id: &str) -> Result<Book> {
        let book_id = book_id.to_string();
        self.writer
            .exec(move |conn| {
                let mut book = load_book(conn, &book_id)?;

                book.deleted_at = None;
                book.updated_at = Utc::now().to_rfc3339();
                book.sync_status = SyncStatus::Dirty;

                persist_book_mutation(conn, &book, SyncOperation::Update)?;
                Ok(book)
            })
            .await
    }

    fn get_sessions_for_book(&self, book_id: &str) -> Result<Vec<ReadingSession>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = reading_sessions::table
            .filter(reading_sessions::book_id.eq(book_id))
            .filter(reading_sessions::deleted_at.is_null())
            .order(reading_sessions::session_date.desc())
            .load::<ReadingSessionDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(to_session).collect()
    }

    async fn record_session(&self, new_session: NewReadingSession) -> Result<ReadingSession> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let session = ReadingSession {
                    id: Uuid::new_v4().to_string(),
                    user_id: None,
                    book_id: new_session.book_id,
                    delta: new_session.delta,
                    unit: new_session.unit,
                    session_date: new_session.session_date,
                    created_at: now.clone(),
                    updated_at: now,
                    deleted_at: None,
                    sync_status: SyncStatus::Dirty,
                };

                diesel::insert_into(reading_sessions::table)
                    .values(&session_row(&session)?)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                write_outbox_event(
                    conn,
                    OutboxWriteRequest::new(
                        SyncCollection::ReadingSession,
                        session.id.clone(),
                        SyncOperation::Create,
                        serde_json::to_value(&session)?,
                    ),
                )?;
                Ok(session)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use daystack_core::books::{BookStatus, ProgressUnit};

    use super::*;
    use crate::db::{create_pool, init, run_migrations, spawn_writer};
    use crate::schema::sync_outbox;
    use crate::sync::model::OutboxEntryDB;

    fn setup() -> (Arc<DbPool>, BookRepository) {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        run_migrations(&db_path).expect("migrate db");
        let pool = create_pool(&db_path).expect("create pool");
        let writer = spawn_writer(pool.as_ref().clone());
        (pool.clone(), BookRepository::new(pool, writer))
    }

    fn dune() -> NewBook {
        NewBook {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: Some("9780306406157".to_string()),
            cover_url: None,
            status: BookStatus::Tbr,
            progress_unit: ProgressUnit::Pages,
            progress_total: 412,
        }
    }

    #[tokio::test]
    async fn deleted_book_can_be_restored_within_undo_window() {
        let (_pool, repo) = setup();
        let book = repo.create_book(dune()).await.expect("create");

        repo.delete_book(&book.id).await.expect("delete");
        assert!(repo.get_all_books().expect("list").is_empty());

        let restored = repo.restore_book(&book.id).await.expect("restore");
        assert!(restored.deleted_at.is_none());
        assert_eq!(restored.sync_status, SyncStatus::Dirty);

        let listed = repo.get_all_books().expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, book.id);
    }

    #[tokio::test]
    async fn restore_enqueues_an_update_entry() {
        let (pool, repo) = setup();
        let book = repo.create_book(dune()).await.expect("create");
        repo.delete_book(&book.id).await.expect("delete");
        repo.restore_book(&book.id).await.expect("restore");

        let mut conn = get_connection(&pool).expect("conn");
        let ops: Vec<String> = sync_outbox::table
            .order(sync_outbox::id.asc())
            .load::<OutboxEntryDB>(&mut conn)
            .expect("outbox")
            .into_iter()
            .map(|row| row.operation)
            .collect();
        assert_eq!(ops, vec!["create", "delete", "update"]);
    }

    #[tokio::test]
    async fn sessions_list_for_their_book_most_recent_first() {
        let (_pool, repo) = setup();
        let book = repo.create_book(dune()).await.expect("create");
        for day in ["2026-03-01", "2026-03-05", "2026-03-03"] {
            repo.record_session(NewReadingSession {
                book_id: book.id.clone(),
                delta: 20,
                unit: ProgressUnit::Pages,
                session_date: day.to_string(),
            })
            .await
            .expect("record");
        }

        let sessions = repo.get_sessions_for_book(&book.id).expect("sessions");
        let days: Vec<&str> = sessions.iter().map(|s| s.session_date.as_str()).collect();
        assert_eq!(days, vec!["2026-03-05", "2026-03-03", "2026-03-01"]);
        assert!(sessions.iter().all(|s| s.sync_status == SyncStatus::Dirty));
    }
}
