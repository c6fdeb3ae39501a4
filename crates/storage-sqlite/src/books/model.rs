//! Database models for books and reading sessions.

use diesel::prelude::*;

use daystack_core::books::{Book, ReadingSession};
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
#[diesel(table_name = crate::schema::books)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BookDB {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub cover_url: Option<String>,
    pub status: String,
    pub progress_unit: String,
    pub progress_current: i32,
    pub progress_total: i32,
    pub is_rereading: bool,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
    pub sync_status: String,
}

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::reading_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReadingSessionDB {
    pub id: String,
    pub user_id: Option<String>,
    pub book_id: String,
    pub delta: i32,
    pub unit: String,
    pub session_date: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
    pub sync_status: String,
}

pub fn to_book(row: BookDB) -> Result<Book> {
    Ok(Book {
        id: row.id,
        user_id: row.user_id,
        title: row.title,
        author: row.author,
        isbn: row.isbn,
        cover_url: row.cover_url,
        status: enum_from_db(&row.status)?,
        progress_unit: enum_from_db(&row.progress_unit)?,
        progress_current: row.progress_current,
        progress_total: row.progress_total,
        is_rereading: row.is_rereading,
        started_at: row.started_at,
        finished_at: row.finished_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
        deleted_at: row.deleted_at,
        sync_status: enum_from_db(&row.sync_status)?,
    })
}

pub fn book_row(book: &Book) -> Result<BookDB> {
    Ok(BookDB {
        id: book.id.clone(),
        user_id: book.user_id.clone(),
        title: book.title.clone(),
        author: book.author.clone(),
        isbn: book.isbn.clone(),
        cover_url: book.cover_url.clone(),
        status: enum_to_db(&book.status)?,
        progress_unit: enum_to_db(&book.progress_unit)?,
        progress_current: book.progress_current,
        progress_total: book.progress_total,
        is_rereading: book.is_rereading,
        started_at: book.started_at.clone(),
        finished_at: book.finished_at.clone(),
        created_at: book.created_at.clone(),
        updated_at: book.updated_at.clone(),
        deleted_at: book.deleted_at.clone(),
        sync_status: enum_to_db(&book.sync_status)?,
    })
}

pub fn to_session(row: ReadingSessionDB) -> Result<ReadingSession> {
    Ok(ReadingSession {
        id: row.id,
        user_id: row.user_id,
        book_id: row.book_id,
        delta: row.delta,
        unit: enum_from_db(&row.unit)?,
        session_date: row.session_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
        deleted_at: row.deleted_at,
        sync_status: enum_from_db(&row.sync_status)?,
    })
}

pub fn session_row(session: &ReadingSession) -> Result<ReadingSessionDB> {
    Ok(ReadingSessionDB {
        id: session.id.clone(),
        user_id: session.user_id.clone(),
        book_id: session.book_id.clone(),
        delta: session.delta,
        unit: enum_to_db(&session.unit)?,
        session_date: session.session_date.clone(),
        created_at: session.created_at.clone(),
        updated_at: session.updated_at.clone(),
        deleted_at: session.deleted_at.clone(),
        sync_status: enum_to_db(&session.sync_status)?,
    })
}
