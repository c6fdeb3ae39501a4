//! Book lifecycle service, including the two-phase progress flow.

use std::sync::Arc;

use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::books::model::{
    Book, BookRepositoryTrait, BookStatus, BookUpdate, NewBook, NewReadingSession, ProgressUnit,
    ReadingSession,
};
use crate::errors::{Error, Result, ValidationError};
use crate::utils::isbn::parse_isbn;

/// A validated progress delta awaiting the caller's finish-or-continue
/// decision. Nothing has been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingProgress {
    pub book_id: String,
    pub delta: i32,
    pub unit: ProgressUnit,
    pub session_date: String,
    /// Where the delta would land `progress_current`.
    pub projected: i32,
    pub total: i32,
}

/// Result of applying a progress delta.
///
/// Reaching the book's total is a domain decision, not an error: the session
/// and book update are only persisted once the caller resolves the pending
/// delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ProgressOutcome {
    Applied {
        book: Book,
        session: ReadingSession,
    },
    #[serde(rename = "prompt_finish")]
    NeedsConfirmation(PendingProgress),
}

pub struct BookService {
    repository: Arc<dyn BookRepositoryTrait>,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepositoryTrait>) -> Self {
        Self { repository }
    }

    pub fn get_all_books(&self) -> Result<Vec<Book>> {
        self.repository.get_all_books()
    }

    pub fn get_book(&self, book_id: &str) -> Result<Book> {
        self.repository.get_book(book_id)
    }

    /// Create a book, validating the ISBN when one is supplied.
    pub async fn create_book(&self, new_book: NewBook) -> Result<Book> {
        if let Some(raw) = new_book.isbn.as_deref() {
            parse_isbn(raw)
                .map_err(|err| ValidationError::InvalidIsbn(format!("'{}': {}", raw, err)))?;
        }
        self.repository.create_book(new_book).await
    }

    pub async fn update_book(&self, book_id: &str, update: BookUpdate) -> Result<Book> {
        self.repository.update_book(book_id, update).await
    }

    pub async fn delete_book(&self, book_id: &str) -> Result<Book> {
        self.repository.delete_book(book_id).await
    }

    /// Undo a recent soft delete; the bounded undo window is enforced by the
    /// caller, not here.
    pub async fn restore_book(&self, book_id: &str) -> Result<Book> {
        self.repository.restore_book(book_id).await
    }

    pub fn get_sessions_for_book(&self, book_id: &str) -> Result<Vec<ReadingSession>> {
        self.repository.get_sessions_for_book(book_id)
    }

    /// Apply a reading-session delta to a book.
    ///
    /// Validation happens before any mutation: the delta must be positive and
    /// must match the unit of any already-recorded progress. A delta that
    /// would reach the total of a not-yet-finished book short-circuits to
    /// `NeedsConfirmation` with nothing persisted; `resolve_pending` commits
    /// once the caller decides. Logging progress against a finished book is
    /// the re-read path: the delta extends the total instead of clamping.
    pub async fn apply_progress(
        &self,
        book_id: &str,
        delta: i32,
        unit: ProgressUnit,
        session_date: &str,
    ) -> Result<ProgressOutcome> {
        let book = self.validated_book(book_id, delta, unit)?;

        if book.status == BookStatus::Finished {
            return self
                .commit_reread(&book, delta, unit, session_date)
                .await
                .map(|(book, session)| ProgressOutcome::Applied { book, session });
        }

        let projected = book.progress_current + delta;
        if !book.is_rereading && book.progress_total > 0 && projected >= book.progress_total {
            debug!(
                "Book {} would reach {}/{}; prompting before commit",
                book.id, projected, book.progress_total
            );
            return Ok(ProgressOutcome::NeedsConfirmation(PendingProgress {
                book_id: book.id,
                delta,
                unit,
                session_date: session_date.to_string(),
                projected,
                total: book.progress_total,
            }));
        }

        let mut update = reading_transition(&book);
        update.progress_unit = Some(unit);
        update.progress_current = Some(projected);
        if book.is_rereading && projected > book.progress_total {
            update.progress_total = Some(projected);
        }

        let (book, session) = self
            .commit(&book.id, update, delta, unit, session_date)
            .await?;
        Ok(ProgressOutcome::Applied { book, session })
    }

    /// Commit a previously prompted delta. Re-validates the book before
    /// persisting; `finished` marks the book done, otherwise progress is
    /// clamped at the total and reading continues.
    pub async fn resolve_pending(
        &self,
        pending: &PendingProgress,
        finished: bool,
    ) -> Result<(Book, ReadingSession)> {
        let book = self.validated_book(&pending.book_id, pending.delta, pending.unit)?;

        let mut update = reading_transition(&book);
        update.progress_unit = Some(pending.unit);
        update.progress_current = Some(book.progress_total);
        if finished {
            update.status = Some(BookStatus::Finished);
            update.finished_at = Some(Some(Utc::now().to_rfc3339()));
        }

        self.commit(
            &pending.book_id,
            update,
            pending.delta,
            pending.unit,
            &pending.session_date,
        )
        .await
    }

    fn validated_book(&self, book_id: &str, delta: i32, unit: ProgressUnit) -> Result<Book> {
        if delta <= 0 {
            return Err(ValidationError::NonPositiveDelta(delta).into());
        }
        let book = self.repository.get_book(book_id)?;
        if book.deleted_at.is_some() {
            return Err(Error::not_found("book", book_id));
        }
        if book.progress_current > 0 && unit != book.progress_unit {
            return Err(ValidationError::UnitMismatch {
                expected: book.progress_unit.as_str().to_string(),
                actual: unit.as_str().to_string(),
            }
            .into());
        }
        Ok(book)
    }

    async fn commit_reread(
        &self,
        book: &Book,
        delta: i32,
        unit: ProgressUnit,
        session_date: &str,
    ) -> Result<(Book, ReadingSession)> {
        let projected = book.progress_current + delta;
        let update = BookUpdate {
            status: Some(BookStatus::Reading),
            is_rereading: Some(true),
            progress_unit: Some(unit),
            progress_current: Some(projected),
            progress_total: Some(book.progress_total.max(projected)),
            ..Default::default()
        };
        self.commit(&book.id, update, delta, unit, session_date)
            .await
    }

    async fn commit(
        &self,
        book_id: &str,
        update: BookUpdate,
        delta: i32,
        unit: ProgressUnit,
        session_date: &str,
    ) -> Result<(Book, ReadingSession)> {
        let book = self.repository.update_book(book_id, update).await?;
        let session = self
            .repository
            .record_session(NewReadingSession {
                book_id: book_id.to_string(),
                delta,
                unit,
                session_date: session_date.to_string(),
            })
            .await?;
        Ok((book, session))
    }
}

/// Status transition applied when new progress lands on a book that is not
/// currently being read.
fn reading_transition(book: &Book) -> BookUpdate {
    let mut update = BookUpdate::default();
    match book.status {
        BookStatus::Tbr => {
            update.status = Some(BookStatus::Reading);
            update.started_at = Some(Some(Utc::now().to_rfc3339()));
        }
        BookStatus::Dnf => {
            update.status = Some(BookStatus::Reading);
        }
        BookStatus::Reading | BookStatus::Finished => {}
    }
    update
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::sync::SyncStatus;

    #[derive(Default)]
    struct MemoryBookRepository {
        books: Mutex<HashMap<String, Book>>,
        sessions: Mutex<Vec<ReadingSession>>,
    }

    impl MemoryBookRepository {
        fn seed(&self, book: Book) {
            self.books.lock().unwrap().insert(book.id.clone(), book);
        }
    }

    #[async_trait]
    impl BookRepositoryTrait for MemoryBookRepository {
        fn get_all_books(&self) -> Result<Vec<Book>> {
            let mut books: Vec<Book> = self
                .books
                .lock()
                .unwrap()
                .values()
                .filter(|b| b.deleted_at.is_none())
                .cloned()
                .collect();
            books.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(books)
        }

        fn get_book(&self, book_id: &str) -> Result<Book> {
            self.books
                .lock()
                .unwrap()
                .get(book_id)
                .cloned()
                .ok_or_else(|| Error::not_found("book", book_id))
        }

        async fn create_book(&self, new_book: NewBook) -> Result<Book> {
            let now = Utc::now().to_rfc3339();
            let book = Book {
                id: uuid::Uuid::new_v4().to_string(),
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
            self.seed(book.clone());
            Ok(book)
        }

        async fn update_book(&self, book_id: &str, update: BookUpdate) -> Result<Book> {
            let mut books = self.books.lock().unwrap();
            let book = books
                .get_mut(book_id)
                .ok_or_else(|| Error::not_found("book", book_id))?;
            if let Some(title) = update.title {
                book.title = title;
            }
            if let Some(status) = update.status {
                book.status = status;
            }
            if let Some(unit) = update.progress_unit {
                book.progress_unit = unit;
            }
            if let Some(current) = update.progress_current {
                book.progress_current = current;
            }
            if let Some(total) = update.progress_total {
                book.progress_total = total;
            }
            if let Some(rereading) = update.is_rereading {
                book.is_rereading = rereading;
            }
            if let Some(started) = update.started_at {
                book.started_at = started;
            }
            if let Some(finished) = update.finished_at {
                book.finished_at = finished;
            }
            book.updated_at = Utc::now().to_rfc3339();
            book.sync_status = SyncStatus::Dirty;
            Ok(book.clone())
        }

        async fn delete_book(&self, book_id: &str) -> Result<Book> {
            let mut books = self.books.lock().unwrap();
            let book = books
                .get_mut(book_id)
                .ok_or_else(|| Error::not_found("book", book_id))?;
            book.deleted_at = Some(Utc::now().to_rfc3339());
            Ok(book.clone())
        }

        async fn restore_book(&self, book_id: &str) -> Result<Book> {
            let mut books = self.books.lock().unwrap();
            let book = books
                .get_mut(book_id)
                .ok_or_else(|| Error::not_found("book", book_id))?;
            book.deleted_at = None;
            Ok(book.clone())
        }

        fn get_sessions_for_book(&self, book_id: &str) -> Result<Vec<ReadingSession>> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.book_id == book_id)
                .cloned()
                .collect())
        }

        async fn record_session(&self, new_session: NewReadingSession) -> Result<ReadingSession> {
            let now = Utc::now().to_rfc3339();
            let session = ReadingSession {
                id: uuid::Uuid::new_v4().to_string(),
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
            self.sessions.lock().unwrap().push(session.clone());
            Ok(session)
        }
    }

    fn service_with_book(total: i32) -> (Arc<MemoryBookRepository>, BookService, String) {
        let repository = Arc::new(MemoryBookRepository::default());
        let now = Utc::now().to_rfc3339();
        let book = Book {
            id: "b-1".to_string(),
            user_id: None,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: None,
            cover_url: None,
            status: BookStatus::Tbr,
            progress_unit: ProgressUnit::Pages,
            progress_current: 0,
            progress_total: total,
            is_rereading: false,
            started_at: None,
            finished_at: None,
            created_at: now.clone(),
            updated_at: now,
            deleted_at: None,
            sync_status: SyncStatus::Synced,
        };
        repository.seed(book);
        let service = BookService::new(repository.clone());
        (repository, service, "b-1".to_string())
    }

    async fn apply(service: &BookService, id: &str, delta: i32) -> ProgressOutcome {
        service
            .apply_progress(id, delta, ProgressUnit::Pages, "2026-03-01")
            .await
            .expect("apply progress")
    }

    #[tokio::test]
    async fn non_positive_delta_is_rejected_before_any_write() {
        let (repository, service, id) = service_with_book(200);
        let err = service
            .apply_progress(&id, 0, ProgressUnit::Pages, "2026-03-01")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NonPositiveDelta(0))
        ));
        assert!(repository.sessions.lock().unwrap().is_empty());
        assert_eq!(repository.get_book(&id).unwrap().progress_current, 0);
    }

    #[tokio::test]
    async fn unit_mismatch_is_rejected_once_progress_exists() {
        let (repository, service, id) = service_with_book(200);
        apply(&service, &id, 50).await;

        let err = service
            .apply_progress(&id, 10, ProgressUnit::Minutes, "2026-03-02")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::UnitMismatch { .. })
        ));
        assert_eq!(repository.get_book(&id).unwrap().progress_current, 50);
        assert_eq!(repository.sessions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unit_can_switch_while_no_progress_is_recorded() {
        let (repository, service, id) = service_with_book(300);
        let outcome = service
            .apply_progress(&id, 25, ProgressUnit::Minutes, "2026-03-01")
            .await
            .unwrap();
        assert!(matches!(outcome, ProgressOutcome::Applied { .. }));
        assert_eq!(
            repository.get_book(&id).unwrap().progress_unit,
            ProgressUnit::Minutes
        );
    }

    #[tokio::test]
    async fn first_progress_moves_tbr_to_reading() {
        let (repository, service, id) = service_with_book(200);
        apply(&service, &id, 50).await;

        let book = repository.get_book(&id).unwrap();
        assert_eq!(book.status, BookStatus::Reading);
        assert!(book.started_at.is_some());
        assert_eq!(book.sync_status, SyncStatus::Dirty);
    }

    #[tokio::test]
    async fn dnf_book_resumes_reading_on_new_progress() {
        let (repository, service, id) = service_with_book(200);
        repository
            .update_book(
                &id,
                BookUpdate {
                    status: Some(BookStatus::Dnf),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        apply(&service, &id, 10).await;
        assert_eq!(repository.get_book(&id).unwrap().status, BookStatus::Reading);
    }

    #[tokio::test]
    async fn reaching_total_prompts_instead_of_persisting() {
        // Scenario: total 200, sessions of 50/50/50 land, the fourth (60)
        // would overshoot and must not persist until confirmed.
        let (repository, service, id) = service_with_book(200);
        for _ in 0..3 {
            assert!(matches!(
                apply(&service, &id, 50).await,
                ProgressOutcome::Applied { .. }
            ));
        }

        let outcome = apply(&service, &id, 60).await;
        let pending = match outcome {
            ProgressOutcome::NeedsConfirmation(pending) => pending,
            other => panic!("expected prompt, got {:?}", other),
        };
        assert_eq!(pending.projected, 210);
        assert_eq!(pending.total, 200);
        assert_eq!(repository.get_book(&id).unwrap().progress_current, 150);
        assert_eq!(repository.sessions.lock().unwrap().len(), 3);

        let (book, _session) = service.resolve_pending(&pending, true).await.unwrap();
        assert_eq!(book.progress_current, 200);
        assert_eq!(book.status, BookStatus::Finished);
        assert!(book.finished_at.is_some());
        assert_eq!(repository.sessions.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn resolving_without_finishing_clamps_and_keeps_reading() {
        let (repository, service, id) = service_with_book(100);
        apply(&service, &id, 90).await;

        let pending = match apply(&service, &id, 30).await {
            ProgressOutcome::NeedsConfirmation(pending) => pending,
            other => panic!("expected prompt, got {:?}", other),
        };

        let (book, _session) = service.resolve_pending(&pending, false).await.unwrap();
        assert_eq!(book.progress_current, 100);
        assert_eq!(book.status, BookStatus::Reading);
        assert!(book.finished_at.is_none());
        assert_eq!(repository.get_sessions_for_book(&id).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn relogging_a_finished_book_extends_total() {
        let (repository, service, id) = service_with_book(200);
        repository
            .update_book(
                &id,
                BookUpdate {
                    status: Some(BookStatus::Finished),
                    progress_current: Some(200),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let outcome = apply(&service, &id, 30).await;
        assert!(matches!(outcome, ProgressOutcome::Applied { .. }));
        let book = repository.get_book(&id).unwrap();
        assert_eq!(book.progress_current, 230);
        assert_eq!(book.progress_total, 230);
        assert!(book.is_rereading);
        assert_eq!(book.status, BookStatus::Reading);
    }

    #[tokio::test]
    async fn progress_on_soft_deleted_book_reports_not_found() {
        let (repository, service, id) = service_with_book(200);
        repository.delete_book(&id).await.unwrap();

        let err = service
            .apply_progress(&id, 10, ProgressUnit::Pages, "2026-03-01")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn create_book_rejects_invalid_isbn() {
        let repository = Arc::new(MemoryBookRepository::default());
        let service = BookService::new(repository.clone());
        let err = service
            .create_book(NewBook {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                isbn: Some("9780306406158".to_string()),
                cover_url: None,
                status: BookStatus::Tbr,
                progress_unit: ProgressUnit::Pages,
                progress_total: 412,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidIsbn(_))
        ));
        assert!(repository.books.lock().unwrap().is_empty());
    }
}
