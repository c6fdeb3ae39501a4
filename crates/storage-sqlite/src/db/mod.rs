//! Database bootstrap: file location, connection pool, migrations.

pub mod write_actor;

use std::path::Path;
use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{error, info};

use daystack_core::Result;

use crate::errors::StorageError;

pub use write_actor::{spawn_writer, WriteHandle};

pub const DB_FILE_NAME: &str = "daystack.db";

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Ensure the app data directory exists and return the database file path.
pub fn init(app_data_dir: &str) -> Result<String> {
    std::fs::create_dir_all(app_data_dir).map_err(|err| {
        StorageError::Internal(format!(
            "Failed to create app data dir '{}': {}",
            app_data_dir, err
        ))
    })?;
    let db_path = Path::new(app_data_dir).join(DB_FILE_NAME);
    Ok(db_path.to_string_lossy().to_string())
}

/// Apply pending schema migrations, in order.
///
/// Every step is additive and idempotent, so re-running against an
/// up-to-date database is a no-op. Failures are fatal for the session and
/// must be surfaced to the caller, never swallowed.
pub fn run_migrations(db_path: &str) -> Result<()> {
    let mut conn = SqliteConnection::establish(db_path)
        .map_err(|err| StorageError::Migration(format!("Failed to open '{}': {}", db_path, err)))?;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| {
            error!("Schema migration failed: {}", err);
            StorageError::Migration(err.to_string())
        })?;
    if !applied.is_empty() {
        info!("Applied {} schema migration(s)", applied.len());
    }
    Ok(())
}

#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Build the shared connection pool. The pool is created once by the host
/// and handed to repositories; there is no module-level global.
pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .max_size(8)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .map_err(|err| StorageError::Connection(err.to_string()))?;
    Ok(Arc::new(pool))
}

/// Checkout a pooled connection for read paths.
pub fn get_connection(pool: &Arc<DbPool>) -> Result<DbConnection> {
    Ok(pool.get().map_err(StorageError::from)?)
}

/// Ready-to-use store handle: shared pool plus the writer actor. The host
/// constructs one of these and injects it into every repository.
pub struct Store {
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
}

/// Bootstrap the store: ensure the data directory, apply migrations, build
/// the pool, start the writer.
///
/// Safe to call more than once (migrations are idempotent and pools are
/// independent); hosts are expected to call it once and share the returned
/// handle behind a one-time-initialization primitive.
pub fn open(app_data_dir: &str) -> Result<Store> {
    let db_path = init(app_data_dir)?;
    run_migrations(&db_path)?;
    let pool = create_pool(&db_path)?;
    let writer = spawn_writer(pool.as_ref().clone());
    Ok(Store { pool, writer })
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn open_is_repeatable_against_the_same_directory() {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let first = open(&app_data).expect("first open");
        let second = open(&app_data).expect("second open");
        assert!(first.pool.get().is_ok());
        assert!(second.pool.get().is_ok());
    }
}
