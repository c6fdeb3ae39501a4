//! Database models for the sync infrastructure tables.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Queryable,
    Identifiable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::sync_outbox)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OutboxEntryDB {
    pub id: i64,
    pub store_name: String,
    pub operation: String,
    pub entity_id: String,
    pub payload: String,
    pub created_at: String,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub status: String,
}

/// Insert shape; the id is assigned by SQLite.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::sync_outbox)]
pub struct NewOutboxEntryDB {
    pub store_name: String,
    pub operation: String,
    pub entity_id: String,
    pub payload: String,
    pub created_at: String,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub status: String,
}

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::sync_engine_state)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncEngineStateDB {
    pub id: i32,
    pub last_push_at: Option<String>,
    pub last_pull_at: Option<String>,
    pub last_error: Option<String>,
    pub consecutive_failures: i32,
}
