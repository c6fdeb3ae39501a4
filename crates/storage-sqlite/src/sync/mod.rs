//! SQLite storage for sync infrastructure (outbox, engine state, row store).

pub mod model;
mod repository;

pub use repository::{
    write_outbox_event, OutboxWriteRequest, SyncRepository, OUTBOX_MAX_RETRIES,
};
