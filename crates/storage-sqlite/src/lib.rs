//! SQLite implementation of the daystack local store: schema, migrations,
//! single-writer actor, entity repositories, and the sync row store.

pub mod books;
mod codec;
pub mod db;
pub mod errors;
pub mod habits;
pub mod journal;
pub mod schema;
pub mod sync;
pub mod transactions;

pub use books::BookRepository;
pub use db::{open, Store};
pub use habits::HabitRepository;
pub use journal::JournalRepository;
pub use sync::SyncRepository;
pub use transactions::TransactionRepository;
