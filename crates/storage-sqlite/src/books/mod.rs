pub mod model;
mod repository;

pub use model::{BookDB, ReadingSessionDB};
pub use repository::BookRepository;
