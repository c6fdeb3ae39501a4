pub mod model;
mod repository;

pub use model::HabitDB;
pub use repository::HabitRepository;
