//! Book domain: models, repository contract, and progress service.

mod model;
mod service;

pub use model::*;
pub use service::*;
