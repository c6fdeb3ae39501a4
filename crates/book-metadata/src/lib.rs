//! Third-party book metadata lookup, normalized to the daystack book shape.

mod models;
mod openlibrary;

pub use models::{BookMetadata, LookupOutcome};
pub use openlibrary::OpenLibraryProvider;
