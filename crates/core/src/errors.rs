//! Error types shared across the daystack crates.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Database-layer failures surfaced through repositories.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to obtain a connection from the pool.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A query failed to execute.
    #[error("Query error: {0}")]
    Query(String),

    /// Schema migration failed. The store cannot be trusted for this
    /// session; callers must surface this loudly, never swallow it.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Catch-all for storage-internal invariant violations.
    #[error("Internal storage error: {0}")]
    Internal(String),
}

/// Validation failures raised before any mutation is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Progress deltas must be strictly positive.
    #[error("Progress delta must be positive, got {0}")]
    NonPositiveDelta(i32),

    /// A progress delta used a different unit than the book's recorded
    /// progress.
    #[error("Unit mismatch: book tracks progress in {expected}, got {actual}")]
    UnitMismatch { expected: String, actual: String },

    /// ISBN failed format or check-digit validation.
    #[error("Invalid ISBN: {0}")]
    InvalidIsbn(String),

    /// Generic field-level validation failure.
    #[error("Invalid {field}: {message}")]
    InvalidField { field: String, message: String },
}

/// Errors that can occur across the daystack core.
#[derive(Debug, Error)]
pub enum Error {
    /// An operation addressed a missing entity id.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input rejected before any state was written.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage failure.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unexpected internal condition.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Create a NotFound error for an entity kind and id.
    pub fn not_found(kind: &str, id: &str) -> Self {
        Self::NotFound(format!("{} '{}'", kind, id))
    }

    /// True when this error means the addressed entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_constructor_formats_kind_and_id() {
        let err = Error::not_found("habit", "h-1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: habit 'h-1'");
    }

    #[test]
    fn validation_errors_are_descriptive() {
        let err = Error::from(ValidationError::UnitMismatch {
            expected: "pages".to_string(),
            actual: "minutes".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Validation error: Unit mismatch: book tracks progress in pages, got minutes"
        );
    }
}
