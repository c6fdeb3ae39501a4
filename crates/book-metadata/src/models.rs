//! Normalized metadata shapes returned by the lookup service.

use serde::{Deserialize, Serialize};

use daystack_core::books::{BookStatus, NewBook, ProgressUnit};

/// Book metadata normalized from a provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub cover_url: Option<String>,
    pub page_count: Option<i32>,
}

impl BookMetadata {
    /// Shape the metadata into a repository create request.
    pub fn into_new_book(self) -> NewBook {
        NewBook {
            title: self.title,
            author: self.author,
            isbn: Some(self.isbn),
            cover_url: self.cover_url,
            status: BookStatus::Tbr,
            progress_unit: ProgressUnit::Pages,
            progress_total: self.page_count.unwrap_or(0),
        }
    }
}

/// Result of a metadata lookup. Lookup failures are expected conditions and
/// travel as data, not errors: callers decide whether to fall back to manual
/// entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum LookupOutcome {
    Found(BookMetadata),
    NotFound,
    NetworkError { message: String },
}
