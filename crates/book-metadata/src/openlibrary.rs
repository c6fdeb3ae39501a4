//! Open Library provider for book-by-ISBN metadata lookup.
//!
//! Uses the free Open Library Books API to resolve ISBN -> title, author,
//! cover, and page count. Read-only; no API key required.

use std::collections::HashMap;
use std::time::Duration;

use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::models::{BookMetadata, LookupOutcome};

const PROVIDER_ID: &str = "OPENLIBRARY";
const API_URL: &str = "https://openlibrary.org/api/books";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct OpenLibraryAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryCover {
    medium: Option<String>,
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryBook {
    title: Option<String>,
    authors: Option<Vec<OpenLibraryAuthor>>,
    cover: Option<OpenLibraryCover>,
    number_of_pages: Option<i32>,
}

pub struct OpenLibraryProvider {
    client: Client,
}

impl Default for OpenLibraryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenLibraryProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Look up a book by ISBN.
    ///
    /// A missing record and a network failure are both ordinary outcomes
    /// here; only the `Found` arm carries data.
    pub async fn lookup_isbn(&self, isbn: &str) -> LookupOutcome {
        let url = format!(
            "{}?bibkeys=ISBN:{}&format=json&jscmd=data",
            API_URL,
            isbn.trim()
        );

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!("[{}] Request failed for {}: {}", PROVIDER_ID, isbn, err);
                return LookupOutcome::NetworkError {
                    message: format!("HTTP request failed: {}", err),
                };
            }
        };

        let status = response.status();
        if !status.is_success() {
            return LookupOutcome::NetworkError {
                message: format!("HTTP {}", status),
            };
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                return LookupOutcome::NetworkError {
                    message: format!("Failed to read response body: {}", err),
                }
            }
        };

        parse_lookup_body(isbn, &body)
    }
}

fn parse_lookup_body(isbn: &str, body: &str) -> LookupOutcome {
    let records: HashMap<String, OpenLibraryBook> = match serde_json::from_str(body) {
        Ok(records) => records,
        Err(err) => {
            debug!("[{}] Unparseable body for {}: {}", PROVIDER_ID, isbn, err);
            return LookupOutcome::NetworkError {
                message: format!("JSON parse error: {}", err),
            };
        }
    };

    let record = match records.into_values().next() {
        Some(record) => record,
        // The API returns an empty object for unknown ISBNs.
        None => return LookupOutcome::NotFound,
    };

    let title = match record.title.filter(|t| !t.is_empty()) {
        Some(title) => title,
        None => return LookupOutcome::NotFound,
    };
    let author = record
        .authors
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| a.name)
        .collect::<Vec<_>>()
        .join(", ");
    let cover_url = record.cover.and_then(|c| c.medium.or(c.large));

    LookupOutcome::Found(BookMetadata {
        title,
        author,
        isbn: isbn.to_string(),
        cover_url,
        page_count: record.number_of_pages,
    })
}
