//! HTTP client for the remote row store consumed by the sync engine.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use daystack_core::sync::{AuthProvider, RemoteStore, RemoteStoreError, SyncCollection, SyncRow};

use crate::error::{RemoteSyncError, Result};
use crate::types::{ApiErrorResponse, FetchRowsResponse, UpsertRowsRequest, UpsertRowsResponse};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Client for the daystack sync backend.
///
/// Every call is scoped to the authenticated user; rows are upserted and
/// fetched per collection, keyed by entity id.
#[derive(Clone)]
pub struct RemoteStoreClient {
    client: reqwest::Client,
    base_url: String,
    auth: Arc<dyn AuthProvider>,
}

impl RemoteStoreClient {
    /// Create a new remote store client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the backend (e.g., "https://api.daystack.app")
    pub fn new(base_url: &str, auth: Arc<dyn AuthProvider>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    fn rows_url(&self, user_id: &str, collection: SyncCollection) -> String {
        format!(
            "{}/v1/users/{}/sync/{}",
            self.base_url,
            user_id,
            collection.table_name()
        )
    }

    /// Create headers for an API request.
    fn headers(&self) -> Result<HeaderMap> {
        let token = self
            .auth
            .access_token()
            .ok_or_else(|| RemoteSyncError::auth("No access token available"))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| RemoteSyncError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);
        Ok(headers)
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            // Try to parse a structured error body first.
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(RemoteSyncError::api(
                    status.as_u16(),
                    format!("{}: {}", error.code, error.message),
                ));
            }
            return Err(RemoteSyncError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!(
                "Failed to deserialize response. Body: {}, Error: {}",
                body,
                e
            );
            RemoteSyncError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    async fn upsert_rows_impl(
        &self,
        user_id: &str,
        collection: SyncCollection,
        rows: Vec<SyncRow>,
    ) -> Result<UpsertRowsResponse> {
        let count = rows.len();
        let response = self
            .client
            .put(self.rows_url(user_id, collection))
            .headers(self.headers()?)
            .json(&UpsertRowsRequest { rows })
            .send()
            .await?;
        let parsed: UpsertRowsResponse = Self::parse_response(response).await?;
        debug!(
            "Upserted {}/{} rows into remote '{}'",
            parsed.accepted,
            count,
            collection.table_name()
        );
        Ok(parsed)
    }

    async fn fetch_rows_impl(
        &self,
        user_id: &str,
        collection: SyncCollection,
    ) -> Result<Vec<SyncRow>> {
        let response = self
            .client
            .get(self.rows_url(user_id, collection))
            .headers(self.headers()?)
            .send()
            .await?;
        let parsed: FetchRowsResponse = Self::parse_response(response).await?;
        Ok(parsed.rows)
    }
}

#[async_trait]
impl RemoteStore for RemoteStoreClient {
    async fn upsert_rows(
        &self,
        user_id: &str,
        collection: SyncCollection,
        rows: Vec<SyncRow>,
    ) -> std::result::Result<(), RemoteStoreError> {
        self.upsert_rows_impl(user_id, collection, rows)
            .await
            .map(|_| ())
            .map_err(RemoteStoreError::from)
    }

    async fn fetch_rows(
        &self,
        user_id: &str,
        collection: SyncCollection,
    ) -> std::result::Result<Vec<SyncRow>, RemoteStoreError> {
        self.fetch_rows_impl(user_id, collection)
            .await
            .map_err(RemoteStoreError::from)
    }
}
