//! Wire types for the remote row store API.
//!
//! The remote schema mirrors the local entity shape field-for-field; rows
//! travel as full snapshots with `id`/`updatedAt`/`deletedAt` lifted out so
//! the backend can index them without parsing domain payloads.

use serde::{Deserialize, Serialize};

use daystack_core::sync::SyncRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRowsRequest {
    pub rows: Vec<SyncRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRowsResponse {
    pub accepted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRowsResponse {
    pub rows: Vec<SyncRow>,
}

/// Error body returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub code: String,
    pub message: String,
}
