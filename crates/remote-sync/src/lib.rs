//! HTTP implementation of the remote row store used for sync.

mod client;
mod error;
mod types;

pub use client::RemoteStoreClient;
pub use error::{RemoteSyncError, Result};
pub use types::{ApiErrorResponse, FetchRowsResponse, UpsertRowsRequest, UpsertRowsResponse};
