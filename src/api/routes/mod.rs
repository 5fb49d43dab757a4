//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`images`] — Submission, status, and listing of retrieval records
//! - [`system`] — Health and OpenAPI

use serde::{Deserialize, Serialize};

mod images;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use images::*;
pub use system::*;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for POST /images
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitImageRequest {
    /// Absolute http(s) URL of the image to retrieve
    pub url: String,
}

/// Response for POST /images
///
/// `storedUrl` is the poll locator of the new record, not the blob itself;
/// the blob URL appears in the status projection once retrieval completes.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitImageResponse {
    /// Relative URL to poll for the record's status
    pub stored_url: String,
}
