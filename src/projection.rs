//! Status projection for retrieval records
//!
//! Pure derivation of the external-facing status view from a stored record,
//! with no side effects. Used by both the single-item and listing queries;
//! the projection never reflects pipeline timing, only persisted state.

use crate::db::ImageRecord;
use crate::types::ImageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// External status view of one retrieval record
///
/// Exactly one of the documented shapes, never a mix: a pending record
/// exposes no stored reference, a completed record always exposes both the
/// reference and the completion timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatusProjection {
    /// Awaiting retrieval
    #[serde(rename_all = "camelCase")]
    Pending {
        /// When the record was created
        created_at: DateTime<Utc>,
    },
    /// Fetched and persisted
    #[serde(rename_all = "camelCase")]
    Completed {
        /// Externally resolvable URL of the stored blob
        stored_url: String,
        /// When the record was created
        created_at: DateTime<Utc>,
        /// When the blob reference was committed
        finished_at: DateTime<Utc>,
    },
    /// Attempt budget exhausted without success
    #[serde(rename_all = "camelCase")]
    Failed {
        /// When the record was created
        created_at: DateTime<Utc>,
        /// Most recent fetch failure
        #[serde(skip_serializing_if = "Option::is_none")]
        last_error: Option<String>,
    },
}

/// One entry of the listing query: the status projection tagged with the
/// record's identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingEntry {
    /// Record identifier
    pub id: ImageId,
    /// Source URL the record was submitted with
    pub source_url: String,
    /// Current status shape
    #[serde(flatten)]
    pub status: StatusProjection,
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

/// Derive the status view of a single record
///
/// `max_attempts` is the configured retry budget: `None` means records retry
/// forever and only ever project as pending or completed.
pub fn project_status(record: &ImageRecord, max_attempts: Option<u32>) -> StatusProjection {
    match (&record.stored_ref, record.finished_at) {
        (Some(stored_url), Some(finished_at)) => StatusProjection::Completed {
            stored_url: stored_url.clone(),
            created_at: timestamp(record.created_at),
            finished_at: timestamp(finished_at),
        },
        _ => {
            let exhausted =
                max_attempts.is_some_and(|max| record.attempts >= i64::from(max));
            if exhausted {
                StatusProjection::Failed {
                    created_at: timestamp(record.created_at),
                    last_error: record.last_error.clone(),
                }
            } else {
                StatusProjection::Pending {
                    created_at: timestamp(record.created_at),
                }
            }
        }
    }
}

/// Derive the listing view of a sequence of records
///
/// Order preserves the input order (the store's natural return order); no
/// re-sorting is applied.
pub fn project_listing(records: &[ImageRecord], max_attempts: Option<u32>) -> Vec<ListingEntry> {
    records
        .iter()
        .map(|record| ListingEntry {
            id: ImageId(record.id),
            source_url: record.source_url.clone(),
            status: project_status(record, max_attempts),
        })
        .collect()
}
