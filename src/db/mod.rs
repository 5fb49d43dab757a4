//! Database layer for image-dl
//!
//! Handles SQLite persistence for retrieval records.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`images`] — Retrieval record CRUD and the atomic completion update

use sqlx::{FromRow, sqlite::SqlitePool};

mod images;
mod migrations;

/// New retrieval record to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewImage {
    /// Source URL the image will be fetched from
    pub source_url: String,
}

/// Retrieval record from database
///
/// A record is append-only plus one terminal update: `stored_ref` and
/// `finished_at` are set together, exactly once, by the conditional
/// completion update. Status is derived, never stored.
#[derive(Debug, Clone, FromRow)]
pub struct ImageRecord {
    /// Unique database ID
    pub id: i64,
    /// Source URL the image is fetched from (immutable after creation)
    pub source_url: String,
    /// Externally resolvable URL of the stored blob; NULL until completed
    pub stored_ref: Option<String>,
    /// Unix timestamp when the record was created
    pub created_at: i64,
    /// Unix timestamp when `stored_ref` was first set
    pub finished_at: Option<i64>,
    /// Number of fetch attempts so far
    pub attempts: i64,
    /// Most recent fetch failure, for observability
    pub last_error: Option<String>,
}

impl ImageRecord {
    /// Whether this record has been fetched and persisted
    pub fn is_completed(&self) -> bool {
        self.stored_ref.is_some()
    }
}

/// Database handle for image-dl
pub struct Database {
    pool: SqlitePool,
}
