//! Retrieval record CRUD operations and the atomic completion update.

use crate::error::DatabaseError;
use crate::types::ImageId;
use crate::{Error, Result};

use super::{Database, ImageRecord, NewImage};

const RECORD_COLUMNS: &str =
    "id, source_url, stored_ref, created_at, finished_at, attempts, last_error";

impl Database {
    /// Insert a new retrieval record
    pub async fn insert_image(&self, image: &NewImage) -> Result<ImageId> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO images (source_url, created_at, attempts)
            VALUES (?, ?, 0)
            "#,
        )
        .bind(&image.source_url)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert image: {}",
                e
            )))
        })?;

        Ok(ImageId(result.last_insert_rowid()))
    }

    /// Get a retrieval record by ID
    pub async fn get_image(&self, id: ImageId) -> Result<Option<ImageRecord>> {
        let row = sqlx::query_as::<_, ImageRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM images WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get image: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// List all retrieval records in insertion order
    pub async fn list_images(&self) -> Result<Vec<ImageRecord>> {
        let rows = sqlx::query_as::<_, ImageRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM images ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list images: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// List records still awaiting retrieval
    ///
    /// Returns records with no stored reference. When `max_attempts` is set,
    /// records that have exhausted their attempt budget are excluded; they
    /// project as failed and are no longer scanned.
    pub async fn list_pending_images(
        &self,
        max_attempts: Option<u32>,
    ) -> Result<Vec<ImageRecord>> {
        let rows = match max_attempts {
            Some(max) => {
                sqlx::query_as::<_, ImageRecord>(&format!(
                    r#"
                    SELECT {RECORD_COLUMNS} FROM images
                    WHERE stored_ref IS NULL AND attempts < ?
                    ORDER BY id ASC
                    "#
                ))
                .bind(i64::from(max))
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, ImageRecord>(&format!(
                    r#"
                    SELECT {RECORD_COLUMNS} FROM images
                    WHERE stored_ref IS NULL
                    ORDER BY id ASC
                    "#
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list pending images: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Atomically complete a record if it is still pending
    ///
    /// This is the single commit point for the retrieval pipeline. The update
    /// only applies while `stored_ref` is still absent, so a concurrent
    /// duplicate task's commit for the same id is a no-op. `stored_ref` and
    /// `finished_at` are set in the same statement, preserving the invariant
    /// that one is set if and only if the other is.
    ///
    /// Returns `true` if this call performed the completion, `false` if the
    /// record was already completed (or does not exist).
    pub async fn complete_if_pending(&self, id: ImageId, stored_ref: &str) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            UPDATE images
            SET stored_ref = ?, finished_at = ?
            WHERE id = ? AND stored_ref IS NULL
            "#,
        )
        .bind(stored_ref)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to complete image: {}",
                e
            )))
        })?;

        Ok(result.rows_affected() == 1)
    }

    /// Record a failed fetch attempt
    ///
    /// Increments the attempt counter and stores the failure message. Guarded
    /// on the record still being pending so a late-arriving failure from a
    /// racing task never mutates a completed record.
    pub async fn record_fetch_failure(&self, id: ImageId, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE images
            SET attempts = attempts + 1, last_error = ?
            WHERE id = ? AND stored_ref IS NULL
            "#,
        )
        .bind(error)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to record fetch failure: {}",
                e
            )))
        })?;

        Ok(())
    }
}
