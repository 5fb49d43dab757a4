//! Core types for image-dl

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a retrieval record
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct ImageId(pub i64);

impl ImageId {
    /// Create a new ImageId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ImageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ImageId> for i64 {
    fn from(id: ImageId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ImageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for ImageId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for ImageId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for ImageId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Derived retrieval status
///
/// Status is never stored directly; it is derived from the persisted record:
/// `Completed` when a stored reference is present, `Failed` when a configured
/// attempt budget has been exhausted, otherwise `Pending`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    /// Awaiting retrieval (or awaiting the next retry)
    Pending,
    /// Fetched and persisted to blob storage
    Completed,
    /// Attempt budget exhausted without success
    Failed,
}

impl std::fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageStatus::Pending => write!(f, "pending"),
            ImageStatus::Completed => write!(f, "completed"),
            ImageStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Handle returned to the submitter of a new retrieval request
///
/// The `poll_url` is a stable locator for the status-query endpoint, not the
/// final blob location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubmissionReceipt {
    /// Identifier of the created record
    pub id: ImageId,
    /// Relative URL at which the record's status can be polled
    pub poll_url: String,
}

/// Reference to a blob persisted by a [`BlobStore`](crate::storage::BlobStore)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredBlob {
    /// Storage key (content-addressed hash plus extension)
    pub key: String,
    /// Externally resolvable URL for the stored bytes
    pub url: String,
    /// Number of bytes written
    pub size_bytes: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn image_id_parses_and_displays() {
        let id: ImageId = "42".parse().unwrap();
        assert_eq!(id, ImageId(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn image_id_serializes_transparently() {
        let json = serde_json::to_string(&ImageId(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ImageStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&ImageStatus::Completed).unwrap(),
            "\"completed\""
        );
        assert_eq!(
            serde_json::to_string(&ImageStatus::Failed).unwrap(),
            "\"failed\""
        );
    }
}
