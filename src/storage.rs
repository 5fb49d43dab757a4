//! Blob storage for fetched images
//!
//! A [`BlobStore`] durably persists a byte stream under a freshly generated
//! unique key and returns a reference resolvable by external consumers. The
//! bundled [`FsBlobStore`] writes to a local directory with content-addressed
//! keys (sha256 of the bytes), which makes key collisions impossible under
//! concurrent writes and deduplicates identical payloads for free.

use crate::error::{FetchError, StoreError};
use crate::types::StoredBlob;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;

/// Monotonic disambiguator for in-progress temp files
static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A writable sink for fetched image bytes
///
/// Trait object at the seam so alternative backends (object storage, in-memory
/// for tests) can be plugged in without touching the pipeline.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fully consume `stream` and persist it, returning the published reference
    ///
    /// Must not publish a reference for a partial write: on any error the
    /// sink is left without a new visible blob.
    async fn store(
        &self,
        stream: BoxStream<'static, Result<Bytes, FetchError>>,
        content_type: Option<&str>,
    ) -> Result<StoredBlob, StoreError>;

    /// Backend name, for logging
    fn name(&self) -> &'static str;
}

/// Filesystem-backed blob store with content-addressed keys
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    /// Create a store rooted at `root`, publishing URLs under `public_base_url`
    ///
    /// Creates the root directory if it does not exist.
    pub async fn new(root: PathBuf, public_base_url: String) -> crate::Result<Self> {
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            crate::Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create image directory '{}': {}", root.display(), e),
            ))
        })?;

        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Map a content type to a filename extension, if it is a known image type
    fn extension_for(content_type: Option<&str>) -> Option<&'static str> {
        // Parameters like "; charset=..." are irrelevant for the mapping
        let essence = content_type?.split(';').next()?.trim();
        match essence {
            "image/jpeg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/gif" => Some("gif"),
            "image/webp" => Some("webp"),
            "image/svg+xml" => Some("svg"),
            _ => None,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let n = PART_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(format!(".{}-{}.part", std::process::id(), n))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(
        &self,
        mut stream: BoxStream<'static, Result<Bytes, FetchError>>,
        content_type: Option<&str>,
    ) -> Result<StoredBlob, StoreError> {
        let temp_path = self.temp_path();

        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("create temp file: {e}")))?;

        // Stream to the temp file while hashing; the final key is unknown
        // until the whole payload has been seen
        let mut hasher = Sha256::new();
        let mut size_bytes: u64 = 0;

        let write_result: Result<(), StoreError> = async {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(StoreError::SourceStream)?;
                hasher.update(&chunk);
                size_bytes += chunk.len() as u64;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| StoreError::WriteFailed(format!("write chunk: {e}")))?;
            }
            file.flush()
                .await
                .map_err(|e| StoreError::WriteFailed(format!("flush: {e}")))?;
            Ok(())
        }
        .await;

        if let Err(e) = write_result {
            // A partial write must never become visible
            drop(file);
            if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
                tracing::warn!(
                    path = %temp_path.display(),
                    error = %cleanup,
                    "Failed to remove partial blob file"
                );
            }
            return Err(e);
        }
        drop(file);

        let hash = hasher.finalize();
        let key = match Self::extension_for(content_type) {
            Some(ext) => format!("{:x}.{}", hash, ext),
            None => format!("{:x}", hash),
        };
        let final_path = self.root.join(&key);

        if tokio::fs::try_exists(&final_path).await.unwrap_or(false) {
            // Identical payload already stored; drop the duplicate
            let _ = tokio::fs::remove_file(&temp_path).await;
        } else if let Err(e) = tokio::fs::rename(&temp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StoreError::PublishFailed {
                key,
                reason: e.to_string(),
            });
        }

        Ok(StoredBlob {
            url: format!("{}/{}", self.public_base_url, key),
            key,
            size_bytes,
        })
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}
