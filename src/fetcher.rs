//! HTTP fetcher for source images
//!
//! Retrieves bytes from a source URL as a stream under a bounded time budget,
//! without buffering the full payload in memory. Transport failures are
//! classified into [`FetchError`] variants, all of which are recoverable at
//! the pipeline level: the record stays pending and is retried next cycle.

use crate::config::FetchConfig;
use crate::error::FetchError;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;

/// HTTP fetcher wrapping a shared [`reqwest::Client`]
///
/// Cheap to clone; the underlying client pools connections across tasks.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    timeout_secs: u64,
    max_bytes: Option<u64>,
}

/// A successfully opened fetch: response metadata plus the byte stream
///
/// The stream enforces the configured size cap mid-transfer and classifies
/// mid-transfer failures as [`FetchError::Stream`].
pub struct FetchedImage {
    /// Content length declared by the source, if any
    pub content_length: Option<u64>,
    /// Content type declared by the source, if any
    pub content_type: Option<String>,
    stream: BoxStream<'static, Result<Bytes, FetchError>>,
}

impl FetchedImage {
    /// Consume the fetch, yielding the byte stream
    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes, FetchError>> {
        self.stream
    }
}

impl std::fmt::Debug for FetchedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedImage")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Create a fetcher from the fetch configuration
    pub fn new(config: &FetchConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            timeout_secs: config.request_timeout_secs,
            max_bytes: config.max_image_bytes,
        })
    }

    /// Retrieve the bytes behind `url` as a stream
    ///
    /// The URL is expected to have been validated at submission; it is not
    /// re-validated here. A non-2xx response, connection failure, timeout, or
    /// oversized declared length all fail the attempt up front; the returned
    /// stream can still fail mid-transfer with [`FetchError::Stream`] or
    /// [`FetchError::TooLarge`].
    pub async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let timeout_secs = self.timeout_secs;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::classify(e, timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let content_length = response.content_length();
        if let Some(limit) = self.max_bytes
            && let Some(declared) = content_length
            && declared > limit
        {
            return Err(FetchError::TooLarge { limit });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // The declared length is advisory; the stream re-checks the cap as
        // bytes actually arrive
        let limit = self.max_bytes;
        let mut seen: u64 = 0;
        let stream = response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => {
                    seen += bytes.len() as u64;
                    if let Some(limit) = limit
                        && seen > limit
                    {
                        Err(FetchError::TooLarge { limit })
                    } else {
                        Ok(bytes)
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        Err(FetchError::Timeout { timeout_secs })
                    } else {
                        Err(FetchError::Stream(e.to_string()))
                    }
                }
            })
            .boxed();

        Ok(FetchedImage {
            content_length,
            content_type,
            stream,
        })
    }
}
