//! Submission intake: URL validation and record creation

use super::ImageFetcher;
use crate::db::NewImage;
use crate::error::{Error, Result};
use crate::types::SubmissionReceipt;
use url::Url;

impl ImageFetcher {
    /// Accept a new source URL for retrieval
    ///
    /// Validates the URL, creates a pending record, and returns a receipt
    /// with the record's poll URL. The image itself is retrieved later by the
    /// scan loop; this call never fetches.
    pub async fn submit(&self, source_url: &str) -> Result<SubmissionReceipt> {
        if !self
            .pipeline_state
            .accepting_new
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(Error::ShuttingDown);
        }

        let source_url = validate_source_url(source_url)?;

        let id = self
            .db
            .insert_image(&NewImage {
                source_url: source_url.clone(),
            })
            .await?;

        tracing::info!(image_id = %id, url = %source_url, "Image submitted");

        Ok(SubmissionReceipt {
            id,
            poll_url: format!("/images/{id}"),
        })
    }
}

/// Validate a submitted source URL, returning it in normalized string form
///
/// Only absolute http/https URLs with a host are accepted. Rejection here is
/// the only place malformed input is caught; downstream fetch code assumes a
/// well-formed URL.
fn validate_source_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("URL must not be empty".to_string()));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|e| Error::Validation(format!("Invalid URL '{trimmed}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::Validation(format!(
                "Unsupported URL scheme '{other}': only http and https are accepted"
            )));
        }
    }

    if parsed.host_str().is_none() {
        return Err(Error::Validation(format!(
            "URL '{trimmed}' has no host"
        )));
    }

    Ok(parsed.to_string())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_source_url("http://example.com/a.jpg").is_ok());
        assert!(validate_source_url("https://example.com/a.jpg").is_ok());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let url = validate_source_url("  https://example.com/a.jpg \n").unwrap();
        assert_eq!(url, "https://example.com/a.jpg");
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert!(matches!(
            validate_source_url(""),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_source_url("   "),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn rejects_non_http_schemes() {
        for url in ["ftp://example.com/a.jpg", "file:///etc/passwd", "data:image/png;base64,AAAA"] {
            assert!(
                matches!(validate_source_url(url), Err(Error::Validation(_))),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_relative_and_garbage() {
        for url in ["/relative/path.jpg", "not a url", "example.com/a.jpg"] {
            assert!(
                matches!(validate_source_url(url), Err(Error::Validation(_))),
                "{url} should be rejected"
            );
        }
    }
}
