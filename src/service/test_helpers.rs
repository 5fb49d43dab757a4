//! Shared helpers for service-level tests

use super::ImageFetcher;
use crate::config::Config;
use std::sync::Arc;

/// Build a service instance backed by a temp directory
///
/// The returned `TempDir` owns the database and the blob directory; keep it
/// alive for the duration of the test.
pub(crate) async fn create_test_service() -> (Arc<ImageFetcher>, tempfile::TempDir) {
    create_test_service_with(|_| {}).await
}

/// Same as [`create_test_service`], with a config tweak applied first
pub(crate) async fn create_test_service_with(
    tweak: impl FnOnce(&mut Config),
) -> (Arc<ImageFetcher>, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.persistence.database_path = temp_dir.path().join("test.db");
    config.storage.image_dir = temp_dir.path().join("images");
    config.fetch.request_timeout_secs = 2;
    config.fetch.scan_interval_secs = 1;
    tweak(&mut config);

    let service = ImageFetcher::new(config).await.unwrap();
    (Arc::new(service), temp_dir)
}
