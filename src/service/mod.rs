//! Core service implementation split into focused submodules.
//!
//! The `ImageFetcher` struct and its methods are organized by domain:
//! - [`intake`] - Submission validation and record creation
//! - [`status`] - Status and listing queries (projection over store reads)
//! - [`fetch_task`] - Per-record fetch-and-persist tasks and dispatch
//! - [`lifecycle`] - Graceful shutdown coordination

mod fetch_task;
mod intake;
mod lifecycle;
mod status;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::storage::{BlobStore, FsBlobStore};
use crate::types::ImageId;

/// Pipeline dispatch state shared across scans and tasks
#[derive(Clone)]
pub(crate) struct PipelineState {
    /// In-flight fetch tasks keyed by record id
    ///
    /// This is the dispatch-level duplicate guard: a scan never spawns a
    /// second task for an id that is still claimed here, closing the window
    /// where scan N+1 re-selects a record scan N is still fetching. The claim
    /// is released only after the task's commit attempt has finished.
    pub(crate) in_flight:
        std::sync::Arc<tokio::sync::Mutex<std::collections::HashMap<ImageId, tokio::task::JoinHandle<()>>>>,
    /// Semaphore bounding concurrent fetches (respects max_concurrent_fetches)
    pub(crate) fetch_permits: std::sync::Arc<tokio::sync::Semaphore>,
    /// Flag cleared during shutdown so intake and dispatch stop accepting work
    pub(crate) accepting_new: std::sync::Arc<std::sync::atomic::AtomicBool>,
    /// Cancellation token observed by the periodic scan loop
    pub(crate) shutdown: tokio_util::sync::CancellationToken,
}

/// Main service instance (cloneable - all fields are Arc-wrapped)
///
/// Owns the record store, the HTTP fetcher, and the blob store, and
/// coordinates the retrieval pipeline over them.
#[derive(Clone)]
pub struct ImageFetcher {
    /// Database handle for record persistence.
    /// Public for integration tests to query record state.
    pub db: std::sync::Arc<Database>,
    /// Configuration (shared across tasks)
    pub(crate) config: std::sync::Arc<Config>,
    /// HTTP fetcher (shared connection pool)
    pub(crate) fetcher: Fetcher,
    /// Blob store (trait object for pluggable backends)
    pub(crate) store: std::sync::Arc<dyn BlobStore>,
    /// Pipeline dispatch state
    pub(crate) pipeline_state: PipelineState,
}

impl ImageFetcher {
    /// Create a new service instance with the filesystem blob store
    ///
    /// Validates the configuration, opens/creates the SQLite database and
    /// runs migrations, creates the image directory, and builds the shared
    /// HTTP client.
    pub async fn new(config: Config) -> Result<Self> {
        let store = FsBlobStore::new(
            config.storage.image_dir.clone(),
            config.storage.public_base_url.clone(),
        )
        .await?;
        Self::with_store(config, std::sync::Arc::new(store)).await
    }

    /// Create a new service instance with a custom blob store backend
    pub async fn with_store(
        config: Config,
        store: std::sync::Arc<dyn BlobStore>,
    ) -> Result<Self> {
        config.validate()?;

        let db = Database::new(&config.persistence.database_path).await?;
        let fetcher = Fetcher::new(&config.fetch)?;

        let pipeline_state = PipelineState {
            in_flight: std::sync::Arc::new(tokio::sync::Mutex::new(
                std::collections::HashMap::new(),
            )),
            fetch_permits: std::sync::Arc::new(tokio::sync::Semaphore::new(
                config.fetch.max_concurrent_fetches,
            )),
            accepting_new: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true)),
            shutdown: tokio_util::sync::CancellationToken::new(),
        };

        tracing::info!(
            blob_store = store.name(),
            scan_interval_secs = config.fetch.scan_interval_secs,
            max_concurrent_fetches = config.fetch.max_concurrent_fetches,
            "Image fetcher initialized"
        );

        Ok(Self {
            db: std::sync::Arc::new(db),
            config: std::sync::Arc::new(config),
            fetcher,
            store,
            pipeline_state,
        })
    }

    /// Get the current configuration (cheap Arc clone)
    pub fn get_config(&self) -> std::sync::Arc<Config> {
        std::sync::Arc::clone(&self.config)
    }

    /// Spawn the retrieval pipeline scan loop in a background task
    ///
    /// The loop runs until [`shutdown`](Self::shutdown) is called.
    pub fn spawn_pipeline(self: &std::sync::Arc<Self>) -> tokio::task::JoinHandle<()> {
        let pipeline = crate::pipeline::RetrievalPipeline::new(self.clone());
        pipeline.spawn()
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server runs concurrently with the pipeline and listens on the
    /// configured bind address (default: 127.0.0.1:3000).
    pub fn spawn_api_server(self: &std::sync::Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let fetcher = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(fetcher, config).await })
    }
}
