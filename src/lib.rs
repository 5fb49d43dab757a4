//! # image-dl
//!
//! Backend library for an asynchronous image retrieval queue: clients submit
//! image URLs over a REST API, a background pipeline fetches and stores the
//! images, and clients poll for status.
//!
//! ## Design Philosophy
//!
//! image-dl is designed to be:
//! - **Asynchronous end to end** - Submission never blocks on retrieval
//! - **Crash-tolerant** - Pending work is re-derived from the record store,
//!   so interrupted fetches are retried on the next start
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//!
//! ## Quick Start
//!
//! ```no_run
//! use image_dl::{Config, ImageFetcher, run_with_shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let fetcher = ImageFetcher::new(config).await?;
//!
//!     // Runs the API server and scan loop until SIGTERM/SIGINT
//!     run_with_shutdown(fetcher).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// HTTP fetcher for source images
pub mod fetcher;
/// Periodic retrieval pipeline
pub mod pipeline;
/// Status projection over stored records
pub mod projection;
/// Core service implementation (decomposed into focused submodules)
pub mod service;
/// Blob storage backends
pub mod storage;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, FetchConfig, PersistenceConfig, StorageConfig};
pub use db::Database;
pub use error::{
    ApiError, DatabaseError, Error, ErrorDetail, FetchError, Result, StoreError, ToHttpStatus,
};
pub use pipeline::RetrievalPipeline;
pub use projection::{ListingEntry, StatusProjection};
pub use service::ImageFetcher;
pub use storage::{BlobStore, FsBlobStore};
pub use types::{ImageId, ImageStatus, StoredBlob, SubmissionReceipt};

/// Run the full service with graceful signal handling.
///
/// Spawns the API server and the retrieval pipeline, waits for a termination
/// signal, then shuts the service down.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(fetcher: ImageFetcher) -> Result<()> {
    let fetcher = std::sync::Arc::new(fetcher);

    let pipeline_handle = fetcher.spawn_pipeline();
    let api_handle = fetcher.spawn_api_server();

    wait_for_signal().await;
    fetcher.shutdown().await;

    api_handle.abort();
    let _ = pipeline_handle.await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
