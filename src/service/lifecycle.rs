//! Graceful shutdown coordination

use super::ImageFetcher;
use std::time::Duration;

/// How long shutdown waits for in-flight fetches before giving up on them
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

impl ImageFetcher {
    /// Shut the service down gracefully
    ///
    /// Stops accepting submissions and new dispatches, stops the scan loop,
    /// and waits up to 30 seconds for in-flight fetch tasks to finish their
    /// commit attempts. Tasks still running after the grace period are
    /// abandoned; their records stay pending and are picked up on the next
    /// start.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down image fetcher");

        self.pipeline_state
            .accepting_new
            .store(false, std::sync::atomic::Ordering::SeqCst);
        self.pipeline_state.shutdown.cancel();

        let remaining = self.in_flight_count().await;
        if remaining > 0 {
            tracing::info!(count = remaining, "Waiting for in-flight fetches");
            if tokio::time::timeout(SHUTDOWN_GRACE, self.wait_for_in_flight())
                .await
                .is_err()
            {
                tracing::warn!(
                    "Shutdown grace period elapsed with fetches still running"
                );
            }
        }

        tracing::info!("Image fetcher shut down");
    }

    /// Token cancelled when shutdown begins
    pub fn shutdown_token(&self) -> tokio_util::sync::CancellationToken {
        self.pipeline_state.shutdown.clone()
    }
}
