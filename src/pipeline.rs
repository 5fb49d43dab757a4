//! Periodic retrieval pipeline
//!
//! Drives the pending-record scan loop: every `scan_interval_secs` the
//! pipeline asks the service to dispatch fetch tasks for unclaimed pending
//! records. The loop is explicitly owned and stoppable; tests trigger scans
//! directly through [`RetrievalPipeline::scan_once`] instead of waiting out
//! the interval.

use crate::service::ImageFetcher;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;

/// Handle for the periodic scan loop over an [`ImageFetcher`]
pub struct RetrievalPipeline {
    service: Arc<ImageFetcher>,
}

impl RetrievalPipeline {
    /// Create a pipeline over the given service
    pub fn new(service: Arc<ImageFetcher>) -> Self {
        Self { service }
    }

    /// Run one scan cycle immediately, returning the number of fetch tasks
    /// dispatched
    pub async fn scan_once(&self) -> crate::Result<usize> {
        self.service.dispatch_pending().await
    }

    /// Run the scan loop until the service shuts down
    ///
    /// A failed scan cycle is logged and skipped; the loop itself never dies
    /// on a transient store error.
    pub async fn run(self) {
        let interval_duration = self.service.get_config().fetch.scan_interval();
        let cancel = self.service.shutdown_token();

        let mut interval = tokio::time::interval(interval_duration);
        // Scans that overlap a slow cycle are skipped, not bursted
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            interval_secs = interval_duration.as_secs(),
            "Retrieval pipeline started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.scan_once().await {
                        Ok(dispatched) if dispatched > 0 => {
                            tracing::debug!(dispatched, "Scan cycle complete");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "Scan cycle failed, will retry next tick");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    tracing::info!("Retrieval pipeline stopped");
                    break;
                }
            }
        }
    }

    /// Spawn the scan loop as a background task
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::StatusProjection;
    use crate::service::test_helpers::create_test_service;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn scan_once_completes_a_pending_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/p.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"p".to_vec()))
            .mount(&server)
            .await;

        let (service, _dir) = create_test_service().await;
        let receipt = service
            .submit(&format!("{}/p.png", server.uri()))
            .await
            .unwrap();

        let pipeline = RetrievalPipeline::new(service.clone());
        assert_eq!(pipeline.scan_once().await.unwrap(), 1);
        service.wait_for_in_flight().await;

        let status = service.get_status(receipt.id).await.unwrap();
        assert!(matches!(status, StatusProjection::Completed { .. }));
    }

    #[tokio::test]
    async fn scan_once_with_nothing_pending_dispatches_nothing() {
        let (service, _dir) = create_test_service().await;
        let pipeline = RetrievalPipeline::new(service);
        assert_eq!(pipeline.scan_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn loop_exits_on_shutdown() {
        let (service, _dir) = create_test_service().await;

        let handle = service.spawn_pipeline();
        // Give the loop a chance to start ticking
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        service.shutdown().await;
        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("pipeline task should exit after shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn periodic_loop_picks_up_submissions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tick.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tick".to_vec()))
            .mount(&server)
            .await;

        let (service, _dir) = create_test_service().await;
        let handle = service.spawn_pipeline();

        let receipt = service
            .submit(&format!("{}/tick.png", server.uri()))
            .await
            .unwrap();

        // Interval is 1s in the test config; poll until the loop gets to it
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
        loop {
            if matches!(
                service.get_status(receipt.id).await.unwrap(),
                StatusProjection::Completed { .. }
            ) {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "record was not completed by the periodic loop"
            );
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }

        service.shutdown().await;
        let _ = handle.await;
    }
}
