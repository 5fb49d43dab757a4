//! Pending-record dispatch and per-record fetch-and-persist tasks

use super::ImageFetcher;
use crate::db::ImageRecord;
use crate::error::Result;
use crate::types::ImageId;

impl ImageFetcher {
    /// Scan for pending records and spawn a fetch task for each unclaimed one
    ///
    /// Returns the number of tasks spawned. Records already claimed by an
    /// in-flight task are skipped, so overlapping scans never double-dispatch
    /// the same record.
    pub(crate) async fn dispatch_pending(&self) -> Result<usize> {
        if !self
            .pipeline_state
            .accepting_new
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Ok(0);
        }

        let pending = self
            .db
            .list_pending_images(self.config.fetch.max_attempts)
            .await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let mut dispatched = 0;
        // The claim map lock is held across the contains-check and the handle
        // insert, so the spawned task's own release cannot interleave
        let mut in_flight = self.pipeline_state.in_flight.lock().await;
        for record in pending {
            let id = ImageId(record.id);
            if in_flight.contains_key(&id) {
                continue;
            }

            let service = self.clone();
            let handle = tokio::spawn(async move {
                service.run_fetch_task(record).await;
            });
            in_flight.insert(id, handle);
            dispatched += 1;
        }
        drop(in_flight);

        if dispatched > 0 {
            tracing::debug!(count = dispatched, "Dispatched pending fetches");
        }
        Ok(dispatched)
    }

    /// Run one fetch-and-persist attempt, then release the record's claim
    async fn run_fetch_task(&self, record: ImageRecord) {
        let id = ImageId(record.id);

        // Bound concurrent transfers; permits are released on drop
        let _permit = match self
            .pipeline_state
            .fetch_permits
            .clone()
            .acquire_owned()
            .await
        {
            Ok(permit) => permit,
            Err(_) => {
                // Semaphore closed, nothing to do
                self.release_claim(id).await;
                return;
            }
        };

        match self.fetch_and_persist(&record).await {
            Ok(true) => {
                tracing::info!(image_id = %id, url = %record.source_url, "Image stored");
            }
            Ok(false) => {
                tracing::debug!(
                    image_id = %id,
                    "Fetch finished but record was already completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    image_id = %id,
                    url = %record.source_url,
                    error = %e,
                    "Fetch attempt failed, record stays pending"
                );
                if let Err(db_err) = self.db.record_fetch_failure(id, &e.to_string()).await {
                    tracing::error!(
                        image_id = %id,
                        error = %db_err,
                        "Failed to record fetch failure"
                    );
                }
            }
        }

        self.release_claim(id).await;
    }

    /// Fetch the source image, persist it, and commit the reference
    ///
    /// Returns `Ok(true)` if this task's result was committed, `Ok(false)` if
    /// the record had already been completed by the time the blob was stored.
    /// In the latter case the freshly stored blob is simply left in place;
    /// content addressing makes it either a duplicate of the winner's blob or
    /// an unreferenced orphan, never a conflicting reference.
    async fn fetch_and_persist(&self, record: &ImageRecord) -> Result<bool> {
        let fetched = self.fetcher.fetch(&record.source_url).await?;
        let content_type = fetched.content_type.clone();

        let blob = self
            .store
            .store(fetched.into_stream(), content_type.as_deref())
            .await?;

        tracing::debug!(
            image_id = record.id,
            key = %blob.key,
            size_bytes = blob.size_bytes,
            "Blob stored"
        );

        let committed = self
            .db
            .complete_if_pending(ImageId(record.id), &blob.url)
            .await?;
        Ok(committed)
    }

    async fn release_claim(&self, id: ImageId) {
        self.pipeline_state.in_flight.lock().await.remove(&id);
    }

    /// Number of fetch tasks currently claimed and running
    pub async fn in_flight_count(&self) -> usize {
        self.pipeline_state.in_flight.lock().await.len()
    }

    /// Wait for every in-flight fetch task to finish
    ///
    /// Used by shutdown and by tests that need deterministic completion of a
    /// dispatched scan.
    pub async fn wait_for_in_flight(&self) {
        loop {
            let handle = {
                let mut in_flight = self.pipeline_state.in_flight.lock().await;
                match in_flight.keys().next().copied() {
                    Some(id) => in_flight.remove(&id),
                    None => return,
                }
            };
            if let Some(handle) = handle {
                if let Err(e) = handle.await {
                    if !e.is_cancelled() {
                        tracing::error!(error = %e, "Fetch task panicked");
                    }
                }
            }
        }
    }
}
