//! Status and listing queries

use super::ImageFetcher;
use crate::error::{Error, Result};
use crate::projection::{self, ListingEntry, StatusProjection};
use crate::types::ImageId;

impl ImageFetcher {
    /// Get the status projection of a single record
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub async fn get_status(&self, id: ImageId) -> Result<StatusProjection> {
        let record = self
            .db
            .get_image(id)
            .await?
            .ok_or(Error::NotFound(id))?;

        Ok(projection::project_status(
            &record,
            self.config.fetch.max_attempts,
        ))
    }

    /// List the status projections of all records, oldest first
    pub async fn list_statuses(&self) -> Result<Vec<ListingEntry>> {
        let records = self.db.list_images().await?;
        Ok(projection::project_listing(
            &records,
            self.config.fetch.max_attempts,
        ))
    }
}
