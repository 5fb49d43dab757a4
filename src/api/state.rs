//! Application state for the API server

use crate::{Config, ImageFetcher};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The main ImageFetcher instance
    pub fetcher: Arc<ImageFetcher>,

    /// Configuration (read access)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(fetcher: Arc<ImageFetcher>, config: Arc<Config>) -> Self {
        Self { fetcher, config }
    }
}
