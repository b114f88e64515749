use std::sync::Arc;

use crate::db::DatasetStore;

const DEFAULT_UPLOAD_LIMIT: usize = 50 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DatasetStore>,
    /// Request body limit for export uploads
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Creates state backed by the given dataset store
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self {
            store,
            max_upload_bytes: DEFAULT_UPLOAD_LIMIT,
        }
    }

    pub fn with_upload_limit(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}
