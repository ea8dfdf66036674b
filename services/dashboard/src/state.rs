//! Application state for the dashboard.

use std::sync::Arc;

use geodata_common::DatasetCatalog;

use crate::source::DataSource;

/// Shared application state. Nothing read from a source is cached.
pub struct AppState {
    pub source: Arc<dyn DataSource>,
    pub catalog: DatasetCatalog,
}

impl AppState {
    pub fn new(source: Arc<dyn DataSource>, catalog: DatasetCatalog) -> Self {
        Self { source, catalog }
    }
}
