//! Application state for the data service.

use std::path::PathBuf;

use metrics_exporter_prometheus::PrometheusHandle;

use geodata_common::DatasetCatalog;

use crate::config::DataApiConfig;

/// Shared application state.
///
/// Requests are stateless; nothing read from disk is kept here.
pub struct AppState {
    pub data_root: PathBuf,

    pub catalog: DatasetCatalog,

    /// Renders the Prometheus exposition; absent when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: DataApiConfig, prometheus: Option<PrometheusHandle>) -> Self {
        Self {
            data_root: config.data_root,
            catalog: config.catalog,
            prometheus,
        }
    }
}
