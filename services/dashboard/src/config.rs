//! Dashboard configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;

use geodata_common::DatasetCatalog;

use crate::source::{ApiSource, DataSource, LocalSource};

/// Data service address used when none is configured.
pub const DEFAULT_API_URL: &str = "http://34.70.250.5";

/// Timeout applied to every call to the data service.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Where the dashboard reads its data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceMode {
    /// Read shapefiles and GeoTIFFs from the data root.
    Standalone,
    /// Call the data service over HTTP.
    Client,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub mode: SourceMode,
    pub data_root: PathBuf,
    pub api_url: String,
    pub timeout: Duration,
    pub catalog: DatasetCatalog,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::Standalone,
            data_root: PathBuf::from("."),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            catalog: DatasetCatalog::builtin(),
        }
    }
}

impl DashboardConfig {
    /// Build the data source selected by `mode`.
    pub fn build_source(&self) -> anyhow::Result<Arc<dyn DataSource>> {
        let source: Arc<dyn DataSource> = match self.mode {
            SourceMode::Standalone => Arc::new(LocalSource::new(
                self.data_root.clone(),
                self.catalog.clone(),
            )),
            SourceMode::Client => Arc::new(ApiSource::new(
                &self.api_url,
                self.timeout,
                self.catalog.clone(),
            )?),
        };
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.mode, SourceMode::Standalone);
        assert_eq!(config.api_url, "http://34.70.250.5");
        assert_eq!(config.timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_build_sources() {
        let mut config = DashboardConfig::default();
        assert!(config.build_source().unwrap().describe().contains("archivos locales"));

        config.mode = SourceMode::Client;
        config.api_url = "http://localhost:8000/".to_string();
        let source = config.build_source().unwrap();
        assert_eq!(source.describe(), "servicio de datos en http://localhost:8000");
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(SourceMode::from_str("client", true).unwrap(), SourceMode::Client);
        assert!(SourceMode::from_str("remote", true).is_err());
    }
}
