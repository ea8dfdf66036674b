//! Data service configuration: data root and dataset catalog.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use geodata_common::dataset::CatalogOverrides;
use geodata_common::DatasetCatalog;

/// Resolved configuration for the data service.
#[derive(Debug, Clone)]
pub struct DataApiConfig {
    /// Directory that dataset path templates are resolved against.
    pub data_root: PathBuf,

    pub catalog: DatasetCatalog,
}

impl DataApiConfig {
    /// Built-in catalog rooted at `data_root`.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            catalog: DatasetCatalog::builtin(),
        }
    }

    /// Build the configuration, applying the optional YAML catalog overrides.
    ///
    /// A datasets file that does not exist is ignored with a warning.
    pub fn load(data_root: impl Into<PathBuf>, datasets_file: Option<&Path>) -> Result<Self> {
        let mut config = Self::new(data_root);

        let Some(file) = datasets_file else {
            return Ok(config);
        };

        if !file.exists() {
            tracing::warn!(
                "Dataset overrides file {} does not exist, using built-in catalog",
                file.display()
            );
            return Ok(config);
        }

        let content = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read: {:?}", file))?;
        let overrides: CatalogOverrides = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse dataset overrides: {:?}", file))?;

        tracing::info!(
            "Loaded {} dataset overrides from {:?}",
            overrides.datasets.len(),
            file
        );
        config.catalog = config.catalog.with_overrides(overrides);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geodata_common::DatasetId;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = DataApiConfig::load("/data", None).unwrap();
        assert_eq!(config.data_root, PathBuf::from("/data"));
        assert_eq!(
            config.catalog.get(DatasetId::Water).path_template,
            "Streamwater_Line_Road_Network/Streamwater.shp"
        );
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = DataApiConfig::load(".", Some(Path::new("/nonexistent/datasets.yaml")));
        assert!(config.is_ok());
    }

    #[test]
    fn test_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "datasets:\n  districts:\n    path_template: \"admin/districts.geojson\""
        )
        .unwrap();

        let config = DataApiConfig::load(".", Some(file.path())).unwrap();
        assert_eq!(
            config.catalog.get(DatasetId::Districts).relative_path(None),
            "admin/districts.geojson"
        );
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "datasets: [not, a, map").unwrap();
        assert!(DataApiConfig::load(".", Some(file.path())).is_err());
    }
}
