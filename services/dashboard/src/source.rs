//! Where the dashboard gets its data: local files or the data service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use geojson::FeatureCollection;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

use geodata_access::{read_raster, read_vector, AccessError};
use geodata_common::codec::{self, TransferPayload};
use geodata_common::{DatasetCatalog, DatasetId, GeoDataError, RasterGrid};

/// Failure to obtain a dataset.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The dataset is unavailable; shown to the user as a warning.
    #[error("{0}")]
    Warning(String),

    #[error(transparent)]
    Data(#[from] GeoDataError),
}

impl SourceError {
    pub fn is_warning(&self) -> bool {
        matches!(self, SourceError::Warning(_))
    }
}

/// A provider of vector layers and yearly rasters.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn vector(&self, id: DatasetId) -> Result<FeatureCollection, SourceError>;

    async fn raster(&self, id: DatasetId, year: i32) -> Result<RasterGrid, SourceError>;

    /// Short description for logs and the page footer.
    fn describe(&self) -> String;
}

/// Reads the files directly from a data root.
pub struct LocalSource {
    data_root: PathBuf,
    catalog: DatasetCatalog,
}

impl LocalSource {
    pub fn new(data_root: impl Into<PathBuf>, catalog: DatasetCatalog) -> Self {
        Self {
            data_root: data_root.into(),
            catalog,
        }
    }

    async fn load<T, F>(&self, id: DatasetId, year: Option<i32>, reader: F) -> Result<T, SourceError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, AccessError> + Send + 'static,
    {
        let def = self.catalog.get(id);
        let relative = def.relative_path(year);
        let path = def.resolve(&self.data_root, year);

        let result = tokio::task::spawn_blocking(move || reader(&path))
            .await
            .map_err(|e| GeoDataError::InternalError(format!("load task failed: {}", e)))?;

        result.map_err(|e| match e {
            AccessError::NotFound(_) => {
                warn!(dataset = %id, path = %relative, "Dataset file not found");
                SourceError::Warning(GeoDataError::FileNotFound(relative).to_string())
            }
            other => {
                error!(dataset = %id, path = %relative, error = %other, "Failed to load dataset");
                SourceError::Data(other.into())
            }
        })
    }
}

#[async_trait]
impl DataSource for LocalSource {
    async fn vector(&self, id: DatasetId) -> Result<FeatureCollection, SourceError> {
        let layer = self.load(id, None, read_vector).await?;
        Ok(layer.collection)
    }

    async fn raster(&self, id: DatasetId, year: i32) -> Result<RasterGrid, SourceError> {
        self.load(id, Some(year), read_raster).await
    }

    fn describe(&self) -> String {
        format!("archivos locales en {}", self.data_root.display())
    }
}

/// Calls the data service over HTTP.
pub struct ApiSource {
    base_url: String,
    client: Client,
    catalog: DatasetCatalog,
}

impl ApiSource {
    pub fn new(base_url: &str, timeout: Duration, catalog: DatasetCatalog) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            catalog,
        })
    }

    /// GET a dataset route; an `{"error": ...}` body becomes a warning.
    async fn get_json(&self, id: DatasetId, year: Option<i32>) -> Result<Value, SourceError> {
        let url = format!("{}{}", self.base_url, self.catalog.get(id).route);

        let mut request = self.client.get(&url);
        if let Some(year) = year {
            request = request.query(&[("year", year)]);
        }

        let response = request.send().await.map_err(|e| request_error(&url, e))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(url = %url, status = status.as_u16(), "Data service returned an error status");
            return Err(GeoDataError::RemoteQueryError(format!(
                "Error {} al llamar {}: {}",
                status.as_u16(),
                url,
                text
            ))
            .into());
        }

        let body: Value = response.json().await.map_err(|e| request_error(&url, e))?;
        if let Some(message) = body.get("error").and_then(Value::as_str) {
            warn!(url = %url, message, "Data service reported an unavailable dataset");
            return Err(SourceError::Warning(message.to_string()));
        }
        Ok(body)
    }
}

fn request_error(url: &str, err: reqwest::Error) -> SourceError {
    error!(url = %url, error = %err, "Request to data service failed");
    if err.is_timeout() {
        return GeoDataError::Timeout.into();
    }
    GeoDataError::NetworkError {
        url: url.to_string(),
        message: err.to_string(),
    }
    .into()
}

#[async_trait]
impl DataSource for ApiSource {
    async fn vector(&self, id: DatasetId) -> Result<FeatureCollection, SourceError> {
        let body = self.get_json(id, None).await?;
        serde_json::from_value(body)
            .map_err(|e| GeoDataError::DecodeError(format!("invalid GeoJSON for {}: {}", id, e)).into())
    }

    async fn raster(&self, id: DatasetId, year: i32) -> Result<RasterGrid, SourceError> {
        let body = self.get_json(id, Some(year)).await?;
        let payload: TransferPayload = serde_json::from_value(body)
            .map_err(|e| GeoDataError::DecodeError(format!("invalid payload for {}: {}", id, e)))?;
        let grid = codec::decode(&payload).map_err(GeoDataError::from)?;
        Ok(grid)
    }

    fn describe(&self) -> String {
        format!("servicio de datos en {}", self.base_url)
    }
}
