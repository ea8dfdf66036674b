//! Earth Engine REST client (`value:compute`).
//!
//! The per-image regional mean is sent as a serialized expression graph:
//!
//! ```text
//! ImageCollection.load(id)
//!   .filterDate(start, end)
//!   .filterBounds(roi)
//!   .map(img -> Feature(null, {date: img.system:time_start,
//!                              value: img.reduceRegion(mean, roi, scale, maxPixels)[band]}))
//!   .filter(notNull(["value"]))
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::error::PlatformError;
use crate::platform::{AnalysisPlatform, RawObservation, SeriesQuery};
use crate::roi::RoiPolygon;
use crate::variables::MAX_PIXELS;

pub const DEFAULT_API_URL: &str = "https://earthengine.googleapis.com/v1";
pub const DEFAULT_PROJECT: &str = "ivanti-453315";

const MAPPING_VAR: &str = "_MAPPING_VAR_0_0";
const ROOT_NODE: &str = "0";
const BODY_NODE: &str = "1";

#[derive(Debug, Clone)]
pub struct EarthEngineConfig {
    pub api_url: String,
    pub project: String,
    /// OAuth bearer token; requests are sent unauthenticated without one.
    pub access_token: Option<String>,
}

impl Default for EarthEngineConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            project: DEFAULT_PROJECT.to_string(),
            access_token: None,
        }
    }
}

pub struct EarthEngineClient {
    client: Client,
    config: EarthEngineConfig,
}

impl EarthEngineClient {
    /// No request timeout is set; a call lasts as long as the platform takes.
    pub fn new(config: EarthEngineConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn compute_url(&self) -> String {
        format!(
            "{}/projects/{}/value:compute",
            self.config.api_url.trim_end_matches('/'),
            self.config.project
        )
    }
}

fn constant(value: Value) -> Value {
    json!({ "constantValue": value })
}

fn invoke(function: &str, arguments: Value) -> Value {
    json!({
        "functionInvocationValue": {
            "functionName": function,
            "arguments": arguments,
        }
    })
}

fn polygon(roi: &RoiPolygon) -> Value {
    invoke(
        "GeometryConstructors.Polygon",
        json!({ "coordinates": constant(json!(roi.rings)) }),
    )
}

/// Serialize the regional-mean expression for `query`.
pub fn series_expression(query: &SeriesQuery) -> Value {
    let variable = query.variable;
    let geometry = polygon(&query.roi);

    let loaded = invoke(
        "ImageCollection.load",
        json!({ "id": constant(json!(variable.collection())) }),
    );
    let by_date = invoke(
        "Collection.filter",
        json!({
            "collection": loaded,
            "filter": invoke("Filter.dateRangeContains", json!({
                "leftValue": invoke("DateRange", json!({
                    "start": constant(json!(query.range.start_str())),
                    "end": constant(json!(query.range.end_str())),
                })),
                "rightField": constant(json!("system:time_start")),
            })),
        }),
    );
    let by_bounds = invoke(
        "Collection.filter",
        json!({
            "collection": by_date,
            "filter": invoke("Filter.intersects", json!({
                "leftField": constant(json!(".all")),
                "rightValue": geometry.clone(),
            })),
        }),
    );
    let mapped = invoke(
        "Collection.map",
        json!({
            "collection": by_bounds,
            "baseAlgorithm": {
                "functionDefinitionValue": {
                    "argumentNames": [MAPPING_VAR],
                    "body": BODY_NODE,
                }
            },
        }),
    );
    let root = invoke(
        "Collection.filter",
        json!({
            "collection": mapped,
            "filter": invoke("Filter.notNull", json!({
                "properties": constant(json!(["value"])),
            })),
        }),
    );

    let image = json!({ "argumentReference": MAPPING_VAR });
    let means = invoke(
        "Image.reduceRegion",
        json!({
            "image": image.clone(),
            "reducer": invoke("Reducer.mean", json!({})),
            "geometry": geometry,
            "scale": constant(json!(variable.scale())),
            "maxPixels": constant(json!(MAX_PIXELS)),
        }),
    );
    let body = invoke(
        "Feature",
        json!({
            "geometry": constant(Value::Null),
            "metadata": {
                "dictionaryValue": {
                    "values": {
                        "date": invoke("Element.get", json!({
                            "object": image,
                            "property": constant(json!("system:time_start")),
                        })),
                        "value": invoke("Dictionary.get", json!({
                            "dictionary": means,
                            "key": constant(json!(variable.band())),
                        })),
                    }
                }
            },
        }),
    );

    json!({
        "result": ROOT_NODE,
        "values": {
            ROOT_NODE: root,
            BODY_NODE: body,
        }
    })
}

/// Extract `(date, value)` pairs from a computed FeatureCollection.
pub fn parse_observations(response: &Value) -> Result<Vec<RawObservation>, PlatformError> {
    let features = response
        .get("result")
        .and_then(|r| r.get("features"))
        .and_then(Value::as_array)
        .ok_or_else(|| PlatformError::Response("missing result.features".to_string()))?;

    Ok(features
        .iter()
        .map(|f| {
            let props = f.get("properties");
            RawObservation {
                time_start_ms: props
                    .and_then(|p| p.get("date"))
                    .and_then(|d| d.as_i64().or_else(|| d.as_f64().map(|v| v as i64))),
                value: props.and_then(|p| p.get("value")).and_then(Value::as_f64),
            }
        })
        .collect())
}

#[async_trait]
impl AnalysisPlatform for EarthEngineClient {
    async fn regional_means(&self, query: &SeriesQuery) -> Result<Vec<RawObservation>, PlatformError> {
        let url = self.compute_url();
        let body = json!({ "expression": series_expression(query) });
        debug!(url = %url, collection = query.variable.collection(), "Submitting regional mean");

        let mut request = self.client.post(&url).json(&body);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!(url = %url, error = %e, "Earth Engine request failed");
            PlatformError::Request {
                url: url.clone(),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(url = %url, status = status.as_u16(), body = %text, "Earth Engine returned an error");
            return Err(PlatformError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: Value = response.json().await.map_err(|e| PlatformError::Request {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let observations = parse_observations(&payload)?;
        info!(
            variable = query.variable.name(),
            start = %query.range.start_str(),
            end = %query.range.end_str(),
            count = observations.len(),
            "Regional means computed"
        );
        Ok(observations)
    }

    fn name(&self) -> String {
        format!("Earth Engine ({})", self.config.project)
    }
}
