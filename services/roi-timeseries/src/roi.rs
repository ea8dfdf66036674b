//! Region of interest: parsing, per-session context and the fallback region.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use geojson::GeoJson;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use geodata_common::BoundingBox;

use crate::error::RoiError;

pub type SessionId = Uuid;

/// Shown when an analysis runs without a drawn ROI.
pub const DEFAULT_ROI_WARNING: &str = "No se ha definido una ROI. Se usará una región por defecto.";

/// Rectangle used when no ROI has been drawn, `[min_lon, min_lat, max_lon, max_lat]`.
pub fn default_roi_bounds() -> BoundingBox {
    BoundingBox::new(-16.0, 16.0, -14.0, 18.0)
}

/// A polygon in GeoJSON coordinate order: exterior ring first, then holes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiPolygon {
    pub rings: Vec<Vec<[f64; 2]>>,
}

impl RoiPolygon {
    pub fn rectangle(bbox: &BoundingBox) -> Self {
        Self {
            rings: vec![bbox.to_ring()],
        }
    }

    /// Take the first polygon out of a FeatureCollection, Feature or bare
    /// geometry.
    pub fn from_geojson(value: Value) -> Result<Self, RoiError> {
        let geojson = GeoJson::from_json_value(value)
            .map_err(|e| RoiError::InvalidGeometry(e.to_string()))?;

        let geometry = match geojson {
            GeoJson::Geometry(g) => Some(g),
            GeoJson::Feature(f) => f.geometry,
            GeoJson::FeatureCollection(fc) => fc
                .features
                .into_iter()
                .filter_map(|f| f.geometry)
                .find(|g| {
                    matches!(
                        g.value,
                        geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_)
                    )
                }),
        }
        .ok_or_else(|| RoiError::InvalidGeometry("no polygon found".to_string()))?;

        let rings = match geometry.value {
            geojson::Value::Polygon(rings) => rings,
            geojson::Value::MultiPolygon(polygons) => polygons
                .into_iter()
                .next()
                .ok_or_else(|| RoiError::InvalidGeometry("empty MultiPolygon".to_string()))?,
            _ => return Err(RoiError::InvalidGeometry("geometry is not a polygon".to_string())),
        };

        let rings = rings
            .into_iter()
            .map(|ring| parse_ring(&ring))
            .collect::<Result<Vec<_>, _>>()?;
        if rings.is_empty() {
            return Err(RoiError::InvalidGeometry("polygon has no rings".to_string()));
        }
        Ok(Self { rings })
    }

    pub fn exterior(&self) -> &[[f64; 2]] {
        self.rings.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn bounds(&self) -> BoundingBox {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for [x, y] in self.exterior() {
            min_x = min_x.min(*x);
            min_y = min_y.min(*y);
            max_x = max_x.max(*x);
            max_y = max_y.max(*y);
        }
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }

    pub fn to_geometry(&self) -> geojson::Geometry {
        let rings = self
            .rings
            .iter()
            .map(|ring| ring.iter().map(|[x, y]| vec![*x, *y]).collect())
            .collect();
        geojson::Geometry::new(geojson::Value::Polygon(rings))
    }
}

/// Validate a ring and close it if needed.
fn parse_ring(ring: &[Vec<f64>]) -> Result<Vec<[f64; 2]>, RoiError> {
    let mut out = Vec::with_capacity(ring.len() + 1);
    for position in ring {
        match position.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => out.push([*x, *y]),
            _ => {
                return Err(RoiError::InvalidGeometry(format!(
                    "invalid position {:?}",
                    position
                )))
            }
        }
    }
    if out.first() != out.last() {
        if let Some(first) = out.first().copied() {
            out.push(first);
        }
    }
    if out.len() < 4 {
        return Err(RoiError::InvalidGeometry(
            "a ring needs at least three distinct positions".to_string(),
        ));
    }
    Ok(out)
}

/// Where the geometry of an analysis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoiSource {
    Drawn,
    Default,
}

/// ROI state of one session, passed explicitly into the analysis screens.
#[derive(Debug, Clone, Default)]
pub struct RoiContext {
    pub roi: Option<RoiPolygon>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The geometry an analysis runs against.
#[derive(Debug, Clone)]
pub struct ResolvedRoi {
    pub polygon: RoiPolygon,
    pub source: RoiSource,
    pub warning: Option<String>,
}

impl RoiContext {
    pub fn with_roi(polygon: RoiPolygon) -> Self {
        Self {
            roi: Some(polygon),
            updated_at: Some(Utc::now()),
        }
    }

    /// The drawn ROI, or the default rectangle plus a warning.
    pub fn resolve(&self) -> ResolvedRoi {
        match &self.roi {
            Some(polygon) => ResolvedRoi {
                polygon: polygon.clone(),
                source: RoiSource::Drawn,
                warning: None,
            },
            None => ResolvedRoi {
                polygon: RoiPolygon::rectangle(&default_roi_bounds()),
                source: RoiSource::Default,
                warning: Some(DEFAULT_ROI_WARNING.to_string()),
            },
        }
    }
}

/// Idle time after which a session is dropped.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 12 * 60;

/// Sessions kept at most; the least recently used one goes first.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug, Clone)]
struct Session {
    ctx: RoiContext,
    created_at: DateTime<Utc>,
    last_used: DateTime<Utc>,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            ctx: RoiContext::default(),
            created_at: now,
            last_used: now,
        }
    }
}

/// In-memory ROI state keyed by session.
///
/// Every access refreshes `last_used`. `create` drops sessions idle for
/// longer than the TTL and then evicts the least recently used ones until
/// there is room for the new session.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(
            Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            DEFAULT_MAX_SESSIONS,
        )
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub async fn create(&self) -> SessionId {
        self.create_at(Utc::now()).await
    }

    async fn create_at(&self, now: DateTime<Utc>) -> SessionId {
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, s| now - s.last_used <= self.ttl);
        let expired = before - sessions.len();

        let mut evicted = 0;
        while sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| (s.last_used, s.created_at))
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    evicted += 1;
                }
                None => break,
            }
        }
        if expired + evicted > 0 {
            debug!(expired, evicted, remaining = sessions.len(), "Dropped idle sessions");
        }

        let id = Uuid::new_v4();
        sessions.insert(id, Session::new(now));
        id
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn context(&self, id: SessionId) -> Result<RoiContext, RoiError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(RoiError::SessionNotFound(id))?;
        session.last_used = Utc::now();
        Ok(session.ctx.clone())
    }

    pub async fn set_roi(&self, id: SessionId, polygon: RoiPolygon) -> Result<(), RoiError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(RoiError::SessionNotFound(id))?;
        session.ctx = RoiContext::with_roi(polygon);
        session.last_used = Utc::now();
        Ok(())
    }

    /// Remove the session's ROI. Returns whether one was set.
    pub async fn clear_roi(&self, id: SessionId) -> Result<bool, RoiError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(RoiError::SessionNotFound(id))?;
        let now = Utc::now();
        session.ctx.updated_at = Some(now);
        session.last_used = now;
        Ok(session.ctx.roi.take().is_some())
    }
}
