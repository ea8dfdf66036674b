//! Dataset catalog: logical dataset names, their routes and file path templates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::GeoDataError;

/// Placeholder substituted with the requested year in raster path templates.
pub const YEAR_PLACEHOLDER: &str = "{year}";

/// Year used when a raster request does not name one.
pub const DEFAULT_YEAR: i32 = 2010;

/// The eight logical datasets served for the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetId {
    Districts,
    Region,
    Roads,
    Water,
    Landcover,
    Gpp,
    Precip,
    #[serde(alias = "pop")]
    Population,
}

impl DatasetId {
    pub const ALL: [DatasetId; 8] = [
        DatasetId::Districts,
        DatasetId::Region,
        DatasetId::Roads,
        DatasetId::Water,
        DatasetId::Landcover,
        DatasetId::Gpp,
        DatasetId::Precip,
        DatasetId::Population,
    ];

    /// Parse a dataset name as used in URLs ("pop" is accepted for population).
    pub fn parse(s: &str) -> Result<Self, GeoDataError> {
        match s.to_lowercase().as_str() {
            "districts" => Ok(DatasetId::Districts),
            "region" => Ok(DatasetId::Region),
            "roads" => Ok(DatasetId::Roads),
            "water" => Ok(DatasetId::Water),
            "landcover" => Ok(DatasetId::Landcover),
            "gpp" => Ok(DatasetId::Gpp),
            "precip" => Ok(DatasetId::Precip),
            "pop" | "population" => Ok(DatasetId::Population),
            _ => Err(GeoDataError::UnknownDataset(s.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DatasetId::Districts => "districts",
            DatasetId::Region => "region",
            DatasetId::Roads => "roads",
            DatasetId::Water => "water",
            DatasetId::Landcover => "landcover",
            DatasetId::Gpp => "gpp",
            DatasetId::Precip => "precip",
            DatasetId::Population => "population",
        }
    }

    pub fn kind(&self) -> DatasetKind {
        match self {
            DatasetId::Districts | DatasetId::Region | DatasetId::Roads | DatasetId::Water => {
                DatasetKind::Vector
            }
            _ => DatasetKind::Raster,
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a dataset is a geometry layer or a gridded raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Vector,
    Raster,
}

/// Map overlay style for vector layers (Leaflet path options).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStyle {
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    pub weight: f32,
    pub fill_opacity: f32,
}

impl LayerStyle {
    fn line(color: &str, weight: f32) -> Self {
        Self {
            color: color.to_string(),
            fill_color: None,
            weight,
            fill_opacity: 0.2,
        }
    }
}

/// Definition of a single dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDefinition {
    pub id: DatasetId,

    /// Human-readable title (Spanish, as shown in the dashboards).
    pub title: String,

    /// HTTP route exposed by the data service.
    pub route: String,

    /// Path relative to the data root, `/`-separated; rasters contain `{year}`.
    pub path_template: String,

    /// Years offered by the dashboards' selectors (empty for vector layers).
    #[serde(default)]
    pub years: Vec<i32>,

    /// Year preselected by the dashboards.
    #[serde(default)]
    pub default_year: Option<i32>,

    /// Axis/colour-bar label for raster plots.
    #[serde(default)]
    pub value_label: Option<String>,

    /// Overlay style for vector layers.
    #[serde(default)]
    pub style: Option<LayerStyle>,
}

impl DatasetDefinition {
    pub fn kind(&self) -> DatasetKind {
        self.id.kind()
    }

    /// Resolve the relative, `/`-separated path for an optional year.
    ///
    /// Rasters fall back to the dataset's `default_year`, then to
    /// [`DEFAULT_YEAR`], when no year is given.
    pub fn relative_path(&self, year: Option<i32>) -> String {
        match self.kind() {
            DatasetKind::Vector => self.path_template.clone(),
            DatasetKind::Raster => {
                let year = year.or(self.default_year).unwrap_or(DEFAULT_YEAR);
                self.path_template
                    .replace(YEAR_PLACEHOLDER, &year.to_string())
            }
        }
    }

    /// Resolve the absolute path under `root`.
    pub fn resolve(&self, root: &Path, year: Option<i32>) -> PathBuf {
        let relative = self.relative_path(year);
        relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
    }
}

/// YAML overrides for the built-in catalog, keyed by dataset name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogOverrides {
    #[serde(default)]
    pub datasets: HashMap<DatasetId, DatasetOverride>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetOverride {
    pub path_template: Option<String>,
    pub years: Option<Vec<i32>>,
    pub default_year: Option<i32>,
    pub title: Option<String>,
}

/// The full set of dataset definitions.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetCatalog {
    datasets: Vec<DatasetDefinition>,
}

impl Default for DatasetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DatasetCatalog {
    /// The Assaba datasets with their canonical file layout.
    pub fn builtin() -> Self {
        let annual: Vec<i32> = (2010..=2023).collect();

        let datasets = vec![
            DatasetDefinition {
                id: DatasetId::Districts,
                title: "Distritos Assaba".to_string(),
                route: "/admin/districts".to_string(),
                path_template: "Admin_layers/Assaba_Districts_layer.shp".to_string(),
                years: Vec::new(),
                default_year: None,
                value_label: None,
                style: Some(LayerStyle::line("#3388ff", 2.0)),
            },
            DatasetDefinition {
                id: DatasetId::Region,
                title: "Región Assaba".to_string(),
                route: "/admin/region".to_string(),
                path_template: "Admin_layers/Assaba_Region_layer.shp".to_string(),
                years: Vec::new(),
                default_year: None,
                value_label: None,
                style: Some(LayerStyle {
                    color: "black".to_string(),
                    fill_color: Some("#ffaf00".to_string()),
                    weight: 2.0,
                    fill_opacity: 0.2,
                }),
            },
            DatasetDefinition {
                id: DatasetId::Roads,
                title: "Carreteras".to_string(),
                route: "/roads".to_string(),
                path_template: "Streamwater_Line_Road_Network/Main_Road.shp".to_string(),
                years: Vec::new(),
                default_year: None,
                value_label: None,
                style: Some(LayerStyle::line("#8b0000", 2.5)),
            },
            DatasetDefinition {
                id: DatasetId::Water,
                title: "Cuerpos de Agua".to_string(),
                route: "/water".to_string(),
                path_template: "Streamwater_Line_Road_Network/Streamwater.shp".to_string(),
                years: Vec::new(),
                default_year: None,
                value_label: None,
                style: Some(LayerStyle::line("#1e90ff", 1.5)),
            },
            DatasetDefinition {
                id: DatasetId::Landcover,
                title: "Cobertura de Tierra (MODIS)".to_string(),
                route: "/rasters/landcover".to_string(),
                path_template: "Modis_Land_Cover_Data/{year}LCT.tif".to_string(),
                years: annual.clone(),
                default_year: Some(2010),
                value_label: Some("Land Cover".to_string()),
                style: None,
            },
            DatasetDefinition {
                id: DatasetId::Gpp,
                title: "Productividad Primaria (GPP)".to_string(),
                route: "/rasters/gpp".to_string(),
                path_template: "MODIS_Gross_Primary_Production_GPP/{year}_GP.tif".to_string(),
                years: annual.clone(),
                default_year: Some(2010),
                value_label: Some("GPP".to_string()),
                style: None,
            },
            DatasetDefinition {
                id: DatasetId::Precip,
                title: "Precipitación (CHIRPS)".to_string(),
                route: "/rasters/precip".to_string(),
                path_template: "Climate_Precipitation_Data/{year}R.tif".to_string(),
                years: annual,
                default_year: Some(2010),
                value_label: Some("mm/año".to_string()),
                style: None,
            },
            DatasetDefinition {
                id: DatasetId::Population,
                title: "Densidad Poblacional".to_string(),
                route: "/rasters/pop".to_string(),
                path_template: "Gridded_Population_Density_Data/mrt_pd_{year}_1km.tif"
                    .to_string(),
                years: vec![2000, 2005, 2010, 2015, 2020],
                default_year: Some(2010),
                value_label: Some("Pob/km2".to_string()),
                style: None,
            },
        ];

        Self { datasets }
    }

    /// Apply YAML overrides on top of the built-in catalog.
    pub fn with_overrides(mut self, overrides: CatalogOverrides) -> Self {
        for def in &mut self.datasets {
            if let Some(o) = overrides.datasets.get(&def.id) {
                if let Some(template) = &o.path_template {
                    def.path_template = template.clone();
                }
                if let Some(years) = &o.years {
                    def.years = years.clone();
                }
                if o.default_year.is_some() {
                    def.default_year = o.default_year;
                }
                if let Some(title) = &o.title {
                    def.title = title.clone();
                }
            }
        }
        self
    }

    pub fn get(&self, id: DatasetId) -> &DatasetDefinition {
        // Every DatasetId has exactly one definition; builtin() guarantees it.
        self.datasets
            .iter()
            .find(|d| d.id == id)
            .unwrap_or(&self.datasets[0])
    }

    pub fn all(&self) -> &[DatasetDefinition] {
        &self.datasets
    }

    pub fn of_kind(&self, kind: DatasetKind) -> impl Iterator<Item = &DatasetDefinition> {
        self.datasets.iter().filter(move |d| d.kind() == kind)
    }
}
