//! Dataset catalog listing.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use serde::Serialize;

use geodata_common::{DatasetDefinition, DatasetKind};

use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub title: String,
    pub kind: DatasetKind,
    pub route: String,
    pub path_template: String,

    /// Years offered for the dataset (empty for vector layers).
    pub years: Vec<i32>,

    /// Offered years whose file exists under the data root.
    pub available_years: Vec<i32>,

    /// For vector layers, whether the file exists.
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct DatasetList {
    pub datasets: Vec<DatasetSummary>,
}

fn summarize(state: &AppState, def: &DatasetDefinition) -> DatasetSummary {
    let available_years: Vec<i32> = def
        .years
        .iter()
        .copied()
        .filter(|year| def.resolve(&state.data_root, Some(*year)).is_file())
        .collect();

    let available = match def.kind() {
        DatasetKind::Vector => def.resolve(&state.data_root, None).is_file(),
        DatasetKind::Raster => !available_years.is_empty(),
    };

    DatasetSummary {
        name: def.id.name().to_string(),
        title: def.title.clone(),
        kind: def.kind(),
        route: def.route.clone(),
        path_template: def.path_template.clone(),
        years: def.years.clone(),
        available_years,
        available,
    }
}

/// GET /datasets - catalog with on-disk availability
pub async fn list_datasets_handler(Extension(state): Extension<Arc<AppState>>) -> Json<DatasetList> {
    metrics::record_request("datasets");
    let datasets = state
        .catalog
        .all()
        .iter()
        .map(|def| summarize(&state, def))
        .collect();
    Json(DatasetList { datasets })
}
