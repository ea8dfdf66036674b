//! The HTTP data source against a live data service.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use data_api::config::DataApiConfig;
use dashboard::source::{ApiSource, DataSource, SourceError};
use geodata_common::{DatasetCatalog, DatasetId, GeoDataError, RasterData};
use test_utils::{create_landcover_grid, layout, RasterFixture, TempDataRoot};

async fn spawn_data_api(root: &TempDataRoot) -> SocketAddr {
    let state = data_api::state::AppState::new(DataApiConfig::new(root.path()), None);
    let app = data_api::build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> ApiSource {
    ApiSource::new(
        &format!("http://{}", addr),
        Duration::from_secs(20),
        DatasetCatalog::builtin(),
    )
    .unwrap()
}

#[tokio::test]
async fn raster_is_decoded_from_payload() {
    let root = TempDataRoot::new();
    let values = create_landcover_grid(9, 7);
    root.add_raster(&layout::landcover(2016), &RasterFixture::assaba(9, 7), &values);
    let addr = spawn_data_api(&root).await;

    let grid = client(addr).raster(DatasetId::Landcover, 2016).await.unwrap();
    assert_eq!(grid.shape(), (7, 9));
    match grid.data() {
        RasterData::UInt8(a) => assert_eq!(a.iter().copied().collect::<Vec<u8>>(), values),
        other => panic!("expected uint8, got {}", other.dtype()),
    }
}

#[tokio::test]
async fn error_body_becomes_warning() {
    let root = TempDataRoot::new();
    let addr = spawn_data_api(&root).await;

    let err = client(addr).vector(DatasetId::Districts).await.unwrap_err();
    assert!(err.is_warning());
    assert_eq!(
        err.to_string(),
        "No se encontró Admin_layers/Assaba_Districts_layer.shp"
    );
}

#[tokio::test]
async fn unreachable_service_is_an_error() {
    // bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr).raster(DatasetId::Gpp, 2010).await.unwrap_err();
    assert!(!err.is_warning());
    assert!(matches!(
        err,
        SourceError::Data(GeoDataError::NetworkError { .. })
    ));
}
