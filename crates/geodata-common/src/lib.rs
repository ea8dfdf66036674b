//! Common types and utilities shared across the Assaba geodata services.

pub mod bbox;
pub mod codec;
pub mod crs;
pub mod dataset;
pub mod error;
pub mod raster;
pub mod time;

pub use bbox::BoundingBox;
pub use codec::{CodecError, TransferPayload};
pub use crs::CrsCode;
pub use dataset::{DatasetCatalog, DatasetDefinition, DatasetId, DatasetKind};
pub use error::{GeoDataError, GeoDataResult};
pub use raster::{Dtype, RasterData, RasterGrid, RasterProfile};
pub use time::DateRange;
