//! File access for the Assaba datasets.
//!
//! Rasters are read band 1 in full, in their native dtype. Vector layers are
//! normalised to EPSG:4326 GeoJSON with textual date/time attributes.

pub mod error;
pub mod raster;
pub mod vector;

pub use error::AccessError;
pub use raster::read_raster;
pub use vector::{read_vector, VectorLayer};
