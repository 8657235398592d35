//! LiDAR canopy-height-model pipeline for the Meridian GIS Platform.
//!
//! Given a submitted polygon, this crate queries an external WFS-style
//! tile index for surface-model (MNS) and terrain-model (MNT) coverage,
//! fetches and decodes the matched raster pairs, computes a canopy-height
//! mosaic, and renders a representative tile as a PNG overlay.
//!
//! The GeoTIFF reader in [`geotiff`] is self-contained: it parses the
//! TIFF strip/tile layout and GeoKeys directly rather than depending on
//! an external TIFF/GDAL binding.

pub mod bbox;
pub mod chm;
pub mod config;
pub mod disk_cache;
pub mod error;
pub mod geometry;
pub mod geotiff;
pub mod image_store;
pub mod index_client;
pub mod pipeline;
pub mod raster;
pub mod raster_client;
pub mod render;

pub use bbox::Envelope;
pub use chm::{ChmTile, MosaicStats};
pub use config::LidarConfig;
pub use error::{LidarError, Result};
pub use pipeline::{LidarPipeline, LidarResult};
pub use raster::Raster;
