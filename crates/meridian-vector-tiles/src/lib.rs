//! # Meridian Vector Tiles
//!
//! Serves MVT tiles for the forest, cadastre, and administrative-boundary
//! table families, backed by PostGIS `ST_AsMVT` and fronted by a
//! single-flight cache keyed on the tile's fingerprint.
//!
//! ```no_run
//! # async fn example(pool: &meridian_db::Pool, cache: std::sync::Arc<impl meridian_cache::backend::CacheBackend + 'static>) -> meridian_vector_tiles::Result<()> {
//! use meridian_vector_tiles::{TileProducer, TileRequest};
//!
//! let producer = TileProducer::new(pool, cache);
//! let request = TileRequest::forest("10", "512", "384")?;
//! let mvt_bytes = producer.produce(&request).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod producer;
pub mod tile;

pub use error::{Error, Result};
pub use producer::TileProducer;
pub use tile::{TileRequest, MAX_ZOOM};
