//! # Meridian Analysis
//!
//! Forest-composition analysis for the Meridian GIS Platform: given a
//! `Polygon`/`MultiPolygon`, resolves which forest parcels it intersects and
//! summarises their area by canonical forest-type code.
//!
//! ```rust,no_run
//! # async fn run(pool: &meridian_db::Pool) -> meridian_analysis::Result<()> {
//! use meridian_analysis::PolygonAnalyzer;
//!
//! let analyzer = PolygonAnalyzer::new(pool);
//! let stats = analyzer.analyze(r#"{"type":"Polygon","coordinates":[]}"#).await?;
//! println!("{} parcels intersected", stats.parcel_count);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod forest;
pub mod polygon;

pub use error::{AnalysisError, Result};
pub use forest::{bucket_by_canonical_code, bucket_by_species, CanonicalCode, UNSPECIFIED_SPECIES};
pub use polygon::{
    parse_polygon_or_multipolygon, total_area_ha, ForestTypeBreakdownRow, PolygonAnalyzer,
    PolygonStats, SpeciesBreakdownRow,
};
