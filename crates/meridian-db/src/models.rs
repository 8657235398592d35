//! Database models for the tile and polygon-analysis service.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Closed set of administrative boundary layers servable as tiles.
///
/// A value of this type, never a raw string, is what reaches table-name
/// interpolation; [`AdminLayer::parse`] is the only way to obtain one from
/// untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminLayer {
    /// French administrative regions.
    Regions,
    /// French departements.
    Departements,
    /// French communes.
    Communes,
}

impl AdminLayer {
    /// Parses a layer name against the closed allow-list.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "regions" => Some(Self::Regions),
            "departements" => Some(Self::Departements),
            "communes" => Some(Self::Communes),
            _ => None,
        }
    }

    /// The backing table name. A literal, never string-interpolated from user input.
    pub fn table(self) -> &'static str {
        match self {
            Self::Regions => "admin_regions",
            Self::Departements => "admin_departements",
            Self::Communes => "admin_communes",
        }
    }

    /// The MVT layer name to emit, matching the externally-facing route segment.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regions => "regions",
            Self::Departements => "departements",
            Self::Communes => "communes",
        }
    }
}

/// A forest parcel row. Bulk-loaded by an external importer; read-only at runtime.
#[derive(Debug, Clone, FromRow)]
pub struct ForestParcelRow {
    /// Internal identifier.
    pub id: Uuid,
    /// Vendor classification code (raw, pre-normalisation).
    pub code_tfv: String,
    /// Human-readable classification label.
    pub libelle: String,
    /// Dominant species code, when known.
    pub essence1: Option<String>,
    /// Administrative department code.
    pub departement: String,
}

/// An administrative boundary row for one of the [`AdminLayer`] tables.
#[derive(Debug, Clone, FromRow)]
pub struct AdminBoundaryRow {
    /// Internal identifier.
    pub id: Uuid,
    /// Official boundary code.
    pub code: String,
    /// Display name.
    pub nom: String,
    /// Parent boundary code, for sub-layers (e.g. a commune's departement).
    pub parent_code: Option<String>,
}

/// A cadastral parcel row.
#[derive(Debug, Clone, FromRow)]
pub struct CadastralParcelRow {
    /// Internal identifier.
    pub id: Uuid,
    /// INSEE commune code.
    pub code_commune: String,
    /// Department code.
    pub departement: String,
    /// Cadastral section.
    pub section: String,
    /// Parcel number within the section.
    pub numero: String,
}

/// Aggregate result of the Q1 summary query: intersected forest area and row count.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct ForestIntersectionSummaryRow {
    /// Sum of intersected forest parcel area, in square metres, EPSG:2154.
    pub intersected_area_m2: f64,
    /// Number of forest parcels intersecting the polygon.
    pub parcel_count: i64,
}

/// One grouping key plus its intersected area, as returned by the Q2/Q3 breakdown queries.
#[derive(Debug, Clone, FromRow)]
pub struct ForestBreakdownRow {
    /// Raw vendor classification code, pre-normalisation.
    pub code_tfv: String,
    /// Dominant species code, possibly empty/whitespace.
    pub essence1: Option<String>,
    /// Intersected area of this parcel, in square metres, EPSG:2154.
    pub intersected_area_m2: f64,
}

/// A rectangular tile envelope in Web Mercator (EPSG:3857).
///
/// Used both to bound the spatial filter (via its inverse transform into the
/// stored CRS) and as the MVT geometry-simplification clip box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileEnvelope {
    /// Minimum easting.
    pub min_x: f64,
    /// Minimum northing.
    pub min_y: f64,
    /// Maximum easting.
    pub max_x: f64,
    /// Maximum northing.
    pub max_y: f64,
}

impl TileEnvelope {
    /// Web Mercator world extent in metres, per side, from the origin.
    const ORIGIN_SHIFT: f64 = 20_037_508.342_789_244;

    /// Computes the Web Mercator envelope of a `(z, x, y)` slippy-map tile.
    pub fn from_zxy(z: u8, x: u32, y: u32) -> Self {
        let tiles = (1u64 << z) as f64;
        let tile_size = 2.0 * Self::ORIGIN_SHIFT / tiles;

        let min_x = x as f64 * tile_size - Self::ORIGIN_SHIFT;
        let max_x = (x as f64 + 1.0) * tile_size - Self::ORIGIN_SHIFT;
        let max_y = Self::ORIGIN_SHIFT - y as f64 * tile_size;
        let min_y = Self::ORIGIN_SHIFT - (y as f64 + 1.0) * tile_size;

        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

/// Coordinates driving the `ST_AsMVTGeom` clip box and simplification.
#[derive(Debug, Clone, Copy)]
pub struct MvtParams {
    /// Tile extent, in device-independent MVT units (4096 per the tile spec).
    pub extent: i32,
    /// Buffer around the tile edge, in the same units, so features that only
    /// touch the envelope are still included.
    pub buffer: i32,
}

impl Default for MvtParams {
    fn default() -> Self {
        Self {
            extent: 4096,
            buffer: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_layer_parses_allow_list_only() {
        assert_eq!(AdminLayer::parse("regions"), Some(AdminLayer::Regions));
        assert_eq!(AdminLayer::parse("communes"), Some(AdminLayer::Communes));
        assert_eq!(AdminLayer::parse("foo"), None);
        assert_eq!(AdminLayer::parse(""), None);
    }

    #[test]
    fn tile_envelope_root_tile_spans_world() {
        let env = TileEnvelope::from_zxy(0, 0, 0);
        assert!((env.min_x + TileEnvelope::ORIGIN_SHIFT).abs() < 1e-6);
        assert!((env.max_x - TileEnvelope::ORIGIN_SHIFT).abs() < 1e-6);
    }
}
