//! `AnalyzePolygon`: GeoJSON validation followed by the Q1 -> Q2 -> Q3
//! forest-composition query sequence.

use geo_types::{Geometry as GeoGeometry, LineString};
use geojson::GeoJson;
use meridian_core::crs::Crs;
use meridian_db::{ForestRepository, Pool};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::forest::{bucket_by_canonical_code, bucket_by_species};

/// One row of the forest-type breakdown (Q2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestTypeBreakdownRow {
    /// The canonical classification code.
    pub code: String,
    /// The opaque display label for this code.
    pub label: String,
    /// Summed intersected area, in hectares.
    pub area_ha: f64,
}

/// One row of the dominant-species breakdown (Q3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesBreakdownRow {
    /// The dominant-species code, or [`crate::forest::UNSPECIFIED_SPECIES`].
    pub species: String,
    /// Summed intersected area, in hectares.
    pub area_ha: f64,
}

/// The composite result of `AnalyzePolygon`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonStats {
    /// Total area of the submitted polygon, in hectares.
    pub total_area_ha: f64,
    /// Total intersected forest area, in hectares.
    pub intersected_forest_area_ha: f64,
    /// Count of forest parcels intersecting the polygon.
    pub parcel_count: i64,
    /// Q2: breakdown by canonical forest-type code, descending area.
    pub forest_type_breakdown: Vec<ForestTypeBreakdownRow>,
    /// Q3: breakdown by dominant species, descending area.
    pub species_breakdown: Vec<SpeciesBreakdownRow>,
}

/// Runs `AnalyzePolygon` against the forest parcel table.
pub struct PolygonAnalyzer {
    forest: ForestRepository,
}

impl PolygonAnalyzer {
    /// Builds an analyzer bound to a connection pool.
    pub fn new(pool: &Pool) -> Self {
        Self {
            forest: ForestRepository::new(pool),
        }
    }

    /// Validates `geojson_text` as a `Polygon` or `MultiPolygon`, then runs
    /// Q1 (summary), and, unless the parcel count is zero, Q2 and Q3
    /// (forest-type and species breakdowns) from a single shared fetch.
    pub async fn analyze(&self, geojson_text: &str) -> Result<PolygonStats> {
        let geometry = parse_polygon_or_multipolygon(geojson_text)?;
        let total_area_ha = total_area_ha(&geometry)?;

        let summary = self
            .forest
            .summarize_intersection(geojson_text)
            .await
            .map_err(|e| AnalysisError::computation_error(e.to_string()))?;

        let intersected_forest_area_ha = summary.intersected_area_m2 / 10_000.0;

        if summary.parcel_count == 0 {
            return Ok(PolygonStats {
                total_area_ha,
                intersected_forest_area_ha,
                parcel_count: 0,
                forest_type_breakdown: Vec::new(),
                species_breakdown: Vec::new(),
            });
        }

        let rows = self
            .forest
            .intersecting_breakdown(geojson_text)
            .await
            .map_err(|e| AnalysisError::computation_error(e.to_string()))?;

        let forest_type_breakdown = bucket_by_canonical_code(&rows)
            .into_iter()
            .map(|(code, area_ha)| ForestTypeBreakdownRow {
                code: code.as_str().to_string(),
                label: code.label().to_string(),
                area_ha,
            })
            .collect();

        let species_breakdown = bucket_by_species(&rows)
            .into_iter()
            .map(|(species, area_ha)| SpeciesBreakdownRow { species, area_ha })
            .collect();

        Ok(PolygonStats {
            total_area_ha,
            intersected_forest_area_ha,
            parcel_count: summary.parcel_count,
            forest_type_breakdown,
            species_breakdown,
        })
    }
}

/// Rejects anything that isn't syntactically valid JSON, or whose geometry
/// type isn't `Polygon`/`MultiPolygon`, before any database work begins.
pub fn parse_polygon_or_multipolygon(raw: &str) -> Result<GeoGeometry<f64>> {
    let parsed: GeoJson = raw
        .parse()
        .map_err(|e| AnalysisError::invalid_geometry(format!("invalid JSON: {e}")))?;

    let geometry_value = match parsed {
        GeoJson::Geometry(g) => g,
        _ => {
            return Err(AnalysisError::invalid_geometry(
                "expected a bare Polygon or MultiPolygon geometry",
            ))
        }
    };

    match &geometry_value.value {
        geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_) => {}
        other => {
            return Err(AnalysisError::invalid_geometry(format!(
                "unsupported geometry type: {}",
                other.type_name()
            )))
        }
    }

    GeoGeometry::try_from(geometry_value).map_err(|e| AnalysisError::invalid_geometry(e.to_string()))
}

/// Computes the polygon's own area by reprojecting every ring vertex to
/// EPSG:2154 (Lambert-93) and applying the shoelace formula, returning
/// hectares.
pub fn total_area_ha(geometry: &GeoGeometry<f64>) -> Result<f64> {
    let mut source = Crs::wgs84();
    let target = Crs::lambert93();

    let area_m2 = match geometry {
        GeoGeometry::Polygon(polygon) => polygon_area_m2(polygon, &mut source, &target)?,
        GeoGeometry::MultiPolygon(multi) => {
            let mut total = 0.0;
            for polygon in multi.iter() {
                total += polygon_area_m2(polygon, &mut source, &target)?;
            }
            total
        }
        _ => {
            return Err(AnalysisError::invalid_geometry(
                "expected Polygon or MultiPolygon",
            ))
        }
    };

    Ok(area_m2 / 10_000.0)
}

fn polygon_area_m2(
    polygon: &geo_types::Polygon<f64>,
    source: &mut Crs,
    target: &Crs,
) -> Result<f64> {
    let mut area = ring_area_m2(polygon.exterior(), source, target)?;
    for interior in polygon.interiors() {
        area -= ring_area_m2(interior, source, target)?;
    }
    Ok(area.max(0.0))
}

fn ring_area_m2(ring: &LineString<f64>, source: &mut Crs, target: &Crs) -> Result<f64> {
    let mut projected = Vec::with_capacity(ring.0.len());
    for coord in ring.coords() {
        let (x, y) = source
            .transform_point(coord.x, coord.y, target)
            .map_err(|e| AnalysisError::computation_error(e.to_string()))?;
        projected.push((x, y));
    }

    let mut sum = 0.0;
    for pair in projected.windows(2) {
        let (x1, y1) = pair[0];
        let (x2, y2) = pair[1];
        sum += x1 * y2 - x2 * y1;
    }

    Ok(sum.abs() / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_input_that_is_not_json() {
        let err = parse_polygon_or_multipolygon("not json").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidGeometry(_)));
    }

    #[test]
    fn rejects_point_geometry() {
        let point = r#"{"type":"Point","coordinates":[2.3,48.8]}"#;
        let err = parse_polygon_or_multipolygon(point).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidGeometry(_)));
    }

    #[test]
    fn rejects_feature_collection_wrapping_a_polygon() {
        let fc = r#"{"type":"FeatureCollection","features":[]}"#;
        let err = parse_polygon_or_multipolygon(fc).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidGeometry(_)));
    }

    #[test]
    fn accepts_a_bare_polygon() {
        let polygon = r#"{"type":"Polygon","coordinates":[[[2.3,48.8],[2.31,48.8],[2.31,48.81],[2.3,48.81],[2.3,48.8]]]}"#;
        let geometry = parse_polygon_or_multipolygon(polygon).unwrap();
        assert!(matches!(geometry, GeoGeometry::Polygon(_)));
    }

    #[test]
    fn accepts_a_bare_multipolygon() {
        let mp = r#"{"type":"MultiPolygon","coordinates":[[[[2.3,48.8],[2.31,48.8],[2.31,48.81],[2.3,48.81],[2.3,48.8]]]]}"#;
        let geometry = parse_polygon_or_multipolygon(mp).unwrap();
        assert!(matches!(geometry, GeoGeometry::MultiPolygon(_)));
    }

    #[test]
    fn total_area_of_a_small_square_near_paris_is_plausible() {
        // Roughly 1.11 km (east-west) by 1.11 km (north-south) at this
        // latitude, so on the order of a few hundred hectares.
        let polygon = r#"{"type":"Polygon","coordinates":[[[2.3,48.8],[2.31,48.8],[2.31,48.81],[2.3,48.81],[2.3,48.8]]]}"#;
        let geometry = parse_polygon_or_multipolygon(polygon).unwrap();
        let area_ha = total_area_ha(&geometry).unwrap();
        assert!(area_ha > 400.0 && area_ha < 900.0, "area_ha = {area_ha}");
    }
}
