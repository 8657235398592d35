//! GeoJSON validation shared by the LiDAR pipeline: only `Polygon` and
//! `MultiPolygon` geometries are accepted, matching the polygon-analysis
//! contract.

use geo_types::Geometry;
use geojson::GeoJson;

use crate::error::{LidarError, Result};

pub fn parse_polygon_or_multipolygon(raw: &str) -> Result<Geometry<f64>> {
    let parsed: GeoJson = raw
        .parse()
        .map_err(|e| LidarError::bad_input(format!("invalid JSON: {e}")))?;

    let geometry_value = match parsed {
        GeoJson::Geometry(g) => g,
        _ => return Err(LidarError::bad_input("expected a bare Polygon or MultiPolygon geometry")),
    };

    match &geometry_value.value {
        geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_) => {}
        other => {
            return Err(LidarError::bad_input(format!(
                "unsupported geometry type: {}",
                other.type_name()
            )))
        }
    }

    Geometry::try_from(geometry_value).map_err(|e| LidarError::bad_input(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_point_geometry() {
        let point = r#"{"type":"Point","coordinates":[2.3,48.8]}"#;
        assert!(parse_polygon_or_multipolygon(point).is_err());
    }

    #[test]
    fn accepts_bare_polygon() {
        let polygon = r#"{"type":"Polygon","coordinates":[[[2.3,48.8],[2.31,48.8],[2.31,48.81],[2.3,48.81],[2.3,48.8]]]}"#;
        assert!(parse_polygon_or_multipolygon(polygon).is_ok());
    }
}
