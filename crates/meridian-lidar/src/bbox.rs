//! WGS84 envelope extraction from submitted polygons, and the CHM
//! mosaic's bounds-normalisation fallback chain.

use geo_types::{Coord, Geometry};

use crate::error::{LidarError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// Walks every ring of a `Polygon`/`MultiPolygon` and returns its WGS84
/// envelope.
pub fn envelope_of(geometry: &Geometry<f64>) -> Result<Envelope> {
    let mut west = f64::INFINITY;
    let mut south = f64::INFINITY;
    let mut east = f64::NEG_INFINITY;
    let mut north = f64::NEG_INFINITY;

    let mut visit = |c: Coord<f64>| {
        west = west.min(c.x);
        east = east.max(c.x);
        south = south.min(c.y);
        north = north.max(c.y);
    };

    match geometry {
        Geometry::Polygon(polygon) => {
            polygon.exterior().coords().for_each(|&c| visit(c));
            polygon.interiors().iter().for_each(|ring| ring.coords().for_each(|&c| visit(c)));
        }
        Geometry::MultiPolygon(multi) => {
            for polygon in multi.iter() {
                polygon.exterior().coords().for_each(|&c| visit(c));
                polygon.interiors().iter().for_each(|ring| ring.coords().for_each(|&c| visit(c)));
            }
        }
        _ => return Err(LidarError::bad_input("expected Polygon or MultiPolygon")),
    }

    if !west.is_finite() || !south.is_finite() || !east.is_finite() || !north.is_finite() {
        return Err(LidarError::bad_input("geometry has no coordinates"));
    }

    Ok(Envelope { west, south, east, north })
}

const LAMBERT93_CENTRAL_LON: f64 = 3.0;
const LAMBERT93_CENTRAL_LAT: f64 = 46.5;
const LAMBERT93_FALSE_EASTING: f64 = 700_000.0;
const LAMBERT93_FALSE_NORTHING: f64 = 6_600_000.0;
const METERS_PER_DEGREE_LAT: f64 = 110_540.0;

fn lambert93_affine_lon(x: f64) -> f64 {
    LAMBERT93_CENTRAL_LON + (x - LAMBERT93_FALSE_EASTING) / (LAMBERT93_CENTRAL_LAT.to_radians().cos() * 111_320.0)
}

fn lambert93_affine_lat(y: f64) -> f64 {
    LAMBERT93_CENTRAL_LAT + (y - LAMBERT93_FALSE_NORTHING) / METERS_PER_DEGREE_LAT
}

/// Plausible metropolitan-France Lambert-93 easting/northing ranges,
/// centred on the false-origin constants used by the affine approximation.
fn looks_like_lambert93(bbox: [f64; 4]) -> bool {
    let plausible_easting = |v: f64| (0.0..=1_300_000.0).contains(&v);
    let plausible_northing = |v: f64| (6_000_000.0..=7_200_000.0).contains(&v);
    plausible_easting(bbox[0]) && plausible_easting(bbox[2]) && plausible_northing(bbox[1]) && plausible_northing(bbox[3])
}

fn is_valid_wgs84(e: &Envelope) -> bool {
    e.west >= -180.0
        && e.east <= 180.0
        && e.south >= -90.0
        && e.north <= 90.0
        && e.west <= e.east
        && e.south <= e.north
}

/// Normalises a mosaic's native bbox to WGS84: pass through if already
/// EPSG:4326, apply the Lambert-93 affine approximation if the magnitudes
/// look projected, otherwise fall back to the submitted polygon's own
/// envelope. The result is always validated against global WGS84 ranges,
/// falling back again if the conversion produced something out of range.
pub fn normalize_bounds(native_bbox: [f64; 4], epsg: u32, fallback: Envelope) -> Envelope {
    if epsg == 4326 {
        let candidate = Envelope { west: native_bbox[0], south: native_bbox[1], east: native_bbox[2], north: native_bbox[3] };
        return if is_valid_wgs84(&candidate) { candidate } else { fallback };
    }

    if looks_like_lambert93(native_bbox) {
        let candidate = Envelope {
            west: lambert93_affine_lon(native_bbox[0]),
            south: lambert93_affine_lat(native_bbox[1]),
            east: lambert93_affine_lon(native_bbox[2]),
            north: lambert93_affine_lat(native_bbox[3]),
        };
        if is_valid_wgs84(&candidate) {
            return candidate;
        }
    }

    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{LineString, Polygon};

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry<f64> {
        Geometry::Polygon(Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        ))
    }

    #[test]
    fn envelope_covers_all_ring_vertices() {
        let geometry = square(2.0, 48.0, 2.5, 48.5);
        let envelope = envelope_of(&geometry).unwrap();
        assert_eq!(envelope, Envelope { west: 2.0, south: 48.0, east: 2.5, north: 48.5 });
    }

    #[test]
    fn rejects_non_polygon_geometry() {
        use geo_types::Point;
        let point = Geometry::Point(Point::new(2.0, 48.0));
        assert!(envelope_of(&point).is_err());
    }

    #[test]
    fn wgs84_native_bbox_passes_through() {
        let fallback = Envelope { west: 0.0, south: 0.0, east: 1.0, north: 1.0 };
        let bounds = normalize_bounds([2.0, 48.0, 2.5, 48.5], 4326, fallback);
        assert_eq!(bounds, Envelope { west: 2.0, south: 48.0, east: 2.5, north: 48.5 });
    }

    #[test]
    fn lambert93_bbox_is_converted_by_the_affine_approximation() {
        let fallback = Envelope { west: 0.0, south: 0.0, east: 1.0, north: 1.0 };
        // Roughly the false origin itself, which should map close to (3.0, 46.5).
        let bounds = normalize_bounds(
            [699_000.0, 6_599_000.0, 701_000.0, 6_601_000.0],
            2154,
            fallback,
        );
        assert!((bounds.west - 2.99).abs() < 0.1);
        assert!((bounds.north - 46.51).abs() < 0.1);
    }

    #[test]
    fn out_of_range_affine_result_falls_back_to_the_polygon_bbox() {
        let fallback = Envelope { west: 1.0, south: 44.0, east: 2.0, north: 45.0 };
        // Wildly implausible easting/northing magnitudes: not recognised as
        // Lambert-93, so the fallback is used directly.
        let bounds = normalize_bounds([1.0e9, 1.0e9, 1.0e9, 1.0e9], 9999, fallback);
        assert_eq!(bounds, fallback);
    }
}
