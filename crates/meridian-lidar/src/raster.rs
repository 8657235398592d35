//! A decoded single-band float32 raster and its georeferencing.

/// A single-band float32 raster with a WGS84 or Lambert-93 bounding
/// envelope, decoded from a GeoTIFF.
#[derive(Debug, Clone)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    data: Vec<f32>,
    pub nodata: Option<f32>,
    /// `[xmin, ymin, xmax, ymax]` in the raster's native CRS.
    pub bbox: [f64; 4],
    pub epsg: u32,
}

impl Raster {
    pub fn new(width: u32, height: u32, data: Vec<f32>, nodata: Option<f32>, bbox: [f64; 4], epsg: u32) -> Self {
        assert_eq!(data.len(), (width as usize) * (height as usize), "raster buffer size mismatch");
        Self { width, height, data, nodata, bbox, epsg }
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// A value counts as "no data" if it is NaN or equal to the raster's
    /// declared nodata sentinel.
    pub fn is_nodata(&self, value: f32) -> bool {
        value.is_nan() || self.nodata.is_some_and(|nd| value == nd)
    }

    pub fn pixel_size(&self) -> (f64, f64) {
        let sx = (self.bbox[2] - self.bbox[0]) / self.width as f64;
        let sy = (self.bbox[3] - self.bbox[1]) / self.height as f64;
        (sx, sy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodata_matches_sentinel_or_nan() {
        let r = Raster::new(1, 1, vec![-9999.0], Some(-9999.0), [0.0, 0.0, 1.0, 1.0], 2154);
        assert!(r.is_nodata(-9999.0));
        assert!(r.is_nodata(f32::NAN));
        assert!(!r.is_nodata(5.0));
    }
}
