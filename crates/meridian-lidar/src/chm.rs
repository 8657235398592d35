//! Pixel-wise canopy-height computation over a matched MNS/MNT pair, and
//! mosaic-wide statistics over all pairs in a request.

use crate::raster::Raster;

/// Sentinel used for pixels where either input was nodata or NaN.
pub const CHM_NODATA: f32 = f32::NAN;

const CANOPY_THRESHOLD_M: f64 = 2.0;

/// A computed canopy-height raster for one MNS/MNT pair, plus the native
/// bbox/EPSG carried through from the surface-model input.
pub struct ChmTile {
    pub width: u32,
    pub height: u32,
    pub values: Vec<f32>,
    pub bbox: [f64; 4],
    pub epsg: u32,
}

/// `chm[i] = max(0, mns[i] - mnt[i])` over the minimum overlapping
/// rectangle of the two inputs; nodata/NaN in either input propagates to
/// the CHM nodata sentinel.
pub fn compute_chm(mns: &Raster, mnt: &Raster) -> ChmTile {
    let width = mns.width.min(mnt.width);
    let height = mns.height.min(mnt.height);
    let mut values = Vec::with_capacity((width * height) as usize);

    for y in 0..height {
        for x in 0..width {
            let a = mns.get(x, y);
            let b = mnt.get(x, y);
            let value = if mns.is_nodata(a) || mnt.is_nodata(b) {
                CHM_NODATA
            } else {
                (a - b).max(0.0)
            };
            values.push(value);
        }
    }

    ChmTile { width, height, values, bbox: mns.bbox, epsg: mns.epsg }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosaicStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

pub enum Mosaic {
    NoCanopy,
    Stats(MosaicStats),
}

/// Concatenates valid values across all pairs, drops anything below the
/// canopy threshold, and computes min/max/mean/median (lower-median on
/// even counts), each rounded to 2 decimal places.
pub fn mosaic_statistics(tiles: &[ChmTile]) -> Mosaic {
    let mut values: Vec<f64> = tiles
        .iter()
        .flat_map(|t| t.values.iter())
        .copied()
        .filter(|v| v.is_finite())
        .map(|v| v as f64)
        .filter(|&v| v >= CANOPY_THRESHOLD_M)
        .collect();

    if values.is_empty() {
        return Mosaic::NoCanopy;
    }

    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let min = values[0];
    let max = values[values.len() - 1];
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let median = if values.len() % 2 == 1 {
        values[values.len() / 2]
    } else {
        values[values.len() / 2 - 1]
    };

    Mosaic::Stats(MosaicStats {
        min: round2(min),
        max: round2(max),
        mean: round2(mean),
        median: round2(median),
    })
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chm_clamps_negative_differences_to_zero_and_propagates_nodata() {
        let mns = Raster::new(2, 1, vec![5.0, f32::NAN], None, [0.0, 0.0, 2.0, 1.0], 2154);
        let mnt = Raster::new(2, 1, vec![10.0, 3.0], None, [0.0, 0.0, 2.0, 1.0], 2154);
        let tile = compute_chm(&mns, &mnt);
        assert_eq!(tile.values[0], 0.0);
        assert!(tile.values[1].is_nan());
    }

    #[test]
    fn scenario_s6_flat_pair_yields_uniform_statistics() {
        let mns = Raster::new(2, 2, vec![10.0, 10.0, 10.0, 10.0], None, [0.0, 0.0, 2.0, 2.0], 2154);
        let mnt = Raster::new(2, 2, vec![5.0, 5.0, 5.0, 5.0], None, [0.0, 0.0, 2.0, 2.0], 2154);
        let tile = compute_chm(&mns, &mnt);
        let stats = match mosaic_statistics(&[tile]) {
            Mosaic::Stats(s) => s,
            Mosaic::NoCanopy => panic!("expected canopy coverage"),
        };
        assert_eq!(stats, MosaicStats { min: 5.0, max: 5.0, mean: 5.0, median: 5.0 });
    }

    #[test]
    fn values_below_canopy_threshold_are_excluded() {
        let mns = Raster::new(2, 1, vec![6.0, 11.0], None, [0.0, 0.0, 2.0, 1.0], 2154);
        let mnt = Raster::new(2, 1, vec![5.0, 1.0], None, [0.0, 0.0, 2.0, 1.0], 2154);
        let tile = compute_chm(&mns, &mnt); // diffs: 1.0 (below threshold), 10.0
        let stats = match mosaic_statistics(&[tile]) {
            Mosaic::Stats(s) => s,
            Mosaic::NoCanopy => panic!("expected canopy coverage"),
        };
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 10.0);
    }

    #[test]
    fn no_surviving_pixels_reports_no_canopy() {
        let mns = Raster::new(1, 1, vec![f32::NAN], None, [0.0, 0.0, 1.0, 1.0], 2154);
        let mnt = Raster::new(1, 1, vec![5.0], None, [0.0, 0.0, 1.0, 1.0], 2154);
        let tile = compute_chm(&mns, &mnt);
        assert!(matches!(mosaic_statistics(&[tile]), Mosaic::NoCanopy));
    }
}
