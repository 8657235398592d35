//! Renders a CHM tile into an 8-bit RGBA PNG using the canopy-height
//! colour ramp.

use png::{BitDepth, ColorType, Encoder};

use crate::chm::ChmTile;
use crate::error::{LidarError, Result};

const RAMP_SCALE_CAP: f64 = 50.0;
const RAMP_SCALE_DEFAULT: f64 = 30.0;
const DATA_ALPHA: u8 = 180;

/// Renders `tile` into PNG bytes. Pixels that are nodata or `<= 0` are
/// fully transparent.
pub fn render_png(tile: &ChmTile) -> Result<Vec<u8>> {
    let max_height = tile
        .values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .fold(0.0f32, f32::max);
    let scale = if max_height > 0.0 { max_height as f64 } else { RAMP_SCALE_DEFAULT }.min(RAMP_SCALE_CAP);

    let mut rgba = vec![0u8; tile.values.len() * 4];
    for (i, &v) in tile.values.iter().enumerate() {
        let (r, g, b, a) = if v.is_finite() && v > 0.0 {
            let t = (v as f64 / scale).clamp(0.0, 1.0);
            color_for(t)
        } else {
            (0, 0, 0, 0)
        };
        let base = i * 4;
        rgba[base] = r;
        rgba[base + 1] = g;
        rgba[base + 2] = b;
        rgba[base + 3] = a;
    }

    let mut buf = Vec::new();
    {
        let mut encoder = Encoder::new(&mut buf, tile.width, tile.height);
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| LidarError::bad_input(format!("png header: {e}")))?;
        writer
            .write_image_data(&rgba)
            .map_err(|e| LidarError::bad_input(format!("png encode: {e}")))?;
    }
    Ok(buf)
}

fn color_for(t: f64) -> (u8, u8, u8, u8) {
    let (r, g, b) = if t < 0.5 {
        (t * 2.0 * 255.0, 200.0, 50.0)
    } else {
        let u = (t - 0.5) * 2.0;
        (255.0, (1.0 - u) * 200.0, (1.0 - u) * 50.0)
    };
    (to_channel(r), to_channel(g), to_channel(b), DATA_ALPHA)
}

fn to_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_negative_pixels_are_fully_transparent() {
        let tile = ChmTile { width: 2, height: 1, values: vec![0.0, -1.0], bbox: [0.0, 0.0, 1.0, 1.0], epsg: 2154 };
        let png = render_png(&tile).unwrap();
        assert!(!png.is_empty());
    }

    #[test]
    fn low_ramp_value_is_mostly_green_with_a_touch_of_red() {
        let (r, g, b, a) = color_for(0.1);
        assert_eq!(a, DATA_ALPHA);
        assert_eq!(g, 200);
        assert_eq!(b, 50);
        assert!(r > 0 && r < 100);
    }

    #[test]
    fn high_ramp_value_trends_toward_pure_red() {
        let (r, g, b, a) = color_for(1.0);
        assert_eq!(a, DATA_ALPHA);
        assert_eq!(r, 255);
        assert_eq!(g, 0);
        assert_eq!(b, 0);
    }

    #[test]
    fn midpoint_ramp_value_is_saturated_red_at_full_green_and_blue() {
        let (r, g, b, _) = color_for(0.5);
        assert_eq!(r, 255);
        assert_eq!(g, 200);
        assert_eq!(b, 50);
    }
}
