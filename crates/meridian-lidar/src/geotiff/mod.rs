//! A self-contained reader for single-band float32 GeoTIFFs, as produced by
//! the upstream MNS/MNT raster service. No `tiff` or `gdal` dependency:
//! the strip/tile layout, GeoKeys, and DEFLATE-compressed payloads are all
//! parsed by hand against the TIFF 6.0 layout.

mod geokeys;
mod tags;

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{LidarError, Result};
use crate::raster::Raster;
use tags::{ByteOrder, TagTable};

const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_BITS_PER_SAMPLE: u16 = 258;
const TAG_COMPRESSION: u16 = 259;
const TAG_STRIP_OFFSETS: u16 = 273;
const TAG_SAMPLES_PER_PIXEL: u16 = 277;
const TAG_ROWS_PER_STRIP: u16 = 278;
const TAG_STRIP_BYTE_COUNTS: u16 = 279;
const TAG_TILE_WIDTH: u16 = 322;
const TAG_TILE_LENGTH: u16 = 323;
const TAG_TILE_OFFSETS: u16 = 324;
const TAG_TILE_BYTE_COUNTS: u16 = 325;
const TAG_SAMPLE_FORMAT: u16 = 339;
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GDAL_NODATA: u16 = 42113;

const SAMPLE_FORMAT_FLOAT: u32 = 3;

/// Decodes a single-band float32 GeoTIFF from raw bytes.
pub fn decode(bytes: &[u8]) -> Result<Raster> {
    if bytes.len() < 8 {
        return Err(LidarError::bad_input("truncated TIFF header"));
    }
    let order = ByteOrder::from_marker([bytes[0], bytes[1]])?;
    let magic = order.u16_at(bytes, 2)?;
    if magic != 42 {
        return Err(LidarError::bad_input("bad TIFF magic number"));
    }
    let ifd_offset = order.u32_at(bytes, 4)? as usize;
    let tags = TagTable::read(bytes, ifd_offset, order)?;

    let bits_per_sample = tags.u32_single(bytes, order, TAG_BITS_PER_SAMPLE)?;
    let sample_format = tags.u32_single_or(bytes, order, TAG_SAMPLE_FORMAT, 1)?;
    if bits_per_sample != 32 || sample_format != SAMPLE_FORMAT_FLOAT {
        return Err(LidarError::bad_input(format!(
            "unsupported sample layout: {bits_per_sample}-bit, format {sample_format} (expected 32-bit float)"
        )));
    }
    let samples_per_pixel = tags.u32_single_or(bytes, order, TAG_SAMPLES_PER_PIXEL, 1)?;
    if samples_per_pixel != 1 {
        return Err(LidarError::bad_input("expected a single-band raster"));
    }

    let width = tags.u32_single(bytes, order, TAG_IMAGE_WIDTH)?;
    let height = tags.u32_single(bytes, order, TAG_IMAGE_LENGTH)?;
    let compression = tags.u32_single_or(bytes, order, TAG_COMPRESSION, 1)?;

    let data = if tags.has(TAG_TILE_WIDTH) {
        read_tiled(bytes, &tags, order, width, height, compression)?
    } else {
        read_striped(bytes, &tags, order, width, height, compression)?
    };

    let nodata = tags
        .ascii(bytes, order, TAG_GDAL_NODATA)
        .and_then(|s| s.trim().parse::<f32>().ok());
    let bbox = compute_bbox(&tags, bytes, order, width, height)?;
    let epsg = geokeys::read_epsg(&tags, bytes, order);

    Ok(Raster::new(width, height, data, nodata, bbox, epsg))
}

fn decompress_chunk(bytes: &[u8], offset: u32, byte_count: u32, compression: u32, expected_len: usize) -> Result<Vec<u8>> {
    let chunk = bytes
        .get(offset as usize..(offset as usize + byte_count as usize))
        .ok_or_else(|| LidarError::bad_input("strip/tile data out of bounds"))?;
    match compression {
        1 => Ok(chunk.to_vec()),
        8 | 32946 => {
            let mut decoder = ZlibDecoder::new(chunk);
            let mut out = Vec::with_capacity(expected_len);
            decoder
                .read_to_end(&mut out)
                .map_err(|e| LidarError::bad_input(format!("DEFLATE decode failed: {e}")))?;
            Ok(out)
        }
        other => Err(LidarError::bad_input(format!("unsupported compression scheme {other}"))),
    }
}

fn read_striped(bytes: &[u8], tags: &TagTable, order: ByteOrder, width: u32, height: u32, compression: u32) -> Result<Vec<f32>> {
    let rows_per_strip = tags.u32_single_or(bytes, order, TAG_ROWS_PER_STRIP, height)?;
    let offsets = tags.u32_vec(bytes, order, TAG_STRIP_OFFSETS)?;
    let byte_counts = tags.u32_vec(bytes, order, TAG_STRIP_BYTE_COUNTS)?;
    if offsets.len() != byte_counts.len() {
        return Err(LidarError::bad_input("strip offset/byte-count arrays disagree in length"));
    }

    let mut data = vec![0f32; width as usize * height as usize];
    for (i, (&offset, &byte_count)) in offsets.iter().zip(byte_counts.iter()).enumerate() {
        let row_start = i as u32 * rows_per_strip;
        if row_start >= height {
            break;
        }
        let rows_in_strip = rows_per_strip.min(height - row_start);
        let expected_len = (width * rows_in_strip * 4) as usize;
        let raw = decompress_chunk(bytes, offset, byte_count, compression, expected_len)?;

        for row in 0..rows_in_strip {
            for col in 0..width {
                let src = ((row * width + col) * 4) as usize;
                let value = order.f32_at(&raw, src)?;
                data[((row_start + row) * width + col) as usize] = value;
            }
        }
    }
    Ok(data)
}

fn read_tiled(bytes: &[u8], tags: &TagTable, order: ByteOrder, width: u32, height: u32, compression: u32) -> Result<Vec<f32>> {
    let tile_width = tags.u32_single(bytes, order, TAG_TILE_WIDTH)?;
    let tile_length = tags.u32_single(bytes, order, TAG_TILE_LENGTH)?;
    let offsets = tags.u32_vec(bytes, order, TAG_TILE_OFFSETS)?;
    let byte_counts = tags.u32_vec(bytes, order, TAG_TILE_BYTE_COUNTS)?;

    let tiles_across = width.div_ceil(tile_width);
    let tiles_down = height.div_ceil(tile_length);
    if offsets.len() != (tiles_across * tiles_down) as usize {
        return Err(LidarError::bad_input("tile offset array does not match tile grid dimensions"));
    }

    let mut data = vec![0f32; width as usize * height as usize];
    let expected_len = (tile_width * tile_length * 4) as usize;
    for ty in 0..tiles_down {
        for tx in 0..tiles_across {
            let idx = (ty * tiles_across + tx) as usize;
            let raw = decompress_chunk(bytes, offsets[idx], byte_counts[idx], compression, expected_len)?;

            let origin_x = tx * tile_width;
            let origin_y = ty * tile_length;
            let valid_cols = tile_width.min(width - origin_x);
            let valid_rows = tile_length.min(height - origin_y);

            for row in 0..valid_rows {
                for col in 0..valid_cols {
                    let src = ((row * tile_width + col) * 4) as usize;
                    let value = order.f32_at(&raw, src)?;
                    data[((origin_y + row) * width + (origin_x + col)) as usize] = value;
                }
            }
        }
    }
    Ok(data)
}

fn compute_bbox(tags: &TagTable, bytes: &[u8], order: ByteOrder, width: u32, height: u32) -> Result<[f64; 4]> {
    let scale = tags.f64_vec(bytes, order, TAG_MODEL_PIXEL_SCALE)?;
    let tiepoint = tags.f64_vec(bytes, order, TAG_MODEL_TIEPOINT)?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(LidarError::bad_input("incomplete georeferencing tags"));
    }
    let (scale_x, scale_y) = (scale[0], scale[1]);
    let (tie_i, tie_j, tie_x, tie_y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);

    let x_min = tie_x - tie_i * scale_x;
    let y_max = tie_y + tie_j * scale_y;
    let x_max = x_min + width as f64 * scale_x;
    let y_min = y_max - height as f64 * scale_y;

    Ok([x_min, y_min, x_max, y_max])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a minimal, uncompressed, single-strip float32 GeoTIFF with
    /// the given pixel values and georeferencing.
    fn build_tiff(width: u16, height: u16, pixels: &[f32], scale: (f64, f64), origin: (f64, f64), nodata: Option<&str>) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"II");
        buf.extend_from_slice(&42u16.to_le_bytes());

        // IFD placed right after the 8-byte header; external data follows it.
        let ifd_offset = 8u32;
        buf.extend_from_slice(&ifd_offset.to_le_bytes());

        let mut entries: Vec<(u16, u16, u32, [u8; 4])> = vec![
            (TAG_IMAGE_WIDTH, 3, 1, (width as u32).to_le_bytes()),
            (TAG_IMAGE_LENGTH, 3, 1, (height as u32).to_le_bytes()),
            (TAG_BITS_PER_SAMPLE, 3, 1, 32u32.to_le_bytes()),
            (TAG_COMPRESSION, 3, 1, 1u32.to_le_bytes()),
            (TAG_SAMPLES_PER_PIXEL, 3, 1, 1u32.to_le_bytes()),
            (TAG_ROWS_PER_STRIP, 3, 1, (height as u32).to_le_bytes()),
            (TAG_SAMPLE_FORMAT, 3, 1, SAMPLE_FORMAT_FLOAT.to_le_bytes()),
        ];

        let entry_count = entries.len() + 4 + nodata.is_some() as usize;
        let header_and_ifd_len = 8 + 2 + entry_count * 12 + 4;

        let mut external = Vec::new();
        let external_base = header_and_ifd_len as u32;

        // ModelPixelScale (3 doubles)
        let scale_offset = external_base + external.len() as u32;
        external.extend_from_slice(&scale.0.to_le_bytes());
        external.extend_from_slice(&scale.1.to_le_bytes());
        external.extend_from_slice(&0f64.to_le_bytes());
        entries.push((TAG_MODEL_PIXEL_SCALE, 12, 3, scale_offset.to_le_bytes()));

        // ModelTiepoint (6 doubles): I,J,K,X,Y,Z
        let tiepoint_offset = external_base + external.len() as u32;
        for v in [0.0, 0.0, 0.0, origin.0, origin.1, 0.0] {
            external.extend_from_slice(&(v as f64).to_le_bytes());
        }
        entries.push((TAG_MODEL_TIEPOINT, 12, 6, tiepoint_offset.to_le_bytes()));

        if let Some(nd) = nodata {
            let nodata_offset = external_base + external.len() as u32;
            let mut ascii = nd.as_bytes().to_vec();
            ascii.push(0);
            let len = ascii.len() as u32;
            external.extend_from_slice(&ascii);
            entries.push((TAG_GDAL_NODATA, 2, len, nodata_offset.to_le_bytes()));
        }

        let pixel_bytes_offset = external_base + external.len() as u32;
        for p in pixels {
            external.extend_from_slice(&p.to_le_bytes());
        }
        let pixel_byte_count = (pixels.len() * 4) as u32;
        entries.push((TAG_STRIP_OFFSETS, 4, 1, pixel_bytes_offset.to_le_bytes()));
        entries.push((TAG_STRIP_BYTE_COUNTS, 4, 1, pixel_byte_count.to_le_bytes()));

        buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for (tag, dtype, count, value) in &entries {
            buf.extend_from_slice(&tag.to_le_bytes());
            buf.extend_from_slice(&dtype.to_le_bytes());
            buf.extend_from_slice(&count.to_le_bytes());
            buf.extend_from_slice(value);
        }
        buf.extend_from_slice(&0u32.to_le_bytes()); // no next IFD
        buf.extend_from_slice(&external);
        buf
    }

    #[test]
    fn decodes_a_flat_two_by_two_raster() {
        let bytes = build_tiff(2, 2, &[10.0, 10.0, 10.0, 10.0], (1.0, 1.0), (0.0, 2.0), None);
        let raster = decode(&bytes).unwrap();
        assert_eq!(raster.width, 2);
        assert_eq!(raster.height, 2);
        assert_eq!(raster.get(0, 0), 10.0);
        assert_eq!(raster.get(1, 1), 10.0);
        assert_eq!(raster.bbox, [0.0, 0.0, 2.0, 2.0]);
    }

    #[test]
    fn parses_gdal_nodata_tag() {
        let bytes = build_tiff(1, 1, &[-9999.0], (1.0, 1.0), (0.0, 1.0), Some("-9999"));
        let raster = decode(&bytes).unwrap();
        assert_eq!(raster.nodata, Some(-9999.0));
        assert!(raster.is_nodata(raster.get(0, 0)));
    }

    #[test]
    fn rejects_non_float_sample_format() {
        let mut bytes = build_tiff(1, 1, &[1.0], (1.0, 1.0), (0.0, 1.0), None);
        // Flip the SampleFormat entry's value from 3 (float) to 1 (uint).
        let pos = bytes
            .windows(2)
            .position(|w| w == TAG_SAMPLE_FORMAT.to_le_bytes())
            .expect("sample format tag present");
        bytes[pos + 8] = 1;
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, LidarError::BadInput(_)));
    }
}
