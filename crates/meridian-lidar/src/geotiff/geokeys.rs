//! Minimal GeoKey directory (tag 34735) parsing: just enough to recover an
//! EPSG code, preferring the projected CRS over the geographic one.

use super::tags::{ByteOrder, TagTable};

const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;

/// Returns the EPSG code declared by the GeoKey directory, preferring
/// `ProjectedCSTypeGeoKey` and falling back to `GeographicTypeGeoKey`, or
/// `0` if neither is present as an inline (`TIFFTagLocation == 0`) short
/// value.
pub fn read_epsg(tags: &TagTable, buf: &[u8], order: ByteOrder) -> u32 {
    let Some(entry) = tags.get(GEO_KEY_DIRECTORY_TAG) else {
        return 0;
    };
    let Ok(shorts) = entry.as_u32_vec(buf, order) else {
        return 0;
    };
    if shorts.len() < 4 {
        return 0;
    }
    let num_keys = shorts[3] as usize;

    let mut projected = None;
    let mut geographic = None;
    for i in 0..num_keys {
        let base = 4 + i * 4;
        if base + 3 >= shorts.len() {
            break;
        }
        let key_id = shorts[base];
        let location = shorts[base + 1];
        let value = shorts[base + 3];
        if location != 0 {
            // Value lives in another tag (usually GeoDoubleParams/GeoAsciiParams); not needed for EPSG lookup.
            continue;
        }
        if key_id == PROJECTED_CS_TYPE_GEO_KEY as u32 {
            projected = Some(value);
        } else if key_id == GEOGRAPHIC_TYPE_GEO_KEY as u32 {
            geographic = Some(value);
        }
    }

    projected.or(geographic).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shorts_le(values: &[u16]) -> Vec<u8> {
        let mut out = Vec::with_capacity(values.len() * 2);
        for v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    #[test]
    fn prefers_projected_over_geographic() {
        // version, revision, minor, num_keys=2, then (key,loc,count,value)*2
        let keys = shorts_le(&[
            1, 1, 0, 2,
            GEOGRAPHIC_TYPE_GEO_KEY, 0, 1, 4326,
            PROJECTED_CS_TYPE_GEO_KEY, 0, 1, 2154,
        ]);
        let mut buf = vec![0u8; 16];
        buf.extend_from_slice(&keys);

        let mut entries = std::collections::HashMap::new();
        entries.insert(
            GEO_KEY_DIRECTORY_TAG,
            super::tags::RawEntry {
                tag: GEO_KEY_DIRECTORY_TAG,
                dtype: 3,
                count: (keys.len() / 2) as u32,
                value_or_offset: (16u32).to_le_bytes(),
            },
        );
        let table = TagTable::from_entries(entries);
        assert_eq!(read_epsg(&table, &buf, ByteOrder::Little), 2154);
    }
}
