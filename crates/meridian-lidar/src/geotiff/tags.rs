//! Byte-order-aware primitive reads and IFD entry decoding for the
//! self-contained GeoTIFF reader.

use std::collections::HashMap;

use crate::error::{LidarError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub fn from_marker(marker: [u8; 2]) -> Result<Self> {
        match &marker {
            b"II" => Ok(Self::Little),
            b"MM" => Ok(Self::Big),
            _ => Err(LidarError::bad_input("not a TIFF: missing byte-order marker")),
        }
    }

    pub fn u16_at(self, buf: &[u8], offset: usize) -> Result<u16> {
        let bytes = slice4(buf, offset, 2)?;
        Ok(match self {
            Self::Little => u16::from_le_bytes([bytes[0], bytes[1]]),
            Self::Big => u16::from_be_bytes([bytes[0], bytes[1]]),
        })
    }

    pub fn u32_at(self, buf: &[u8], offset: usize) -> Result<u32> {
        let bytes = slice4(buf, offset, 4)?;
        Ok(match self {
            Self::Little => u32::from_le_bytes(bytes.try_into().unwrap()),
            Self::Big => u32::from_be_bytes(bytes.try_into().unwrap()),
        })
    }

    pub fn f32_at(self, buf: &[u8], offset: usize) -> Result<f32> {
        let bytes = slice4(buf, offset, 4)?;
        Ok(match self {
            Self::Little => f32::from_le_bytes(bytes.try_into().unwrap()),
            Self::Big => f32::from_be_bytes(bytes.try_into().unwrap()),
        })
    }

    pub fn f64_at(self, buf: &[u8], offset: usize) -> Result<f64> {
        let bytes = slice4(buf, offset, 8)?;
        Ok(match self {
            Self::Little => f64::from_le_bytes(bytes.try_into().unwrap()),
            Self::Big => f64::from_be_bytes(bytes.try_into().unwrap()),
        })
    }

    fn u16_from_bytes(self, b: &[u8]) -> u16 {
        match self {
            Self::Little => u16::from_le_bytes([b[0], b[1]]),
            Self::Big => u16::from_be_bytes([b[0], b[1]]),
        }
    }

    fn u32_from_bytes(self, b: &[u8]) -> u32 {
        match self {
            Self::Little => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            Self::Big => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
        }
    }
}

fn slice4(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    buf.get(offset..offset + len)
        .ok_or_else(|| LidarError::bad_input(format!("truncated TIFF at offset {offset}")))
}

/// A raw, un-dereferenced IFD entry as laid out on disk.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub tag: u16,
    pub dtype: u16,
    pub count: u32,
    /// The 4-byte value-or-offset field, verbatim.
    pub value_or_offset: [u8; 4],
}

fn type_size(dtype: u16) -> usize {
    match dtype {
        1 | 2 | 6 | 7 => 1,
        3 | 8 => 2,
        4 | 9 | 11 => 4,
        5 | 10 | 12 => 8,
        _ => 0,
    }
}

impl RawEntry {
    /// Resolves the bytes backing this entry's values: inline within
    /// `value_or_offset` when they fit in 4 bytes, or via the external
    /// offset otherwise.
    fn value_bytes<'a>(&self, buf: &'a [u8], order: ByteOrder) -> Result<std::borrow::Cow<'a, [u8]>> {
        let size = type_size(self.dtype);
        let total = size.checked_mul(self.count as usize).unwrap_or(usize::MAX);
        if total == 0 {
            return Ok(std::borrow::Cow::Borrowed(&[]));
        }
        if total <= 4 {
            Ok(std::borrow::Cow::Owned(self.value_or_offset[..total].to_vec()))
        } else {
            let offset = order.u32_from_bytes(&self.value_or_offset) as usize;
            let bytes = buf.get(offset..offset + total).ok_or_else(|| {
                LidarError::bad_input(format!("IFD entry tag {} points out of bounds", self.tag))
            })?;
            Ok(std::borrow::Cow::Borrowed(bytes))
        }
    }

    pub fn as_u32_vec(&self, buf: &[u8], order: ByteOrder) -> Result<Vec<u32>> {
        let size = type_size(self.dtype);
        if size == 0 {
            return Err(LidarError::bad_input(format!("unsupported IFD type {} for tag {}", self.dtype, self.tag)));
        }
        let bytes = self.value_bytes(buf, order)?;
        let mut out = Vec::with_capacity(self.count as usize);
        for chunk in bytes.chunks(size) {
            let v = match self.dtype {
                1 | 2 | 6 | 7 => chunk[0] as u32,
                3 | 8 => order.u16_from_bytes(chunk) as u32,
                4 | 9 => order.u32_from_bytes(chunk),
                other => return Err(LidarError::bad_input(format!("tag {} has non-integer type {other}", self.tag))),
            };
            out.push(v);
        }
        Ok(out)
    }

    pub fn as_f64_vec(&self, buf: &[u8], order: ByteOrder) -> Result<Vec<f64>> {
        let bytes = self.value_bytes(buf, order)?;
        match self.dtype {
            12 => Ok(bytes
                .chunks(8)
                .map(|c| match order {
                    ByteOrder::Little => f64::from_le_bytes(c.try_into().unwrap()),
                    ByteOrder::Big => f64::from_be_bytes(c.try_into().unwrap()),
                })
                .collect()),
            5 => Ok(bytes
                .chunks(8)
                .map(|c| {
                    let num = order.u32_from_bytes(&c[0..4]) as f64;
                    let den = order.u32_from_bytes(&c[4..8]) as f64;
                    if den == 0.0 { 0.0 } else { num / den }
                })
                .collect()),
            other => Err(LidarError::bad_input(format!("tag {} has non-rational/double type {other}", self.tag))),
        }
    }

    pub fn as_ascii(&self, buf: &[u8], order: ByteOrder) -> Result<String> {
        let bytes = self.value_bytes(buf, order)?;
        let text = bytes.iter().take_while(|&&b| b != 0).copied().collect::<Vec<u8>>();
        String::from_utf8(text).map_err(|e| LidarError::bad_input(format!("tag {} is not valid ASCII: {e}", self.tag)))
    }
}

/// All IFD entries of the first (and only, for this decoder) image
/// directory, indexed by tag number.
pub struct TagTable {
    entries: HashMap<u16, RawEntry>,
}

impl TagTable {
    #[cfg(test)]
    pub fn from_entries(entries: HashMap<u16, RawEntry>) -> Self {
        Self { entries }
    }

    pub fn read(buf: &[u8], ifd_offset: usize, order: ByteOrder) -> Result<Self> {
        let count = order.u16_at(buf, ifd_offset)? as usize;
        let mut entries = HashMap::with_capacity(count);
        for i in 0..count {
            let entry_offset = ifd_offset + 2 + i * 12;
            let tag = order.u16_at(buf, entry_offset)?;
            let dtype = order.u16_at(buf, entry_offset + 2)?;
            let count = order.u32_at(buf, entry_offset + 4)?;
            let value_or_offset: [u8; 4] = buf
                .get(entry_offset + 8..entry_offset + 12)
                .ok_or_else(|| LidarError::bad_input("truncated IFD entry"))?
                .try_into()
                .unwrap();
            entries.insert(tag, RawEntry { tag, dtype, count, value_or_offset });
        }
        Ok(Self { entries })
    }

    pub fn has(&self, tag: u16) -> bool {
        self.entries.contains_key(&tag)
    }

    pub fn get(&self, tag: u16) -> Option<&RawEntry> {
        self.entries.get(&tag)
    }

    pub fn require(&self, tag: u16) -> Result<&RawEntry> {
        self.get(tag).ok_or_else(|| LidarError::bad_input(format!("missing required TIFF tag {tag}")))
    }

    pub fn u32_single(&self, buf: &[u8], order: ByteOrder, tag: u16) -> Result<u32> {
        let entry = self.require(tag)?;
        entry
            .as_u32_vec(buf, order)?
            .first()
            .copied()
            .ok_or_else(|| LidarError::bad_input(format!("tag {tag} has no values")))
    }

    pub fn u32_single_or(&self, buf: &[u8], order: ByteOrder, tag: u16, default: u32) -> Result<u32> {
        match self.get(tag) {
            Some(_) => self.u32_single(buf, order, tag),
            None => Ok(default),
        }
    }

    pub fn u32_vec(&self, buf: &[u8], order: ByteOrder, tag: u16) -> Result<Vec<u32>> {
        self.require(tag)?.as_u32_vec(buf, order)
    }

    pub fn f64_vec(&self, buf: &[u8], order: ByteOrder, tag: u16) -> Result<Vec<f64>> {
        self.require(tag)?.as_f64_vec(buf, order)
    }

    pub fn ascii(&self, buf: &[u8], order: ByteOrder, tag: u16) -> Option<String> {
        self.get(tag).and_then(|e| e.as_ascii(buf, order).ok())
    }
}
