//! Bounds-checked little-endian readers and the append-only block builder.
//!
//! A [`Region`] is a window over the tile buffer that remembers its absolute
//! start, so every error can report a tile-relative offset. Sub-regions that
//! fall outside their parent produce [`DecodeError::InvalidOffset`]; reads that
//! run off the end of a region produce [`DecodeError::TruncatedBuffer`].

use glam::Vec3;

use crate::error::{DecodeError, EncodeError};

/// A borrowed window into the tile buffer.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Region<'a> {
    bytes: &'a [u8],
    base: usize,
}

impl<'a> Region<'a> {
    /// Wraps a whole buffer starting at absolute offset 0.
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, base: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Absolute offset of the first byte.
    pub(crate) fn base(&self) -> usize {
        self.base
    }

    pub(crate) fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Returns the sub-region `[offset, offset + len)` relative to this region.
    pub(crate) fn sub(
        &self,
        offset: usize,
        len: usize,
        what: &'static str,
    ) -> Result<Region<'a>, DecodeError> {
        let end = offset.checked_add(len);
        match end {
            Some(end) if end <= self.bytes.len() => Ok(Region {
                bytes: &self.bytes[offset..end],
                base: self.base + offset,
            }),
            _ => Err(DecodeError::InvalidOffset {
                offset: self.base.saturating_add(offset),
                what,
            }),
        }
    }

    /// Returns everything from `offset` to the end of this region.
    pub(crate) fn tail(&self, offset: usize, what: &'static str) -> Result<Region<'a>, DecodeError> {
        let len = self.bytes.len().checked_sub(offset).ok_or(DecodeError::InvalidOffset {
            offset: self.base.saturating_add(offset),
            what,
        })?;
        self.sub(offset, len, what)
    }

    pub(crate) fn cursor(&self) -> Cursor<'a> {
        Cursor {
            bytes: self.bytes,
            base: self.base,
            pos: 0,
        }
    }
}

/// Sequential little-endian reader over a [`Region`].
#[derive(Debug)]
pub(crate) struct Cursor<'a> {
    bytes: &'a [u8],
    base: usize,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Absolute offset of the next byte to be read.
    pub(crate) fn position(&self) -> usize {
        self.base + self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::TruncatedBuffer {
                offset: self.position(),
                needed: n,
                available: self.remaining(),
            });
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn i8(&mut self) -> Result<i8, DecodeError> {
        Ok(i8::from_le_bytes(self.array()?))
    }

    pub(crate) fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    /// Reads a `u32` offset or count field as `usize`.
    pub(crate) fn usize32(&mut self) -> Result<usize, DecodeError> {
        Ok(self.u32()? as usize)
    }

    pub(crate) fn u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub(crate) fn f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    pub(crate) fn vec3(&mut self) -> Result<Vec3, DecodeError> {
        Ok(Vec3::new(self.f32()?, self.f32()?, self.f32()?))
    }
}

/// Append-only byte buffer used to lay out blocks before their header is stamped.
///
/// Positions returned by [`BlockBuilder::position`] are relative to the start
/// of the builder; callers add the size of whatever header will later be
/// prepended to obtain final offsets.
#[derive(Debug, Default)]
pub(crate) struct BlockBuilder {
    buf: Vec<u8>,
}

impl BlockBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub(crate) fn put_i8(&mut self, v: i8) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn put_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn put_vec3(&mut self, v: Vec3) {
        self.put_f32(v.x);
        self.put_f32(v.y);
        self.put_f32(v.z);
    }

    pub(crate) fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Appends `bytes` and returns the range they occupy.
    pub(crate) fn append_block(&mut self, bytes: &[u8]) -> BlockRange {
        let offset = self.position();
        self.put_bytes(bytes);
        BlockRange {
            offset,
            len: bytes.len(),
        }
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// A written byte range inside a [`BlockBuilder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BlockRange {
    pub offset: usize,
    pub len: usize,
}

impl BlockRange {
    /// Returns the offset shifted by `base`, or 0 when the block is empty
    /// and `zero_if_empty` is set.
    pub(crate) fn offset_u32(
        &self,
        base: usize,
        zero_if_empty: bool,
        what: &'static str,
    ) -> Result<u32, EncodeError> {
        if zero_if_empty && self.len == 0 {
            return Ok(0);
        }
        to_u32(base + self.offset, what)
    }
}

/// Narrows a size or offset to the 32-bit field width used on disk.
pub(crate) fn to_u32(value: usize, what: &'static str) -> Result<u32, EncodeError> {
    u32::try_from(value).map_err(|_| EncodeError::TooLarge(what))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_region_reports_absolute_offset() {
        let data = [0u8; 32];
        let region = Region::new(&data);
        let inner = region.sub(8, 16, "inner").unwrap();
        assert_eq!(inner.base(), 8);

        let err = inner.sub(10, 10, "block").unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidOffset {
                offset: 18,
                what: "block"
            }
        );
    }

    #[test]
    fn test_cursor_reads_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x00, 0x00, 0x80, 0x3F];
        let mut cursor = Region::new(&data).cursor();
        assert_eq!(cursor.u32().unwrap(), 0x0403_0201);
        assert_eq!(cursor.f32().unwrap(), 1.0);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_cursor_truncation_error() {
        let data = [0u8; 6];
        let region = Region::new(&data).sub(2, 4, "r").unwrap();
        let mut cursor = region.cursor();
        cursor.u16().unwrap();
        let err = cursor.u32().unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedBuffer {
                offset: 4,
                needed: 4,
                available: 2
            }
        );
    }

    #[test]
    fn test_builder_records_ranges() {
        let mut builder = BlockBuilder::new();
        builder.put_u32(7);
        let range = builder.append_block(&[1, 2, 3]);
        assert_eq!(range, BlockRange { offset: 4, len: 3 });
        assert_eq!(range.offset_u32(100, false, "x").unwrap(), 104);
        assert_eq!(BlockRange::default().offset_u32(100, true, "x").unwrap(), 0);
        assert_eq!(builder.into_inner(), vec![7, 0, 0, 0, 1, 2, 3]);
    }
}
