//! Binary writer for little-endian serialization.
//!
//! [`BinaryWriter`] wraps any [`Write`] and tracks how many bytes went
//! through it, so callers can record offsets and pad to an alignment without
//! requiring [`std::io::Seek`].

use std::io::{Read, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use zerocopy::{Immutable, IntoBytes};

use crate::{Error, Result};

/// A little-endian binary writer with position tracking.
///
/// # Example
///
/// ```
/// use pegtool_common::BinaryWriter;
///
/// let mut writer = BinaryWriter::new(Vec::new());
/// writer.write_u16(0x0201).unwrap();
/// writer.write_cstring("ab").unwrap();
/// writer.align(8).unwrap();
///
/// assert_eq!(writer.position(), 8);
/// assert_eq!(writer.into_inner(), [0x01, 0x02, b'a', b'b', 0, 0, 0, 0]);
/// ```
#[derive(Debug)]
pub struct BinaryWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> BinaryWriter<W> {
    /// Create a writer starting at position zero.
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.inner.write_u8(value)?;
        self.position += 1;
        Ok(())
    }

    /// Write a signed byte.
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.inner.write_i8(value)?;
        self.position += 1;
        Ok(())
    }

    /// Write a little-endian u16.
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.inner.write_u16::<LittleEndian>(value)?;
        self.position += 2;
        Ok(())
    }

    /// Write a little-endian i16.
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.inner.write_i16::<LittleEndian>(value)?;
        self.position += 2;
        Ok(())
    }

    /// Write a little-endian u32.
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.inner.write_u32::<LittleEndian>(value)?;
        self.position += 4;
        Ok(())
    }

    /// Write a little-endian i32.
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.inner.write_i32::<LittleEndian>(value)?;
        self.position += 4;
        Ok(())
    }

    /// Write a little-endian u64.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.inner.write_u64::<LittleEndian>(value)?;
        self.position += 8;
        Ok(())
    }

    /// Write a little-endian i64.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.inner.write_i64::<LittleEndian>(value)?;
        self.position += 8;
        Ok(())
    }

    /// Write a string followed by a null terminator.
    ///
    /// A string containing an interior NUL could not be read back and is rejected.
    pub fn write_cstring(&mut self, value: &str) -> Result<()> {
        if memchr::memchr(0, value.as_bytes()).is_some() {
            return Err(Error::invalid_field("string", value.escape_debug()));
        }
        self.write_bytes(value.as_bytes())?;
        self.write_u8(0)
    }

    /// Write a struct using zerocopy.
    pub fn write_struct<T: IntoBytes + Immutable>(&mut self, value: &T) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Pad with zero bytes up to the next multiple of `alignment`.
    ///
    /// Returns the number of padding bytes written. An alignment of 0 or 1
    /// never pads.
    pub fn align(&mut self, alignment: u64) -> Result<u64> {
        if alignment <= 1 {
            return Ok(0);
        }
        let padding = (alignment - self.position % alignment) % alignment;
        if padding > 0 {
            std::io::copy(&mut std::io::repeat(0).take(padding), &mut self.inner)?;
            self.position += padding;
        }
        Ok(padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BinaryReader;

    #[test]
    fn test_write_primitives() {
        let mut writer = BinaryWriter::new(Vec::new());
        writer.write_u32(0x04030201).unwrap();
        writer.write_i16(-1).unwrap();
        writer.write_i64(-2).unwrap();
        writer.write_i8(-3).unwrap();
        assert_eq!(writer.position(), 15);

        let bytes = writer.into_inner();
        assert_eq!(&bytes[..6], &[0x01, 0x02, 0x03, 0x04, 0xFF, 0xFF]);

        let mut reader = BinaryReader::new(&bytes);
        reader.advance(6);
        assert_eq!(reader.read_i64().unwrap(), -2);
        assert_eq!(reader.read_i8().unwrap(), -3);
    }

    #[test]
    fn test_write_cstring() {
        let mut writer = BinaryWriter::new(Vec::new());
        writer.write_cstring("tex").unwrap();
        writer.write_cstring("").unwrap();
        assert_eq!(writer.into_inner(), b"tex\0\0");
    }

    #[test]
    fn test_write_cstring_rejects_interior_nul() {
        let mut writer = BinaryWriter::new(Vec::new());
        let err = writer.write_cstring("a\0b").unwrap_err();
        assert_eq!(err.field(), Some("string"));
        assert_eq!(writer.position(), 0);
    }

    #[test]
    fn test_align() {
        let mut writer = BinaryWriter::new(Vec::new());
        assert_eq!(writer.align(16).unwrap(), 0);

        writer.write_u8(0xAA).unwrap();
        assert_eq!(writer.align(16).unwrap(), 15);
        assert_eq!(writer.position(), 16);
        assert_eq!(writer.align(16).unwrap(), 0);

        writer.write_bytes(&[1, 2, 3]).unwrap();
        assert_eq!(writer.align(1).unwrap(), 0);
        assert_eq!(writer.align(0).unwrap(), 0);

        let bytes = writer.into_inner();
        assert_eq!(bytes.len(), 19);
        assert!(bytes[1..16].iter().all(|&b| b == 0));
    }
}
