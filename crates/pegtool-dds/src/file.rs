//! Whole DDS files: magic, header and the opaque surface data after it.

use std::fs;
use std::path::Path;

use pegtool_common::{BinaryReader, BinaryWriter};

use crate::header::DdsHeader;
use crate::Result;

/// A DDS file held in memory.
///
/// Everything after the header is treated as one opaque payload. Mip levels
/// and faces are not split apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdsFile {
    /// Parsed header.
    pub header: DdsHeader,
    /// Surface data following the header.
    pub data: Vec<u8>,
}

impl DdsFile {
    /// Create a file from a header and its payload.
    pub fn new(header: DdsHeader, data: Vec<u8>) -> Self {
        Self { header, data }
    }

    /// Parse a DDS file from bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(bytes);
        let header = DdsHeader::read(&mut reader)?;
        let data = reader.remaining_bytes().to_vec();
        Ok(Self { header, data })
    }

    /// Read and parse a DDS file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer =
            BinaryWriter::new(Vec::with_capacity(DdsHeader::FILE_HEADER_LEN + self.data.len()));
        self.header.write(&mut writer)?;
        writer.write_bytes(&self.data)?;
        Ok(writer.into_inner())
    }

    /// Serialize and write to disk, replacing any existing file.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}
