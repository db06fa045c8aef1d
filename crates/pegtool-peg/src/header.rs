//! Container directory: the header, entry records and name block.

use std::io::Write;

use log::info;
use pegtool_common::{BinaryReader, BinaryWriter};

use crate::entry::PegEntry;
use crate::{Error, Result, PEG_MAGIC};

/// Directory of a PEG container, as stored in the header file.
///
/// # File Format
///
/// - 24 bytes: header (`"GEKV"`, version, platform, block sizes, counters,
///   alignment)
/// - N x 72 bytes: entry records
/// - N null-terminated filenames, in entry order
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PegHeader {
    pub version: i16,
    /// Target platform, 0 for PC.
    pub platform: i16,
    /// Size of the header file in bytes.
    pub dir_block_size: u32,
    /// Size of the data file in bytes, including padding.
    pub data_block_size: u32,
    pub num_bitmaps: u16,
    pub flags: u16,
    pub total_entries: u16,
    /// Payload start alignment in the data file.
    pub alignment: u16,
    pub entries: Vec<PegEntry>,
}

impl Default for PegHeader {
    fn default() -> Self {
        Self {
            version: Self::VERSION,
            platform: Self::PLATFORM_PC,
            dir_block_size: 0,
            data_block_size: 0,
            num_bitmaps: 0,
            flags: 0,
            total_entries: 0,
            alignment: Self::DEFAULT_ALIGNMENT,
            entries: Vec::new(),
        }
    }
}

impl PegHeader {
    /// Size of the fixed header.
    pub const SIZE: usize = 24;
    /// The only supported container version.
    pub const VERSION: i16 = 13;
    /// Platform id for PC containers.
    pub const PLATFORM_PC: i16 = 0;
    /// Payload alignment used by PC containers.
    pub const DEFAULT_ALIGNMENT: u16 = 16;

    /// Create an empty container directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a directory from the full contents of a header file.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::read(&mut BinaryReader::new(data))
    }

    /// Read the header, entry records and filenames.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let signature: [u8; 4] = reader.read_array()?;
        let version = reader.read_i16()?;
        let platform = reader.read_i16()?;
        let dir_block_size = reader.read_u32()?;
        let data_block_size = reader.read_u32()?;
        let num_bitmaps = reader.read_u16()?;
        let flags = reader.read_u16()?;
        let total_entries = reader.read_u16()?;
        let alignment = reader.read_u16()?;

        if &signature != PEG_MAGIC {
            return Err(Error::invalid_field(
                "signature",
                String::from_utf8_lossy(&signature).escape_debug(),
            ));
        }
        if version != Self::VERSION {
            return Err(Error::invalid_field("version", version));
        }
        if num_bitmaps != total_entries {
            return Err(Error::invalid_field("num_bitmaps", num_bitmaps));
        }

        let mut entries = (0..total_entries)
            .map(|_| PegEntry::read_record(reader))
            .collect::<Result<Vec<_>>>()?;
        for entry in &mut entries {
            entry.filename = reader.read_cstring()?.to_owned();
        }

        Ok(Self {
            version,
            platform,
            dir_block_size,
            data_block_size,
            num_bitmaps,
            flags,
            total_entries,
            alignment,
            entries,
        })
    }

    /// Check the counters and filenames before anything is written.
    pub(crate) fn validate(&self) -> Result<()> {
        if usize::from(self.total_entries) != self.entries.len() {
            return Err(Error::invalid_field("total_entries", self.total_entries));
        }
        if self.total_entries != self.num_bitmaps {
            return Err(Error::invalid_field("num_bitmaps", self.num_bitmaps));
        }
        if self.entries.iter().any(|entry| entry.filename.is_empty()) {
            return Err(Error::invalid_field("filename", "empty"));
        }
        Ok(())
    }

    /// Write the header, entry records and filenames.
    ///
    /// Counters and filenames are validated first, so a failed write emits
    /// nothing.
    pub fn write<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        self.validate()?;

        writer.write_bytes(PEG_MAGIC)?;
        writer.write_i16(self.version)?;
        writer.write_i16(self.platform)?;
        writer.write_u32(self.dir_block_size)?;
        writer.write_u32(self.data_block_size)?;
        writer.write_u16(self.num_bitmaps)?;
        writer.write_u16(self.flags)?;
        writer.write_u16(self.total_entries)?;
        writer.write_u16(self.alignment)?;

        for entry in &self.entries {
            entry.write_record(writer)?;
        }
        for entry in &self.entries {
            writer.write_cstring(&entry.filename)?;
        }
        Ok(())
    }

    /// Serialize the directory to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = BinaryWriter::new(Vec::with_capacity(self.byte_size()));
        self.write(&mut writer)?;
        Ok(writer.into_inner())
    }

    /// Exact number of bytes [`PegHeader::write`] produces.
    pub fn byte_size(&self) -> usize {
        Self::SIZE
            + self.entries.len() * PegEntry::RECORD_SIZE
            + self
                .entries
                .iter()
                .map(|entry| entry.filename.len() + 1)
                .sum::<usize>()
    }

    /// Index of the first entry with exactly this name.
    pub fn find_index(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.filename == name)
    }

    /// Find the first entry with exactly this name.
    pub fn find(&self, name: &str) -> Option<&PegEntry> {
        self.find_index(name).map(|index| &self.entries[index])
    }

    /// Append an entry, keeping both counters in step.
    ///
    /// Fails with a `total_entries` field error when the container is full.
    pub fn add_entry(&mut self, entry: PegEntry) -> Result<usize> {
        let count = self
            .total_entries
            .checked_add(1)
            .ok_or_else(|| Error::invalid_field("total_entries", self.total_entries))?;
        info!("Adding {}", entry.filename);
        self.entries.push(entry);
        self.total_entries = count;
        self.num_bitmaps = count;
        Ok(self.entries.len() - 1)
    }

    /// Remove the first entry with this name.
    ///
    /// Returns `false` without changing anything if no entry matches.
    pub fn remove_entry(&mut self, name: &str) -> bool {
        match self.find_index(name) {
            Some(index) => self.remove_at(index).is_some(),
            None => false,
        }
    }

    /// Remove the entry at `index`, keeping both counters in step.
    pub fn remove_at(&mut self, index: usize) -> Option<PegEntry> {
        if index >= self.entries.len() {
            return None;
        }
        debug_assert_eq!(self.total_entries, self.num_bitmaps);
        debug_assert_eq!(usize::from(self.total_entries), self.entries.len());
        let entry = self.entries.remove(index);
        info!("Removing {}", entry.filename);
        self.total_entries -= 1;
        self.num_bitmaps -= 1;
        Some(entry)
    }

    /// Replace the entry at `index` in place.
    pub fn update_entry(&mut self, index: usize, entry: PegEntry) -> Result<()> {
        let slot = self
            .entries
            .get_mut(index)
            .ok_or_else(|| Error::invalid_field("index", index))?;
        info!("Updating {}", entry.filename);
        *slot = entry;
        Ok(())
    }
}
