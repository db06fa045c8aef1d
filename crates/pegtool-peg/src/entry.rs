//! Texture entry records.

use std::io::Write;

use pegtool_common::{BinaryReader, BinaryWriter};
use pegtool_dds::{
    compressed_size, detect_format, pixel_format_for, DdsHeader, TextureFormat, DDSCAPS_COMPLEX,
    DDSCAPS_MIPMAP, DDSD_LINEARSIZE, DDSD_MIPMAPCOUNT, DDSD_PITCH,
};

use crate::{Error, Result};

// Entry flags

/// Texture has an alpha channel.
pub const FLAG_ALPHA: u16 = 0x1;
/// Dimensions are not powers of two.
pub const FLAG_NONPOW2: u16 = 0x2;
/// Alpha is used for alpha testing.
pub const FLAG_ALPHA_TEST: u16 = 0x4;
/// Six-faced cube map.
pub const FLAG_CUBE_MAP: u16 = 0x8;
/// Mip levels are interleaved.
pub const FLAG_INTERLEAVED_MIPS: u16 = 0x10;
/// Data is interleaved.
pub const FLAG_INTERLEAVED_DATA: u16 = 0x20;
/// Debug copy of the data exists.
pub const FLAG_DEBUG_DATA_COPIED: u16 = 0x40;
/// Dynamic texture.
pub const FLAG_DYNAMIC: u16 = 0x80;
/// Animation sheet; `anim_tiles_*` are meaningful.
pub const FLAG_ANIM_SHEET: u16 = 0x100;
/// Linear rather than sRGB color space.
pub const FLAG_LINEAR_COLOR_SPACE: u16 = 0x200;
/// High-resolution mip.
pub const FLAG_HIGH_MIP: u16 = 0x400;
/// Eligible for a high-resolution mip.
pub const FLAG_HIGH_MIP_ELIGIBLE: u16 = 0x800;
/// Linked to a high-resolution mip.
pub const FLAG_LINKED_TO_HIGH_MIP: u16 = 0x1000;
/// Permanently registered.
pub const FLAG_PERM_REGISTERED: u16 = 0x2000;

const FLAG_NAMES: [(u16, &str); 14] = [
    (FLAG_ALPHA, "ALPHA"),
    (FLAG_NONPOW2, "NONPOW2"),
    (FLAG_ALPHA_TEST, "ALPHA_TEST"),
    (FLAG_CUBE_MAP, "CUBE_MAP"),
    (FLAG_INTERLEAVED_MIPS, "INTERLEAVED_MIPS"),
    (FLAG_INTERLEAVED_DATA, "INTERLEAVED_DATA"),
    (FLAG_DEBUG_DATA_COPIED, "DEBUG_DATA_COPIED"),
    (FLAG_DYNAMIC, "DYNAMIC"),
    (FLAG_ANIM_SHEET, "ANIM_SHEET"),
    (FLAG_LINEAR_COLOR_SPACE, "LINEAR_COLOR_SPACE"),
    (FLAG_HIGH_MIP, "HIGH_MIP"),
    (FLAG_HIGH_MIP_ELIGIBLE, "HIGH_MIP_ELIGIBLE"),
    (FLAG_LINKED_TO_HIGH_MIP, "LINKED_TO_HIGH_MIP"),
    (FLAG_PERM_REGISTERED, "PERM_REGISTERED"),
];

/// Render the set flag bits as a comma-separated list of names, lowest bit first.
///
/// Bits without a name are skipped.
pub fn flag_names(flags: u16) -> String {
    FLAG_NAMES
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Metadata for one texture in a container.
///
/// The on-disk record is 72 bytes; the filename lives in the name block that
/// follows all records. The in-file filename pointer and trailing padding are
/// runtime scratch space and are always written as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PegEntry {
    /// Texture name, without extension.
    pub filename: String,
    /// Payload offset in the data file. Assigned by the layout engine.
    pub offset: i64,
    pub width: u16,
    pub height: u16,
    pub format: TextureFormat,
    /// Palette format, unused on PC.
    pub pal_fmt: u16,
    pub anim_tiles_width: u16,
    pub anim_tiles_height: u16,
    pub num_frames: u16,
    pub flags: u16,
    /// Palette size, unused on PC.
    pub pal_size: u16,
    pub fps: u8,
    pub mip_levels: u8,
    /// Payload length in bytes.
    pub data_size: u32,
    pub next: u64,
    pub prev: u64,
    pub cache: [u32; 2],
}

impl Default for PegEntry {
    fn default() -> Self {
        Self {
            filename: String::new(),
            offset: 0,
            width: 0,
            height: 0,
            format: TextureFormat::UNKNOWN,
            pal_fmt: 0,
            anim_tiles_width: 1,
            anim_tiles_height: 1,
            num_frames: 1,
            flags: 0,
            pal_size: 0,
            fps: 1,
            mip_levels: 1,
            data_size: 0,
            next: 0,
            prev: 0,
            cache: [0; 2],
        }
    }
}

impl PegEntry {
    /// Size of one entry record on disk.
    pub const RECORD_SIZE: usize = 72;

    /// Create a default entry with the given name.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Default::default()
        }
    }

    /// Check whether a flag bit is set.
    #[inline]
    pub const fn has_flag(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    /// Read one fixed-size record. The filename is left empty.
    pub fn read_record(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let offset = reader.read_i64()?;
        let width = reader.read_u16()?;
        let height = reader.read_u16()?;
        let format = TextureFormat(reader.read_u16()?);
        let pal_fmt = reader.read_u16()?;
        let anim_tiles_width = reader.read_u16()?;
        let anim_tiles_height = reader.read_u16()?;
        let num_frames = reader.read_u16()?;
        let flags = reader.read_u16()?;
        let _filename_ptr = reader.read_i64()?;
        let pal_size = reader.read_u16()?;
        let fps = reader.read_u8()?;
        let mip_levels = reader.read_u8()?;
        let data_size = reader.read_u32()?;
        let next = reader.read_u64()?;
        let prev = reader.read_u64()?;
        let cache = [reader.read_u32()?, reader.read_u32()?];
        let _padding = reader.read_u64()?;

        Ok(Self {
            filename: String::new(),
            offset,
            width,
            height,
            format,
            pal_fmt,
            anim_tiles_width,
            anim_tiles_height,
            num_frames,
            flags,
            pal_size,
            fps,
            mip_levels,
            data_size,
            next,
            prev,
            cache,
        })
    }

    /// Write the fixed-size record. The filename is written separately.
    pub fn write_record<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_i64(self.offset)?;
        writer.write_u16(self.width)?;
        writer.write_u16(self.height)?;
        writer.write_u16(self.format.raw())?;
        writer.write_u16(self.pal_fmt)?;
        writer.write_u16(self.anim_tiles_width)?;
        writer.write_u16(self.anim_tiles_height)?;
        writer.write_u16(self.num_frames)?;
        writer.write_u16(self.flags)?;
        writer.write_i64(0)?;
        writer.write_u16(self.pal_size)?;
        writer.write_u8(self.fps)?;
        writer.write_u8(self.mip_levels)?;
        writer.write_u32(self.data_size)?;
        writer.write_u64(self.next)?;
        writer.write_u64(self.prev)?;
        writer.write_u32(self.cache[0])?;
        writer.write_u32(self.cache[1])?;
        writer.write_u64(0)?;
        Ok(())
    }

    /// Take geometry, format and mip count from a DDS header.
    ///
    /// Nothing is changed if any value does not fit the entry.
    pub fn update_from_dds(&mut self, header: &DdsHeader) -> Result<()> {
        let width =
            u16::try_from(header.width).map_err(|_| Error::invalid_field("width", header.width))?;
        let height = u16::try_from(header.height)
            .map_err(|_| Error::invalid_field("height", header.height))?;
        let mip_levels = if header.mipmap_count > 1 {
            u8::try_from(header.mipmap_count)
                .map_err(|_| Error::invalid_field("mip_levels", header.mipmap_count))?
        } else {
            1
        };

        self.width = width;
        self.height = height;
        self.format = detect_format(&header.pixel_format);
        self.mip_levels = mip_levels;
        Ok(())
    }

    /// Build a DDS header describing this entry's payload.
    pub fn to_dds(&self) -> Result<DdsHeader> {
        let mut header = DdsHeader {
            width: u32::from(self.width),
            height: u32::from(self.height),
            pixel_format: pixel_format_for(self.format)?,
            ..Default::default()
        };

        if self.mip_levels > 1 {
            header.flags |= DDSD_MIPMAPCOUNT;
            header.mipmap_count = u32::from(self.mip_levels);
            header.caps |= DDSCAPS_COMPLEX | DDSCAPS_MIPMAP;
        }

        let bit_count = header.pixel_format.rgb_bit_count;
        if let Some(block_size) = self.format.block_size() {
            header.flags |= DDSD_LINEARSIZE;
            header.pitch_or_linear_size = compressed_size(header.width, header.height, block_size);
        } else if bit_count > 0 {
            header.flags |= DDSD_PITCH;
            header.pitch_or_linear_size = (header.width * bit_count).div_ceil(8);
        } else {
            return Err(Error::invalid_field("format", self.format.raw()));
        }

        Ok(header)
    }
}
