//! DDS header structures.

use std::io::Write;

use pegtool_common::{BinaryReader, BinaryWriter};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result, DDS_MAGIC};

// Pixel format flags (ddraw.h)

/// Pixel format has an alpha channel mask.
pub const DDPF_ALPHAPIXELS: u32 = 0x1;
/// Alpha-only surface.
pub const DDPF_ALPHA: u32 = 0x2;
/// The `four_cc` field is valid.
pub const DDPF_FOURCC: u32 = 0x4;
/// The RGB bit count and masks are valid.
pub const DDPF_RGB: u32 = 0x40;
/// RGB with alpha.
pub const DDPF_RGBA: u32 = DDPF_RGB | DDPF_ALPHAPIXELS;
/// Bump map dU/dV data.
pub const DDPF_BUMPDUDV: u32 = 0x80000;

// Header flags

/// Required in every header.
pub const DDSD_CAPS: u32 = 0x1;
/// Required in every header.
pub const DDSD_HEIGHT: u32 = 0x2;
/// Required in every header.
pub const DDSD_WIDTH: u32 = 0x4;
/// Pitch is given for an uncompressed texture.
pub const DDSD_PITCH: u32 = 0x8;
/// Required in every header.
pub const DDSD_PIXELFORMAT: u32 = 0x1000;
/// The mipmap count is valid.
pub const DDSD_MIPMAPCOUNT: u32 = 0x20000;
/// Linear size is given for a compressed texture.
pub const DDSD_LINEARSIZE: u32 = 0x80000;
/// Flags that must be present in every header.
pub const DDSD_REQUIRED: u32 = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT;

// Caps flags

/// Surface has more than one layer.
pub const DDSCAPS_COMPLEX: u32 = 0x8;
/// Required.
pub const DDSCAPS_TEXTURE: u32 = 0x1000;
/// Surface has mipmaps.
pub const DDSCAPS_MIPMAP: u32 = 0x400000;

/// DDS file header.
///
/// Follows the 4-byte `"DDS "` magic at the start of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct DdsHeader {
    /// Header size (should be 124).
    pub size: u32,
    /// Header flags.
    pub flags: u32,
    /// Image height.
    pub height: u32,
    /// Image width.
    pub width: u32,
    /// Pitch or linear size.
    pub pitch_or_linear_size: u32,
    /// Depth (for volume textures).
    pub depth: u32,
    /// Number of mipmap levels.
    pub mipmap_count: u32,
    /// Reserved.
    pub reserved1: [u32; 11],
    /// Pixel format.
    pub pixel_format: DdsPixelFormat,
    /// Surface capabilities.
    pub caps: u32,
    /// Surface capabilities 2.
    pub caps2: u32,
    /// Surface capabilities 3.
    pub caps3: u32,
    /// Surface capabilities 4.
    pub caps4: u32,
    /// Reserved.
    pub reserved2: u32,
}

impl DdsHeader {
    /// Expected header size.
    pub const SIZE: u32 = 124;

    /// Bytes taken by the magic plus the header.
    pub const FILE_HEADER_LEN: usize = DDS_MAGIC.len() + Self::SIZE as usize;

    /// Read the magic and header, validating the structure sizes.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let magic: [u8; 4] = reader.read_array()?;
        if &magic != DDS_MAGIC {
            return Err(Error::invalid_field(
                "signature",
                String::from_utf8_lossy(&magic).escape_debug(),
            ));
        }

        let header: DdsHeader = reader.read_struct()?;
        if header.size != Self::SIZE {
            return Err(Error::invalid_field("size", header.size));
        }
        if header.pixel_format.size != DdsPixelFormat::SIZE {
            return Err(Error::invalid_field(
                "pixel_format.size",
                header.pixel_format.size,
            ));
        }

        Ok(header)
    }

    /// Write the magic and header.
    pub fn write<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_bytes(DDS_MAGIC)?;
        writer.write_struct(self)?;
        Ok(())
    }
}

impl Default for DdsHeader {
    fn default() -> Self {
        Self {
            size: Self::SIZE,
            flags: DDSD_REQUIRED,
            height: 0,
            width: 0,
            pitch_or_linear_size: 0,
            depth: 0,
            mipmap_count: 1,
            reserved1: [0; 11],
            pixel_format: DdsPixelFormat::default(),
            caps: DDSCAPS_TEXTURE,
            caps2: 0,
            caps3: 0,
            caps4: 0,
            reserved2: 0,
        }
    }
}

/// DDS pixel format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
#[repr(C)]
pub struct DdsPixelFormat {
    /// Structure size (should be 32).
    pub size: u32,
    /// Pixel format flags.
    pub flags: u32,
    /// Four-character code for compression.
    pub four_cc: FourCC,
    /// Number of bits per pixel (for uncompressed).
    pub rgb_bit_count: u32,
    /// Red bit mask.
    pub r_bit_mask: u32,
    /// Green bit mask.
    pub g_bit_mask: u32,
    /// Blue bit mask.
    pub b_bit_mask: u32,
    /// Alpha bit mask.
    pub a_bit_mask: u32,
}

impl DdsPixelFormat {
    /// Expected structure size.
    pub const SIZE: u32 = 32;

    /// Check whether a flag bit is set.
    #[inline]
    pub const fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

/// Four-character code for compression type.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
#[repr(transparent)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// No code.
    pub const NONE: Self = Self([0; 4]);
    /// DXT1 compression.
    pub const DXT1: Self = Self(*b"DXT1");
    /// DXT3 compression.
    pub const DXT3: Self = Self(*b"DXT3");
    /// DXT5 compression.
    pub const DXT5: Self = Self(*b"DXT5");
    /// D3DFMT_CxV8U8, stored as the numeric format id 117.
    pub const CXV8U8: Self = Self(117u32.to_le_bytes());
}

/// Calculate the size in bytes of a block-compressed surface.
///
/// Blocks cover 4x4 pixels; a surface always has at least one block in each
/// direction.
pub fn compressed_size(width: u32, height: u32, block_size: u32) -> u32 {
    let blocks_x = width.div_ceil(4).max(1);
    let blocks_y = height.div_ceil(4).max(1);
    blocks_x * blocks_y * block_size
}
