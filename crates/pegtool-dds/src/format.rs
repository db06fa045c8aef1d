//! Texture formats understood by PEG containers and their DDS pixel formats.
//!
//! The mapping is a single ordered table. Detection scans it front to back
//! and returns the first row that matches, so row order decides ties.

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::header::{
    DdsPixelFormat, FourCC, DDPF_ALPHA, DDPF_ALPHAPIXELS, DDPF_BUMPDUDV, DDPF_FOURCC, DDPF_RGB,
    DDPF_RGBA,
};
use crate::{Error, Result};

/// Texture pixel format as stored in a PEG entry.
///
/// Values outside the known set are kept as-is so that unrecognised entries
/// survive a read/write cycle unchanged.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
#[repr(transparent)]
pub struct TextureFormat(pub u16);

impl TextureFormat {
    /// No format assigned.
    pub const UNKNOWN: Self = Self(0);
    /// BC1 block compression.
    pub const DXT1: Self = Self(400);
    /// BC2 block compression.
    pub const DXT3: Self = Self(401);
    /// BC3 block compression.
    pub const DXT5: Self = Self(402);
    /// 16-bit 5:6:5 RGB.
    pub const R5G6B5: Self = Self(403);
    /// 16-bit 1:5:5:5 ARGB.
    pub const A1R5G5B5: Self = Self(404);
    /// 16-bit 4:4:4:4 ARGB.
    pub const A4R4G4B4: Self = Self(405);
    /// 24-bit RGB.
    pub const R8G8B8: Self = Self(406);
    /// 32-bit ARGB.
    pub const A8R8G8B8: Self = Self(407);
    /// 16-bit bump map (V8U8).
    pub const V8U8: Self = Self(408);
    /// 16-bit compressed normal map (CxV8U8).
    pub const CXV8U8: Self = Self(409);
    /// 8-bit alpha only.
    pub const A8: Self = Self(410);

    /// Every format with a DDS mapping, in detection order.
    pub fn supported() -> impl Iterator<Item = TextureFormat> {
        FORMATS.iter().map(|info| info.format)
    }

    /// Get the raw on-disk value.
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Check whether this format has a DDS mapping.
    pub fn is_supported(self) -> bool {
        lookup(self).is_some()
    }

    /// Human-readable name, `"UNKNOWN"` for unmapped values.
    pub fn name(self) -> &'static str {
        lookup(self).map_or("UNKNOWN", |info| info.name)
    }

    /// Bytes per 4x4 block for block-compressed formats.
    pub fn block_size(self) -> Option<u32> {
        match self {
            Self::DXT1 => Some(8),
            Self::DXT3 | Self::DXT5 => Some(16),
            _ => None,
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for TextureFormat {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match lookup(*self) {
            Some(info) => serializer.serialize_str(info.name),
            None => serializer.serialize_u16(self.0),
        }
    }
}

/// One row of the format table.
struct FormatInfo {
    format: TextureFormat,
    name: &'static str,
    pixel_format: DdsPixelFormat,
}

const fn four_cc(format: TextureFormat, name: &'static str, code: FourCC) -> FormatInfo {
    FormatInfo {
        format,
        name,
        pixel_format: DdsPixelFormat {
            size: DdsPixelFormat::SIZE,
            flags: DDPF_FOURCC,
            four_cc: code,
            rgb_bit_count: 0,
            r_bit_mask: 0,
            g_bit_mask: 0,
            b_bit_mask: 0,
            a_bit_mask: 0,
        },
    }
}

const fn masked(
    format: TextureFormat,
    name: &'static str,
    flags: u32,
    four_cc: FourCC,
    bits: u32,
    [r, g, b, a]: [u32; 4],
) -> FormatInfo {
    FormatInfo {
        format,
        name,
        pixel_format: DdsPixelFormat {
            size: DdsPixelFormat::SIZE,
            flags,
            four_cc,
            rgb_bit_count: bits,
            r_bit_mask: r,
            g_bit_mask: g,
            b_bit_mask: b,
            a_bit_mask: a,
        },
    }
}

/// Indexed by `format - 400`; the order is also the detection order.
#[rustfmt::skip]
static FORMATS: [FormatInfo; 11] = [
    four_cc(TextureFormat::DXT1, "DXT1", FourCC::DXT1),
    four_cc(TextureFormat::DXT3, "DXT3", FourCC::DXT3),
    four_cc(TextureFormat::DXT5, "DXT5", FourCC::DXT5),
    masked(TextureFormat::R5G6B5, "R5G6B5", DDPF_RGB, FourCC::NONE, 16, [0xF800, 0x07E0, 0x001F, 0]),
    masked(TextureFormat::A1R5G5B5, "A1R5G5B5", DDPF_RGBA, FourCC::NONE, 16, [0x7C00, 0x03E0, 0x001F, 0x8000]),
    masked(TextureFormat::A4R4G4B4, "A4R4G4B4", DDPF_RGBA, FourCC::NONE, 16, [0x0F00, 0x00F0, 0x000F, 0xF000]),
    masked(TextureFormat::R8G8B8, "R8G8B8", DDPF_RGB, FourCC::NONE, 24, [0xFF0000, 0x00FF00, 0x0000FF, 0]),
    masked(TextureFormat::A8R8G8B8, "A8R8G8B8", DDPF_RGBA, FourCC::NONE, 32, [0x00FF0000, 0x0000FF00, 0x000000FF, 0xFF000000]),
    masked(TextureFormat::V8U8, "V8U8", DDPF_BUMPDUDV, FourCC::NONE, 16, [0x00FF, 0xFF00, 0, 0]),
    masked(TextureFormat::CXV8U8, "CxV8U8", DDPF_FOURCC, FourCC::CXV8U8, 16, [0x00FF, 0xFF00, 0, 0]),
    masked(TextureFormat::A8, "A8", DDPF_ALPHA, FourCC::NONE, 8, [0, 0, 0, 0xFF]),
];

fn lookup(format: TextureFormat) -> Option<&'static FormatInfo> {
    let index = format.0.checked_sub(TextureFormat::DXT1.0)?;
    FORMATS
        .get(usize::from(index))
        .filter(|info| info.format == format)
}

/// Find the texture format described by a DDS pixel format.
///
/// Flags must match a table row exactly. The four-character code, RGB bit
/// count and masks, and alpha mask are compared only when the corresponding
/// flag is set. Returns [`TextureFormat::UNKNOWN`] when nothing matches.
pub fn detect_format(pixel_format: &DdsPixelFormat) -> TextureFormat {
    FORMATS
        .iter()
        .find(|info| matches(pixel_format, &info.pixel_format))
        .map_or(TextureFormat::UNKNOWN, |info| info.format)
}

fn matches(candidate: &DdsPixelFormat, reference: &DdsPixelFormat) -> bool {
    if candidate.flags != reference.flags {
        return false;
    }
    if candidate.has_flag(DDPF_FOURCC) && candidate.four_cc != reference.four_cc {
        return false;
    }
    if candidate.has_flag(DDPF_RGB)
        && (candidate.rgb_bit_count != reference.rgb_bit_count
            || candidate.r_bit_mask != reference.r_bit_mask
            || candidate.g_bit_mask != reference.g_bit_mask
            || candidate.b_bit_mask != reference.b_bit_mask)
    {
        return false;
    }
    if candidate.has_flag(DDPF_ALPHAPIXELS) && candidate.a_bit_mask != reference.a_bit_mask {
        return false;
    }
    true
}

/// Get the DDS pixel format for a texture format.
///
/// Fails with a `format` field error for values without a table row,
/// including [`TextureFormat::UNKNOWN`].
pub fn pixel_format_for(format: TextureFormat) -> Result<DdsPixelFormat> {
    lookup(format)
        .map(|info| info.pixel_format)
        .ok_or_else(|| Error::invalid_field("format", format.0))
}
