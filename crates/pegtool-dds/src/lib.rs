//! DDS texture handling for PEG containers.
//!
//! PEG entries describe their pixel layout with a small closed set of
//! [`TextureFormat`] values. This crate maps those values to and from the
//! pixel format block of a DDS header, and reads and writes whole DDS files
//! whose surface data is treated as opaque bytes.
//!
//! # Example
//!
//! ```no_run
//! use pegtool_dds::{detect_format, DdsFile};
//!
//! let dds = DdsFile::from_path("rock_diffuse.dds")?;
//! let format = detect_format(&dds.header.pixel_format);
//! println!("{}x{} {}", dds.header.width, dds.header.height, format);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod file;
mod format;
mod header;

pub use error::{Error, Result};
pub use file::DdsFile;
pub use format::{detect_format, pixel_format_for, TextureFormat};
pub use header::{
    compressed_size, DdsHeader, DdsPixelFormat, FourCC, DDPF_ALPHA, DDPF_ALPHAPIXELS,
    DDPF_BUMPDUDV, DDPF_FOURCC, DDPF_RGB, DDPF_RGBA, DDSCAPS_COMPLEX, DDSCAPS_MIPMAP,
    DDSCAPS_TEXTURE, DDSD_CAPS, DDSD_HEIGHT, DDSD_LINEARSIZE, DDSD_MIPMAPCOUNT, DDSD_PITCH,
    DDSD_PIXELFORMAT, DDSD_REQUIRED, DDSD_WIDTH,
};

/// DDS file magic bytes ("DDS ").
pub const DDS_MAGIC: &[u8; 4] = b"DDS ";
