//! pegtool - PEG texture container library.
//!
//! This crate provides a unified interface to the pegtool crates for reading,
//! editing and validating PEG texture containers.
//!
//! # Crates
//!
//! - [`pegtool_common`] - Binary reading and writing
//! - [`pegtool_dds`] - DDS headers, files and texture format mapping
//! - [`pegtool_peg`] - Container codec, data layout and validation
//!
//! # Example
//!
//! ```no_run
//! use pegtool::prelude::*;
//!
//! let peg = PegFile::open("always_loaded.cpeg_pc")?;
//! for failure in check(&peg) {
//!     println!("Failed check: {failure}");
//! }
//!
//! // Extract the first texture
//! let dds = peg.export_dds(0)?;
//! dds.write_to_path("first.dds")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use pegtool_common as common;
pub use pegtool_dds as dds;
pub use pegtool_peg as peg;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use pegtool_common::{BinaryReader, BinaryWriter};
    pub use pegtool_dds::{detect_format, pixel_format_for, DdsFile, DdsHeader, TextureFormat};
    pub use pegtool_peg::{
        check, data_path_for, flag_names, texture_name, PegEntry, PegFile, PegHeader,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
