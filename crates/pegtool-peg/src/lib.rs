//! PEG texture containers.
//!
//! A container is a pair of files. The header file (`.cpeg_pc` or
//! `.cvbm_pc`) holds a directory of texture entries; the data file (`.gpeg_pc`
//! or `.gvbm_pc`) holds the raw payload of every entry at an aligned offset.
//! This crate reads and writes both, keeps the directory counters consistent
//! as entries are added, replaced and removed, converts entries to and from
//! DDS files, and checks loaded containers for structural problems.
//!
//! # Example
//!
//! ```no_run
//! use pegtool_peg::{data_path_for, PegFile};
//!
//! let mut peg = PegFile::open("always_loaded.cpeg_pc")?;
//! for entry in &peg.header.entries {
//!     println!("{} {}x{} {}", entry.filename, entry.width, entry.height, entry.format);
//! }
//!
//! peg.import_dds_path("rock_diffuse.dds")?;
//! let data_path = data_path_for("always_loaded.cpeg_pc")?;
//! peg.save("always_loaded.cpeg_pc", data_path)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod check;
mod data;
mod entry;
mod error;
mod file;
mod header;

pub use check::check;
pub use data::{read_data, write_data};
pub use entry::*;
pub use error::{Error, Result};
pub use file::{data_path_for, texture_name, PegFile};
pub use header::PegHeader;

/// PEG header magic bytes ("GEKV").
pub const PEG_MAGIC: &[u8; 4] = b"GEKV";
