//! pegtool CLI - Command-line tool for PEG texture containers.
//!
//! This is the main entry point for the pegtool command-line application.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use pegtool::peg::FLAG_ANIM_SHEET;
use pegtool::prelude::*;

/// pegtool - PEG texture container editor
#[derive(Parser)]
#[command(name = "pegtool")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List header fields and texture entries
    #[command(visible_alias = "l")]
    List {
        /// Header file ending with cvbm_pc or cpeg_pc
        header: PathBuf,

        /// Print the directory as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract textures as DDS files
    #[command(visible_alias = "x")]
    Extract {
        /// Header file ending with cvbm_pc or cpeg_pc
        header: PathBuf,

        /// Only extract these textures
        textures: Vec<String>,

        /// Directory to write the DDS files to
        #[arg(short, long, env = "PEGTOOL_OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Add textures to a container or update them if they already exist
    #[command(visible_alias = "a")]
    Add {
        /// Header file ending with cvbm_pc or cpeg_pc
        header: PathBuf,

        /// DDS files to add or update
        files: Vec<PathBuf>,

        /// Directory to update every existing texture from
        #[arg(short, long, conflicts_with = "files")]
        input: Option<PathBuf>,

        /// Directory to write the new container to
        #[arg(short, long, env = "PEGTOOL_OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Delete textures from a container
    #[command(visible_alias = "d")]
    Delete {
        /// Header file ending with cvbm_pc or cpeg_pc
        header: PathBuf,

        /// Textures to delete
        #[arg(required = true)]
        textures: Vec<String>,

        /// Directory to write the new container to
        #[arg(short, long, env = "PEGTOOL_OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Rename a texture or change its flags
    #[command(visible_alias = "m")]
    Modify {
        /// Header file ending with cvbm_pc or cpeg_pc
        header: PathBuf,

        /// Texture to modify
        texture: String,

        /// New texture name
        #[arg(short, long)]
        name: Option<String>,

        /// New flags, decimal or 0x-prefixed hex
        #[arg(short, long, value_parser = parse_flags)]
        flags: Option<u16>,

        /// Directory to write the new container to
        #[arg(short, long, env = "PEGTOOL_OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Check containers for structural errors
    #[command(visible_alias = "c")]
    Check {
        /// Header files ending with cvbm_pc or cpeg_pc
        #[arg(required = true)]
        headers: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();

    match cli.command {
        Commands::List { header, json } => {
            cmd_list(&header, json)?;
        }
        Commands::Extract {
            header,
            textures,
            output,
        } => {
            cmd_extract(&header, &textures, output.as_deref())?;
        }
        Commands::Add {
            header,
            files,
            input,
            output,
        } => {
            cmd_add(&header, &files, input.as_deref(), output.as_deref())?;
        }
        Commands::Delete {
            header,
            textures,
            output,
        } => {
            cmd_delete(&header, &textures, output.as_deref())?;
        }
        Commands::Modify {
            header,
            texture,
            name,
            flags,
            output,
        } => {
            cmd_modify(&header, &texture, name.as_deref(), flags, output.as_deref())?;
        }
        Commands::Check { headers } => {
            cmd_check(&headers)?;
        }
    }

    Ok(())
}

fn cmd_list(header_path: &Path, json: bool) -> Result<()> {
    let data = fs::read(header_path)
        .with_context(|| format!("Failed to read header file {}", header_path.display()))?;
    let header = PegHeader::parse(&data).context("Failed to parse header")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&header)?);
        return Ok(());
    }

    print!("{}", describe(&header));
    Ok(())
}

fn describe(header: &PegHeader) -> String {
    let mut out = String::new();
    out += &format!("Version: {}\n", header.version);
    out += &format!("Platform: {}\n", header.platform);
    out += &format!("Dir block size: {}\n", header.dir_block_size);
    out += &format!("Data block size: {}\n", header.data_block_size);
    out += &format!("Bitmap count: {}\n", header.num_bitmaps);
    out += &format!("Entry count: {}\n", header.total_entries);
    out += &format!("Flags: {:#x}\n", header.flags);
    out += &format!("Alignment: {}\n", header.alignment);
    out += "\nEntries:\n";

    for entry in &header.entries {
        out += &format!("Name: {}\n", entry.filename);
        out += &format!("Dimensions: {}x{}\n", entry.width, entry.height);
        out += &format!("Format: {}\n", entry.format);
        if entry.flags != 0 {
            out += &format!("Flags: {}\n", flag_names(entry.flags));
        }
        if entry.mip_levels > 1 {
            out += &format!("Mip levels: {}\n", entry.mip_levels);
        }
        if entry.has_flag(FLAG_ANIM_SHEET) {
            out += &format!(
                "Animation tiles: {}x{}\n",
                entry.anim_tiles_width, entry.anim_tiles_height
            );
        }
        out += &format!("Offset: {:#x}\n", entry.offset);
        out += &format!("Size: {}\n\n", entry.data_size);
    }
    out
}

fn cmd_extract(header_path: &Path, textures: &[String], output: Option<&Path>) -> Result<()> {
    let peg = open(header_path)?;

    let indices: Vec<usize> = peg
        .header
        .entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| textures.is_empty() || textures.contains(&entry.filename))
        .map(|(index, _)| index)
        .collect();

    for name in textures {
        if peg.find_index(name).is_none() {
            warn!("Texture {} does not exist", name);
        }
    }

    let output = output.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let pb = ProgressBar::new(indices.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    for index in indices {
        let name = &peg.header.entries[index].filename;
        pb.set_message(name.clone());

        let dds = peg
            .export_dds(index)
            .with_context(|| format!("Failed to convert {}", name))?;
        let dds_path = output.join(format!("{}.dds", name));
        dds.write_to_path(&dds_path)
            .with_context(|| format!("Failed to write {}", dds_path.display()))?;

        pb.inc(1);
    }

    pb.finish_with_message("Done");
    Ok(())
}

fn cmd_add(
    header_path: &Path,
    files: &[PathBuf],
    input: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    if files.is_empty() && input.is_none() {
        bail!("Either DDS files or an input directory is required");
    }

    let mut peg = if header_path.exists() {
        open(header_path)?
    } else {
        info!("{} does not exist, creating a new container", header_path.display());
        data_path_for(header_path)?;
        PegFile::new()
    };

    let dds_paths: Vec<PathBuf> = match input {
        Some(dir) => peg
            .header
            .entries
            .iter()
            .map(|entry| dir.join(format!("{}.dds", entry.filename)))
            .collect(),
        None => files.to_vec(),
    };

    for dds_path in &dds_paths {
        peg.import_dds_path(dds_path)
            .with_context(|| format!("Failed to import {}", dds_path.display()))?;
    }

    save(&mut peg, header_path, output)
}

fn cmd_delete(header_path: &Path, textures: &[String], output: Option<&Path>) -> Result<()> {
    let mut peg = open(header_path)?;

    for name in textures {
        if !peg.remove(name) {
            warn!("Texture {} does not exist", name);
        }
    }

    save(&mut peg, header_path, output)
}

fn cmd_modify(
    header_path: &Path,
    texture: &str,
    name: Option<&str>,
    flags: Option<u16>,
    output: Option<&Path>,
) -> Result<()> {
    let mut peg = open(header_path)?;

    if peg.find_index(texture).is_none() {
        bail!("Texture {} does not exist", texture);
    }
    if let Some(flags) = flags {
        peg.set_flags(texture, flags)?;
    }
    if let Some(name) = name {
        peg.rename(texture, name)?;
    }

    save(&mut peg, header_path, output)
}

fn cmd_check(headers: &[PathBuf]) -> Result<()> {
    let mut failed = 0;

    for header_path in headers {
        let peg = match open(header_path) {
            Ok(peg) => peg,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                failed += 1;
                continue;
            }
        };

        let failures = check(&peg);
        if !failures.is_empty() {
            for failure in &failures {
                println!("Failed check: {}", failure);
            }
            println!("Failed: {}", header_path.display());
            failed += 1;
        }
    }

    println!("Checked {} files", headers.len());
    if failed > 0 {
        bail!("{} of {} files failed", failed, headers.len());
    }
    Ok(())
}

fn open(header_path: &Path) -> Result<PegFile> {
    PegFile::open(header_path)
        .with_context(|| format!("Failed to open {}", header_path.display()))
}

/// Write a container next to its input, or into `output` under the same file names.
fn save(peg: &mut PegFile, header_path: &Path, output: Option<&Path>) -> Result<()> {
    let (header_out, data_out) = output_paths(header_path, output)?;
    if let Some(dir) = output {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    peg.save(&header_out, &data_out)
        .with_context(|| format!("Failed to write {}", header_out.display()))?;
    info!(
        "Wrote {} textures to {}",
        peg.len(),
        header_out.display()
    );
    Ok(())
}

fn output_paths(header_path: &Path, output: Option<&Path>) -> Result<(PathBuf, PathBuf)> {
    let data_path = data_path_for(header_path)?;
    let Some(dir) = output else {
        return Ok((header_path.to_path_buf(), data_path));
    };

    let header_name = header_path
        .file_name()
        .context("Header path has no file name")?;
    let data_name = data_path.file_name().context("Data path has no file name")?;
    Ok((dir.join(header_name), dir.join(data_name)))
}

/// Parse flags given as decimal or `0x`-prefixed hexadecimal.
fn parse_flags(value: &str) -> std::result::Result<u16, String> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid flags {value:?}: {e}"))
}
