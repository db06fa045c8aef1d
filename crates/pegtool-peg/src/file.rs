//! Header and data file pairs.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::{info, warn};
use pegtool_common::BinaryWriter;
use pegtool_dds::{detect_format, DdsFile};

use crate::data::{read_data, write_data};
use crate::entry::PegEntry;
use crate::header::PegHeader;
use crate::{Error, Result};

/// Header file extensions and the data file extension each pairs with.
const EXTENSION_PAIRS: [(&str, &str); 2] = [("cvbm_pc", "gvbm_pc"), ("cpeg_pc", "gpeg_pc")];

/// Get the data file path that belongs to a header file.
///
/// # Example
///
/// ```
/// use pegtool_peg::data_path_for;
///
/// let data = data_path_for("textures/always_loaded.cpeg_pc")?;
/// assert_eq!(data.to_str(), Some("textures/always_loaded.gpeg_pc"));
/// # Ok::<(), pegtool_peg::Error>(())
/// ```
pub fn data_path_for(header_path: impl AsRef<Path>) -> Result<PathBuf> {
    let header_path = header_path.as_ref();
    let extension = header_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    EXTENSION_PAIRS
        .iter()
        .find(|(header, _)| *header == extension)
        .map(|(_, data)| header_path.with_extension(data))
        .ok_or_else(|| Error::UnknownExtension(extension.to_string()))
}

/// Entry name for a texture file: the file name without its last extension.
pub fn texture_name(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_owned)
}

/// A PEG container with its payloads loaded.
///
/// `textures[i]` is always the payload of `header.entries[i]`; the mutating
/// methods keep the two in step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PegFile {
    /// Directory as stored in the header file.
    pub header: PegHeader,
    /// Payload bytes, one per entry.
    pub textures: Vec<Vec<u8>>,
}

impl PegFile {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a header file and its paired data file.
    pub fn open(header_path: impl AsRef<Path>) -> Result<Self> {
        let header_path = header_path.as_ref();
        let data_path = data_path_for(header_path)?;
        Self::open_pair(header_path, data_path)
    }

    /// Open a header file and an explicitly named data file.
    ///
    /// The data file is not touched when the container has no entries.
    pub fn open_pair(header_path: impl AsRef<Path>, data_path: impl AsRef<Path>) -> Result<Self> {
        let header = PegHeader::parse(&fs::read(header_path)?)?;
        let textures = if header.entries.is_empty() {
            Vec::new()
        } else {
            let mut reader = BufReader::new(File::open(data_path)?);
            read_data(&mut reader, &header)?
        };
        Ok(Self { header, textures })
    }

    /// Lay out the data file and write both files.
    ///
    /// Both files are fully serialized in memory first. Nothing is written
    /// and `self` is left untouched when either one fails to serialize.
    pub fn save(&mut self, header_path: impl AsRef<Path>, data_path: impl AsRef<Path>) -> Result<()> {
        let (header, data) = self.lay_out()?;
        let header_bytes = header.to_bytes()?;

        fs::write(data_path, data)?;
        fs::write(header_path, header_bytes)?;
        self.header = header;
        Ok(())
    }

    /// Lay out the payloads in memory, returning the data file contents.
    ///
    /// Updates offsets and both block sizes exactly as [`PegFile::save`]
    /// would. On error the header is left as it was.
    pub fn layout(&mut self) -> Result<Vec<u8>> {
        let (header, data) = self.lay_out()?;
        self.header = header;
        Ok(data)
    }

    fn lay_out(&self) -> Result<(PegHeader, Vec<u8>)> {
        let mut header = self.header.clone();
        header.validate()?;

        let mut writer = BinaryWriter::new(Vec::new());
        write_data(&mut writer, &mut header, &self.textures)?;

        let size = header.byte_size();
        header.dir_block_size =
            u32::try_from(size).map_err(|_| Error::invalid_field("dir_block_size", size))?;
        Ok((header, writer.into_inner()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.header.entries.len()
    }

    /// Check whether the container has no entries.
    pub fn is_empty(&self) -> bool {
        self.header.entries.is_empty()
    }

    /// Index of the first entry with exactly this name.
    pub fn find_index(&self, name: &str) -> Option<usize> {
        self.header.find_index(name)
    }

    /// Get an entry and its payload by name.
    pub fn get(&self, name: &str) -> Option<(&PegEntry, &[u8])> {
        let index = self.find_index(name)?;
        Some((&self.header.entries[index], self.textures.get(index)?.as_slice()))
    }

    /// Append an entry with its payload.
    pub fn push(&mut self, mut entry: PegEntry, data: Vec<u8>) -> Result<usize> {
        entry.data_size = payload_size(&data)?;
        let index = self.header.add_entry(entry)?;
        self.textures.push(data);
        Ok(index)
    }

    /// Remove the first entry with this name together with its payload.
    ///
    /// Returns `false` without changing anything if no entry matches.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(index) = self.find_index(name) else {
            return false;
        };
        self.header.remove_at(index);
        if index < self.textures.len() {
            self.textures.remove(index);
        }
        true
    }

    /// Add a texture from a DDS file, or replace the entry of the same name.
    ///
    /// A replaced entry keeps its position and every field the DDS header
    /// does not describe, such as flags and animation tiles. Returns the
    /// entry's index.
    pub fn import_dds(&mut self, name: &str, dds: DdsFile) -> Result<usize> {
        let existing = self.find_index(name);
        let mut entry = match existing {
            Some(index) => {
                let entry = self.header.entries[index].clone();
                warn_on_changes(&entry, &dds);
                entry
            }
            None => PegEntry::new(name),
        };

        entry.update_from_dds(&dds.header)?;
        entry.data_size = payload_size(&dds.data)?;

        match existing {
            Some(index) => {
                self.header.update_entry(index, entry)?;
                if let Some(slot) = self.textures.get_mut(index) {
                    *slot = dds.data;
                }
                Ok(index)
            }
            None => {
                let index = self.header.add_entry(entry)?;
                self.textures.push(dds.data);
                Ok(index)
            }
        }
    }

    /// Read a DDS file and import it under its file stem.
    pub fn import_dds_path(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let name = texture_name(path)
            .ok_or_else(|| Error::invalid_field("filename", path.display()))?;
        let dds = DdsFile::from_path(path)?;
        self.import_dds(&name, dds)
    }

    /// Build a DDS file from the entry at `index` and its payload.
    pub fn export_dds(&self, index: usize) -> Result<DdsFile> {
        let (entry, data) = self
            .header
            .entries
            .get(index)
            .zip(self.textures.get(index))
            .ok_or_else(|| Error::invalid_field("index", index))?;
        Ok(DdsFile::new(entry.to_dds()?, data.clone()))
    }

    /// Rename the first entry called `name`.
    pub fn rename(&mut self, name: &str, new_name: &str) -> Result<()> {
        if new_name.is_empty() {
            return Err(Error::invalid_field("filename", "empty"));
        }
        let entry = self.entry_mut(name)?;
        info!("Renaming {} to {}", name, new_name);
        entry.filename = new_name.to_owned();
        Ok(())
    }

    /// Replace the flags of the first entry called `name`.
    pub fn set_flags(&mut self, name: &str, flags: u16) -> Result<()> {
        let entry = self.entry_mut(name)?;
        info!("Setting flags of {} to {:#x}", name, flags);
        entry.flags = flags;
        Ok(())
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut PegEntry> {
        let index = self
            .find_index(name)
            .ok_or_else(|| Error::NotFound(name.to_owned()))?;
        Ok(&mut self.header.entries[index])
    }
}

fn payload_size(data: &[u8]) -> Result<u32> {
    u32::try_from(data.len()).map_err(|_| Error::invalid_field("data_size", data.len()))
}

fn warn_on_changes(entry: &PegEntry, dds: &DdsFile) {
    let header = &dds.header;

    let format = detect_format(&header.pixel_format);
    if format != entry.format {
        warn!(
            "{}: switching format from {} to {}",
            entry.filename, entry.format, format
        );
    }
    if header.width != u32::from(entry.width) || header.height != u32::from(entry.height) {
        warn!(
            "{}: changing dimensions from {}x{} to {}x{}",
            entry.filename, entry.width, entry.height, header.width, header.height
        );
    }
    let mip_levels = header.mipmap_count.max(1);
    if mip_levels != u32::from(entry.mip_levels) {
        warn!(
            "{}: changing mip levels from {} to {}",
            entry.filename, entry.mip_levels, mip_levels
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::check;
    use crate::entry::{FLAG_ANIM_SHEET, FLAG_LINEAR_COLOR_SPACE};
    use pegtool_dds::{pixel_format_for, DdsHeader, TextureFormat};

    fn dds(width: u32, height: u32, format: TextureFormat, mips: u32, size: usize) -> DdsFile {
        let header = DdsHeader {
            width,
            height,
            mipmap_count: mips,
            pixel_format: pixel_format_for(format).unwrap(),
            ..Default::default()
        };
        DdsFile::new(header, vec![0x5A; size])
    }

    #[test]
    fn test_data_path_for() {
        assert_eq!(
            data_path_for("a/b/interface.cvbm_pc").unwrap(),
            PathBuf::from("a/b/interface.gvbm_pc")
        );
        assert_eq!(
            data_path_for("terrain.cpeg_pc").unwrap(),
            PathBuf::from("terrain.gpeg_pc")
        );

        let err = data_path_for("terrain.gpeg_pc").unwrap_err();
        assert!(matches!(err, Error::UnknownExtension(ref ext) if ext == "gpeg_pc"));
        assert!(matches!(
            data_path_for("terrain").unwrap_err(),
            Error::UnknownExtension(_)
        ));
    }

    #[test]
    fn test_texture_name() {
        assert_eq!(texture_name("in/rock_d.dds").as_deref(), Some("rock_d"));
        assert_eq!(texture_name("rock.tga.dds").as_deref(), Some("rock.tga"));
        assert_eq!(texture_name("noext").as_deref(), Some("noext"));
        assert_eq!(texture_name("dir/"), Some("dir".to_owned()));
        assert_eq!(texture_name(""), None);
    }

    #[test]
    fn test_add_to_empty() {
        let mut peg = PegFile::new();
        let index = peg
            .import_dds("grass", dds(64, 64, TextureFormat::DXT1, 0, 2048))
            .unwrap();
        assert_eq!(index, 0);
        peg.layout().unwrap();

        let entry = &peg.header.entries[0];
        assert_eq!((entry.width, entry.height), (64, 64));
        assert_eq!(entry.format, TextureFormat::DXT1);
        assert_eq!(entry.mip_levels, 1);
        assert_eq!(entry.offset, 0);
        assert_eq!(entry.data_size, 2048);
        assert_eq!(peg.header.data_block_size, 2048);
        assert_eq!((peg.header.num_bitmaps, peg.header.total_entries), (1, 1));
        assert!(check(&peg).is_empty());
    }

    #[test]
    fn test_update_preserves_unrelated_fields() {
        let mut peg = PegFile::new();
        peg.import_dds("flame", dds(32, 32, TextureFormat::DXT1, 1, 512))
            .unwrap();
        peg.import_dds("smoke", dds(16, 16, TextureFormat::A8, 1, 256))
            .unwrap();
        {
            let entry = &mut peg.header.entries[0];
            entry.flags = FLAG_ANIM_SHEET;
            entry.anim_tiles_width = 4;
            entry.anim_tiles_height = 4;
            entry.cache = [3, 4];
        }

        let index = peg
            .import_dds("flame", dds(128, 64, TextureFormat::DXT5, 8, 10_928))
            .unwrap();
        assert_eq!(index, 0);
        assert_eq!(peg.len(), 2);
        assert_eq!((peg.header.num_bitmaps, peg.header.total_entries), (2, 2));

        let entry = &peg.header.entries[0];
        assert_eq!(entry.flags, FLAG_ANIM_SHEET);
        assert_eq!(entry.fps, 1);
        assert_eq!((entry.anim_tiles_width, entry.anim_tiles_height), (4, 4));
        assert_eq!(entry.cache, [3, 4]);
        assert_eq!((entry.width, entry.height), (128, 64));
        assert_eq!(entry.format, TextureFormat::DXT5);
        assert_eq!(entry.mip_levels, 8);
        assert_eq!(entry.data_size, 10_928);
        assert_eq!(peg.textures[0].len(), 10_928);
    }

    #[test]
    fn test_failed_import_changes_nothing() {
        let mut peg = PegFile::new();
        peg.import_dds("flame", dds(32, 32, TextureFormat::DXT1, 1, 512))
            .unwrap();
        let before = peg.clone();

        let err = peg
            .import_dds("flame", dds(100_000, 32, TextureFormat::DXT1, 1, 8))
            .unwrap_err();
        assert_eq!(err.field(), Some("width"));
        let err = peg
            .import_dds("spark", dds(8, 8, TextureFormat::DXT1, 300, 8))
            .unwrap_err();
        assert_eq!(err.field(), Some("mip_levels"));
        assert_eq!(peg, before);
    }

    #[test]
    fn test_remove() {
        let mut peg = PegFile::new();
        peg.import_dds("a", dds(8, 8, TextureFormat::DXT1, 1, 8)).unwrap();
        peg.import_dds("b", dds(8, 8, TextureFormat::DXT3, 1, 16)).unwrap();
        let before = peg.clone();

        assert!(!peg.remove("c"));
        assert_eq!(peg, before);

        assert!(peg.remove("a"));
        assert_eq!(peg.len(), 1);
        assert_eq!(peg.textures, [vec![0x5A; 16]]);
        assert_eq!(peg.get("b").map(|(e, _)| e.format), Some(TextureFormat::DXT3));
        assert!(peg.get("a").is_none());
        assert_eq!((peg.header.num_bitmaps, peg.header.total_entries), (1, 1));
    }

    #[test]
    fn test_export_dds() {
        let mut peg = PegFile::new();
        let original = dds(64, 32, TextureFormat::A8R8G8B8, 4, 10_880);
        peg.import_dds("sign", original.clone()).unwrap();

        let exported = peg.export_dds(0).unwrap();
        assert_eq!(exported.data, original.data);
        assert_eq!(exported.header.width, 64);
        assert_eq!(exported.header.mipmap_count, 4);
        assert_eq!(exported.header.pitch_or_linear_size, 256);
        assert_eq!(
            detect_format(&exported.header.pixel_format),
            TextureFormat::A8R8G8B8
        );

        assert_eq!(peg.export_dds(1).unwrap_err().field(), Some("index"));
    }

    #[test]
    fn test_export_unknown_format() {
        let mut peg = PegFile::new();
        peg.push(PegEntry::new("odd"), vec![1, 2, 3]).unwrap();
        assert_eq!(peg.export_dds(0).unwrap_err().field(), Some("format"));
    }

    #[test]
    fn test_rename_and_flags() {
        let mut peg = PegFile::new();
        peg.import_dds("old", dds(8, 8, TextureFormat::DXT1, 1, 8)).unwrap();

        peg.rename("old", "new").unwrap();
        peg.set_flags("new", FLAG_LINEAR_COLOR_SPACE).unwrap();
        assert_eq!(peg.header.entries[0].filename, "new");
        assert_eq!(peg.header.entries[0].flags, FLAG_LINEAR_COLOR_SPACE);

        assert!(matches!(
            peg.rename("old", "x").unwrap_err(),
            Error::NotFound(ref name) if name == "old"
        ));
        assert!(matches!(
            peg.set_flags("old", 0).unwrap_err(),
            Error::NotFound(_)
        ));
        assert_eq!(peg.rename("new", "").unwrap_err().field(), Some("filename"));
    }

    #[test]
    fn test_save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let header_path = dir.path().join("vehicles.cvbm_pc");
        let data_path = data_path_for(&header_path).unwrap();

        let mut peg = PegFile::new();
        peg.import_dds("hull", dds(256, 256, TextureFormat::DXT5, 9, 87_392))
            .unwrap();
        peg.import_dds("glass", dds(8, 8, TextureFormat::A4R4G4B4, 1, 125))
            .unwrap();
        peg.import_dds("decal", dds(4, 4, TextureFormat::DXT1, 1, 8))
            .unwrap();
        peg.save(&header_path, &data_path).unwrap();

        let header_len = fs::metadata(&header_path).unwrap().len();
        let data_len = fs::metadata(&data_path).unwrap().len();
        assert_eq!(header_len, peg.header.byte_size() as u64);
        assert_eq!(u64::from(peg.header.dir_block_size), header_len);
        assert_eq!(u64::from(peg.header.data_block_size), data_len);
        assert_eq!(peg.header.entries[1].offset, 87_392);
        assert_eq!(peg.header.entries[2].offset, 87_520);

        let loaded = PegFile::open(&header_path).unwrap();
        assert_eq!(loaded, peg);
        assert!(check(&loaded).is_empty());
    }

    #[test]
    fn test_open_empty_skips_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let header_path = dir.path().join("empty.cpeg_pc");
        let data_path = dir.path().join("empty.gpeg_pc");

        let mut peg = PegFile::new();
        peg.save(&header_path, &data_path).unwrap();
        assert_eq!(fs::metadata(&header_path).unwrap().len(), 24);
        assert_eq!(fs::metadata(&data_path).unwrap().len(), 0);

        fs::remove_file(&data_path).unwrap();
        let loaded = PegFile::open(&header_path).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.header.dir_block_size, 24);
    }

    #[test]
    fn test_open_missing_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let header_path = dir.path().join("ui.cpeg_pc");

        let mut peg = PegFile::new();
        peg.import_dds("cursor", dds(8, 8, TextureFormat::DXT1, 1, 32))
            .unwrap();
        peg.save(&header_path, dir.path().join("elsewhere.gpeg_pc"))
            .unwrap();

        let err = PegFile::open(&header_path).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_open_truncated_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let header_path = dir.path().join("ui.cpeg_pc");
        let data_path = dir.path().join("ui.gpeg_pc");

        let mut peg = PegFile::new();
        peg.import_dds("cursor", dds(8, 8, TextureFormat::DXT1, 1, 32))
            .unwrap();
        peg.save(&header_path, &data_path).unwrap();
        fs::write(&data_path, [0u8; 16]).unwrap();

        assert!(PegFile::open(&header_path).unwrap_err().is_eof());
    }

    #[test]
    fn test_failed_save_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        let header_path = dir.path().join("ui.cpeg_pc");
        let data_path = dir.path().join("ui.gpeg_pc");

        let mut peg = PegFile::new();
        peg.import_dds("cursor", dds(8, 8, TextureFormat::DXT1, 1, 32))
            .unwrap();
        peg.save(&header_path, &data_path).unwrap();

        let mut header_bytes = fs::read(&header_path).unwrap();
        header_bytes[22..24].copy_from_slice(&0u16.to_le_bytes());
        fs::write(&header_path, &header_bytes).unwrap();
        let data_bytes = fs::read(&data_path).unwrap();

        let mut peg = PegFile::open(&header_path).unwrap();
        let before = peg.clone();
        let err = peg.save(&header_path, &data_path).unwrap_err();
        assert_eq!(err.field(), Some("alignment"));
        assert_eq!(peg, before);
        assert_eq!(fs::read(&header_path).unwrap(), header_bytes);
        assert_eq!(fs::read(&data_path).unwrap(), data_bytes);
    }

    #[test]
    fn test_save_rejects_empty_filename() {
        let dir = tempfile::tempdir().unwrap();
        let header_path = dir.path().join("ui.cpeg_pc");
        let data_path = dir.path().join("ui.gpeg_pc");

        let mut peg = PegFile::new();
        peg.import_dds("cursor", dds(8, 8, TextureFormat::DXT1, 1, 32))
            .unwrap();
        peg.import_dds("frame", dds(4, 4, TextureFormat::DXT1, 1, 8))
            .unwrap();
        peg.save(&header_path, &data_path).unwrap();
        let header_bytes = fs::read(&header_path).unwrap();
        let data_bytes = fs::read(&data_path).unwrap();

        peg.header.entries[1].filename.clear();
        peg.textures[0] = vec![0x11; 64];
        let before = peg.clone();
        let err = peg.save(&header_path, &data_path).unwrap_err();
        assert_eq!(err.field(), Some("filename"));
        assert_eq!(peg, before);
        assert_eq!(fs::read(&header_path).unwrap(), header_bytes);
        assert_eq!(fs::read(&data_path).unwrap(), data_bytes);

        let err = peg.layout().unwrap_err();
        assert_eq!(err.field(), Some("filename"));
        assert_eq!(peg, before);
    }

    #[test]
    fn test_import_dds_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brick_n.dds");
        dds(16, 16, TextureFormat::V8U8, 1, 512)
            .write_to_path(&path)
            .unwrap();

        let mut peg = PegFile::new();
        assert_eq!(peg.import_dds_path(&path).unwrap(), 0);
        let (entry, data) = peg.get("brick_n").unwrap();
        assert_eq!(entry.format, TextureFormat::V8U8);
        assert_eq!(data.len(), 512);
        assert_eq!(entry.data_size, 512);
    }
}
