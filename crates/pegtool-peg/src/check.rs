//! Structural checks over a loaded container.

use pegtool_dds::TextureFormat;

use crate::file::PegFile;
use crate::header::PegHeader;

/// Run every structural check and describe each one that fails.
///
/// All checks run regardless of earlier failures. An empty result means the
/// container looks sound. Per-entry failures are prefixed with the entry name.
pub fn check(peg: &PegFile) -> Vec<String> {
    let mut failures = Vec::new();
    let mut require = |ok: bool, what: &str| {
        if !ok {
            failures.push(what.to_owned());
        }
    };

    let header = &peg.header;
    let count = header.entries.len() as u64;
    let alignment = u64::from(header.alignment);
    let data_block_size = u64::from(header.data_block_size);
    let payload_total: u64 = header
        .entries
        .iter()
        .map(|entry| u64::from(entry.data_size))
        .sum();

    require(
        header.dir_block_size as usize == header.byte_size(),
        "dir_block_size == byte_size()",
    );
    require(
        data_block_size >= payload_total,
        "data_block_size >= sum(data_size)",
    );
    require(
        data_block_size <= payload_total + count * alignment,
        "data_block_size <= sum(data_size) + entries * alignment",
    );
    require(u64::from(header.num_bitmaps) == count, "num_bitmaps == entries");
    require(
        header.num_bitmaps == header.total_entries,
        "num_bitmaps == total_entries",
    );
    require(header.flags == 0, "flags == 0");
    require(
        header.alignment == PegHeader::DEFAULT_ALIGNMENT,
        "alignment == 16",
    );

    for (index, entry) in header.entries.iter().enumerate() {
        let name = if entry.filename.is_empty() {
            format!("#{index}")
        } else {
            entry.filename.clone()
        };
        let mut require_entry = |ok: bool, what: &str| {
            if !ok {
                failures.push(format!("{name}: {what}"));
            }
        };

        let end = i128::from(entry.offset) + i128::from(entry.data_size);
        require_entry(
            entry.offset < i64::from(header.data_block_size),
            "offset < data_block_size",
        );
        require_entry(
            end <= i128::from(header.data_block_size),
            "offset + data_size <= data_block_size",
        );
        require_entry(entry.width > 0, "width > 0");
        require_entry(entry.height > 0, "height > 0");
        require_entry(
            (TextureFormat::DXT1.raw()..=TextureFormat::A8.raw()).contains(&entry.format.raw()),
            "format in DXT1..=A8",
        );
        require_entry(entry.pal_fmt == 0, "pal_fmt == 0");
        require_entry(entry.num_frames == 1, "num_frames == 1");
        require_entry(entry.pal_size == 0, "pal_size == 0");
        require_entry(entry.fps == 1, "fps == 1");
        require_entry(entry.mip_levels >= 1, "mip_levels >= 1");
        require_entry(!entry.filename.is_empty(), "filename is not empty");
        require_entry(
            peg.textures.get(index).is_some_and(|data| !data.is_empty()),
            "texture data is not empty",
        );
    }

    if let Some(last) = header.entries.last() {
        let end = i128::from(last.offset) + i128::from(last.data_size);
        if i128::from(header.data_block_size) > end + i128::from(header.alignment) {
            failures.push("data_block_size <= last offset + data_size + alignment".to_owned());
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::PegEntry;

    fn sound_container() -> PegFile {
        let mut peg = PegFile::new();
        for (name, size) in [("bark", 40usize), ("leaf", 8), ("moss", 100)] {
            let entry = PegEntry {
                width: 8,
                height: 8,
                format: TextureFormat::DXT1,
                ..PegEntry::new(name)
            };
            peg.push(entry, vec![0xAB; size]).unwrap();
        }
        peg.layout().unwrap();
        peg
    }

    #[test]
    fn test_sound_container_passes() {
        let peg = sound_container();
        assert_eq!(check(&peg), Vec::<String>::new());
        assert!(check(&PegFile::new()).is_empty());
    }

    #[test]
    fn test_reports_only_dir_block_size() {
        let mut peg = sound_container();
        peg.header.dir_block_size += 1;
        assert_eq!(check(&peg), ["dir_block_size == byte_size()"]);
    }

    #[test]
    fn test_reports_every_failure() {
        let mut peg = sound_container();
        peg.header.flags = 1;
        peg.header.entries[1].fps = 30;
        peg.header.entries[1].format = TextureFormat::UNKNOWN;
        peg.header.entries[2].width = 0;

        let failures = check(&peg);
        assert_eq!(
            failures,
            [
                "flags == 0",
                "leaf: format in DXT1..=A8",
                "leaf: fps == 1",
                "moss: width > 0",
            ]
        );
    }

    #[test]
    fn test_data_block_bounds() {
        let mut peg = sound_container();
        peg.header.data_block_size = 50;
        let failures = check(&peg);
        assert!(failures.contains(&"data_block_size >= sum(data_size)".to_owned()));
        assert!(failures.contains(&"moss: offset < data_block_size".to_owned()));
        assert!(failures.contains(&"moss: offset + data_size <= data_block_size".to_owned()));

        let mut peg = sound_container();
        peg.header.data_block_size += 64;
        let failures = check(&peg);
        assert_eq!(
            failures,
            [
                "data_block_size <= sum(data_size) + entries * alignment",
                "data_block_size <= last offset + data_size + alignment",
            ]
        );
    }

    #[test]
    fn test_counter_mismatch() {
        let mut peg = sound_container();
        peg.header.num_bitmaps = 4;
        assert_eq!(
            check(&peg),
            ["num_bitmaps == entries", "num_bitmaps == total_entries"]
        );

        let mut peg = sound_container();
        peg.header.total_entries = 4;
        assert_eq!(check(&peg), ["num_bitmaps == total_entries"]);
    }

    #[test]
    fn test_unusual_alignment() {
        let mut peg = sound_container();
        peg.header.alignment = 32;
        assert_eq!(check(&peg), ["alignment == 16"]);
    }

    #[test]
    fn test_empty_texture_data() {
        let mut peg = sound_container();
        peg.textures[0].clear();
        assert_eq!(check(&peg), ["bark: texture data is not empty"]);
    }
}
