//! Data file layout.
//!
//! The data file is every payload in entry order, each starting at a
//! multiple of the container alignment with zero bytes in between. It has no
//! header of its own; the directory holds every offset and size.

use std::io::{self, Read, Seek, SeekFrom, Write};

use log::debug;
use pegtool_common::BinaryWriter;

use crate::header::PegHeader;
use crate::{Error, Result};

/// Compute payload offsets and the total data file size.
fn plan(alignment: u16, sizes: impl IntoIterator<Item = usize>) -> Result<(Vec<u32>, u32)> {
    if !alignment.is_power_of_two() {
        return Err(Error::invalid_field("alignment", alignment));
    }
    let mask = u64::from(alignment) - 1;

    let mut offsets = Vec::new();
    let mut cursor = 0u64;
    for size in sizes {
        cursor = (cursor + mask) & !mask;
        let size = u32::try_from(size).map_err(|_| Error::invalid_field("data_size", size))?;
        offsets.push(
            u32::try_from(cursor).map_err(|_| Error::invalid_field("data_block_size", cursor))?,
        );
        cursor += u64::from(size);
    }
    let end = u32::try_from(cursor).map_err(|_| Error::invalid_field("data_block_size", cursor))?;
    Ok((offsets, end))
}

/// Lay out and write every payload, updating the directory to match.
///
/// Sets each entry's `offset` and `data_size` and the header's
/// `data_block_size`. The writer is expected to start at the beginning of the
/// data file. Nothing is written or changed if the layout cannot be
/// represented.
pub fn write_data<W, P>(
    writer: &mut BinaryWriter<W>,
    header: &mut PegHeader,
    payloads: &[P],
) -> Result<()>
where
    W: Write,
    P: AsRef<[u8]>,
{
    if payloads.len() != header.entries.len() {
        return Err(Error::invalid_field("payloads", payloads.len()));
    }
    let (offsets, end) = plan(
        header.alignment,
        payloads.iter().map(|payload| payload.as_ref().len()),
    )?;

    let alignment = u64::from(header.alignment);
    for ((entry, payload), offset) in header.entries.iter_mut().zip(payloads).zip(offsets) {
        let payload = payload.as_ref();
        writer.align(alignment)?;
        debug!(
            "{}: {} bytes at {:#x}",
            entry.filename,
            payload.len(),
            offset
        );
        writer.write_bytes(payload)?;
        entry.offset = i64::from(offset);
        entry.data_size = payload.len() as u32;
    }
    header.data_block_size = end;
    Ok(())
}

/// Read every payload back from a data file.
///
/// A payload extending past the end of the file is an I/O error of kind
/// [`std::io::ErrorKind::UnexpectedEof`].
pub fn read_data<R: Read + Seek>(reader: &mut R, header: &PegHeader) -> Result<Vec<Vec<u8>>> {
    header
        .entries
        .iter()
        .map(|entry| -> Result<Vec<u8>> {
            let offset = u64::try_from(entry.offset)
                .map_err(|_| Error::invalid_field("offset", entry.offset))?;
            reader.seek(SeekFrom::Start(offset))?;
            let mut payload = Vec::new();
            reader
                .by_ref()
                .take(u64::from(entry.data_size))
                .read_to_end(&mut payload)?;
            if payload.len() != entry.data_size as usize {
                return Err(Error::Io(io::ErrorKind::UnexpectedEof.into()));
            }
            Ok(payload)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::entry::PegEntry;

    fn header_with(names: &[&str]) -> PegHeader {
        let mut header = PegHeader::new();
        for name in names {
            header.add_entry(PegEntry::new(*name)).unwrap();
        }
        header
    }

    fn layout(header: &mut PegHeader, payloads: &[Vec<u8>]) -> Vec<u8> {
        let mut writer = BinaryWriter::new(Vec::new());
        write_data(&mut writer, header, payloads).unwrap();
        writer.into_inner()
    }

    #[test]
    fn test_offsets_are_aligned() {
        let mut header = header_with(&["a", "b", "c"]);
        let payloads = vec![vec![1u8; 5], vec![2u8; 16], vec![3u8; 1]];
        let data = layout(&mut header, &payloads);

        let offsets: Vec<i64> = header.entries.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, [0, 16, 32]);
        assert_eq!(header.data_block_size, 33);
        assert_eq!(data.len(), 33);
        assert!(data[5..16].iter().all(|&b| b == 0));
        assert_eq!(header.entries[1].data_size, 16);
    }

    #[test]
    fn test_other_alignments() {
        let mut header = header_with(&["a", "b"]);
        header.alignment = 4096;
        let data = layout(&mut header, &[vec![9u8; 10], vec![8u8; 10]]);
        assert_eq!(header.entries[1].offset, 4096);
        assert_eq!(data.len(), 4106);

        header.alignment = 1;
        layout(&mut header, &[vec![9u8; 10], vec![8u8; 10]]);
        assert_eq!(header.entries[1].offset, 10);
        assert_eq!(header.data_block_size, 20);
    }

    #[test]
    fn test_layout_is_idempotent() {
        let mut header = header_with(&["a", "b", "c"]);
        let payloads = vec![vec![1u8; 100], vec![2u8; 7], vec![3u8; 64]];
        let first = layout(&mut header, &payloads);
        let snapshot = header.clone();

        let second = layout(&mut header, &payloads);
        assert_eq!(header, snapshot);
        assert_eq!(first, second);
        assert!(header
            .entries
            .iter()
            .all(|e| e.offset % i64::from(header.alignment) == 0));
    }

    #[test]
    fn test_empty_payload() {
        let mut header = header_with(&["a", "b"]);
        layout(&mut header, &[Vec::new(), vec![1u8; 3]]);
        assert_eq!(header.entries[0].offset, 0);
        assert_eq!(header.entries[1].offset, 0);
        assert_eq!(header.data_block_size, 3);
    }

    #[test]
    fn test_rejects_bad_alignment() {
        for alignment in [0u16, 3, 24] {
            let mut header = header_with(&["a"]);
            header.alignment = alignment;
            let mut writer = BinaryWriter::new(Vec::new());
            let err = write_data(&mut writer, &mut header, &[vec![1u8]]).unwrap_err();
            assert_eq!(err.field(), Some("alignment"));
            assert_eq!(writer.position(), 0);
        }
    }

    #[test]
    fn test_rejects_payload_mismatch() {
        let mut header = header_with(&["a", "b"]);
        let mut writer = BinaryWriter::new(Vec::new());
        let err = write_data(&mut writer, &mut header, &[vec![1u8]]).unwrap_err();
        assert_eq!(err.field(), Some("payloads"));
    }

    #[test]
    fn test_read_back() {
        let mut header = header_with(&["a", "b", "c"]);
        let payloads = vec![vec![1u8; 17], vec![2u8; 3], vec![3u8; 40]];
        let data = layout(&mut header, &payloads);

        let read = read_data(&mut Cursor::new(data), &header).unwrap();
        assert_eq!(read, payloads);
    }

    #[test]
    fn test_read_short_file() {
        let mut header = header_with(&["a", "b"]);
        let mut data = layout(&mut header, &[vec![1u8; 20], vec![2u8; 20]]);
        data.truncate(40);

        let err = read_data(&mut Cursor::new(data), &header).unwrap_err();
        assert!(err.is_eof());
    }

    #[test]
    fn test_read_oversized_entry() {
        let mut header = header_with(&["a"]);
        header.entries[0].data_size = u32::MAX;
        let err = read_data(&mut Cursor::new(vec![0u8; 64]), &header).unwrap_err();
        assert!(err.is_eof());
    }

    #[test]
    fn test_read_negative_offset() {
        let mut header = header_with(&["a"]);
        header.entries[0].offset = -16;
        let err = read_data(&mut Cursor::new(vec![0u8; 32]), &header).unwrap_err();
        assert_eq!(err.field(), Some("offset"));
    }
}
