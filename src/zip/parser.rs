//! Central directory reading over an in-memory buffer.
//!
//! Zip archives are read from the end: locate the end record (skipping any
//! trailing comment), follow it to the ZIP64 record when a field is
//! saturated, then walk the central directory. Every offset and length
//! taken from the archive is checked against the buffer before use, so a
//! hostile archive yields [`Error::CorruptArchive`] instead of a panic.

use tracing::debug;

use crate::error::{Error, Result};

use super::structures::{EndRecord, LocalHeader, Zip64EndRecord, Zip64Locator, ZipFileEntry};

/// Longest comment the end record can announce.
const MAX_COMMENT_LEN: usize = u16::MAX as usize;

/// Where the central directory lives, whichever end record described it.
#[derive(Debug, Clone, Copy)]
struct DirectoryBounds {
    offset: u64,
    size: u64,
    entries: u64,
}

/// Parser over a borrowed archive buffer.
///
/// Usually reached through [`ZipArchive`](super::ZipArchive).
#[derive(Debug)]
pub struct ZipParser<'a> {
    data: &'a [u8],
}

impl<'a> ZipParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Borrow `len` bytes at `offset`, failing if the range leaves the buffer.
    pub fn slice(&self, offset: u64, len: u64) -> Result<&'a [u8]> {
        let data: &'a [u8] = self.data;
        match offset.checked_add(len) {
            Some(end) if end <= data.len() as u64 => Ok(&data[offset as usize..end as usize]),
            _ => Err(Error::corrupt(format!(
                "range {offset}+{len} exceeds archive size {}",
                data.len()
            ))),
        }
    }

    /// Locate the end record and return it with its offset.
    ///
    /// A candidate signature only counts when its comment length accounts
    /// for exactly the bytes after it.
    pub fn find_end_record(&self) -> Result<(EndRecord, u64)> {
        let len = self.data.len();
        if len < EndRecord::LEN {
            return Err(Error::corrupt("buffer too small to be a zip archive"));
        }

        let window_start = len.saturating_sub(EndRecord::LEN + MAX_COMMENT_LEN);
        let last = len - EndRecord::LEN;

        for at in (window_start..=last).rev() {
            if &self.data[at..at + 4] != EndRecord::MAGIC {
                continue;
            }
            let record = EndRecord::parse(&self.data[at..at + EndRecord::LEN])?;
            if record.comment_len as usize == last - at {
                return Ok((record, at as u64));
            }
        }

        Err(Error::corrupt("end of central directory signature not found"))
    }

    /// Follow the ZIP64 locator that precedes the end record at `end_offset`.
    pub fn read_zip64_end_record(&self, end_offset: u64) -> Result<Zip64EndRecord> {
        let locator_offset = end_offset
            .checked_sub(Zip64Locator::LEN as u64)
            .ok_or_else(|| Error::corrupt("missing ZIP64 locator"))?;
        let locator = Zip64Locator::parse(self.slice(locator_offset, Zip64Locator::LEN as u64)?)?;

        if locator.total_disks > 1 {
            return Err(Error::corrupt("multi-disk archives are not supported"));
        }
        if locator.record_offset >= locator_offset {
            return Err(Error::corrupt("ZIP64 end record lies past its locator"));
        }

        Zip64EndRecord::parse(self.slice(locator.record_offset, Zip64EndRecord::LEN as u64)?)
    }

    fn directory_bounds(&self) -> Result<DirectoryBounds> {
        let (end, end_offset) = self.find_end_record()?;
        if end.spans_disks() {
            return Err(Error::corrupt("multi-disk archives are not supported"));
        }

        let bounds = if end.needs_zip64() {
            let record = self.read_zip64_end_record(end_offset)?;
            DirectoryBounds {
                offset: record.cd_offset,
                size: record.cd_size,
                entries: record.entries,
            }
        } else {
            DirectoryBounds {
                offset: end.cd_offset.into(),
                size: end.cd_size.into(),
                entries: end.entries.into(),
            }
        };

        if bounds.offset.saturating_add(bounds.size) > end_offset {
            return Err(Error::corrupt(format!(
                "central directory ({} bytes at {}) overlaps end record at {}",
                bounds.size, bounds.offset, end_offset
            )));
        }
        if bounds.entries.saturating_mul(ZipFileEntry::MIN_LEN as u64) > bounds.size {
            return Err(Error::corrupt(format!(
                "{} entries cannot fit in a {} byte central directory",
                bounds.entries, bounds.size
            )));
        }
        Ok(bounds)
    }

    /// Every entry, in central directory order.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let bounds = self.directory_bounds()?;
        debug!(
            entries = bounds.entries,
            offset = bounds.offset,
            size = bounds.size,
            "reading central directory"
        );

        let mut rest = self.slice(bounds.offset, bounds.size)?;
        let mut entries = Vec::with_capacity(bounds.entries as usize);
        for _ in 0..bounds.entries {
            let (entry, len) = ZipFileEntry::parse(rest)?;
            entries.push(entry);
            rest = &rest[len..];
        }
        Ok(entries)
    }

    /// Offset of an entry's payload, past its local header.
    ///
    /// The local header's name and extra lengths may differ from the
    /// central directory's copy, so they are read from the header itself.
    pub fn payload_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let header = self.slice(entry.lfh_offset, LocalHeader::LEN as u64)?;
        let header_len = LocalHeader::total_len(header).map_err(|_| {
            Error::corrupt(format!("invalid local file header for {}", entry.file_name))
        })?;
        entry
            .lfh_offset
            .checked_add(header_len)
            .ok_or_else(|| Error::corrupt("local header offset overflows"))
    }
}

#[cfg(test)]
mod tests {
    use super::super::structures::{SATURATED_U16, SATURATED_U32};
    use super::*;

    fn empty_archive() -> Vec<u8> {
        let mut data = EndRecord::MAGIC.to_vec();
        data.extend_from_slice(&[0u8; 18]);
        data
    }

    #[test]
    fn empty_archive_has_no_entries() {
        let data = empty_archive();
        assert!(ZipParser::new(&data).list_files().unwrap().is_empty());
    }

    #[test]
    fn end_record_found_behind_comment() {
        let mut data = empty_archive();
        data[20] = 5;
        data.extend_from_slice(b"hello");

        let (_, offset) = ZipParser::new(&data).find_end_record().unwrap();
        assert_eq!(offset, 0);
    }

    #[test]
    fn comment_length_must_match() {
        let mut data = empty_archive();
        data[20] = 9;
        data.extend_from_slice(b"hello");

        let err = ZipParser::new(&data).find_end_record().unwrap_err();
        assert!(matches!(err, Error::CorruptArchive { .. }));
    }

    #[test]
    fn missing_signature_is_corrupt() {
        let data = vec![0u8; 64];
        let err = ZipParser::new(&data).find_end_record().unwrap_err();
        assert!(matches!(err, Error::CorruptArchive { .. }));
    }

    #[test]
    fn tiny_buffer_is_corrupt() {
        let err = ZipParser::new(b"PK").list_files().unwrap_err();
        assert!(matches!(err, Error::CorruptArchive { .. }));
    }

    #[test]
    fn entry_count_larger_than_directory_is_corrupt() {
        let mut data = empty_archive();
        data[10] = 3;
        let err = ZipParser::new(&data).list_files().unwrap_err();
        assert!(matches!(err, Error::CorruptArchive { .. }));
    }

    #[test]
    fn directory_offset_past_buffer_is_corrupt() {
        let mut data = empty_archive();
        data[10] = 1;
        data[12] = 46;
        data[16..20].copy_from_slice(&1000u32.to_le_bytes());
        let err = ZipParser::new(&data).list_files().unwrap_err();
        assert!(matches!(err, Error::CorruptArchive { .. }));
    }

    #[test]
    fn saturated_fields_without_locator_are_corrupt() {
        let mut data = empty_archive();
        data[16..20].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = ZipParser::new(&data).list_files().unwrap_err();
        assert!(matches!(err, Error::CorruptArchive { .. }));
    }

    fn central_header(name: &str) -> Vec<u8> {
        let mut out = ZipFileEntry::MAGIC.to_vec();
        out.extend_from_slice(&[45, 0, 45, 0, 0, 0, 0, 0]);
        out.extend_from_slice(&[0; 16]); // time, date, crc, sizes
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&[0; 16]); // extra, comment, disk, attributes, offset
        out.extend_from_slice(name.as_bytes());
        out
    }

    /// Directory, ZIP64 end record, locator, then a classic end record
    /// with every field saturated.
    fn zip64_archive(names: &[&str]) -> Vec<u8> {
        let mut data: Vec<u8> = names.iter().flat_map(|n| central_header(n)).collect();
        let cd_size = data.len() as u64;
        let record_offset = data.len() as u64;

        data.extend_from_slice(Zip64EndRecord::MAGIC);
        data.extend_from_slice(&44u64.to_le_bytes());
        data.extend_from_slice(&[45, 0, 45, 0]);
        data.extend_from_slice(&[0; 8]); // disk, directory disk
        data.extend_from_slice(&(names.len() as u64).to_le_bytes());
        data.extend_from_slice(&(names.len() as u64).to_le_bytes());
        data.extend_from_slice(&cd_size.to_le_bytes());
        data.extend_from_slice(&0u64.to_le_bytes());

        data.extend_from_slice(Zip64Locator::MAGIC);
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&record_offset.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());

        data.extend_from_slice(EndRecord::MAGIC);
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&SATURATED_U16.to_le_bytes());
        data.extend_from_slice(&SATURATED_U16.to_le_bytes());
        data.extend_from_slice(&SATURATED_U32.to_le_bytes());
        data.extend_from_slice(&SATURATED_U32.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data
    }

    #[test]
    fn zip64_end_record_locates_directory() {
        let data = zip64_archive(&["Payload/", "Payload/Foo.app/Info.plist"]);
        let parser = ZipParser::new(&data);

        let (end, end_offset) = parser.find_end_record().unwrap();
        assert!(end.needs_zip64());
        let record = parser.read_zip64_end_record(end_offset).unwrap();
        assert_eq!(record.entries, 2);
        assert_eq!(record.cd_offset, 0);

        let names: Vec<String> = parser
            .list_files()
            .unwrap()
            .into_iter()
            .map(|e| e.file_name)
            .collect();
        assert_eq!(names, ["Payload/", "Payload/Foo.app/Info.plist"]);
    }

    #[test]
    fn zip64_record_past_locator_is_corrupt() {
        let mut data = zip64_archive(&["a.txt"]);
        let locator = data.len() - EndRecord::LEN - Zip64Locator::LEN;
        data[locator + 8..locator + 16].copy_from_slice(&(locator as u64).to_le_bytes());

        let err = ZipParser::new(&data).list_files().unwrap_err();
        assert!(matches!(err, Error::CorruptArchive { .. }));
    }

    #[test]
    fn slice_rejects_overflowing_range() {
        let data = [0u8; 4];
        let parser = ZipParser::new(&data);
        assert!(parser.slice(2, 2).is_ok());
        assert!(parser.slice(3, 2).is_err());
        assert!(parser.slice(u64::MAX, 2).is_err());
    }
}
