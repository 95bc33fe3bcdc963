//! Fixed-layout zip records (PKWARE APPNOTE 4.3) and the entry type built
//! from them.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Value a 16-bit field holds when the real value lives in a ZIP64 record.
pub const SATURATED_U16: u16 = 0xFFFF;
/// Value a 32-bit field holds when the real value lives in a ZIP64 record.
pub const SATURATED_U32: u32 = 0xFFFF_FFFF;

const ZIP64_EXTRA_ID: u16 = 0x0001;

/// How an entry's payload is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl From<u16> for CompressionMethod {
    fn from(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            other => CompressionMethod::Unknown(other),
        }
    }
}

/// Little-endian field reader over one record.
///
/// Every read is checked against the record's bytes; running off the end
/// is reported as a corrupt archive naming the record.
pub(crate) struct Record<'a> {
    bytes: &'a [u8],
    pos: usize,
    what: &'static str,
}

impl<'a> Record<'a> {
    /// Check the magic and minimum length, leaving the reader just past
    /// the magic.
    pub(crate) fn open(
        bytes: &'a [u8],
        magic: &[u8; 4],
        min_len: usize,
        what: &'static str,
    ) -> Result<Self> {
        if bytes.len() < min_len {
            return Err(Error::corrupt(format!("truncated {what}")));
        }
        if &bytes[..4] != magic {
            return Err(Error::corrupt(format!("bad {what} signature")));
        }
        Ok(Self { bytes, pos: 4, what })
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| Error::corrupt(format!("{} runs past its data", self.what)))?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        self.take(2).map(LittleEndian::read_u16)
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        self.take(4).map(LittleEndian::read_u32)
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        self.take(8).map(LittleEndian::read_u64)
    }
}

/// Classic end of central directory record.
#[derive(Debug, Clone, Copy)]
pub struct EndRecord {
    pub disk: u16,
    pub cd_disk: u16,
    pub entries_on_disk: u16,
    pub entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndRecord {
    pub const MAGIC: &'static [u8; 4] = b"PK\x05\x06";
    pub const LEN: usize = 22;

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut r = Record::open(bytes, Self::MAGIC, Self::LEN, "end of central directory")?;
        Ok(Self {
            disk: r.u16()?,
            cd_disk: r.u16()?,
            entries_on_disk: r.u16()?,
            entries: r.u16()?,
            cd_size: r.u32()?,
            cd_offset: r.u32()?,
            comment_len: r.u16()?,
        })
    }

    /// Any saturated field means the ZIP64 record is authoritative.
    pub fn needs_zip64(&self) -> bool {
        self.entries_on_disk == SATURATED_U16
            || self.entries == SATURATED_U16
            || self.cd_size == SATURATED_U32
            || self.cd_offset == SATURATED_U32
    }

    pub fn spans_disks(&self) -> bool {
        self.disk != 0 || self.cd_disk != 0
    }
}

/// Pointer from the classic end record to the ZIP64 one.
#[derive(Debug, Clone, Copy)]
pub struct Zip64Locator {
    pub record_offset: u64,
    pub total_disks: u32,
}

impl Zip64Locator {
    pub const MAGIC: &'static [u8; 4] = b"PK\x06\x07";
    pub const LEN: usize = 20;

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut r = Record::open(bytes, Self::MAGIC, Self::LEN, "ZIP64 locator")?;
        r.skip(4)?; // disk holding the ZIP64 record
        Ok(Self {
            record_offset: r.u64()?,
            total_disks: r.u32()?,
        })
    }
}

/// ZIP64 end of central directory record; only the directory location is
/// kept.
#[derive(Debug, Clone, Copy)]
pub struct Zip64EndRecord {
    pub entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EndRecord {
    pub const MAGIC: &'static [u8; 4] = b"PK\x06\x06";
    pub const LEN: usize = 56;

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut r = Record::open(bytes, Self::MAGIC, Self::LEN, "ZIP64 end record")?;
        // record size, versions, disk numbers, per-disk entry count
        r.skip(8 + 2 + 2 + 4 + 4 + 8)?;
        Ok(Self {
            entries: r.u64()?,
            cd_size: r.u64()?,
            cd_offset: r.u64()?,
        })
    }
}

/// Local file header; only its length matters, to find the payload.
pub struct LocalHeader;

impl LocalHeader {
    pub const MAGIC: &'static [u8; 4] = b"PK\x03\x04";
    pub const LEN: usize = 30;

    /// Total header length including the variable name and extra fields.
    pub fn total_len(bytes: &[u8]) -> Result<u64> {
        let mut r = Record::open(bytes, Self::MAGIC, Self::LEN, "local file header")?;
        r.skip(22)?;
        let name_len = r.u16()? as u64;
        let extra_len = r.u16()? as u64;
        Ok(Self::LEN as u64 + name_len + extra_len)
    }
}

/// MS-DOS packed date and time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DosTimestamp {
    pub date: u16,
    pub time: u16,
}

impl DosTimestamp {
    /// (year, month, day)
    pub fn ymd(&self) -> (u16, u8, u8) {
        (
            1980 + (self.date >> 9),
            ((self.date >> 5) & 0x0F) as u8,
            (self.date & 0x1F) as u8,
        )
    }

    /// (hour, minute, second); seconds have two-second resolution.
    pub fn hms(&self) -> (u8, u8, u8) {
        (
            (self.time >> 11) as u8,
            ((self.time >> 5) & 0x3F) as u8,
            ((self.time & 0x1F) * 2) as u8,
        )
    }
}

/// One central directory entry.
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub modified: DosTimestamp,
    pub is_directory: bool,
}

impl ZipFileEntry {
    pub const MAGIC: &'static [u8; 4] = b"PK\x01\x02";
    /// Fixed part of a central directory header.
    pub const MIN_LEN: usize = 46;

    /// Parse the central directory header at the start of `bytes`.
    ///
    /// Returns the entry and the header's full length, so the caller can
    /// step to the next one.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut r = Record::open(bytes, Self::MAGIC, Self::MIN_LEN, "central directory header")?;
        r.skip(6)?; // version made by, version needed, flags
        let compression_method = CompressionMethod::from(r.u16()?);
        let modified = DosTimestamp {
            time: r.u16()?,
            date: r.u16()?,
        };
        let crc32 = r.u32()?;
        let mut compressed_size = r.u32()? as u64;
        let mut uncompressed_size = r.u32()? as u64;
        let name_len = r.u16()? as usize;
        let extra_len = r.u16()? as usize;
        let comment_len = r.u16()? as usize;
        r.skip(8)?; // start disk, internal and external attributes
        let mut lfh_offset = r.u32()? as u64;

        // Non-UTF-8 names are kept lossily; they never match a manifest path.
        let file_name = String::from_utf8_lossy(r.take(name_len)?).into_owned();
        let extra = r.take(extra_len)?;
        r.skip(comment_len)?;

        if let Some(zip64) = find_extra(extra, ZIP64_EXTRA_ID) {
            // Values appear in this order, each only if its header field
            // is saturated.
            let mut values = zip64.chunks_exact(8).map(LittleEndian::read_u64);
            if uncompressed_size == SATURATED_U32 as u64 {
                uncompressed_size = values.next().unwrap_or(uncompressed_size);
            }
            if compressed_size == SATURATED_U32 as u64 {
                compressed_size = values.next().unwrap_or(compressed_size);
            }
            if lfh_offset == SATURATED_U32 as u64 {
                lfh_offset = values.next().unwrap_or(lfh_offset);
            }
        }

        let entry = Self {
            is_directory: file_name.ends_with('/'),
            file_name,
            compression_method,
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            modified,
        };
        Ok((entry, r.position()))
    }
}

/// Body of the first extra field with `id`, clipped to the extra block.
fn find_extra(mut extra: &[u8], id: u16) -> Option<&[u8]> {
    while extra.len() >= 4 {
        let field_id = LittleEndian::read_u16(&extra[0..2]);
        let len = LittleEndian::read_u16(&extra[2..4]) as usize;
        let body = &extra[4..(4 + len).min(extra.len())];
        if field_id == id {
            return Some(body);
        }
        extra = &extra[4 + body.len()..];
    }
    None
}
