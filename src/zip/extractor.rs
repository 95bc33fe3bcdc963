use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::collections::HashMap;
use std::io::Read;
use tracing::debug;

use crate::error::{Error, Result};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Name-indexed view of an archive's central directory.
///
/// Entries keep their central directory order for listing. When a name
/// appears twice the first occurrence wins lookups.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    entries: Vec<ZipFileEntry>,
    by_name: HashMap<String, usize>,
}

impl Directory {
    pub(crate) fn new(entries: Vec<ZipFileEntry>) -> Self {
        let mut by_name = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            by_name.entry(entry.file_name.clone()).or_insert(index);
        }
        Self { entries, by_name }
    }

    pub fn get(&self, name: &str) -> Option<&ZipFileEntry> {
        self.by_name.get(name).map(|&index| &self.entries[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Entry names in archive order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.file_name.as_str())
    }

    pub fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An opened in-memory zip archive.
///
/// Opening indexes every central directory entry; payloads are only
/// decompressed when [`extract`](Self::extract) asks for them.
#[derive(Debug)]
pub struct ZipArchive<'a> {
    parser: ZipParser<'a>,
    directory: Directory,
}

impl<'a> ZipArchive<'a> {
    pub fn open(data: &'a [u8]) -> Result<Self> {
        let parser = ZipParser::new(data);
        let directory = Directory::new(parser.list_files()?);
        debug!(entries = directory.len(), "opened archive");
        Ok(Self { parser, directory })
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Extract a named entry to memory, verifying its size and CRC-32.
    pub fn extract(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self.directory.get(name).ok_or_else(|| Error::EntryNotFound {
            name: name.to_string(),
        })?;
        self.extract_entry(entry)
    }

    /// Extract an entry already looked up in the directory.
    pub fn extract_entry(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let data_offset = self.parser.payload_offset(entry)?;
        let payload = self.parser.slice(data_offset, entry.compressed_size)?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => payload.to_vec(),
            CompressionMethod::Deflate => inflate(entry, payload)?,
            CompressionMethod::Unknown(method) => {
                return Err(Error::decompression(
                    &entry.file_name,
                    format!("unsupported compression method {}", method),
                ));
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            return Err(Error::decompression(
                &entry.file_name,
                format!(
                    "expected {} bytes, got {}",
                    entry.uncompressed_size,
                    data.len()
                ),
            ));
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(Error::decompression(
                &entry.file_name,
                format!(
                    "CRC mismatch: expected {:08x}, got {:08x}",
                    entry.crc32,
                    crc.sum()
                ),
            ));
        }

        debug!(
            name = %entry.file_name,
            method = ?entry.compression_method,
            size = data.len(),
            "extracted entry"
        );
        Ok(data)
    }
}

fn inflate(entry: &ZipFileEntry, payload: &[u8]) -> Result<Vec<u8>> {
    // Read one byte past the declared size so an oversized stream is detected
    // without inflating it completely.
    let limit = entry.uncompressed_size.saturating_add(1);
    let mut data = Vec::with_capacity(entry.uncompressed_size.min(1 << 20) as usize);
    DeflateDecoder::new(payload)
        .take(limit)
        .read_to_end(&mut data)
        .map_err(|e| Error::decompression(&entry.file_name, e.to_string()))?;
    Ok(data)
}
