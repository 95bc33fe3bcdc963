//! Reading zip containers from memory.
//!
//! An IPA is a plain zip file. Only the central directory is indexed up
//! front; entry payloads are located and decompressed one at a time, on
//! request.
//!
//! - [`structures`]: fixed-layout records and [`ZipFileEntry`]
//! - [`parser`]: end record discovery and central directory walking
//! - [`extractor`]: [`ZipArchive`] and its name index, [`Directory`]
//!
//! ZIP64 archives are read. STORED and DEFLATE payloads are supported and
//! checked against their CRC-32; encrypted, multi-disk and other
//! compression methods are not.

mod extractor;
mod parser;
mod structures;

pub use extractor::{Directory, ZipArchive};
pub use parser::ZipParser;
pub use structures::{
    CompressionMethod, DosTimestamp, EndRecord, LocalHeader, SATURATED_U16, SATURATED_U32,
    Zip64EndRecord, Zip64Locator, ZipFileEntry,
};
