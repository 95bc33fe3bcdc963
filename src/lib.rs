//! # ipameta
//!
//! Extract application identity from IPA archives and enrich it with public
//! store metadata.
//!
//! An IPA is a zip container holding `Payload/<Name>.app/Info.plist`. This
//! library reads the archive from memory, decompresses only that manifest,
//! decodes it (binary or XML property list) and resolves the display name,
//! version and bundle identifier. The display name is then used to search a
//! public software catalog for the icon, rating, description and developer.
//!
//! ## Features
//!
//! - Bounds-checked zip reading with ZIP64 support, STORED and DEFLATE entries, CRC-32 verification
//! - Binary (`bplist00`) and XML property list decoding with cycle and depth protection
//! - Catalog enrichment that degrades to a partial result instead of failing
//! - Per-upload attempt tracking so late results never overwrite a newer file
//!
//! ## Example
//!
//! ```no_run
//! use ipameta::{MetadataPipeline, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bytes = std::fs::read("MyApp.ipa")?;
//!
//!     let pipeline = MetadataPipeline::from_config(&StoreConfig::default())?;
//!     let metadata = pipeline.derive_metadata(&bytes).await?;
//!
//!     println!("{} {} ({})", metadata.name, metadata.version, metadata.bundle_id);
//!     if metadata.is_partial() {
//!         eprintln!("store metadata unavailable");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod manifest;
pub mod metadata;
pub mod pipeline;
pub mod plist;
pub mod store;
pub mod zip;

pub use cli::Cli;
pub use config::StoreConfig;
pub use error::{Error, Result};
pub use identity::ResolvedIdentity;
pub use metadata::AppMetadata;
pub use pipeline::{
    AttemptId, AttemptOutcome, MetadataPipeline, PipelineState, UploadSession, extract_identity,
    is_supported_archive_name,
};
pub use plist::ManifestNode;
pub use store::{CatalogClient, OfflineStore, StoreLookup, StoreOutcome, StoreRecord};
pub use zip::{ZipArchive, ZipFileEntry};
