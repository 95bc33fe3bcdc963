//! Locating the application manifest inside an archive.

use tracing::debug;

use crate::error::{Error, Result};
use crate::zip::Directory;

pub const MANIFEST_FILE_NAME: &str = "Info.plist";
pub const BUNDLE_SUFFIX: &str = ".app";

/// Whether `name` is an `Info.plist` sitting directly inside an `.app` directory.
pub fn is_manifest_path(name: &str) -> bool {
    let mut segments = name.rsplit('/');
    let (Some(file), Some(bundle)) = (segments.next(), segments.next()) else {
        return false;
    };
    file == MANIFEST_FILE_NAME
        && bundle.len() > BUNDLE_SUFFIX.len()
        && bundle.ends_with(BUNDLE_SUFFIX)
}

/// Pick the application manifest from the archive's entry names.
///
/// Nested bundles (watch apps, embedded apps) also carry an `Info.plist`, so
/// the shallowest match wins, then the lexicographically smallest path.
/// Only names are inspected; nothing is decompressed.
pub fn locate(directory: &Directory) -> Result<&str> {
    let chosen = directory
        .entries()
        .iter()
        .filter(|entry| !entry.is_directory && is_manifest_path(&entry.file_name))
        .map(|entry| entry.file_name.as_str())
        .min_by_key(|name| (name.split('/').count(), *name))
        .ok_or(Error::ManifestNotFound)?;

    debug!(manifest = chosen, "located manifest");
    Ok(chosen)
}
