//! Error types for metadata extraction.
//!
//! Every variant here is fatal to a single extraction run. Store lookups
//! never produce an [`Error`]; see [`crate::store::UnavailableReason`].

/// Extraction errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The buffer is not a readable zip container.
    #[error("corrupt archive: {reason}")]
    CorruptArchive { reason: String },

    /// No entry with this exact name exists in the central directory.
    #[error("entry not found: {name}")]
    EntryNotFound { name: String },

    /// The entry exists but its payload could not be recovered.
    #[error("failed to decompress {name}: {reason}")]
    Decompression { name: String, reason: String },

    /// No `Info.plist` sits directly inside an `.app` bundle directory.
    #[error("Info.plist not found in any .app bundle")]
    ManifestNotFound,

    /// The manifest bytes are not a valid property list.
    #[error("malformed manifest: {reason}")]
    MalformedManifest { reason: String },

    /// The manifest parsed but its root is not a dictionary.
    #[error("unexpected manifest shape: root is {found}, expected dictionary")]
    UnexpectedManifestShape { found: &'static str },
}

impl Error {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptArchive {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedManifest {
            reason: reason.into(),
        }
    }

    pub(crate) fn decompression(name: &str, reason: impl Into<String>) -> Self {
        Self::Decompression {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the failure happened while reading the zip container itself.
    pub fn is_archive_error(&self) -> bool {
        matches!(
            self,
            Self::CorruptArchive { .. } | Self::EntryNotFound { .. } | Self::Decompression { .. }
        )
    }
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;
