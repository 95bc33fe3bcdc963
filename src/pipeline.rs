//! End-to-end metadata derivation and per-upload attempt tracking.
//!
//! ```text
//! Idle ──begin──▶ Extracting ──▶ Resolving ──▶ Assembled
//!                     │
//!                     └──────────▶ Failed
//! ```
//!
//! Only archive, locator, parser and resolver errors lead to `Failed`; a
//! store lookup that comes back empty still reaches `Assembled` with a
//! partial record.

use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::Result;
use crate::identity::{self, ResolvedIdentity};
use crate::manifest;
use crate::metadata::{AppMetadata, assemble};
use crate::plist;
use crate::store::{CatalogClient, OfflineStore, StoreLookup};
use crate::zip::ZipArchive;

const SUPPORTED_EXTENSIONS: &[&str] = &[".ipa", ".app.zip"];

/// Whether a file name looks like an application archive.
pub fn is_supported_archive_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Read identity fields from archive bytes.
///
/// Runs synchronously: open the archive, pick the manifest, decompress and
/// parse only that entry, then resolve the identity fields.
pub fn extract_identity(archive: &[u8]) -> Result<ResolvedIdentity> {
    let zip = ZipArchive::open(archive)?;
    let manifest_name = manifest::locate(zip.directory())?;
    let manifest_bytes = zip.extract(manifest_name)?;
    let root = plist::parse(&manifest_bytes)?;
    let identity = identity::resolve(&root)?;

    debug!(
        manifest = manifest_name,
        name = identity.name(),
        version = identity.version(),
        bundle_id = identity.bundle_id(),
        "resolved identity"
    );
    Ok(identity)
}

/// Archive-to-metadata pipeline over a store lookup.
pub struct MetadataPipeline<S> {
    store: S,
}

impl MetadataPipeline<Box<dyn StoreLookup>> {
    /// Build a pipeline that searches the configured catalog, or stays
    /// offline when lookups are disabled.
    pub fn from_config(config: &StoreConfig) -> reqwest::Result<Self> {
        let store: Box<dyn StoreLookup> = if config.enabled {
            Box::new(CatalogClient::new(config)?)
        } else {
            Box::new(OfflineStore)
        };
        Ok(Self::new(store))
    }
}

impl<S: StoreLookup> MetadataPipeline<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Derive the full metadata record for an archive.
    ///
    /// Fails only when the manifest identity cannot be produced; store
    /// trouble shows up as `is_partial` on the result.
    pub async fn derive_metadata(&self, archive: &[u8]) -> Result<AppMetadata> {
        let identity = extract_identity(archive)?;
        let store = self.store.lookup(identity.name()).await;
        Ok(assemble(&identity, store))
    }
}

/// Identifier of one pipeline run within an [`UploadSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptId(u64);

impl AttemptId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Where the current upload attempt stands.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Extracting {
        attempt: AttemptId,
    },
    Resolving {
        attempt: AttemptId,
        identity: ResolvedIdentity,
    },
    Assembled {
        attempt: AttemptId,
        metadata: AppMetadata,
    },
    Failed {
        attempt: AttemptId,
        error: String,
    },
}

impl PipelineState {
    pub fn attempt(&self) -> Option<AttemptId> {
        match self {
            PipelineState::Idle => None,
            PipelineState::Extracting { attempt }
            | PipelineState::Resolving { attempt, .. }
            | PipelineState::Assembled { attempt, .. }
            | PipelineState::Failed { attempt, .. } => Some(*attempt),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Assembled { .. } | PipelineState::Failed { .. }
        )
    }
}

/// How a finished attempt was received by its session.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Applied(AppMetadata),
    /// A newer attempt or a reset started before this one finished.
    Superseded,
}

struct SessionInner {
    latest: u64,
    state: PipelineState,
}

/// State of the one upload a user is working on.
///
/// Every new file starts a fresh attempt. Results from older attempts are
/// dropped instead of overwriting the state of the newer file.
pub struct UploadSession {
    inner: Mutex<SessionInner>,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                latest: 0,
                state: PipelineState::Idle,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> PipelineState {
        self.lock().state.clone()
    }

    /// Start a new attempt, superseding any in flight.
    pub fn begin(&self) -> AttemptId {
        let mut inner = self.lock();
        inner.latest += 1;
        let attempt = AttemptId(inner.latest);
        inner.state = PipelineState::Extracting { attempt };
        debug!(attempt = attempt.0, "attempt started");
        attempt
    }

    /// Drop back to `Idle`; in-flight attempts become stale.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.latest += 1;
        inner.state = PipelineState::Idle;
    }

    pub fn is_current(&self, attempt: AttemptId) -> bool {
        self.lock().latest == attempt.0
    }

    /// Move to `state` on behalf of `attempt`. Returns false, leaving the
    /// session untouched, when the attempt is stale.
    pub fn advance(&self, attempt: AttemptId, state: PipelineState) -> bool {
        let mut inner = self.lock();
        if inner.latest != attempt.0 {
            debug!(
                attempt = attempt.0,
                latest = inner.latest,
                "ignoring stale attempt"
            );
            return false;
        }
        inner.state = state;
        true
    }

    /// Run one attempt for `archive` through `pipeline`.
    ///
    /// Errors are returned only for the current attempt; a stale attempt
    /// reports [`AttemptOutcome::Superseded`] whatever happened to it.
    pub async fn process<S: StoreLookup>(
        &self,
        pipeline: &MetadataPipeline<S>,
        archive: &[u8],
    ) -> Result<AttemptOutcome> {
        let attempt = self.begin();

        let identity = match extract_identity(archive) {
            Ok(identity) => identity,
            Err(e) => {
                let failed = PipelineState::Failed {
                    attempt,
                    error: e.to_string(),
                };
                return if self.advance(attempt, failed) {
                    Err(e)
                } else {
                    Ok(AttemptOutcome::Superseded)
                };
            }
        };

        let resolving = PipelineState::Resolving {
            attempt,
            identity: identity.clone(),
        };
        if !self.advance(attempt, resolving) {
            return Ok(AttemptOutcome::Superseded);
        }

        let store = pipeline.store().lookup(identity.name()).await;
        let metadata = assemble(&identity, store);

        let assembled = PipelineState::Assembled {
            attempt,
            metadata: metadata.clone(),
        };
        if !self.advance(attempt, assembled) {
            return Ok(AttemptOutcome::Superseded);
        }

        info!(
            attempt = attempt.0,
            name = %metadata.name,
            partial = metadata.is_partial(),
            "metadata assembled"
        );
        Ok(AttemptOutcome::Applied(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ipa_and_app_zip_names() {
        assert!(is_supported_archive_name("Foo.ipa"));
        assert!(is_supported_archive_name("FOO.IPA"));
        assert!(is_supported_archive_name("Foo.app.zip"));
        assert!(!is_supported_archive_name("Foo.zip"));
        assert!(!is_supported_archive_name("Foo.apk"));
    }

    #[test]
    fn attempts_increase_monotonically() {
        let session = UploadSession::new();
        let first = session.begin();
        let second = session.begin();
        assert!(second > first);
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
    }

    #[test]
    fn stale_attempt_cannot_advance() {
        let session = UploadSession::new();
        let first = session.begin();
        let second = session.begin();

        let failed = PipelineState::Failed {
            attempt: first,
            error: "boom".into(),
        };
        assert!(!session.advance(first, failed));
        assert_eq!(
            session.state(),
            PipelineState::Extracting { attempt: second }
        );
    }

    #[test]
    fn reset_returns_to_idle_and_invalidates() {
        let session = UploadSession::new();
        let attempt = session.begin();
        session.reset();

        assert_eq!(session.state(), PipelineState::Idle);
        assert!(!session.advance(attempt, PipelineState::Extracting { attempt }));
        assert_eq!(session.state().attempt(), None);
    }

    #[tokio::test]
    async fn corrupt_archive_fails_current_attempt() {
        let session = UploadSession::new();
        let pipeline = MetadataPipeline::new(OfflineStore);

        let err = session.process(&pipeline, b"not a zip").await.unwrap_err();
        assert!(err.is_archive_error());

        let state = session.state();
        assert!(state.is_terminal());
        assert!(matches!(state, PipelineState::Failed { .. }));
    }
}
