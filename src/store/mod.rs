//! Public catalog lookups used to enrich manifest metadata.
//!
//! Enrichment is optional: every failure is folded into
//! [`StoreOutcome::Unavailable`] and never surfaces as an error.

mod client;
mod types;

pub use client::CatalogClient;
pub use types::{SearchResponse, SearchResult};

use async_trait::async_trait;
use serde::Serialize;

/// Highest rating the catalog hands out.
pub const MAX_RATING: f64 = 5.0;

/// Store-side metadata for one application.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRecord {
    pub icon: String,
    /// Average user rating, always within `0.0..=5.0`.
    pub rating: f64,
    pub description: String,
    pub developer: String,
    pub genre: String,
    pub price: String,
    pub file_size: u64,
}

/// Clamp an upstream rating into `0.0..=5.0`; non-finite values become 0.
pub fn clamp_rating(rating: f64) -> f64 {
    if rating.is_finite() {
        rating.clamp(0.0, MAX_RATING)
    } else {
        0.0
    }
}

/// Why a lookup produced no usable record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnavailableReason {
    #[error("store lookups are disabled")]
    Disabled,
    #[error("no name to search for")]
    EmptyTerm,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("catalog returned HTTP {0}")]
    Status(u16),
    #[error("catalog response was not understood: {0}")]
    Malformed(String),
    #[error("catalog has no matching app")]
    NoResults,
}

/// Result of a store lookup. There is no error case.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome {
    Found(StoreRecord),
    Unavailable(UnavailableReason),
}

impl StoreOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, StoreOutcome::Found(_))
    }
}

/// Source of store metadata keyed by display name.
#[async_trait]
pub trait StoreLookup: Send + Sync {
    /// Look up `term`; must not fail, only degrade to `Unavailable`.
    async fn lookup(&self, term: &str) -> StoreOutcome;
}

#[async_trait]
impl<T: StoreLookup + ?Sized> StoreLookup for Box<T> {
    async fn lookup(&self, term: &str) -> StoreOutcome {
        (**self).lookup(term).await
    }
}

#[async_trait]
impl<T: StoreLookup + ?Sized> StoreLookup for std::sync::Arc<T> {
    async fn lookup(&self, term: &str) -> StoreOutcome {
        (**self).lookup(term).await
    }
}

/// Lookup that never goes to the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineStore;

#[async_trait]
impl StoreLookup for OfflineStore {
    async fn lookup(&self, _term: &str) -> StoreOutcome {
        StoreOutcome::Unavailable(UnavailableReason::Disabled)
    }
}
