//! The final metadata record shown before an upload is confirmed.

use serde::Serialize;

use crate::identity::ResolvedIdentity;
use crate::store::StoreOutcome;

/// Identity from the manifest merged with store enrichment.
///
/// `is_partial` is `Some(true)` exactly when the store had nothing usable;
/// the identity fields are authoritative either way.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppMetadata {
    pub icon: String,
    pub name: String,
    pub version: String,
    pub bundle_id: String,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_partial: Option<bool>,
}

impl AppMetadata {
    pub fn is_partial(&self) -> bool {
        self.is_partial.unwrap_or(false)
    }
}

/// Merge manifest identity with a store outcome. Never fails.
pub fn assemble(identity: &ResolvedIdentity, store: StoreOutcome) -> AppMetadata {
    let base = AppMetadata {
        icon: String::new(),
        name: identity.name().to_string(),
        version: identity.version().to_string(),
        bundle_id: identity.bundle_id().to_string(),
        rating: 0.0,
        description: None,
        developer: None,
        genre: None,
        price: None,
        file_size: None,
        is_partial: None,
    };

    match store {
        StoreOutcome::Found(record) => AppMetadata {
            icon: record.icon,
            rating: record.rating,
            description: Some(record.description),
            developer: Some(record.developer),
            genre: Some(record.genre),
            price: Some(record.price),
            file_size: Some(record.file_size),
            ..base
        },
        StoreOutcome::Unavailable(_) => AppMetadata {
            is_partial: Some(true),
            ..base
        },
    }
}
