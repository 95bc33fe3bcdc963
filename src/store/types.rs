//! Wire types for the catalog search endpoint.

use serde::Deserialize;
use serde_json::Value;

use super::{StoreRecord, clamp_rating};

/// Body of a search response: `{resultCount, results: [...]}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub result_count: Option<u64>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// One catalog entry. Every field is optional upstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub artwork_url512: Option<String>,
    pub artwork_url100: Option<String>,
    pub artist_name: Option<String>,
    pub average_user_rating: Option<f64>,
    pub description: Option<String>,
    pub formatted_price: Option<String>,
    /// Sent as a string by the catalog; numbers are accepted too.
    pub file_size_bytes: Option<Value>,
    pub primary_genre_name: Option<String>,
}

impl SearchResponse {
    /// Map the best match, if the response has one.
    pub fn into_record(self) -> Option<StoreRecord> {
        if self.result_count == Some(0) {
            return None;
        }
        self.results.into_iter().next().map(SearchResult::into_record)
    }
}

impl SearchResult {
    pub fn into_record(self) -> StoreRecord {
        StoreRecord {
            icon: self
                .artwork_url512
                .or(self.artwork_url100)
                .unwrap_or_default(),
            rating: clamp_rating(self.average_user_rating.unwrap_or(0.0)),
            description: self.description.unwrap_or_default(),
            developer: self.artist_name.unwrap_or_default(),
            genre: self.primary_genre_name.unwrap_or_default(),
            price: self.formatted_price.unwrap_or_default(),
            file_size: self.file_size_bytes.as_ref().and_then(file_size).unwrap_or(0),
        }
    }
}

fn file_size(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
