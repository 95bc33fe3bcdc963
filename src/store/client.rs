use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::StoreConfig;

use super::types::SearchResponse;
use super::{StoreLookup, StoreOutcome, StoreRecord, UnavailableReason};

/// HTTP client for the public software catalog search.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    search_url: String,
}

impl CatalogClient {
    pub fn new(config: &StoreConfig) -> reqwest::Result<Self> {
        let mut default_headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&config.user_agent) {
            default_headers.insert(USER_AGENT, value);
        }

        let mut builder = Client::builder().default_headers(default_headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            search_url: config.search_url.clone(),
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    /// Search for `term`, keeping only the first result.
    ///
    /// The term goes through the query serializer, so reserved characters
    /// reach the catalog percent-encoded and decode back to the literal term.
    pub async fn search(&self, term: &str) -> Result<StoreRecord, UnavailableReason> {
        if term.trim().is_empty() {
            return Err(UnavailableReason::EmptyTerm);
        }

        debug!(url = %self.search_url, term, "searching catalog");

        let response = self
            .client
            .get(&self.search_url)
            .query(&[("term", term), ("entity", "software"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| UnavailableReason::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UnavailableReason::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UnavailableReason::Transport(e.to_string()))?;
        let parsed: SearchResponse = serde_json::from_slice(&body)
            .map_err(|e| UnavailableReason::Malformed(e.to_string()))?;

        parsed.into_record().ok_or(UnavailableReason::NoResults)
    }
}

#[async_trait]
impl StoreLookup for CatalogClient {
    async fn lookup(&self, term: &str) -> StoreOutcome {
        match self.search(term).await {
            Ok(record) => {
                debug!(term, developer = %record.developer, "store metadata found");
                StoreOutcome::Found(record)
            }
            Err(reason) => {
                warn!(term, %reason, "store metadata unavailable");
                StoreOutcome::Unavailable(reason)
            }
        }
    }
}
