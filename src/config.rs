//! Store lookup configuration.
//!
//! Environment variables are read by the CLI layer, not here.

use serde::Deserialize;

pub const DEFAULT_SEARCH_URL: &str = "https://itunes.apple.com/search";

const USER_AGENT_VALUE: &str = concat!("ipameta/", env!("CARGO_PKG_VERSION"));

/// Settings for the catalog search used to enrich metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Full URL of the search endpoint.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Request timeout in seconds. `None` keeps the transport default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// When false, lookups are skipped and every result is partial.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_search_url() -> String {
    DEFAULT_SEARCH_URL.to_string()
}

fn default_user_agent() -> String {
    USER_AGENT_VALUE.to_string()
}

fn default_enabled() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            timeout_secs: None,
            user_agent: default_user_agent(),
            enabled: default_enabled(),
        }
    }
}

impl StoreConfig {
    /// Set the search endpoint.
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Enable or disable store lookups.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
