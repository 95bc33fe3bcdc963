use clap::Parser;

use crate::config::StoreConfig;

#[derive(Parser, Debug)]
#[command(name = "ipameta")]
#[command(version)]
#[command(about = "Show app metadata from an IPA archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  ipameta MyApp.ipa              print name, version, bundle id and store info\n  \
  ipameta --json MyApp.ipa       print the metadata record as JSON\n  \
  ipameta -l MyApp.ipa           list archive entries\n  \
  ipameta --offline MyApp.ipa    skip the store lookup")]
pub struct Cli {
    /// IPA or .app.zip file path
    #[arg(value_name = "FILE")]
    pub file: String,

    /// List archive entries instead of reading metadata
    #[arg(short = 'l')]
    pub list: bool,

    /// Verbose listing and debug logging
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Print metadata as JSON
    #[arg(long)]
    pub json: bool,

    /// Skip the store lookup
    #[arg(long, env = "IPAMETA_OFFLINE")]
    pub offline: bool,

    /// Catalog search endpoint
    #[arg(long, value_name = "URL", env = "IPAMETA_STORE_URL")]
    pub store_url: Option<String>,

    /// Store request timeout in seconds
    #[arg(long, value_name = "SECS", env = "IPAMETA_STORE_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Accept files without an .ipa or .app.zip extension
    #[arg(long)]
    pub any_extension: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.json
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Store settings from flags, falling back to defaults.
    pub fn store_config(&self) -> StoreConfig {
        let mut config = StoreConfig::default().with_enabled(!self.offline);
        if let Some(url) = &self.store_url {
            config = config.with_search_url(url.clone());
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout_secs(secs);
        }
        config
    }
}
