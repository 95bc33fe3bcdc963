//! Application identity fields read from a parsed manifest.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::plist::{Dictionary, ManifestNode};

/// Keys tried in order for the user-visible name.
pub const DISPLAY_NAME_KEYS: &[&str] = &["CFBundleDisplayName", "CFBundleName"];
/// Keys tried in order for the marketing version.
pub const VERSION_KEYS: &[&str] = &["CFBundleShortVersionString", "CFBundleVersion"];
pub const BUNDLE_ID_KEYS: &[&str] = &["CFBundleIdentifier"];

/// Name, version and bundle identifier of one manifest.
///
/// Absent fields stay `None`; the accessors report them as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIdentity {
    pub display_name: Option<String>,
    pub version: Option<String>,
    pub bundle_id: Option<String>,
}

impl ResolvedIdentity {
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_default()
    }

    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or_default()
    }

    pub fn bundle_id(&self) -> &str {
        self.bundle_id.as_deref().unwrap_or_default()
    }
}

/// Resolve identity fields from a manifest root.
///
/// Each field takes the first key in its chain that holds a string. Missing
/// fields are not an error.
pub fn resolve(root: &ManifestNode) -> Result<ResolvedIdentity> {
    let dict = root
        .as_dictionary()
        .ok_or(Error::UnexpectedManifestShape { found: root.kind() })?;

    Ok(ResolvedIdentity {
        display_name: first_string(dict, DISPLAY_NAME_KEYS),
        version: first_string(dict, VERSION_KEYS),
        bundle_id: first_string(dict, BUNDLE_ID_KEYS),
    })
}

fn first_string(dict: &Dictionary, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| dict.get_str(key))
        .map(str::to_string)
}
