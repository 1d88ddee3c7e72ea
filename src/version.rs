//! Build version snapshot.
//!
//! Loaded once at startup and shared read-only with the `/version` handler.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Contents of `version.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Version {
    pub timestamp: String,
    pub git_sha: String,
    pub git_branch: String,
}

impl Version {
    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty() && self.git_sha.is_empty() && self.git_branch.is_empty()
    }
}

/// Read the snapshot from `path`.
///
/// A missing, unparseable, or all-empty file yields `None`; the service runs
/// either way and `/version` answers 404.
pub fn load_version(path: &Path) -> Option<Version> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::info!(path = %path.display(), error = %e, "Version file not loaded");
            return None;
        }
    };

    match serde_json::from_str::<Version>(&content) {
        Ok(version) if version.is_empty() => None,
        Ok(version) => Some(version),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Unable to parse version file");
            None
        }
    }
}
