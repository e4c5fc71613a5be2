// ─── Version Manifest ───
// Handles fetching and parsing the Mojang version manifest v2.

use std::fmt;

use serde::Deserialize;
use tracing::info;

use crate::core::error::{LauncherResult, VersionNotFound};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    #[default]
    Release,
    Snapshot,
    OldBeta,
    OldAlpha,
}

impl fmt::Display for VersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionType::Release => "release",
            VersionType::Snapshot => "snapshot",
            VersionType::OldBeta => "old_beta",
            VersionType::OldAlpha => "old_alpha",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// Top-level Mojang version manifest. Refetched every session.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionManifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionSummary>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: VersionType,
    /// URL of the per-version document.
    pub url: String,
    pub sha1: String,
    #[serde(default)]
    pub release_time: Option<String>,
}

impl VersionManifest {
    /// Fetch the version manifest using a shared HTTP client.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> LauncherResult<Self> {
        info!("Fetching Minecraft version manifest...");

        let manifest: VersionManifest = client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find(&self, id: &str) -> Result<&VersionSummary, VersionNotFound> {
        self.versions
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| VersionNotFound { id: id.to_string() })
    }

    /// Official stable versions, newest first as listed.
    pub fn releases(&self) -> Vec<&VersionSummary> {
        self.versions
            .iter()
            .filter(|v| v.version_type == VersionType::Release)
            .collect()
    }

    pub fn latest_release(&self) -> Option<&VersionSummary> {
        self.find(&self.latest.release).ok()
    }
}
