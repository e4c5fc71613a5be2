// ─── Manifest Resolver ───
// Turns a version id into a parsed `VersionMeta`, caching the per-version
// document on disk behind its manifest hash.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::manifest::{VersionManifest, VersionSummary};
use super::version_file::VersionMeta;
use crate::core::config::DataLayout;
use crate::core::downloader::{ArtifactStore, FetchRequest};
use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone)]
pub struct ManifestResolver {
    store: Arc<ArtifactStore>,
    layout: DataLayout,
    manifest_url: String,
}

impl ManifestResolver {
    pub fn new(store: Arc<ArtifactStore>, layout: DataLayout, manifest_url: impl Into<String>) -> Self {
        Self {
            store,
            layout,
            manifest_url: manifest_url.into(),
        }
    }

    /// The version catalog. Never cached beyond the call.
    pub async fn fetch_version_manifest(&self) -> LauncherResult<VersionManifest> {
        VersionManifest::fetch(self.store.client(), &self.manifest_url).await
    }

    /// Download (or reuse) the per-version document and parse it.
    pub async fn fetch_version_meta(&self, summary: &VersionSummary) -> LauncherResult<VersionMeta> {
        let dest = self.layout.version_json(&summary.id);
        let request = FetchRequest::new(&summary.url, &dest).sha1(&summary.sha1);
        let outcome = self.store.fetch(&request, None).await?;
        debug!("Version document {} -> {:?} ({:?})", summary.id, dest, outcome);

        read_version_meta(&dest).await
    }

    /// Catalog lookup followed by the document fetch.
    #[instrument(skip(self))]
    pub async fn resolve(&self, version_id: &str) -> LauncherResult<VersionMeta> {
        let manifest = self.fetch_version_manifest().await?;
        let summary = manifest.find(version_id)?;
        let meta = self.fetch_version_meta(summary).await?;

        info!(
            "Resolved {} ({} libraries, asset index {}, runtime {})",
            meta.id,
            meta.libraries.len(),
            meta.asset_index.id,
            meta.java_component()
        );
        Ok(meta)
    }
}

/// Parse a version document already on disk.
pub async fn read_version_meta(path: &Path) -> LauncherResult<VersionMeta> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| LauncherError::io(path, e))?;
    serde_json::from_slice(&raw).map_err(|e| LauncherError::json(path.display(), e))
}
