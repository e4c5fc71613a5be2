use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::core::config::DataLayout;
use crate::core::downloader::{FetchPool, FetchRequest, PendingFetch};
use crate::core::error::{InstallError, InstallStage, LauncherError};
use crate::core::install::SectionInstaller;
use crate::core::progress::SharedProgress;
use crate::core::version::{AssetIndexRef, VersionMeta};

/// Top-level asset index JSON structure.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    pub objects: BTreeMap<String, AssetObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

/// Installs the asset index and every object it lists under
/// `assets/objects/<first two hex chars>/<hash>`.
#[derive(Debug, Clone)]
pub struct AssetInstaller {
    layout: DataLayout,
    resources_base: String,
}

impl AssetInstaller {
    pub fn new(layout: DataLayout, resources_base: impl Into<String>) -> Self {
        Self {
            layout,
            resources_base: resources_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn object_url(&self, hash: &str) -> String {
        let prefix = hash.get(..2).unwrap_or(hash);
        format!("{}/{}/{}", self.resources_base, prefix, hash)
    }

    /// Fetch (or reuse) the index document and parse it. Awaited inline: the
    /// object list is unknown until it is on disk.
    pub async fn load_index(
        &self,
        index_ref: &AssetIndexRef,
        pool: &FetchPool,
        progress: &SharedProgress,
    ) -> Result<AssetIndex, InstallError> {
        let fail = |cause: LauncherError| {
            InstallError::new(InstallStage::AssetIndex, format!("{}.json", index_ref.id), cause)
        };

        let dest = self.layout.asset_index(&index_ref.id);
        let request = FetchRequest::new(&index_ref.url, &dest)
            .sha1(&index_ref.sha1)
            .size(index_ref.size);
        pool.store()
            .fetch(&request, Some(progress.as_ref()))
            .await
            .map_err(|e| fail(e.into()))?;

        let raw = tokio::fs::read(&dest)
            .await
            .map_err(|e| fail(LauncherError::io(&dest, e)))?;
        serde_json::from_slice(&raw).map_err(|e| fail(LauncherError::json(dest.display(), e)))
    }

    /// Schedule every object of an already-parsed index. Objects sharing a
    /// hash are fetched once; the repeat's size is credited straight away.
    pub fn schedule_objects(
        &self,
        index: &AssetIndex,
        progress: &SharedProgress,
        pool: &FetchPool,
    ) -> Vec<PendingFetch> {
        let mut seen = HashSet::new();
        let mut pending = Vec::with_capacity(index.objects.len());

        for (name, object) in &index.objects {
            if !seen.insert(object.hash.as_str()) {
                progress.advance(object.size);
                continue;
            }

            let request = FetchRequest::new(
                self.object_url(&object.hash),
                self.layout.asset_object(&object.hash),
            )
            .sha1(&object.hash)
            .size(object.size);
            pending.push(pool.schedule(InstallStage::Assets, name, request, progress.clone()));
        }

        debug!(
            "Scheduled {} asset objects ({} duplicates)",
            pending.len(),
            index.objects.len() - pending.len()
        );
        pending
    }
}

#[async_trait]
impl SectionInstaller for AssetInstaller {
    fn stage(&self) -> InstallStage {
        InstallStage::Assets
    }

    /// Index document plus every object it lists.
    fn total_size(&self, meta: &VersionMeta) -> u64 {
        meta.asset_index.size + meta.asset_index.total_size
    }

    async fn install(
        &self,
        meta: &VersionMeta,
        progress: &SharedProgress,
        pool: &FetchPool,
    ) -> Result<Vec<PendingFetch>, InstallError> {
        let index = self.load_index(&meta.asset_index, pool, progress).await?;
        info!(
            "Asset index {} lists {} objects",
            meta.asset_index.id,
            index.objects.len()
        );
        Ok(self.schedule_objects(&index, progress, pool))
    }
}
