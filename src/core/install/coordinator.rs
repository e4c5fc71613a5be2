// ─── Install Coordinator ───
// Resolve → publish total → fan out every section onto one pool → await.
// Rerunning is always safe: artifacts already on disk are hash-checked and
// reused, partial ones are replaced.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::installer::SectionInstaller;
use crate::core::assets::AssetInstaller;
use crate::core::config::{DataLayout, LauncherConfig};
use crate::core::downloader::{await_all, ArtifactStore, FetchPool};
use crate::core::error::{InstallError, InstallStage};
use crate::core::instance::InstanceInfo;
use crate::core::java::{RuntimeInstallation, RuntimeInstaller, RuntimeRequest};
use crate::core::libraries::LibraryInstaller;
use crate::core::platform::PlatformInfo;
use crate::core::progress::SharedProgress;
use crate::core::version::{ClientInstaller, ManifestResolver, RuleEngine, VersionMeta};

#[derive(Debug, Clone)]
pub struct InstallCoordinator {
    layout: DataLayout,
    resolver: ManifestResolver,
    pool: FetchPool,
    client: ClientInstaller,
    libraries: LibraryInstaller,
    assets: AssetInstaller,
    runtime: RuntimeInstaller,
}

impl InstallCoordinator {
    pub fn new(config: &LauncherConfig, platform: PlatformInfo, http: reqwest::Client) -> Self {
        let layout = config.layout();
        let store = Arc::new(ArtifactStore::new(http));
        let endpoints = &config.endpoints;

        Self {
            resolver: ManifestResolver::new(
                Arc::clone(&store),
                layout.clone(),
                &endpoints.version_manifest,
            ),
            pool: FetchPool::new(Arc::clone(&store), config.concurrency),
            client: ClientInstaller::new(layout.clone()),
            libraries: LibraryInstaller::new(layout.clone(), RuleEngine::new(platform.clone())),
            assets: AssetInstaller::new(layout.clone(), &endpoints.resources_base),
            runtime: RuntimeInstaller::new(
                store,
                layout.clone(),
                platform,
                &endpoints.runtime_index,
                &endpoints.runtime_releases_api,
            ),
            layout,
        }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn resolver(&self) -> &ManifestResolver {
        &self.resolver
    }

    pub fn libraries(&self) -> &LibraryInstaller {
        &self.libraries
    }

    pub fn runtime(&self) -> &RuntimeInstaller {
        &self.runtime
    }

    fn sections(&self) -> [&dyn SectionInstaller; 3] {
        [&self.assets, &self.libraries, &self.client]
    }

    /// Total bytes a fresh install of `meta` credits to progress.
    pub fn total_size(&self, meta: &VersionMeta) -> u64 {
        self.sections().iter().map(|s| s.total_size(meta)).sum()
    }

    /// Make sure every game artifact of the instance's version is on disk.
    #[instrument(skip(self, info, progress), fields(version = %info.minecraft_version))]
    pub async fn ensure_installed(
        &self,
        info: &InstanceInfo,
        progress: SharedProgress,
    ) -> Result<VersionMeta, InstallError> {
        progress.reset();
        progress.set_status(&format!("Resolving {}", info.minecraft_version));

        let meta = self
            .resolver
            .resolve(&info.minecraft_version)
            .await
            .map_err(|e| InstallError::new(InstallStage::Resolve, &info.minecraft_version, e))?;

        let total = self.total_size(&meta);
        progress.set_max(total);
        progress.set_status(&format!("Downloading {}", meta.id));
        debug!("Total download size for {}: {} bytes", meta.id, total);

        let [assets, libraries, client] = self.sections();
        let (mut pending, library_fetches, client_fetches) = tokio::try_join!(
            assets.install(&meta, &progress, &self.pool),
            libraries.install(&meta, &progress, &self.pool),
            client.install(&meta, &progress, &self.pool),
        )?;
        pending.extend(library_fetches);
        pending.extend(client_fetches);

        let summary = await_all(pending).await?;
        progress.set_status(&format!("Installed {}", meta.id));
        info!(
            "Installed {}: {} downloaded, {} already valid, {} bytes",
            meta.id, summary.downloaded, summary.reused, summary.bytes
        );
        Ok(meta)
    }

    /// Resolve the managed runtime for `request` and install it unless the
    /// install marker says the same manifest is already in place.
    #[instrument(skip(self, meta, progress))]
    pub async fn ensure_runtime(
        &self,
        request: &RuntimeRequest,
        meta: &VersionMeta,
        progress: SharedProgress,
    ) -> Result<RuntimeInstallation, InstallError> {
        let resolved = self
            .runtime
            .resolve(request, meta)
            .await
            .map_err(|e| InstallError::new(InstallStage::RuntimeIndex, request.to_string(), e))?;

        if self.runtime.is_current(&resolved).await {
            debug!("Runtime {} is up to date", resolved.component);
        } else {
            let manifest = self.runtime.load_manifest(&resolved).await?;

            progress.reset();
            progress.set_max(RuntimeInstaller::total_size(&manifest));
            progress.set_status(&format!(
                "Installing runtime {} {}",
                resolved.component, resolved.release.version.name
            ));

            let pending = self
                .runtime
                .install(&resolved.component, &manifest, &progress, &self.pool)
                .await?;
            let summary = await_all(pending).await?;

            self.runtime
                .write_marker(&resolved)
                .await
                .map_err(|e| InstallError::new(InstallStage::Runtime, &resolved.component, e))?;
            info!(
                "Runtime {} installed ({} files downloaded, {} reused)",
                resolved.component, summary.downloaded, summary.reused
            );
        }

        Ok(RuntimeInstallation {
            java: self.runtime.executable_path(&resolved.component),
            root: self.runtime.runtime_root(&resolved.component),
            version: resolved.release.version.name,
            component: resolved.component,
        })
    }
}
