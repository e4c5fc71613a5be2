// ─── Client Jar ───

use async_trait::async_trait;
use tracing::debug;

use super::version_file::VersionMeta;
use crate::core::config::DataLayout;
use crate::core::downloader::{FetchPool, FetchRequest, PendingFetch};
use crate::core::error::{InstallError, InstallStage};
use crate::core::install::SectionInstaller;
use crate::core::progress::SharedProgress;

/// Installs `versions/<id>/<id>.jar`.
#[derive(Debug, Clone)]
pub struct ClientInstaller {
    layout: DataLayout,
}

impl ClientInstaller {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }
}

#[async_trait]
impl SectionInstaller for ClientInstaller {
    fn stage(&self) -> InstallStage {
        InstallStage::Client
    }

    fn total_size(&self, meta: &VersionMeta) -> u64 {
        meta.client_artifact().size
    }

    async fn install(
        &self,
        meta: &VersionMeta,
        progress: &SharedProgress,
        pool: &FetchPool,
    ) -> Result<Vec<PendingFetch>, InstallError> {
        let artifact = meta.client_artifact();
        let dest = self.layout.client_jar(&meta.id);
        debug!("Scheduling client jar {} -> {:?}", meta.id, dest);

        let request = FetchRequest::new(&artifact.url, dest)
            .sha1(&artifact.sha1)
            .size(artifact.size);
        Ok(vec![pool.schedule(
            self.stage(),
            format!("{}.jar", meta.id),
            request,
            progress.clone(),
        )])
    }
}
