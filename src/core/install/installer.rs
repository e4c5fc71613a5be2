use async_trait::async_trait;

use crate::core::downloader::{FetchPool, PendingFetch};
use crate::core::error::{InstallError, InstallStage};
use crate::core::progress::SharedProgress;
use crate::core::version::VersionMeta;

/// One section of a version document (client jar, libraries, assets).
///
/// `install` verifies or schedules every artifact of its section on the
/// shared pool and returns without awaiting the fetches, so the coordinator
/// can await all sections together.
#[async_trait]
pub trait SectionInstaller: Send + Sync {
    fn stage(&self) -> InstallStage;

    /// Bytes the section credits to progress on a fresh install.
    fn total_size(&self, meta: &VersionMeta) -> u64;

    async fn install(
        &self,
        meta: &VersionMeta,
        progress: &SharedProgress,
        pool: &FetchPool,
    ) -> Result<Vec<PendingFetch>, InstallError>;
}
