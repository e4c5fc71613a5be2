// ─── Library Installer ───
// Filtering is defined once here and shared by install and classpath
// assembly, so the launch classpath is always what was installed.

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::core::config::DataLayout;
use crate::core::downloader::{FetchPool, FetchRequest, PendingFetch};
use crate::core::error::{InstallError, InstallStage};
use crate::core::install::SectionInstaller;
use crate::core::platform::Arch;
use crate::core::progress::SharedProgress;
use crate::core::version::{LibraryArtifact, LibraryEntry, RuleEngine, VersionMeta};

#[derive(Debug, Clone)]
pub struct LibraryInstaller {
    layout: DataLayout,
    rules: RuleEngine,
}

impl LibraryInstaller {
    pub fn new(layout: DataLayout, rules: RuleEngine) -> Self {
        Self { layout, rules }
    }

    /// Artifacts this host needs, in document order, first occurrence of
    /// each path only.
    pub fn eligible<'a>(&self, libraries: &'a [LibraryEntry]) -> Vec<&'a LibraryArtifact> {
        let mut seen = HashSet::new();
        libraries
            .iter()
            .filter(|lib| {
                let allowed = self.rules.is_allowed(lib.rules());
                if !allowed {
                    debug!("Skipping library (rules): {}", lib.name);
                }
                allowed
            })
            .filter_map(LibraryEntry::artifact)
            .filter(|artifact| self.path_matches_host(&artifact.path))
            .filter(|&artifact| seen.insert(artifact.path.as_str()))
            .collect()
    }

    /// Natives and arch-tagged jars built for another host are skipped.
    fn path_matches_host(&self, path: &str) -> bool {
        if path.contains("natives-") {
            let matches = self
                .rules
                .natives_classifier()
                .is_some_and(|classifier| path.contains(&format!("{}.jar", classifier)));
            if !matches {
                return false;
            }
        }

        let arch = self.rules.platform().arch;
        if path.contains("x86_64") && arch != Arch::X86_64 {
            return false;
        }
        if (path.contains("aarch_64") || path.contains("aarch64")) && arch != Arch::Aarch64 {
            return false;
        }
        true
    }

    /// Absolute jar paths for the classpath. Same order on every call.
    pub fn classpath_entries(&self, libraries: &[LibraryEntry]) -> Vec<PathBuf> {
        let libraries_dir = self.layout.libraries_dir();
        self.eligible(libraries)
            .into_iter()
            .map(|artifact| libraries_dir.join(&artifact.path))
            .collect()
    }

    /// Declared size of every library a fresh install downloads, duplicates
    /// included (they are credited without a fetch).
    pub fn declared_size(&self, libraries: &[LibraryEntry]) -> u64 {
        libraries
            .iter()
            .filter(|lib| self.rules.is_allowed(lib.rules()))
            .filter_map(LibraryEntry::artifact)
            .filter(|artifact| self.path_matches_host(&artifact.path))
            .map(|artifact| artifact.size)
            .sum()
    }

    pub fn schedule(
        &self,
        libraries: &[LibraryEntry],
        progress: &SharedProgress,
        pool: &FetchPool,
    ) -> Vec<PendingFetch> {
        let eligible = self.eligible(libraries);
        let duplicate_bytes = self.declared_size(libraries)
            - eligible.iter().map(|artifact| artifact.size).sum::<u64>();
        if duplicate_bytes > 0 {
            progress.advance(duplicate_bytes);
        }

        let libraries_dir = self.layout.libraries_dir();
        eligible
            .into_iter()
            .map(|artifact| {
                let request = FetchRequest::new(&artifact.url, libraries_dir.join(&artifact.path))
                    .sha1(&artifact.sha1)
                    .size(artifact.size);
                pool.schedule(InstallStage::Libraries, &artifact.path, request, progress.clone())
            })
            .collect()
    }
}

#[async_trait]
impl SectionInstaller for LibraryInstaller {
    fn stage(&self) -> InstallStage {
        InstallStage::Libraries
    }

    fn total_size(&self, meta: &VersionMeta) -> u64 {
        self.declared_size(&meta.libraries)
    }

    async fn install(
        &self,
        meta: &VersionMeta,
        progress: &SharedProgress,
        pool: &FetchPool,
    ) -> Result<Vec<PendingFetch>, InstallError> {
        let pending = self.schedule(&meta.libraries, progress, pool);
        debug!(
            "Scheduled {} of {} libraries for {}",
            pending.len(),
            meta.libraries.len(),
            meta.id
        );
        Ok(pending)
    }
}
