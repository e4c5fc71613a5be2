use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::core::config::DataLayout;
use crate::core::downloader::{ArtifactStore, FetchPool, FetchRequest, PendingFetch};
use crate::core::error::{InstallError, InstallStage, LauncherError, LauncherResult};
use crate::core::platform::{OsFamily, PlatformInfo};
use crate::core::progress::SharedProgress;
use crate::core::version::{DownloadArtifact, VersionMeta};

const INSTALL_MARKER_FILE: &str = ".installed.json";

// ─── Runtime Request ───

/// Which managed runtime an instance asks for, as stored in `instance.toml`.
///
/// - `""` / `"auto"`: the component named by the version document
/// - `"latest"`: newest runtime not above the most recent Java feature release
/// - `"17"`: newest runtime of that major
/// - anything else: a Mojang component name, e.g. `java-runtime-gamma`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuntimeRequest {
    #[default]
    Auto,
    Latest,
    Major(u32),
    Component(String),
}

impl RuntimeRequest {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("auto") {
            RuntimeRequest::Auto
        } else if raw.eq_ignore_ascii_case("latest") {
            RuntimeRequest::Latest
        } else if let Ok(major) = raw.parse::<u32>() {
            RuntimeRequest::Major(major)
        } else {
            RuntimeRequest::Component(raw.to_string())
        }
    }
}

impl From<String> for RuntimeRequest {
    fn from(raw: String) -> Self {
        RuntimeRequest::parse(&raw)
    }
}

impl From<RuntimeRequest> for String {
    fn from(request: RuntimeRequest) -> Self {
        request.to_string()
    }
}

impl fmt::Display for RuntimeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeRequest::Auto => f.write_str("auto"),
            RuntimeRequest::Latest => f.write_str("latest"),
            RuntimeRequest::Major(major) => write!(f, "{}", major),
            RuntimeRequest::Component(name) => f.write_str(name),
        }
    }
}

// ─── Mojang runtime index ───

/// `all.json`: platform key → component → releases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RuntimeIndex(pub HashMap<String, HashMap<String, Vec<RuntimeRelease>>>);

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeRelease {
    pub manifest: DownloadArtifact,
    pub version: RuntimeVersion,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeVersion {
    pub name: String,
    #[serde(default)]
    pub released: String,
}

impl RuntimeVersion {
    /// Java major of a release name: `17.0.8` → 17, `8u51` → 8, `1.8.0_51` → 8.
    pub fn major(&self) -> Option<u32> {
        let name = self.name.strip_prefix("1.").unwrap_or(&self.name);
        let digits: String = name.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    }
}

#[derive(Debug, Deserialize)]
struct AvailableReleases {
    most_recent_feature_release: u32,
}

/// A component picked from the index for this platform.
#[derive(Debug, Clone)]
pub struct ResolvedRuntime {
    pub component: String,
    pub release: RuntimeRelease,
}

// ─── Per-runtime file manifest ───

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeManifest {
    pub files: BTreeMap<String, RuntimeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuntimeEntry {
    File {
        #[serde(default)]
        executable: bool,
        downloads: RuntimeDownloads,
    },
    Directory,
    Link {
        target: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeDownloads {
    pub raw: DownloadArtifact,
    #[serde(default)]
    pub lzma: Option<DownloadArtifact>,
}

impl RuntimeDownloads {
    /// Transfer to use: `lzma` when offered, `raw` otherwise. The expected
    /// hash is always the raw one since the body is decoded before writing.
    pub fn preferred(&self) -> (&DownloadArtifact, bool) {
        match &self.lzma {
            Some(lzma) => (lzma, true),
            None => (&self.raw, false),
        }
    }
}

/// Written once every runtime file is in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallMarker {
    pub manifest_sha1: String,
    pub version: String,
    pub installed_at: DateTime<Utc>,
}

/// A runtime ready to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInstallation {
    pub component: String,
    pub version: String,
    pub root: PathBuf,
    pub java: PathBuf,
}

// ─── Installer ───

#[derive(Debug, Clone)]
pub struct RuntimeInstaller {
    store: Arc<ArtifactStore>,
    layout: DataLayout,
    platform: PlatformInfo,
    index_url: String,
    releases_api: String,
}

impl RuntimeInstaller {
    pub fn new(
        store: Arc<ArtifactStore>,
        layout: DataLayout,
        platform: PlatformInfo,
        index_url: impl Into<String>,
        releases_api: impl Into<String>,
    ) -> Self {
        Self {
            store,
            layout,
            platform,
            index_url: index_url.into(),
            releases_api: releases_api.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_index(&self) -> LauncherResult<RuntimeIndex> {
        debug!("Fetching runtime index from {}", self.index_url);
        let index = self
            .store
            .client()
            .get(&self.index_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(index)
    }

    /// Most recent Java feature release according to Adoptium.
    pub async fn latest_feature_release(&self) -> LauncherResult<u32> {
        let url = format!("{}/v3/info/available_releases", self.releases_api);
        let releases: AvailableReleases = self
            .store
            .client()
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(releases.most_recent_feature_release)
    }

    /// Map a request onto a component of this platform's index.
    #[instrument(skip(self, meta), fields(platform = %self.platform))]
    pub async fn resolve(
        &self,
        request: &RuntimeRequest,
        meta: &VersionMeta,
    ) -> LauncherResult<ResolvedRuntime> {
        let key = self
            .platform
            .runtime_platform_key()
            .ok_or_else(|| LauncherError::UnsupportedPlatform(self.platform.to_string()))?;

        let index = self.fetch_index().await?;
        let components = index.0.get(key).cloned().unwrap_or_default();

        let ceiling = match request {
            RuntimeRequest::Latest => Some(self.latest_feature_release().await?),
            _ => None,
        };

        let picked = match request {
            RuntimeRequest::Auto => pick_component(&components, meta.java_component()),
            RuntimeRequest::Component(name) => pick_component(&components, name),
            RuntimeRequest::Major(major) => pick_newest(&components, |m| m == *major),
            RuntimeRequest::Latest => {
                let ceiling = ceiling.unwrap_or(u32::MAX);
                pick_newest(&components, |m| m <= ceiling)
            }
        };

        let resolved = picked.ok_or_else(|| LauncherError::RuntimeNotAvailable(request.to_string()))?;
        info!(
            "Runtime request '{}' -> {} {}",
            request, resolved.component, resolved.release.version.name
        );
        Ok(resolved)
    }

    pub fn runtime_root(&self, component: &str) -> PathBuf {
        self.layout.runtime_root(component)
    }

    /// Path of the `java` launcher inside an installed component.
    pub fn executable_path(&self, component: &str) -> PathBuf {
        let root = self.runtime_root(component);
        match self.platform.os {
            OsFamily::Linux => root.join("bin").join("java"),
            OsFamily::Osx => root
                .join("jre.bundle")
                .join("Contents")
                .join("Home")
                .join("bin")
                .join("java"),
            OsFamily::Windows => root.join("bin").join("java.exe"),
        }
    }

    /// Installed and matching the resolved manifest.
    pub async fn is_current(&self, resolved: &ResolvedRuntime) -> bool {
        let Some(marker) = self.read_marker(&resolved.component).await else {
            return false;
        };
        marker
            .manifest_sha1
            .eq_ignore_ascii_case(&resolved.release.manifest.sha1)
            && self.executable_path(&resolved.component).is_file()
    }

    pub async fn read_marker(&self, component: &str) -> Option<InstallMarker> {
        let path = self.runtime_root(component).join(INSTALL_MARKER_FILE);
        let raw = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice(&raw) {
            Ok(marker) => Some(marker),
            Err(e) => {
                warn!("Ignoring unreadable runtime marker {:?}: {}", path, e);
                None
            }
        }
    }

    pub async fn write_marker(&self, resolved: &ResolvedRuntime) -> LauncherResult<()> {
        let path = self.runtime_root(&resolved.component).join(INSTALL_MARKER_FILE);
        let marker = InstallMarker {
            manifest_sha1: resolved.release.manifest.sha1.clone(),
            version: resolved.release.version.name.clone(),
            installed_at: Utc::now(),
        };
        let payload = serde_json::to_vec_pretty(&marker)
            .map_err(|e| LauncherError::json(path.display(), e))?;
        tokio::fs::write(&path, payload)
            .await
            .map_err(|source| LauncherError::Io { path, source })
    }

    /// Fetch (or reuse) the per-runtime file manifest.
    pub async fn load_manifest(
        &self,
        resolved: &ResolvedRuntime,
    ) -> Result<RuntimeManifest, InstallError> {
        let manifest_ref = &resolved.release.manifest;
        let fail = |cause: LauncherError| {
            InstallError::new(
                InstallStage::Runtime,
                format!("{}.json", resolved.component),
                cause,
            )
        };

        let dest = self.layout.runtime_manifest(&resolved.component);
        let request = FetchRequest::new(&manifest_ref.url, &dest)
            .sha1(&manifest_ref.sha1)
            .size(manifest_ref.size);
        self.store
            .fetch(&request, None)
            .await
            .map_err(|e| fail(e.into()))?;

        let raw = tokio::fs::read(&dest)
            .await
            .map_err(|e| fail(LauncherError::io(&dest, e)))?;
        serde_json::from_slice(&raw).map_err(|e| fail(LauncherError::json(dest.display(), e)))
    }

    /// Bytes transferred by a fresh install (compressed sizes where offered).
    pub fn total_size(manifest: &RuntimeManifest) -> u64 {
        manifest
            .files
            .values()
            .map(|entry| match entry {
                RuntimeEntry::File { downloads, .. } => downloads.preferred().0.size,
                _ => 0,
            })
            .sum()
    }

    /// Create directories and links now, schedule every file on the pool.
    pub async fn install(
        &self,
        component: &str,
        manifest: &RuntimeManifest,
        progress: &SharedProgress,
        pool: &FetchPool,
    ) -> Result<Vec<PendingFetch>, InstallError> {
        let root = self.runtime_root(component);
        let mut pending = Vec::new();
        let mut links = Vec::new();

        for (relative, entry) in &manifest.files {
            let path = root.join(relative);
            match entry {
                RuntimeEntry::Directory => {
                    tokio::fs::create_dir_all(&path).await.map_err(|e| {
                        InstallError::new(InstallStage::Runtime, relative, LauncherError::io(&path, e))
                    })?;
                }
                RuntimeEntry::File {
                    executable,
                    downloads,
                } => {
                    let (artifact, lzma) = downloads.preferred();
                    let request = FetchRequest::new(&artifact.url, path)
                        .sha1(&downloads.raw.sha1)
                        .size(artifact.size)
                        .lzma(lzma)
                        .executable(*executable);
                    pending.push(pool.schedule(
                        InstallStage::Runtime,
                        relative,
                        request,
                        progress.clone(),
                    ));
                }
                RuntimeEntry::Link { target } => links.push((relative, path, target)),
            }
        }

        for (relative, path, target) in links {
            create_link(&path, target)
                .await
                .map_err(|e| InstallError::new(InstallStage::Runtime, relative, LauncherError::io(&path, e)))?;
        }

        debug!(
            "Runtime {}: {} files scheduled into {:?}",
            component,
            pending.len(),
            root
        );
        Ok(pending)
    }
}

fn pick_component(
    components: &HashMap<String, Vec<RuntimeRelease>>,
    name: &str,
) -> Option<ResolvedRuntime> {
    let release = components.get(name)?.first()?.clone();
    Some(ResolvedRuntime {
        component: name.to_string(),
        release,
    })
}

/// Newest release (by major, then release date) whose major passes `accept`.
fn pick_newest(
    components: &HashMap<String, Vec<RuntimeRelease>>,
    accept: impl Fn(u32) -> bool,
) -> Option<ResolvedRuntime> {
    components
        .iter()
        .filter_map(|(component, releases)| {
            let release = releases.first()?;
            let major = release.version.major()?;
            accept(major).then_some((major, component, release))
        })
        .max_by(|(ma, ca, ra), (mb, cb, rb)| {
            ma.cmp(mb)
                .then_with(|| ra.version.released.cmp(&rb.version.released))
                .then_with(|| cb.cmp(ca))
        })
        .map(|(_, component, release)| ResolvedRuntime {
            component: component.clone(),
            release: release.clone(),
        })
}

/// Only created when nothing exists at `path` yet. Not locked: two racing
/// installs may both try, and the loser's `AlreadyExists` is ignored.
#[cfg(unix)]
async fn create_link(path: &Path, target: &str) -> std::io::Result<()> {
    if tokio::fs::symlink_metadata(path).await.is_ok() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    match tokio::fs::symlink(target, path).await {
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        other => other,
    }
}

#[cfg(not(unix))]
async fn create_link(path: &Path, target: &str) -> std::io::Result<()> {
    debug!("Skipping runtime link {:?} -> {}", path, target);
    Ok(())
}
