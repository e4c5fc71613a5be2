// ─── Launcher Config ───
// Read-only launcher settings plus the on-disk layout derived from them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};

pub const APP_DIR_NAME: &str = "ice-launcher";
pub const LAUNCHER_NAME: &str = "ice-launcher";
pub const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DATA_DIR_ENV: &str = "ICE_LAUNCHER_DATA_DIR";
const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_CLIENT_ID: &str = "0018ddff-bd2f-4cc6-b220-66f6a4462a5c";

/// Remote endpoints. Overridable so tests can point at a local server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub version_manifest: String,
    pub resources_base: String,
    pub runtime_index: String,
    pub runtime_releases_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            version_manifest: "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json"
                .into(),
            resources_base: "https://resources.download.minecraft.net".into(),
            runtime_index: "https://piston-meta.mojang.com/v1/products/java-runtime/2ec0cc96c44e5a76b9c8b7c39df7210883d12871/all.json".into(),
            runtime_releases_api: "https://api.adoptium.net".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub config_version: u32,
    /// Root of every file the launcher writes.
    pub data_dir: PathBuf,
    /// Parallel fetch workers.
    pub concurrency: usize,
    /// Value of `-Xmx`.
    pub jvm_memory: String,
    /// Extra JVM flags appended after the launcher's own.
    pub jvm_options: Vec<String>,
    /// Append the G1 tuning block.
    pub optimize_jvm: bool,
    /// Substituted for `${clientid}`.
    pub client_id: String,
    pub endpoints: Endpoints,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            config_version: 1,
            data_dir: default_data_dir(),
            concurrency: default_concurrency(),
            jvm_memory: "2G".into(),
            jvm_options: Vec::new(),
            optimize_jvm: true,
            client_id: DEFAULT_CLIENT_ID.into(),
            endpoints: Endpoints::default(),
        }
    }
}

impl LauncherConfig {
    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load `<data_dir>/config.toml` if present. The data dir itself always
    /// comes from the argument, never from the file.
    pub fn load(data_dir: Option<PathBuf>) -> LauncherResult<Self> {
        let data_dir = data_dir
            .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(default_data_dir);
        let path = data_dir.join(CONFIG_FILE);

        let mut config = match std::fs::read_to_string(&path) {
            Ok(raw) => {
                debug!("Loading launcher config from {:?}", path);
                toml::from_str::<LauncherConfig>(&raw).map_err(|e| LauncherError::Toml {
                    path: path.clone(),
                    message: e.to_string(),
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LauncherConfig::default(),
            Err(e) => return Err(LauncherError::io(path, e)),
        };

        config.data_dir = data_dir;
        if config.concurrency == 0 {
            config.concurrency = default_concurrency();
        }

        info!(
            "Launcher data dir {:?}, {} fetch workers",
            config.data_dir, config.concurrency
        );
        Ok(config)
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_dir)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Every path the pipeline writes, derived from the data dir. Stable across
/// runs so the hash checks can recognise earlier work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn version_json(&self, version_id: &str) -> PathBuf {
        self.versions_dir()
            .join(version_id)
            .join(format!("{}.json", version_id))
    }

    pub fn client_jar(&self, version_id: &str) -> PathBuf {
        self.versions_dir()
            .join(version_id)
            .join(format!("{}.jar", version_id))
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn asset_index(&self, index_id: &str) -> PathBuf {
        self.assets_dir()
            .join("indexes")
            .join(format!("{}.json", index_id))
    }

    pub fn asset_object(&self, hash: &str) -> PathBuf {
        let prefix = hash.get(..2).unwrap_or(hash);
        self.assets_dir().join("objects").join(prefix).join(hash)
    }

    pub fn runtimes_dir(&self) -> PathBuf {
        self.root.join("runtimes")
    }

    pub fn runtime_manifest(&self, component: &str) -> PathBuf {
        self.runtimes_dir().join(format!("{}.json", component))
    }

    pub fn runtime_root(&self, component: &str) -> PathBuf {
        self.runtimes_dir().join(component)
    }

    pub fn instances_dir(&self) -> PathBuf {
        self.root.join("instances")
    }
}
