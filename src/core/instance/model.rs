use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::java::RuntimeRequest;

/// Schema version written by this build. Older files are rewritten on read.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Kind of instance. Only vanilla can be installed and launched; the loader
/// variants are recognised so their files stay readable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InstanceType {
    #[default]
    Vanilla,
    Fabric,
    Forge,
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            InstanceType::Vanilla => "vanilla",
            InstanceType::Fabric => "fabric",
            InstanceType::Forge => "forge",
        })
    }
}

/// Persisted to `instances/<name>/instance.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceInfo {
    /// Missing in files written before versioning; reads as 0.
    #[serde(default)]
    pub config_version: u32,
    #[serde(default)]
    pub instance_type: InstanceType,
    /// Join key into the version manifest.
    pub minecraft_version: String,
    #[serde(default)]
    pub jre_version: RuntimeRequest,
}

impl InstanceInfo {
    pub fn vanilla(minecraft_version: impl Into<String>) -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION,
            instance_type: InstanceType::Vanilla,
            minecraft_version: minecraft_version.into(),
            jre_version: RuntimeRequest::Auto,
        }
    }

    pub fn with_jre(mut self, jre_version: RuntimeRequest) -> Self {
        self.jre_version = jre_version;
        self
    }

    pub fn is_outdated(&self) -> bool {
        self.config_version < CURRENT_CONFIG_VERSION
    }
}

/// An instance as found on disk.
///
/// Layout:
/// - `instance.toml`: the serialized `InstanceInfo`
/// - `minecraft/`: game working directory (.minecraft equivalent)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub name: String,
    pub dir: PathBuf,
    pub info: InstanceInfo,
}

impl Instance {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>, info: InstanceInfo) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            info,
        }
    }

    /// Path to the instance's `minecraft/` game working directory.
    pub fn game_dir(&self) -> PathBuf {
        self.dir.join("minecraft")
    }

    pub fn config_path(&self) -> PathBuf {
        config_path(&self.dir)
    }
}

pub(crate) fn config_path(instance_dir: &Path) -> PathBuf {
    instance_dir.join("instance.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_round_trips_through_toml() {
        let info = InstanceInfo::vanilla("1.20.1").with_jre(RuntimeRequest::Major(17));
        let text = toml::to_string(&info).unwrap();
        assert!(text.contains("jre_version = \"17\""));
        assert!(text.contains("instance_type = \"vanilla\""));

        let parsed: InstanceInfo = toml::from_str(&text).unwrap();
        assert_eq!(parsed, info);
    }

    #[test]
    fn unversioned_files_read_as_outdated() {
        let parsed: InstanceInfo = toml::from_str(
            r#"
                instance_type = "fabric"
                minecraft_version = "1.19.4"
            "#,
        )
        .unwrap();
        assert!(parsed.is_outdated());
        assert_eq!(parsed.instance_type, InstanceType::Fabric);
        assert_eq!(parsed.jre_version, RuntimeRequest::Auto);
    }
}
