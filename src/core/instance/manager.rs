use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::model::{config_path, Instance, InstanceInfo, CURRENT_CONFIG_VERSION};
use crate::core::error::{LauncherError, LauncherResult};

/// Owns `InstanceInfo` lifetime: one directory per instance under the
/// instances root, named after the instance.
#[derive(Debug, Clone)]
pub struct InstanceRepository {
    /// Root directory where all instances live.
    instances_dir: PathBuf,
}

impl InstanceRepository {
    pub fn new(instances_dir: impl Into<PathBuf>) -> Self {
        Self {
            instances_dir: instances_dir.into(),
        }
    }

    /// Directory of instance `name`. Rejects names that would escape the
    /// instances root.
    pub fn instance_dir(&self, name: &str) -> LauncherResult<PathBuf> {
        validate_name(name)?;
        Ok(self.instances_dir.join(name))
    }

    /// Create a new instance on disk. Refuses to overwrite.
    ///
    /// Creates:
    /// - `<instance>/minecraft/`
    /// - `<instance>/instance.toml`
    pub async fn create(&self, name: &str, mut info: InstanceInfo) -> LauncherResult<Instance> {
        let dir = self.instance_dir(name)?;
        if dir.exists() {
            return Err(LauncherError::InstanceAlreadyExists(name.to_string()));
        }

        info.config_version = CURRENT_CONFIG_VERSION;
        let instance = Instance::new(name, dir, info);

        let game_dir = instance.game_dir();
        tokio::try_join!(create_dir_safe(&instance.dir), create_dir_safe(&game_dir))?;
        self.write(name, &instance.info).await?;

        info!(
            "Created instance '{}' ({} {})",
            name, instance.info.instance_type, instance.info.minecraft_version
        );
        Ok(instance)
    }

    /// Persist instance metadata.
    pub async fn write(&self, name: &str, info: &InstanceInfo) -> LauncherResult<()> {
        let path = config_path(&self.instance_dir(name)?);
        let text = toml::to_string_pretty(info).map_err(|e| LauncherError::Toml {
            path: path.clone(),
            message: e.to_string(),
        })?;

        tokio::fs::write(&path, text)
            .await
            .map_err(|e| LauncherError::Io {
                path,
                source: e,
            })
    }

    /// Read one instance's metadata, upgrading the file if it predates the
    /// current schema.
    pub async fn read(&self, name: &str) -> LauncherResult<InstanceInfo> {
        let path = config_path(&self.instance_dir(name)?);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LauncherError::InstanceNotFound(name.to_string()));
            }
            Err(e) => return Err(LauncherError::io(&path, e)),
        };

        let mut info: InstanceInfo = toml::from_str(&text).map_err(|e| LauncherError::Toml {
            path: path.clone(),
            message: e.to_string(),
        })?;

        if info.is_outdated() {
            debug!(
                "Upgrading {:?} from config version {} to {}",
                path, info.config_version, CURRENT_CONFIG_VERSION
            );
            info.config_version = CURRENT_CONFIG_VERSION;
            self.write(name, &info).await?;
        }

        Ok(info)
    }

    pub async fn open(&self, name: &str) -> LauncherResult<Instance> {
        let info = self.read(name).await?;
        Ok(Instance::new(name, self.instance_dir(name)?, info))
    }

    /// List all instances, sorted by name. Unreadable ones are skipped.
    pub async fn list(&self) -> LauncherResult<Vec<Instance>> {
        let mut instances = Vec::new();

        if !self.instances_dir.exists() {
            return Ok(instances);
        }

        let mut entries = tokio::fs::read_dir(&self.instances_dir)
            .await
            .map_err(|e| LauncherError::io(&self.instances_dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LauncherError::io(&self.instances_dir, e))?
        {
            let path = entry.path();
            if !config_path(&path).is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            match self.open(name).await {
                Ok(instance) => instances.push(instance),
                Err(e) => warn!("Skipping instance at {:?}: {}", path, e),
            }
        }

        instances.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(instances)
    }

    /// Move an instance to a new name. The metadata is rewritten under the
    /// new directory.
    pub async fn rename(&self, old: &str, new: &str) -> LauncherResult<Instance> {
        let to = self.instance_dir(new)?;
        let info = self.read(old).await?;
        let from = self.instance_dir(old)?;
        if to.exists() {
            return Err(LauncherError::InstanceAlreadyExists(new.to_string()));
        }

        tokio::fs::rename(&from, &to)
            .await
            .map_err(|e| LauncherError::io(&to, e))?;
        self.write(new, &info).await?;

        info!("Renamed instance '{}' -> '{}'", old, new);
        Ok(Instance::new(new, to, info))
    }

    /// Delete an instance from disk.
    pub async fn delete(&self, name: &str) -> LauncherResult<()> {
        let instance_dir = self.instance_dir(name)?;
        if !config_path(&instance_dir).is_file() {
            return Err(LauncherError::InstanceNotFound(name.to_string()));
        }

        tokio::fs::remove_dir_all(&instance_dir)
            .await
            .map_err(|e| LauncherError::Io {
                path: instance_dir,
                source: e,
            })?;

        info!("Deleted instance {}", name);
        Ok(())
    }
}

/// Names double as directory names.
fn validate_name(name: &str) -> LauncherResult<()> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed != name
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', ':']);
    if invalid {
        return Err(LauncherError::InvalidInstanceName(name.to_string()));
    }
    Ok(())
}

async fn create_dir_safe(path: &Path) -> LauncherResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })
}
