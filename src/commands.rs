use std::process::ExitStatus;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{info, warn};

use crate::core::auth::Account;
use crate::core::config::LauncherConfig;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;
use crate::core::install::InstallCoordinator;
use crate::core::instance::{Instance, InstanceInfo, InstanceRepository};
use crate::core::java::{RuntimeInstallation, RuntimeRequest};
use crate::core::launch::LaunchComposer;
use crate::core::platform::PlatformInfo;
use crate::core::progress::SharedProgress;
use crate::core::version::{VersionMeta, VersionSummary};

/// Everything a front end needs, wired from one config.
#[derive(Debug, Clone)]
pub struct Launcher {
    config: LauncherConfig,
    instances: InstanceRepository,
    coordinator: Arc<InstallCoordinator>,
    composer: LaunchComposer,
}

impl Launcher {
    pub fn new(config: LauncherConfig) -> LauncherResult<Self> {
        let platform = PlatformInfo::detect();
        info!("Host platform: {}", platform);

        let http = build_http_client()?;
        let coordinator = Arc::new(InstallCoordinator::new(&config, platform.clone(), http));
        let composer = LaunchComposer::new(Arc::clone(&coordinator), &config, platform);

        Ok(Self {
            instances: InstanceRepository::new(config.layout().instances_dir()),
            config,
            coordinator,
            composer,
        })
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn instances(&self) -> &InstanceRepository {
        &self.instances
    }

    pub async fn list_versions(&self, include_snapshots: bool) -> LauncherResult<Vec<VersionSummary>> {
        let manifest = self.coordinator.resolver().fetch_version_manifest().await?;
        if include_snapshots {
            return Ok(manifest.versions);
        }
        Ok(manifest.releases().into_iter().cloned().collect())
    }

    /// `version` may be `latest` for the newest release.
    pub async fn create_instance(
        &self,
        name: &str,
        version: &str,
        jre: Option<&str>,
    ) -> LauncherResult<Instance> {
        let manifest = self.coordinator.resolver().fetch_version_manifest().await?;
        let summary = if version == "latest" {
            manifest
                .latest_release()
                .ok_or_else(|| LauncherError::Other("Manifest lists no latest release".into()))?
        } else {
            manifest.find(version)?
        };

        let info = InstanceInfo::vanilla(&summary.id)
            .with_jre(jre.map(RuntimeRequest::parse).unwrap_or_default());
        self.instances.create(name, info).await
    }

    /// Game artifacts first, then the runtime the instance asks for.
    pub async fn install_instance(
        &self,
        name: &str,
        progress: SharedProgress,
    ) -> LauncherResult<(VersionMeta, RuntimeInstallation)> {
        let instance = self.instances.open(name).await?;
        let meta = self
            .coordinator
            .ensure_installed(&instance.info, progress.clone())
            .await?;
        let runtime = self
            .coordinator
            .ensure_runtime(&instance.info.jre_version, &meta, progress)
            .await?;
        Ok((meta, runtime))
    }

    /// Install if needed, start the game, forward its output to the log and
    /// wait for it to exit.
    pub async fn launch_instance(
        &self,
        name: &str,
        account: &dyn Account,
        progress: SharedProgress,
    ) -> LauncherResult<ExitStatus> {
        let instance = self.instances.open(name).await?;
        let meta = self
            .coordinator
            .ensure_installed(&instance.info, progress.clone())
            .await?;

        let mut process = self
            .composer
            .launch(&instance, &meta, account, Some(progress))
            .await?;
        info!("Instance '{}' running (pid {:?})", name, process.id());

        let mut forwarders = Vec::new();
        if let Some(stdout) = process.take_stdout() {
            forwarders.push(tokio::spawn(forward_lines(name.to_string(), "stdout", stdout)));
        }
        if let Some(stderr) = process.take_stderr() {
            forwarders.push(tokio::spawn(forward_lines(name.to_string(), "stderr", stderr)));
        }

        let status = process.wait().await?;
        for forwarder in forwarders {
            forwarder.await?;
        }

        info!("Instance '{}' exited with {}", name, status);
        Ok(status)
    }
}

async fn forward_lines(instance: String, stream: &'static str, reader: impl AsyncRead + Unpin) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if stream == "stderr" => warn!("[mc:{}][{}] {}", instance, stream, line),
            Ok(Some(line)) => info!("[mc:{}][{}] {}", instance, stream, line),
            Ok(None) => break,
            Err(e) => {
                warn!("[mc:{}] {} closed: {}", instance, stream, e);
                break;
            }
        }
    }
}
