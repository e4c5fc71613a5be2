// ─── Launch Task ───
// Authenticate → ensure runtime → compose the command line → spawn.
// `launch` returns as soon as the process exists; output is read by the
// caller through the returned handle.

use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, instrument};

use super::arguments::{game_arguments, safe_path_str, TemplateContext};
use super::jvm::jvm_arguments;
use crate::core::auth::{Account, Credential};
use crate::core::config::LauncherConfig;
use crate::core::error::{LaunchError, LaunchStage, LauncherError, LauncherResult};
use crate::core::install::InstallCoordinator;
use crate::core::instance::{Instance, InstanceType};
use crate::core::java::RuntimeInstallation;
use crate::core::platform::PlatformInfo;
use crate::core::progress::{NoProgress, SharedProgress};
use crate::core::version::{RuleEngine, VersionMeta};

/// Fully composed command line, not yet started.
#[derive(Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Values masked when the command is displayed.
    secrets: Vec<String>,
}

impl LaunchCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: working_dir.into(),
            secrets: Vec::new(),
        }
    }

    fn redacting(mut self, secret: &str) -> Self {
        if !secret.is_empty() {
            self.secrets.push(secret.to_string());
        }
        self
    }

    fn redact(&self, raw: &str) -> String {
        self.secrets
            .iter()
            .fold(raw.to_string(), |text, secret| text.replace(secret.as_str(), "<redacted>"))
    }

    /// Start the process in `working_dir` with piped output.
    pub async fn spawn(&self) -> LauncherResult<ProcessHandle> {
        tokio::fs::create_dir_all(&self.working_dir)
            .await
            .map_err(|e| LauncherError::io(&self.working_dir, e))?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        configure_platform_spawn(&mut cmd);

        debug!("Command (copy/paste): {}", self);
        let child = cmd
            .spawn()
            .map_err(|e| LauncherError::io(&self.program, e))?;

        info!("Started {:?} (pid {:?})", self.program, child.id());
        Ok(ProcessHandle {
            program: self.program.clone(),
            child,
        })
    }
}

// Shell-pasteable, secrets masked.
impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_escape(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", shell_escape(&self.redact(arg)))?;
        }
        Ok(())
    }
}

impl fmt::Debug for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchCommand")
            .field("program", &self.program)
            .field(
                "args",
                &self.args.iter().map(|arg| self.redact(arg)).collect::<Vec<_>>(),
            )
            .field("working_dir", &self.working_dir)
            .finish()
    }
}

/// A running game process.
#[derive(Debug)]
pub struct ProcessHandle {
    program: PathBuf,
    child: Child,
}

impl ProcessHandle {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    pub async fn wait(&mut self) -> LauncherResult<ExitStatus> {
        self.child
            .wait()
            .await
            .map_err(|e| LauncherError::io(&self.program, e))
    }
}

#[derive(Debug, Clone)]
pub struct LaunchComposer {
    coordinator: Arc<InstallCoordinator>,
    rules: RuleEngine,
    config: LauncherConfig,
}

impl LaunchComposer {
    pub fn new(coordinator: Arc<InstallCoordinator>, config: &LauncherConfig, platform: PlatformInfo) -> Self {
        Self {
            coordinator,
            rules: RuleEngine::new(platform),
            config: config.clone(),
        }
    }

    pub fn platform(&self) -> &PlatformInfo {
        self.rules.platform()
    }

    /// Launch `instance` with its installed `meta`. The runtime is installed
    /// or updated first when needed.
    #[instrument(skip_all, fields(instance = %instance.name, version = %meta.id))]
    pub async fn launch(
        &self,
        instance: &Instance,
        meta: &VersionMeta,
        account: &dyn Account,
        progress: Option<SharedProgress>,
    ) -> Result<ProcessHandle, LaunchError> {
        let credential = account
            .refresh()
            .await
            .map_err(|e| LaunchError::new(LaunchStage::Authentication, e))?;

        let progress = progress.unwrap_or_else(|| Arc::new(NoProgress));
        let runtime = self
            .coordinator
            .ensure_runtime(&instance.info.jre_version, meta, progress)
            .await
            .map_err(|e| LaunchError::new(LaunchStage::Runtime, e))?;
        debug!("Using runtime {} ({})", runtime.component, runtime.version);

        let command = self.compose(instance, meta, &credential, &runtime)?;
        info!("Launching {} with {:?}", meta.id, command.program);
        debug!("Command: {:?}", command);

        command
            .spawn()
            .await
            .map_err(|e| LaunchError::new(LaunchStage::Spawn, e))
    }

    /// Build the command line without starting anything.
    pub fn compose(
        &self,
        instance: &Instance,
        meta: &VersionMeta,
        credential: &Credential,
        runtime: &RuntimeInstallation,
    ) -> Result<LaunchCommand, LaunchError> {
        let main_class = main_class(instance, meta)
            .map_err(|e| LaunchError::new(LaunchStage::MainClass, e))?;
        let classpath = self
            .classpath(meta)
            .map_err(|e| LaunchError::new(LaunchStage::Classpath, e))?;

        let layout = self.coordinator.layout();
        let ctx = TemplateContext {
            instance,
            meta,
            credential,
            layout,
            client_id: &self.config.client_id,
        };

        let mut args = jvm_arguments(self.platform(), &self.config, &classpath);
        args.push(main_class.to_string());
        args.extend(game_arguments(&self.rules, &ctx));

        Ok(LaunchCommand::new(&runtime.java, args, instance.game_dir())
            .redacting(&credential.access_token))
    }

    /// Installed libraries followed by the client jar, joined with the host
    /// separator.
    pub fn classpath(&self, meta: &VersionMeta) -> LauncherResult<String> {
        let layout = self.coordinator.layout();
        let mut entries = self.coordinator.libraries().classpath_entries(&meta.libraries);
        entries.push(layout.client_jar(&meta.id));

        if let Some(missing) = entries.iter().find(|path| !path.is_file()) {
            return Err(LauncherError::Other(format!(
                "{} is missing, install the version first",
                missing.display()
            )));
        }

        let separator = self.platform().os.classpath_separator();
        let classpath = entries
            .iter()
            .map(|path| safe_path_str(path))
            .collect::<Vec<_>>()
            .join(separator);
        debug!("Classpath: {} entries, {} chars", entries.len(), classpath.len());
        Ok(classpath)
    }
}

fn main_class<'a>(instance: &Instance, meta: &'a VersionMeta) -> LauncherResult<&'a str> {
    match instance.info.instance_type {
        InstanceType::Vanilla => Ok(meta.main_class.as_str()),
        other => Err(LauncherError::Other(format!(
            "{} instances cannot be launched",
            other
        ))),
    }
}

fn configure_platform_spawn(cmd: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.creation_flags(CREATE_NO_WINDOW);

        // Terminal session vars make LWJGL treat the game as a console app.
        cmd.env_remove("WT_SESSION");
        cmd.env_remove("TERM");
        cmd.env_remove("ConEmuANSI");
    }
    #[cfg(not(target_os = "windows"))]
    let _ = cmd;
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=' | '<' | '>')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::core::auth::AccountMode;
    use crate::core::http::build_http_client;
    use crate::core::instance::InstanceInfo;
    use crate::core::platform::{Arch, OsFamily};

    const LIBRARY: &str = "com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar";

    fn meta() -> VersionMeta {
        serde_json::from_value(serde_json::json!({
            "id": "1.20.1",
            "type": "release",
            "mainClass": "net.minecraft.client.main.Main",
            "assetIndex": { "id": "5", "sha1": "a", "size": 1, "totalSize": 2, "url": "u" },
            "downloads": { "client": { "sha1": "c", "size": 3, "url": "u" } },
            "libraries": [{
                "name": "com.mojang:brigadier:1.1.8",
                "downloads": { "artifact": {
                    "path": LIBRARY, "sha1": "b", "size": 4, "url": "u"
                } }
            }],
            "arguments": { "game": [
                "--username", "${auth_player_name}",
                "--gameDir", "${game_directory}",
                "--accessToken", "${auth_access_token}",
                "--quickPlay", "${quickPlayPath}"
            ] }
        }))
        .unwrap()
    }

    fn credential() -> Credential {
        Credential {
            mode: AccountMode::Microsoft,
            display_name: "Alex".into(),
            subject_id: "uuid".into(),
            access_token: "very-secret".into(),
        }
    }

    fn composer(root: &Path) -> LaunchComposer {
        let config = LauncherConfig::with_data_dir(root);
        let platform = PlatformInfo::new(OsFamily::Linux, Arch::X86_64);
        let coordinator = InstallCoordinator::new(&config, platform.clone(), build_http_client().unwrap());
        LaunchComposer::new(Arc::new(coordinator), &config, platform)
    }

    fn runtime(root: &Path) -> RuntimeInstallation {
        RuntimeInstallation {
            component: "java-runtime-gamma".into(),
            version: "17.0.8".into(),
            root: root.join("runtimes/java-runtime-gamma"),
            java: root.join("runtimes/java-runtime-gamma/bin/java"),
        }
    }

    fn install_files(composer: &LaunchComposer) {
        let layout = composer.coordinator.layout();
        for path in [layout.libraries_dir().join(LIBRARY), layout.client_jar("1.20.1")] {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"jar").unwrap();
        }
    }

    #[test]
    fn composes_full_command_line() {
        let temp = tempfile::tempdir().unwrap();
        let composer = composer(temp.path());
        install_files(&composer);
        let instance = Instance::new(
            "survival",
            temp.path().join("instances/survival"),
            InstanceInfo::vanilla("1.20.1"),
        );

        let command = composer
            .compose(&instance, &meta(), &credential(), &runtime(temp.path()))
            .unwrap();
        assert_eq!(command.program, runtime(temp.path()).java);
        assert_eq!(command.working_dir, instance.game_dir());

        let cp_at = command.args.iter().position(|arg| arg == "-cp").unwrap();
        let classpath = &command.args[cp_at + 1];
        let layout = composer.coordinator.layout();
        assert_eq!(
            classpath,
            &format!(
                "{}:{}",
                safe_path_str(&layout.libraries_dir().join(LIBRARY)),
                safe_path_str(&layout.client_jar("1.20.1"))
            )
        );
        assert_eq!(command.args[cp_at + 2], "net.minecraft.client.main.Main");
        let game_dir = safe_path_str(&instance.game_dir());
        assert_eq!(
            &command.args[cp_at + 3..],
            [
                "--username",
                "Alex",
                "--gameDir",
                game_dir.as_str(),
                "--accessToken",
                "very-secret",
                "--quickPlay",
                "${quickPlayPath}",
            ]
        );
    }

    #[test]
    fn displayed_command_hides_access_token() {
        let temp = tempfile::tempdir().unwrap();
        let composer = composer(temp.path());
        install_files(&composer);
        let instance = Instance::new("a", temp.path().join("instances/a"), InstanceInfo::vanilla("1.20.1"));

        let command = composer
            .compose(&instance, &meta(), &credential(), &runtime(temp.path()))
            .unwrap();
        assert!(command.args.contains(&"very-secret".to_string()));
        assert!(!command.to_string().contains("very-secret"));
        assert!(!format!("{:?}", command).contains("very-secret"));
        assert!(command.to_string().contains("<redacted>"));
    }

    #[test]
    fn missing_jars_fail_at_classpath() {
        let temp = tempfile::tempdir().unwrap();
        let composer = composer(temp.path());
        let instance = Instance::new("a", temp.path().join("instances/a"), InstanceInfo::vanilla("1.20.1"));

        let err = composer
            .compose(&instance, &meta(), &credential(), &runtime(temp.path()))
            .unwrap_err();
        assert_eq!(err.stage, LaunchStage::Classpath);
    }

    #[test]
    fn modded_instances_fail_at_main_class() {
        let temp = tempfile::tempdir().unwrap();
        let composer = composer(temp.path());
        install_files(&composer);
        let mut info = InstanceInfo::vanilla("1.20.1");
        info.instance_type = InstanceType::Fabric;
        let instance = Instance::new("a", temp.path().join("instances/a"), info);

        let err = composer
            .compose(&instance, &meta(), &credential(), &runtime(temp.path()))
            .unwrap_err();
        assert_eq!(err.stage, LaunchStage::MainClass);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawn_returns_before_exit_and_pipes_output() {
        use tokio::io::{AsyncBufReadExt, BufReader};

        let temp = tempfile::tempdir().unwrap();
        let game_dir = temp.path().join("game");
        let command = LaunchCommand::new("sh", vec!["-c".into(), "pwd".into()], &game_dir);

        let mut handle = command.spawn().await.unwrap();
        let stdout = handle.take_stdout().unwrap();
        let line = BufReader::new(stdout).lines().next_line().await.unwrap().unwrap();
        assert_eq!(Path::new(&line).file_name(), game_dir.file_name());
        assert!(handle.wait().await.unwrap().success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launch_refreshes_once_installs_runtime_and_returns_running_process() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        use async_trait::async_trait;
        use tokio::io::{AsyncBufReadExt, BufReader};

        use crate::core::auth::OfflineAccount;
        use crate::core::progress::ProgressCounter;
        use crate::core::test_support::{publish_runtime, publish_version, FixtureServer, PublishedVersion};

        struct CountingAccount {
            inner: OfflineAccount,
            refreshes: AtomicUsize,
        }

        #[async_trait]
        impl Account for CountingAccount {
            async fn refresh(&self) -> LauncherResult<Credential> {
                self.refreshes.fetch_add(1, Ordering::SeqCst);
                self.inner.refresh().await
            }
        }

        let server = FixtureServer::start().await;
        publish_version(&server, "1.20.1", &[b"object"], &[(LIBRARY, b"brigadier")]);
        publish_runtime(&server, b"#!/bin/sh\necho \"$@\"\n");

        let temp = tempfile::tempdir().unwrap();
        let mut config = LauncherConfig::with_data_dir(temp.path());
        config.endpoints.version_manifest = PublishedVersion::manifest_url(&server);
        config.endpoints.resources_base = PublishedVersion::resources_base(&server);
        config.endpoints.runtime_index = server.url("/runtime/all.json");
        let platform = PlatformInfo::new(OsFamily::Linux, Arch::X86_64);
        let coordinator = Arc::new(InstallCoordinator::new(
            &config,
            platform.clone(),
            build_http_client().unwrap(),
        ));
        let composer = LaunchComposer::new(Arc::clone(&coordinator), &config, platform);

        let info = InstanceInfo::vanilla("1.20.1");
        let meta = coordinator
            .ensure_installed(&info, Arc::new(ProgressCounter::new()))
            .await
            .unwrap();
        let instance = Instance::new("survival", temp.path().join("instances/survival"), info);
        let account = CountingAccount {
            inner: OfflineAccount::new("Steve"),
            refreshes: AtomicUsize::new(0),
        };

        let mut handle = composer
            .launch(&instance, &meta, &account, None)
            .await
            .unwrap();
        assert_eq!(account.refreshes.load(Ordering::SeqCst), 1);
        assert!(coordinator.layout().runtime_root("java-runtime-gamma").join(".installed.json").is_file());

        let stdout = handle.take_stdout().unwrap();
        let line = BufReader::new(stdout).lines().next_line().await.unwrap().unwrap();
        assert!(line.contains("net.minecraft.client.main.Main --username Steve"));
        assert!(handle.wait().await.unwrap().success());
    }

    #[tokio::test]
    async fn spawn_failure_names_the_program() {
        let temp = tempfile::tempdir().unwrap();
        let command = LaunchCommand::new(temp.path().join("no-java"), Vec::new(), temp.path());

        let err = command.spawn().await.unwrap_err();
        assert!(matches!(err, LauncherError::Io { .. }));
    }
}
