use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Hash mismatch after a download that reported success.
#[derive(Debug, Error)]
#[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
pub struct IntegrityError {
    pub path: PathBuf,
    pub expected: String,
    pub actual: String,
}

/// Raw failure surfaced by the artifact store. Every variant names the URL
/// and the destination it was being written to.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request to {url} failed (dest {dest:?}): {source}")]
    Transport {
        url: String,
        dest: PathBuf,
        source: reqwest::Error,
    },

    #[error("Download failed for {url}: HTTP {status}")]
    Status {
        url: String,
        dest: PathBuf,
        status: u16,
    },

    #[error("IO error writing {dest:?} (from {url}): {source}")]
    Io {
        url: String,
        dest: PathBuf,
        source: std::io::Error,
    },

    #[error("LZMA stream from {url} could not be decoded into {dest:?}: {message}")]
    Decompress {
        url: String,
        dest: PathBuf,
        message: String,
    },

    #[error("Integrity check failed for {url}: {source}")]
    Integrity {
        url: String,
        #[source]
        source: IntegrityError,
    },
}

#[derive(Debug, Error)]
#[error("Minecraft version {id} not found in manifest")]
pub struct VersionNotFound {
    pub id: String,
}

/// A rule predicate this launcher does not evaluate. Never fatal: the
/// guarded library or argument is dropped.
#[derive(Debug, Error)]
#[error("Unsupported rule predicate: feature '{feature}'")]
pub struct RuleEvaluationUnsupported {
    pub feature: String,
}

/// Central cause type for the launcher core.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    // ── Documents ───────────────────────────────────────
    #[error("JSON error in {origin}: {source}")]
    Json {
        origin: String,
        source: serde_json::Error,
    },

    #[error("TOML error in {path:?}: {message}")]
    Toml { path: PathBuf, message: String },

    #[error(transparent)]
    VersionNotFound(#[from] VersionNotFound),

    // ── Instance ────────────────────────────────────────
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Instance already exists: {0}")]
    InstanceAlreadyExists(String),

    #[error("Invalid instance name: {0:?}")]
    InvalidInstanceName(String),

    // ── Runtime ─────────────────────────────────────────
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("No managed runtime matches '{0}' on this platform")]
    RuntimeNotAvailable(String),

    #[error(transparent)]
    Install(Box<InstallError>),

    #[error(transparent)]
    Launch(Box<LaunchError>),

    // ── Tasks ───────────────────────────────────────────
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(origin: impl fmt::Display, source: serde_json::Error) -> Self {
        LauncherError::Json {
            origin: origin.to_string(),
            source,
        }
    }
}

/// Phase of `ensure_installed` an error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    Resolve,
    Client,
    Libraries,
    AssetIndex,
    Assets,
    RuntimeIndex,
    Runtime,
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallStage::Resolve => "resolve",
            InstallStage::Client => "client",
            InstallStage::Libraries => "libraries",
            InstallStage::AssetIndex => "asset index",
            InstallStage::Assets => "assets",
            InstallStage::RuntimeIndex => "runtime index",
            InstallStage::Runtime => "runtime",
        };
        f.write_str(name)
    }
}

/// Installation failure with enough context to decide on a retry. Rerunning
/// `ensure_installed` is always safe.
#[derive(Debug, Error)]
#[error("Install failed during {stage} ({artifact}): {cause}")]
pub struct InstallError {
    pub stage: InstallStage,
    pub artifact: String,
    #[source]
    pub cause: LauncherError,
}

impl InstallError {
    pub fn new(
        stage: InstallStage,
        artifact: impl Into<String>,
        cause: impl Into<LauncherError>,
    ) -> Self {
        Self {
            stage,
            artifact: artifact.into(),
            cause: cause.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStage {
    Authentication,
    Runtime,
    MainClass,
    Classpath,
    Spawn,
}

impl fmt::Display for LaunchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LaunchStage::Authentication => "authentication",
            LaunchStage::Runtime => "runtime",
            LaunchStage::MainClass => "main class",
            LaunchStage::Classpath => "classpath",
            LaunchStage::Spawn => "spawn",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("Launch failed during {stage}: {cause}")]
pub struct LaunchError {
    pub stage: LaunchStage,
    #[source]
    pub cause: LauncherError,
}

impl LaunchError {
    pub fn new(stage: LaunchStage, cause: impl Into<LauncherError>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}

impl From<InstallError> for LauncherError {
    fn from(err: InstallError) -> Self {
        LauncherError::Install(Box::new(err))
    }
}

impl From<LaunchError> for LauncherError {
    fn from(err: LaunchError) -> Self {
        LauncherError::Launch(Box::new(err))
    }
}
