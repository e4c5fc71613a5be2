pub mod client;
pub mod manifest;
pub mod resolver;
pub mod rules;
pub mod version_file;

pub use client::ClientInstaller;
pub use manifest::{LatestVersions, VersionManifest, VersionSummary, VersionType};
pub use resolver::{read_version_meta, ManifestResolver};
pub use rules::{OsRule, Rule, RuleAction, RuleEngine};
pub use version_file::{
    Argument, ArgumentValue, Arguments, AssetIndexRef, DownloadArtifact, JavaVersionInfo,
    LibraryArtifact, LibraryDownloads, LibraryEntry, VersionDownloads, VersionMeta,
    LEGACY_RUNTIME_COMPONENT,
};
