// ─── Ice Launcher Core ───
// Install-and-launch pipeline for Minecraft versions.
//
// Architecture:
//   core/
//     version/     Mojang manifest, version documents, OS rules, client jar
//     downloader/  Hash-verified artifact store + bounded fetch pool
//     assets/      Asset index + content-addressed objects
//     libraries/   Rule-filtered library jars, shared classpath order
//     java/        Mojang-managed runtimes (index, manifest, marker)
//     install/     Coordinator fanning every section onto one pool
//     launch/      Argument templating, JVM flags, process spawn
//     instance/    Instance metadata on disk
//     auth/        Credential collaborators

pub mod assets;
pub mod auth;
pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod instance;
pub mod java;
pub mod launch;
pub mod libraries;
pub mod platform;
pub mod progress;
pub mod version;

#[cfg(test)]
pub(crate) mod test_support;
