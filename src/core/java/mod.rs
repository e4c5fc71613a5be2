pub mod runtime;

pub use runtime::{
    InstallMarker, ResolvedRuntime, RuntimeEntry, RuntimeIndex, RuntimeInstallation,
    RuntimeInstaller, RuntimeManifest, RuntimeRequest,
};
