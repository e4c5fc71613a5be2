pub mod coordinator;
pub mod installer;

pub use coordinator::InstallCoordinator;
pub use installer::SectionInstaller;
