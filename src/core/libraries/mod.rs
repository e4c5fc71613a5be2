pub mod installer;

pub use installer::LibraryInstaller;
