// ─── Platform ───
// Host OS / architecture, computed once and threaded explicitly into the
// rule engine, the runtime installer and the launch composer.

use std::fmt;

/// OS families as named by Mojang manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Windows,
    Linux,
    Osx,
}

impl OsFamily {
    /// Mojang rule name (`windows`, `linux`, `osx`).
    pub fn rule_name(self) -> &'static str {
        match self {
            OsFamily::Windows => "windows",
            OsFamily::Linux => "linux",
            OsFamily::Osx => "osx",
        }
    }

    /// Platform classpath separator.
    pub fn classpath_separator(self) -> &'static str {
        match self {
            OsFamily::Windows => ";",
            _ => ":",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rule_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    X86,
    Aarch64,
    Other,
}

impl Arch {
    pub fn is_32_bit(self) -> bool {
        matches!(self, Arch::X86)
    }
}

/// Immutable description of the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub os: OsFamily,
    pub arch: Arch,
    /// Kernel / product version as reported by the OS, when known.
    pub os_version: Option<String>,
}

impl PlatformInfo {
    pub fn new(os: OsFamily, arch: Arch) -> Self {
        Self {
            os,
            arch,
            os_version: None,
        }
    }

    pub fn with_os_version(mut self, version: impl Into<String>) -> Self {
        self.os_version = Some(version.into());
        self
    }

    /// Probe the running host. Call once at startup.
    pub fn detect() -> Self {
        let os = match std::env::consts::OS {
            "windows" => OsFamily::Windows,
            "macos" => OsFamily::Osx,
            _ => OsFamily::Linux,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => Arch::X86_64,
            "x86" => Arch::X86,
            "aarch64" => Arch::Aarch64,
            _ => Arch::Other,
        };

        Self {
            os,
            arch,
            os_version: sysinfo::System::os_version(),
        }
    }

    /// True on Windows 10 (and later builds that still report a `10` major).
    pub fn is_windows_10(&self) -> bool {
        self.os == OsFamily::Windows
            && self
                .os_version
                .as_deref()
                .is_some_and(|version| version.trim_start().starts_with("10"))
    }

    /// Key of this platform in Mojang's java-runtime index.
    pub fn runtime_platform_key(&self) -> Option<&'static str> {
        match (self.os, self.arch) {
            (OsFamily::Linux, Arch::X86_64) => Some("linux"),
            (OsFamily::Linux, Arch::X86) => Some("linux-i386"),
            (OsFamily::Osx, Arch::X86_64) => Some("mac-os"),
            (OsFamily::Osx, Arch::Aarch64) => Some("mac-os-arm64"),
            (OsFamily::Windows, Arch::X86_64) => Some("windows-x64"),
            (OsFamily::Windows, Arch::X86) => Some("windows-x86"),
            (OsFamily::Windows, Arch::Aarch64) => Some("windows-arm64"),
            _ => None,
        }
    }
}

impl fmt::Display for PlatformInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:?}", self.os, self.arch)
    }
}
