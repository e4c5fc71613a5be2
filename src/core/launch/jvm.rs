use crate::core::config::{LauncherConfig, LAUNCHER_NAME, LAUNCHER_VERSION};
use crate::core::platform::{OsFamily, PlatformInfo};

/// G1 tuning appended when `optimize_jvm` is set.
pub const G1_FLAGS: &[&str] = &[
    "-XX:+UnlockExperimentalVMOptions",
    "-XX:+UseG1GC",
    "-XX:G1NewSizePercent=20",
    "-XX:G1ReservePercent=20",
    "-XX:MaxGCPauseMillis=50",
    "-XX:G1HeapRegionSize=32M",
];

const WINDOWS_HEAP_DUMP: &str =
    "-XX:HeapDumpPath=MojangTricksIntelDriversForPerformance_javaw.exe_minecraft.exe.heapdump";

/// Host-specific flags. LWJGL needs the first thread on macOS.
pub fn platform_flags(platform: &PlatformInfo) -> Vec<String> {
    let mut flags = Vec::new();

    match platform.os {
        OsFamily::Osx => flags.push("-XstartOnFirstThread".to_string()),
        OsFamily::Windows => {
            flags.push(WINDOWS_HEAP_DUMP.to_string());
            if platform.is_windows_10() {
                flags.push("-Dos.name=Windows 10".to_string());
                flags.push("-Dos.version=10.0".to_string());
            }
        }
        OsFamily::Linux => {}
    }

    if platform.arch.is_32_bit() {
        flags.push("-Xss1M".to_string());
    }

    flags
}

/// Full JVM side of the command line, ending with `-cp <classpath>`.
pub fn jvm_arguments(platform: &PlatformInfo, config: &LauncherConfig, classpath: &str) -> Vec<String> {
    let mut args = platform_flags(platform);

    args.push(format!("-Dminecraft.launcher.brand={}", LAUNCHER_NAME));
    args.push(format!("-Dminecraft.launcher.version={}", LAUNCHER_VERSION));
    args.push(format!("-Xmx{}", config.jvm_memory));
    args.extend(
        config
            .jvm_options
            .iter()
            .filter(|opt| !opt.trim().is_empty())
            .cloned(),
    );

    if config.optimize_jvm {
        args.extend(G1_FLAGS.iter().map(|flag| flag.to_string()));
    }

    args.push("-cp".into());
    args.push(classpath.into());
    args
}
