// ─── Version File ───
// Parses a per-version Mojang JSON document into the sections the installers
// and the launch composer consume.

use serde::Deserialize;

use super::manifest::VersionType;
use super::rules::{Rule, RuleEngine};

/// Runtime component used when a version document predates `javaVersion`.
pub const LEGACY_RUNTIME_COMPONENT: &str = "jre-legacy";

/// A fully parsed Mojang version JSON. Never mutated after parse.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMeta {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: VersionType,
    pub main_class: String,
    pub asset_index: AssetIndexRef,
    pub downloads: VersionDownloads,
    #[serde(default)]
    pub java_version: Option<JavaVersionInfo>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    #[serde(default)]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersionInfo {
    pub component: String,
    pub major_version: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionDownloads {
    pub client: DownloadArtifact,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    pub id: String,
    pub sha1: String,
    /// Size of the index document itself.
    pub size: u64,
    /// Sum of every object the index lists.
    pub total_size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<Argument>,
}

/// A literal token or a rule-gated group of tokens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Plain(String),
    Conditional {
        rules: Vec<Rule>,
        value: ArgumentValue,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Single(String),
    Many(Vec<String>),
}

impl ArgumentValue {
    pub fn tokens(&self) -> &[String] {
        match self {
            ArgumentValue::Single(token) => std::slice::from_ref(token),
            ArgumentValue::Many(tokens) => tokens,
        }
    }
}

impl Argument {
    /// Tokens this argument contributes on the engine's platform.
    pub fn resolve<'a>(&'a self, engine: &RuleEngine) -> &'a [String] {
        match self {
            Argument::Plain(token) => std::slice::from_ref(token),
            Argument::Conditional { rules, value } if engine.is_allowed(rules) => value.tokens(),
            Argument::Conditional { .. } => &[],
        }
    }
}

// ─── Library Entry ───

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Option<Vec<Rule>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibraryArtifact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibraryArtifact {
    /// Path relative to the libraries directory.
    pub path: String,
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

impl LibraryEntry {
    /// The downloadable jar, if the entry declares one. Entries without an
    /// artifact (old classifier-only natives) are ignored.
    pub fn artifact(&self) -> Option<&LibraryArtifact> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    pub fn rules(&self) -> &[Rule] {
        self.rules.as_deref().unwrap_or_default()
    }
}

impl VersionMeta {
    /// Managed runtime component this version expects.
    pub fn java_component(&self) -> &str {
        self.java_version
            .as_ref()
            .map(|j| j.component.as_str())
            .unwrap_or(LEGACY_RUNTIME_COMPONENT)
    }

    pub fn client_artifact(&self) -> &DownloadArtifact {
        &self.downloads.client
    }

    /// Game arguments as declared. Legacy documents are split on whitespace.
    pub fn game_arguments(&self) -> Vec<Argument> {
        match (&self.arguments, &self.minecraft_arguments) {
            (Some(args), _) => args.game.clone(),
            (None, Some(legacy)) => legacy
                .split_whitespace()
                .map(|token| Argument::Plain(token.to_string()))
                .collect(),
            (None, None) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::{Arch, OsFamily, PlatformInfo};

    fn document(extra: serde_json::Value) -> serde_json::Value {
        let mut base = serde_json::json!({
            "id": "1.20.1",
            "type": "release",
            "mainClass": "net.minecraft.client.main.Main",
            "assetIndex": {
                "id": "5",
                "sha1": "idx",
                "size": 100,
                "totalSize": 2000,
                "url": "https://example.com/5.json"
            },
            "downloads": {
                "client": { "sha1": "H", "size": 5000, "url": "https://example.com/client.jar" }
            }
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        base
    }

    #[test]
    fn parses_modern_document() {
        let meta: VersionMeta = serde_json::from_value(document(serde_json::json!({
            "javaVersion": { "component": "java-runtime-gamma", "majorVersion": 17 },
            "libraries": [
                {
                    "name": "com.mojang:brigadier:1.1.8",
                    "downloads": {
                        "artifact": {
                            "path": "com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar",
                            "sha1": "abc",
                            "size": 77,
                            "url": "https://libraries.minecraft.net/com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar"
                        }
                    }
                },
                { "name": "old:natives-only:1.0", "downloads": { "classifiers": {} } }
            ],
            "arguments": {
                "game": [
                    "--username",
                    "${auth_player_name}",
                    {
                        "rules": [{ "action": "allow", "features": { "is_demo_user": true } }],
                        "value": "--demo"
                    }
                ]
            }
        })))
        .unwrap();

        assert_eq!(meta.java_component(), "java-runtime-gamma");
        assert_eq!(meta.client_artifact().size, 5000);
        assert_eq!(meta.asset_index.total_size, 2000);
        assert!(meta.libraries[0].artifact().is_some());
        assert!(meta.libraries[1].artifact().is_none());
        assert_eq!(meta.game_arguments().len(), 3);
    }

    #[test]
    fn legacy_arguments_are_split_on_whitespace() {
        let meta: VersionMeta = serde_json::from_value(document(serde_json::json!({
            "minecraftArguments": "--username ${auth_player_name}  --version ${version_name}"
        })))
        .unwrap();

        assert_eq!(meta.java_component(), LEGACY_RUNTIME_COMPONENT);
        let tokens: Vec<_> = meta
            .game_arguments()
            .into_iter()
            .map(|arg| match arg {
                Argument::Plain(token) => token,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            tokens,
            ["--username", "${auth_player_name}", "--version", "${version_name}"]
        );
    }

    #[test]
    fn conditional_arguments_follow_rules() {
        let args: Vec<Argument> = serde_json::from_value(serde_json::json!([
            "--plain",
            { "rules": [{ "action": "allow", "os": { "name": "osx" } }], "value": ["-a", "-b"] }
        ]))
        .unwrap();

        let mac = RuleEngine::new(PlatformInfo::new(OsFamily::Osx, Arch::Aarch64));
        let linux = RuleEngine::new(PlatformInfo::new(OsFamily::Linux, Arch::X86_64));

        assert_eq!(args[1].resolve(&mac), ["-a", "-b"]);
        assert!(args[1].resolve(&linux).is_empty());
        assert_eq!(args[0].resolve(&linux), ["--plain"]);
    }
}
