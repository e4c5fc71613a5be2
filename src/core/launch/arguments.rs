// ─── Game Arguments ───
// `${name}` placeholders in version documents are resolved through a fixed
// table. Names missing from the table are left in the token untouched.

use std::path::Path;

use crate::core::auth::Credential;
use crate::core::config::DataLayout;
use crate::core::instance::Instance;
use crate::core::version::{RuleEngine, VersionMeta};

/// Everything a placeholder can be resolved against.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub instance: &'a Instance,
    pub meta: &'a VersionMeta,
    pub credential: &'a Credential,
    pub layout: &'a DataLayout,
    pub client_id: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    AuthPlayerName,
    VersionName,
    GameDirectory,
    AssetsRoot,
    AssetsIndexName,
    AuthUuid,
    AuthAccessToken,
    ClientId,
    AuthXuid,
    UserType,
    VersionType,
    UserProperties,
    /// Pre-1.7 combined session token.
    AuthSession,
    /// Pre-1.7 name for the assets root.
    GameAssets,
}

impl Placeholder {
    pub const ALL: [Placeholder; 14] = [
        Placeholder::AuthPlayerName,
        Placeholder::VersionName,
        Placeholder::GameDirectory,
        Placeholder::AssetsRoot,
        Placeholder::AssetsIndexName,
        Placeholder::AuthUuid,
        Placeholder::AuthAccessToken,
        Placeholder::ClientId,
        Placeholder::AuthXuid,
        Placeholder::UserType,
        Placeholder::VersionType,
        Placeholder::UserProperties,
        Placeholder::AuthSession,
        Placeholder::GameAssets,
    ];

    /// Name as written between `${` and `}`.
    pub fn name(self) -> &'static str {
        match self {
            Placeholder::AuthPlayerName => "auth_player_name",
            Placeholder::VersionName => "version_name",
            Placeholder::GameDirectory => "game_directory",
            Placeholder::AssetsRoot => "assets_root",
            Placeholder::AssetsIndexName => "assets_index_name",
            Placeholder::AuthUuid => "auth_uuid",
            Placeholder::AuthAccessToken => "auth_access_token",
            Placeholder::ClientId => "clientid",
            Placeholder::AuthXuid => "auth_xuid",
            Placeholder::UserType => "user_type",
            Placeholder::VersionType => "version_type",
            Placeholder::UserProperties => "user_properties",
            Placeholder::AuthSession => "auth_session",
            Placeholder::GameAssets => "game_assets",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn resolve(self, ctx: &TemplateContext<'_>) -> String {
        match self {
            Placeholder::AuthPlayerName => ctx.credential.display_name.clone(),
            Placeholder::VersionName => ctx.meta.id.clone(),
            Placeholder::GameDirectory => safe_path_str(&ctx.instance.game_dir()),
            Placeholder::AssetsRoot | Placeholder::GameAssets => {
                safe_path_str(&ctx.layout.assets_dir())
            }
            Placeholder::AssetsIndexName => ctx.meta.asset_index.id.clone(),
            Placeholder::AuthUuid => ctx.credential.subject_id.clone(),
            Placeholder::AuthAccessToken => ctx.credential.access_token.clone(),
            Placeholder::ClientId => ctx.client_id.to_string(),
            Placeholder::AuthXuid => "0".into(),
            Placeholder::UserType => ctx.credential.user_type().into(),
            Placeholder::VersionType => ctx.meta.version_type.to_string(),
            Placeholder::UserProperties => "{}".into(),
            Placeholder::AuthSession => format!(
                "token:{}:{}",
                ctx.credential.access_token, ctx.credential.subject_id
            ),
        }
    }
}

/// Replace every known `${name}` in `token`.
pub fn substitute(token: &str, ctx: &TemplateContext<'_>) -> String {
    let mut out = String::with_capacity(token.len());
    let mut rest = token;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated, keep verbatim.
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after[..end];
        match Placeholder::from_name(name) {
            Some(placeholder) => out.push_str(&placeholder.resolve(ctx)),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Game arguments for this host, rule-gated and substituted, in document
/// order.
pub fn game_arguments(engine: &RuleEngine, ctx: &TemplateContext<'_>) -> Vec<String> {
    ctx.meta
        .game_arguments()
        .iter()
        .flat_map(|arg| arg.resolve(engine).to_vec())
        .map(|token| substitute(&token, ctx))
        .collect()
}

/// Absolute, display-ready path. Extended-length prefixes confuse Java on
/// Windows and are stripped.
pub fn safe_path_str(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::AccountMode;
    use crate::core::instance::InstanceInfo;
    use crate::core::platform::{Arch, OsFamily, PlatformInfo};

    fn meta(game: serde_json::Value) -> VersionMeta {
        serde_json::from_value(serde_json::json!({
            "id": "1.20.1",
            "type": "release",
            "mainClass": "net.minecraft.client.main.Main",
            "assetIndex": { "id": "5", "sha1": "a", "size": 1, "totalSize": 2, "url": "u" },
            "downloads": { "client": { "sha1": "c", "size": 3, "url": "u" } },
            "libraries": [],
            "arguments": { "game": game }
        }))
        .unwrap()
    }

    fn credential() -> Credential {
        Credential {
            mode: AccountMode::Offline,
            display_name: "Steve".into(),
            subject_id: "8667ba71-b85a-4004-af54-457a9734eed7".into(),
            access_token: "token-123".into(),
        }
    }

    fn with_context<R>(meta: &VersionMeta, f: impl FnOnce(&TemplateContext<'_>) -> R) -> R {
        let instance = Instance::new("survival", "/data/instances/survival", InstanceInfo::vanilla("1.20.1"));
        let credential = credential();
        let layout = DataLayout::new(Path::new("/data"));
        let ctx = TemplateContext {
            instance: &instance,
            meta,
            credential: &credential,
            layout: &layout,
            client_id: "client-id",
        };
        f(&ctx)
    }

    #[test]
    fn demo_argument_is_dropped_off_linux() {
        let meta = meta(serde_json::json!([
            "${auth_player_name}",
            { "rules": [{ "action": "allow", "os": { "name": "linux" } }], "value": "--demo" }
        ]));
        let windows = RuleEngine::new(PlatformInfo::new(OsFamily::Windows, Arch::X86_64));
        let linux = RuleEngine::new(PlatformInfo::new(OsFamily::Linux, Arch::X86_64));

        with_context(&meta, |ctx| {
            assert_eq!(game_arguments(&windows, ctx), ["Steve"]);
            assert_eq!(game_arguments(&linux, ctx), ["Steve", "--demo"]);
        });
    }

    #[test]
    fn feature_gated_arguments_never_apply() {
        let meta = meta(serde_json::json!([
            "--username",
            "${auth_player_name}",
            {
                "rules": [{ "action": "allow", "features": { "has_custom_resolution": true } }],
                "value": ["--width", "${resolution_width}"]
            }
        ]));
        let engine = RuleEngine::new(PlatformInfo::new(OsFamily::Linux, Arch::X86_64));

        with_context(&meta, |ctx| {
            assert_eq!(game_arguments(&engine, ctx), ["--username", "Steve"]);
        });
    }

    #[test]
    fn known_placeholders_resolve_and_unknown_pass_through() {
        let meta = meta(serde_json::json!([]));
        with_context(&meta, |ctx| {
            assert_eq!(substitute("${version_name}", ctx), "1.20.1");
            assert_eq!(substitute("${assets_index_name}", ctx), "5");
            assert_eq!(substitute("${clientid}/${auth_xuid}", ctx), "client-id/0");
            assert_eq!(substitute("${user_type}:${version_type}", ctx), "legacy:release");
            assert_eq!(substitute("${user_properties}", ctx), "{}");
            assert_eq!(substitute("${auth_access_token}", ctx), "token-123");
            assert_eq!(substitute("--x=${launcher_name}", ctx), "--x=${launcher_name}");
            assert_eq!(substitute("broken ${auth_uuid", ctx), "broken ${auth_uuid");
        });
    }

    #[test]
    fn legacy_argument_string_resolves() {
        let mut meta = meta(serde_json::json!([]));
        meta.arguments = None;
        meta.minecraft_arguments = Some(
            "--username ${auth_player_name} --session ${auth_session} --assetsDir ${game_assets}"
                .into(),
        );
        let engine = RuleEngine::new(PlatformInfo::new(OsFamily::Linux, Arch::X86_64));

        with_context(&meta, |ctx| {
            assert_eq!(
                game_arguments(&engine, ctx),
                [
                    "--username",
                    "Steve",
                    "--session",
                    "token:token-123:8667ba71-b85a-4004-af54-457a9734eed7",
                    "--assetsDir",
                    "/data/assets",
                ]
            );
        });
    }

    #[test]
    fn placeholder_names_round_trip() {
        for placeholder in Placeholder::ALL {
            assert_eq!(Placeholder::from_name(placeholder.name()), Some(placeholder));
        }
        assert_eq!(Placeholder::from_name("natives_directory"), None);
    }
}
