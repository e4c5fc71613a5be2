use async_trait::async_trait;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::LauncherResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountMode {
    Offline,
    Microsoft,
}

impl AccountMode {
    /// Value substituted for `${user_type}`.
    pub fn user_type(self) -> &'static str {
        match self {
            AccountMode::Offline => "legacy",
            AccountMode::Microsoft => "msa",
        }
    }
}

/// What the launch composer needs from an authenticated account.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub mode: AccountMode,
    pub display_name: String,
    /// Dashed profile UUID.
    pub subject_id: String,
    pub access_token: String,
}

// The token never reaches logs through `{:?}`.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("mode", &self.mode)
            .field("display_name", &self.display_name)
            .field("subject_id", &self.subject_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl Credential {
    pub fn user_type(&self) -> &'static str {
        self.mode.user_type()
    }
}

/// Credential collaborator. `refresh` is called once per launch and may hit
/// the network for online accounts.
#[async_trait]
pub trait Account: Send + Sync {
    async fn refresh(&self) -> LauncherResult<Credential>;
}

/// No authentication. The profile UUID is derived from the name the same
/// way vanilla servers in offline mode derive it.
#[derive(Debug, Clone)]
pub struct OfflineAccount {
    username: String,
}

impl OfflineAccount {
    pub fn new(username: &str) -> Self {
        let username = username.trim();
        Self {
            username: if username.is_empty() {
                "Player".into()
            } else {
                username.to_string()
            },
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Name-based (version 3) UUID of `OfflinePlayer:<name>`.
pub fn offline_uuid(username: &str) -> Uuid {
    let digest = Md5::digest(format!("OfflinePlayer:{}", username).as_bytes());
    let mut bytes = [0_u8; 16];
    bytes.copy_from_slice(&digest);
    uuid::Builder::from_md5_bytes(bytes).into_uuid()
}

#[async_trait]
impl Account for OfflineAccount {
    async fn refresh(&self) -> LauncherResult<Credential> {
        Ok(Credential {
            mode: AccountMode::Offline,
            display_name: self.username.clone(),
            subject_id: offline_uuid(&self.username).hyphenated().to_string(),
            access_token: "offline_access_token".into(),
        })
    }
}

/// Tokens obtained elsewhere (e.g. an external Microsoft sign-in). Returned
/// as-is on every refresh.
#[derive(Debug, Clone)]
pub struct StaticAccount {
    credential: Credential,
}

impl StaticAccount {
    pub fn new(display_name: &str, subject_id: &str, access_token: &str) -> Self {
        Self {
            credential: Credential {
                mode: AccountMode::Microsoft,
                display_name: display_name.trim().to_string(),
                subject_id: subject_id.trim().to_string(),
                access_token: access_token.trim().to_string(),
            },
        }
    }
}

#[async_trait]
impl Account for StaticAccount {
    async fn refresh(&self) -> LauncherResult<Credential> {
        Ok(self.credential.clone())
    }
}
