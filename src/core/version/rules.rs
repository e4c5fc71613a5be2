// ─── Rule Engine ───
// Decides whether a rule-gated library or argument applies to this host.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::core::error::RuleEvaluationUnsupported;
use crate::core::platform::{Arch, OsFamily, PlatformInfo};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
    #[serde(default)]
    pub features: Option<BTreeMap<String, bool>>,
}

impl Rule {
    /// `allow` gated on one OS name.
    pub fn allow_os(name: &str) -> Self {
        Self {
            action: RuleAction::Allow,
            os: Some(OsRule {
                name: Some(name.to_string()),
                ..OsRule::default()
            }),
            features: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuleEngine {
    platform: PlatformInfo,
}

impl RuleEngine {
    pub fn new(platform: PlatformInfo) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &PlatformInfo {
        &self.platform
    }

    /// First sufficient allow wins.
    ///
    /// - empty list: allowed
    /// - otherwise default-deny, rules read in order
    /// - a `features` predicate ends evaluation as unsupported
    /// - `allow` whose `os.name` is this host's ends evaluation as allowed
    pub fn evaluate(&self, rules: &[Rule]) -> Result<bool, RuleEvaluationUnsupported> {
        if rules.is_empty() {
            return Ok(true);
        }

        let current = self.platform.os.rule_name();
        for rule in rules {
            if let Some(features) = &rule.features {
                let feature = features.keys().next().cloned().unwrap_or_default();
                return Err(RuleEvaluationUnsupported { feature });
            }

            let os_matches = rule
                .os
                .as_ref()
                .and_then(|os| os.name.as_deref())
                .is_some_and(|name| name == current);

            if rule.action == RuleAction::Allow && os_matches {
                return Ok(true);
            }
        }

        Ok(false)
    }

    pub fn is_allowed(&self, rules: &[Rule]) -> bool {
        match self.evaluate(rules) {
            Ok(allowed) => allowed,
            Err(unsupported) => {
                debug!("{}; treating rule list as unmet", unsupported);
                false
            }
        }
    }

    /// Classifier of the native artifacts built for this host, e.g.
    /// `natives-macos-arm64`. `None` when Mojang ships no natives for it.
    pub fn natives_classifier(&self) -> Option<&'static str> {
        match (self.platform.os, self.platform.arch) {
            (OsFamily::Linux, _) => Some("natives-linux"),
            (OsFamily::Osx, Arch::X86_64) => Some("natives-macos"),
            (OsFamily::Osx, Arch::Aarch64) => Some("natives-macos-arm64"),
            (OsFamily::Windows, Arch::X86_64) => Some("natives-windows"),
            (OsFamily::Windows, Arch::X86) => Some("natives-windows-x86"),
            (OsFamily::Windows, Arch::Aarch64) => Some("natives-windows-arm64"),
            _ => None,
        }
    }
}
