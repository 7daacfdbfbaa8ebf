// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

fn default_profile_name() -> String {
    "default".into()
}

fn default_session_list_limit() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Profile selected when `--profile` is not given on the CLI.
    #[serde(default = "default_profile_name")]
    pub default_profile: String,
    /// Named profiles.  Reference them with `--profile <name>`.
    ///
    /// ```json
    /// {
    ///   "profiles": {
    ///     "default": { "provider": "openai", "model": "gpt-4o" },
    ///     "work":    { "provider": "anthropic", "model": "claude-opus-4-5",
    ///                  "api_key_env": "WORK_ANTHROPIC_KEY" }
    ///   }
    /// }
    /// ```
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
    /// Which tool invocations run without per-call confirmation.
    #[serde(default)]
    pub tool_approvals: ToolApprovals,
    /// How many sessions `/session list` offers for selection.
    #[serde(default = "default_session_list_limit")]
    pub session_list_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(default_profile_name(), Profile::default());
        Self {
            default_profile: default_profile_name(),
            profiles,
            tool_approvals: ToolApprovals::default(),
            session_list_limit: default_session_list_limit(),
        }
    }
}

impl Config {
    /// Resolve a profile by name, falling back to `default_profile` and then
    /// to a built-in default when the named profile does not exist.
    pub fn profile(&self, name: Option<&str>) -> Profile {
        let key = name.unwrap_or(&self.default_profile);
        self.profiles.get(key).cloned().unwrap_or_default()
    }

    /// Name of the profile that `profile(name)` resolves to.
    pub fn profile_name(&self, name: Option<&str>) -> String {
        name.unwrap_or(&self.default_profile).to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Provider identifier forwarded to the chat service ("openai",
    /// "anthropic", "scripted", ...).
    pub provider: String,
    /// Model name forwarded to the chat service.
    pub model: String,
    /// Environment variable that holds the API key (read at runtime by the
    /// chat service; never stored in config files).
    pub api_key_env: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        // The scripted provider is the only one bundled with this build;
        // real backends are configured through profiles.
        Self {
            provider: "scripted".into(),
            model: "echo".into(),
            api_key_env: None,
        }
    }
}

/// Which tool invocations the assistant may run without per-call confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolApprovals {
    /// Only read-only tools run unattended.
    #[default]
    Readonly,
    /// All tools run unattended.
    All,
}

impl FromStr for ToolApprovals {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "readonly" => Ok(ToolApprovals::Readonly),
            "all" => Ok(ToolApprovals::All),
            other => anyhow::bail!("invalid tool-approval mode '{other}' (expected readonly|all)"),
        }
    }
}

impl std::fmt::Display for ToolApprovals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolApprovals::Readonly => write!(f, "readonly"),
            ToolApprovals::All => write!(f, "all"),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_default_profile() {
        let cfg = Config::default();
        assert!(cfg.profiles.contains_key("default"));
        assert_eq!(cfg.default_profile, "default");
    }

    #[test]
    fn profile_lookup_falls_back_to_default() {
        let cfg = Config::default();
        let p = cfg.profile(Some("nonexistent"));
        assert_eq!(p.provider, "scripted");
    }

    #[test]
    fn profile_lookup_uses_named_profile() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "work".into(),
            Profile { provider: "anthropic".into(), model: "claude-opus-4-5".into(), api_key_env: None },
        );
        assert_eq!(cfg.profile(Some("work")).provider, "anthropic");
    }

    #[test]
    fn tool_approvals_parses_known_values() {
        assert_eq!("readonly".parse::<ToolApprovals>().unwrap(), ToolApprovals::Readonly);
        assert_eq!("all".parse::<ToolApprovals>().unwrap(), ToolApprovals::All);
    }

    #[test]
    fn tool_approvals_rejects_unknown_value() {
        assert!("everything".parse::<ToolApprovals>().is_err());
        assert!("READONLY".parse::<ToolApprovals>().is_err());
    }

    #[test]
    fn tool_approvals_display_round_trips() {
        for mode in [ToolApprovals::Readonly, ToolApprovals::All] {
            assert_eq!(mode.to_string().parse::<ToolApprovals>().unwrap(), mode);
        }
    }
}
