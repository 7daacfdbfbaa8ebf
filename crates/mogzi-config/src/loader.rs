// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::Config;

/// Default config file name, resolved first in the current working directory
/// and then in the user home directory.
const CONFIG_FILE_NAME: &str = "mogzi.config.json";

/// Resolve the config file path: an explicit `--config` path wins, otherwise
/// the first existing `mogzi.config.json` in CWD then home.  Returns `None`
/// when no file exists anywhere (defaults apply).
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    let cwd_candidate = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_candidate.is_file() {
        return Some(cwd_candidate);
    }
    if let Some(home) = dirs::home_dir() {
        let home_candidate = home.join(CONFIG_FILE_NAME);
        if home_candidate.is_file() {
            return Some(home_candidate);
        }
    }
    None
}

/// Load configuration.  The `extra` argument may provide an explicit path
/// (the `--config` CLI flag); an explicit path that does not exist is an
/// error, while a missing default file silently yields `Config::default()`.
pub fn load(extra: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = resolve_config_path(extra) else {
        debug!("no config file found, using defaults");
        return Ok(Config::default());
    };

    debug!(path = %path.display(), "loading config");
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: Config = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_returns_error_when_explicit_path_missing() {
        let result = load(Some(Path::new("/tmp/mogzi_nonexistent_config_xyz.json")));
        assert!(result.is_err());
    }

    #[test]
    fn load_explicit_file_overrides_defaults() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"{{"default_profile":"work","profiles":{{"work":{{"provider":"anthropic","model":"claude-opus-4-5"}}}}}}"#
        )
        .unwrap();
        let cfg = load(Some(f.path())).unwrap();
        assert_eq!(cfg.default_profile, "work");
        assert_eq!(cfg.profile(None).provider, "anthropic");
    }

    #[test]
    fn load_explicit_file_with_invalid_json_is_error() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "not json at all").unwrap();
        assert!(load(Some(f.path())).is_err());
    }

    #[test]
    fn unknown_fields_do_not_fail_the_load() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, r#"{{"tool_approvals":"all","future_knob":42}}"#).unwrap();
        let cfg = load(Some(f.path())).unwrap();
        assert_eq!(cfg.tool_approvals, crate::ToolApprovals::All);
    }
}
