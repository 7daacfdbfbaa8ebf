// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Command-line surface.
//!
//! Flags follow the product contract rather than pure POSIX: `-ta` and `-v`
//! are accepted as written, so the raw args are normalized before clap sees
//! them.  Argument errors exit 1; `-h`/`--help` exits 0.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(
    name = "mogzi",
    about = "A terminal chat frontend for an AI coding assistant",
    disable_version_flag = true
)]
pub struct Cli {
    /// Force interactive chat mode.
    #[arg(long)]
    pub chat: bool,

    /// Print version and exit.
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Configuration file path (default: mogzi.config.json in CWD, then home).
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Named profile to use (default from config).
    #[arg(short = 'p', long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Print the active configuration table and exit.
    #[arg(short = 's', long)]
    pub status: bool,

    /// Tool approval mode override: readonly | all  (also: -ta).
    #[arg(long = "tool-approvals", value_name = "MODE")]
    pub tool_approvals: Option<String>,

    /// Load an existing session by id; otherwise a new session is created.
    #[arg(long, value_name = "ID")]
    pub session: Option<String>,

    /// Free-form prompt; concatenated with piped stdin in non-interactive mode.
    #[arg(value_name = "PROMPT")]
    pub prompt: Vec<String>,
}

/// Map the two-letter short flag onto its long form.
fn normalize_args(args: impl Iterator<Item = String>) -> Vec<String> {
    args.map(|a| if a == "-ta" { "--tool-approvals".to_string() } else { a })
        .collect()
}

/// Parse `std::env::args`, exiting 0 for help and 1 for argument errors.
pub fn parse() -> Cli {
    match Cli::try_parse_from(normalize_args(std::env::args())) {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                std::process::exit(0);
            }
            _ => {
                let _ = e.print();
                std::process::exit(1);
            }
        },
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("mogzi".to_string())
            .chain(list.iter().map(|s| s.to_string()))
            .collect()
    }

    #[test]
    fn short_ta_flag_is_normalized() {
        let cli = Cli::try_parse_from(normalize_args(args(&["-ta", "all"]).into_iter())).unwrap();
        assert_eq!(cli.tool_approvals.as_deref(), Some("all"));
    }

    #[test]
    fn long_tool_approvals_flag_parses() {
        let cli = Cli::try_parse_from(args(&["--tool-approvals", "readonly"])).unwrap();
        assert_eq!(cli.tool_approvals.as_deref(), Some("readonly"));
    }

    #[test]
    fn positional_prompt_collects_all_words() {
        let cli = Cli::try_parse_from(args(&["fix", "the", "build"])).unwrap();
        assert_eq!(cli.prompt, vec!["fix", "the", "build"]);
        assert!(!cli.chat);
    }

    #[test]
    fn version_flag_uses_lowercase_v() {
        let cli = Cli::try_parse_from(args(&["-v"])).unwrap();
        assert!(cli.version);
    }

    #[test]
    fn chat_and_session_flags_parse_together() {
        let cli = Cli::try_parse_from(args(&[
            "--chat",
            "--session",
            "01929ad0-7d77-7d77-8d77-0123456789ab",
        ]))
        .unwrap();
        assert!(cli.chat);
        assert!(cli.session.is_some());
    }

    #[test]
    fn unknown_flag_is_a_parse_error() {
        assert!(Cli::try_parse_from(args(&["--frobnicate"])).is_err());
    }
}
