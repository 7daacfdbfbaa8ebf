// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `/status` — snapshot of the active configuration.

use crate::commands::{CommandContext, CommandResult, SlashCommand};

pub struct StatusCommand;

impl SlashCommand for StatusCommand {
    fn name(&self) -> &'static str {
        "/status"
    }

    fn description(&self) -> &'static str {
        "Show the active configuration"
    }

    fn execute(&self, _args: &str, ctx: &CommandContext) -> CommandResult {
        CommandResult::info(format_status(ctx))
    }
}

/// Shared with the `--status` CLI flag.
pub fn format_status(ctx: &CommandContext) -> String {
    let rows = [
        ("profile", ctx.profile_name.clone()),
        ("model", format!("{}/{}", ctx.provider, ctx.model)),
        ("tool approvals", ctx.tool_approvals.to_string()),
        ("session", ctx.session_name.clone()),
        ("working dir", ctx.working_dir.clone()),
        ("version", ctx.version.clone()),
        ("platform", ctx.platform.clone()),
    ];
    rows.iter()
        .map(|(label, value)| format!("  {label:<15} {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
