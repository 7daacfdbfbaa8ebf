// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod clear;
mod exit;
mod help;
mod session;
pub(crate) mod status;
mod tool_approvals;

use std::sync::Arc;

use super::SlashCommand;

/// The closed built-in command set.
pub fn all() -> Vec<Arc<dyn SlashCommand>> {
    let mut commands: Vec<Arc<dyn SlashCommand>> = vec![
        Arc::new(clear::ClearCommand),
        Arc::new(exit::ExitCommand { name: "/exit" }),
        Arc::new(exit::ExitCommand { name: "/quit" }),
        Arc::new(status::StatusCommand),
        Arc::new(tool_approvals::ToolApprovalsCommand),
        Arc::new(session::SessionClearCommand),
        Arc::new(session::SessionListCommand),
        Arc::new(session::SessionRenameCommand),
    ];

    // /help renders the full table, including its own row.
    let mut entries: Vec<(&'static str, &'static str)> =
        commands.iter().map(|c| (c.name(), c.description())).collect();
    entries.push((help::NAME, help::DESCRIPTION));
    entries.sort_by(|a, b| a.0.cmp(b.0));
    commands.push(Arc::new(help::HelpCommand::new(entries)));

    commands
}
