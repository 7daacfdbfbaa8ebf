// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `/help` — render the command table.

use crate::commands::{CommandContext, CommandResult, SlashCommand};

pub const NAME: &str = "/help";
pub const DESCRIPTION: &str = "Show available commands";

pub struct HelpCommand {
    /// `(name, description)` rows, pre-sorted by name.
    entries: Vec<(&'static str, &'static str)>,
}

impl HelpCommand {
    pub fn new(entries: Vec<(&'static str, &'static str)>) -> Self {
        Self { entries }
    }
}

impl SlashCommand for HelpCommand {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    fn execute(&self, _args: &str, _ctx: &CommandContext) -> CommandResult {
        let name_width = self.entries.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        let mut table = String::from("Available commands:\n");
        for (name, description) in &self.entries {
            table.push_str(&format!("  {name:<name_width$}  {description}\n"));
        }
        CommandResult::info(table.trim_end().to_string())
    }
}
