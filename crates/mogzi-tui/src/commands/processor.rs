// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Command lookup and dispatch.
//!
//! Dispatch rule: the longest registered name that is a prefix of the
//! lowercased input wins, provided the character after the name is
//! whitespace or end-of-input (`/session clearing` must not match
//! `/session clear`).  The remainder, trimmed, is the argument string.

use std::sync::Arc;

use super::builtin;
use super::{CommandContext, CommandResult, SlashCommand};

pub struct SlashCommandProcessor {
    commands: Vec<Arc<dyn SlashCommand>>,
}

impl SlashCommandProcessor {
    /// Registry pre-populated with the closed built-in set.
    pub fn with_builtins() -> Self {
        Self { commands: builtin::all() }
    }

    /// Sorted `(name, description)` pairs for help and completion.
    pub fn command_table(&self) -> Vec<(&'static str, &'static str)> {
        let mut table: Vec<_> =
            self.commands.iter().map(|c| (c.name(), c.description())).collect();
        table.sort_by(|a, b| a.0.cmp(b.0));
        table
    }

    /// Look up a command by exact name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn SlashCommand>> {
        self.commands.iter().find(|c| c.name() == name)
    }

    /// Dispatch `input`.  Returns `None` when the input is not a slash
    /// command at all; unknown `/`-prefixed input yields the hint result.
    pub fn dispatch(&self, input: &str, ctx: &CommandContext) -> Option<CommandResult> {
        let input = input.trim();
        if !input.starts_with('/') {
            return None;
        }

        match self.find(input) {
            Some((cmd, args)) => Some(cmd.execute(args, ctx)),
            None => {
                let token = input.split_whitespace().next().unwrap_or(input);
                Some(CommandResult::info(format!(
                    "Unknown command: {token}. Tip: Type /help to see available commands."
                )))
            }
        }
    }

    /// The command `input` resolves to, plus its trimmed argument string.
    pub fn find<'a>(&self, input: &'a str) -> Option<(&Arc<dyn SlashCommand>, &'a str)> {
        let lower = input.to_lowercase();
        let mut best: Option<&Arc<dyn SlashCommand>> = None;
        for cmd in &self.commands {
            let name = cmd.name();
            if !lower.starts_with(name) {
                continue;
            }
            // The next character must be whitespace or end-of-input.
            match lower[name.len()..].chars().next() {
                Some(c) if !c.is_whitespace() => continue,
                _ => {}
            }
            if best.map_or(true, |b| name.len() > b.name().len()) {
                best = Some(cmd);
            }
        }
        let cmd = best?;
        Some((cmd, input[cmd.name().len()..].trim()))
    }

    /// Sorted command names whose lowercase form starts with `partial`.
    pub fn suggestions(&self, partial: &str) -> Vec<&'static str> {
        let partial = partial.to_lowercase();
        let mut names: Vec<&'static str> = self
            .commands
            .iter()
            .map(|c| c.name())
            .filter(|n| n.starts_with(&partial))
            .collect();
        names.sort_unstable();
        names
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
