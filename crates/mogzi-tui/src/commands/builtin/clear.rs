// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `/clear` — erase the in-memory chat history.  The on-disk session is
//! untouched; that is `/session clear`.

use crate::commands::{CommandAction, CommandContext, CommandResult, SlashCommand};

pub struct ClearCommand;

impl SlashCommand for ClearCommand {
    fn name(&self) -> &'static str {
        "/clear"
    }

    fn description(&self) -> &'static str {
        "Clear the chat history"
    }

    fn execute(&self, _args: &str, _ctx: &CommandContext) -> CommandResult {
        CommandResult::action(CommandAction::ClearHistory)
    }
}
