// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `/session clear`, `/session list`, `/session rename` — durable session
//! operations.  The commands themselves are pure; the app applies the
//! returned action against the session store.

use crate::commands::{CommandAction, CommandContext, CommandResult, SlashCommand};

pub struct SessionClearCommand;

impl SlashCommand for SessionClearCommand {
    fn name(&self) -> &'static str {
        "/session clear"
    }

    fn description(&self) -> &'static str {
        "Clear the current session history"
    }

    fn execute(&self, _args: &str, _ctx: &CommandContext) -> CommandResult {
        CommandResult::action(CommandAction::ClearSession)
    }
}

pub struct SessionListCommand;

impl SlashCommand for SessionListCommand {
    fn name(&self) -> &'static str {
        "/session list"
    }

    fn description(&self) -> &'static str {
        "Pick a recent session to load"
    }

    fn is_interactive(&self) -> bool {
        true
    }

    fn execute(&self, _args: &str, _ctx: &CommandContext) -> CommandResult {
        CommandResult::action(CommandAction::EnterSelection("/session list"))
    }
}

pub struct SessionRenameCommand;

impl SlashCommand for SessionRenameCommand {
    fn name(&self) -> &'static str {
        "/session rename"
    }

    fn description(&self) -> &'static str {
        "Rename the current session"
    }

    fn execute(&self, args: &str, _ctx: &CommandContext) -> CommandResult {
        let name = args.trim();
        if name.is_empty() {
            return CommandResult::error("usage: /session rename <name>");
        }
        CommandResult::action(CommandAction::RenameSession(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;

    #[test]
    fn session_clear_returns_clear_session_action() {
        let result = SessionClearCommand.execute("", &test_context());
        assert_eq!(result.action, Some(CommandAction::ClearSession));
    }

    #[test]
    fn session_list_is_interactive() {
        assert!(SessionListCommand.is_interactive());
        let result = SessionListCommand.execute("", &test_context());
        assert_eq!(result.action, Some(CommandAction::EnterSelection("/session list")));
    }

    #[test]
    fn rename_with_empty_argument_is_an_error() {
        let result = SessionRenameCommand.execute("   ", &test_context());
        let (msg, level) = result.message.unwrap();
        assert!(msg.starts_with("usage:"));
        assert_eq!(level, mogzi_core::InfoLevel::Error);
        assert!(result.action.is_none());
    }

    #[test]
    fn rename_carries_the_trimmed_name() {
        let result = SessionRenameCommand.execute("  my project  ", &test_context());
        assert_eq!(result.action, Some(CommandAction::RenameSession("my project".into())));
    }
}
