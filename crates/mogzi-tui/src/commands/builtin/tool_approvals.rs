// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `/tool-approvals` — interactive: pick the tool approval mode.

use crate::commands::{CommandAction, CommandContext, CommandResult, SlashCommand};

pub struct ToolApprovalsCommand;

impl SlashCommand for ToolApprovalsCommand {
    fn name(&self) -> &'static str {
        "/tool-approvals"
    }

    fn description(&self) -> &'static str {
        "Choose the tool approval mode"
    }

    fn is_interactive(&self) -> bool {
        true
    }

    fn execute(&self, _args: &str, _ctx: &CommandContext) -> CommandResult {
        CommandResult::action(CommandAction::EnterSelection("/tool-approvals"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;

    #[test]
    fn command_is_interactive_and_enters_selection() {
        assert!(ToolApprovalsCommand.is_interactive());
        let result = ToolApprovalsCommand.execute("", &test_context());
        assert_eq!(result.action, Some(CommandAction::EnterSelection("/tool-approvals")));
        assert!(result.message.is_none());
    }
}
