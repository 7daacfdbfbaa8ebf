// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `/exit` and `/quit` — request orderly shutdown of the event loop.

use mogzi_core::InfoLevel;

use crate::commands::{CommandAction, CommandContext, CommandResult, SlashCommand};

pub struct ExitCommand {
    pub name: &'static str,
}

impl SlashCommand for ExitCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "Exit the application"
    }

    fn execute(&self, _args: &str, _ctx: &CommandContext) -> CommandResult {
        CommandResult {
            message: Some(("goodbye".into(), InfoLevel::Info)),
            action: Some(CommandAction::Shutdown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;

    #[test]
    fn both_aliases_request_shutdown() {
        for name in ["/exit", "/quit"] {
            let result = ExitCommand { name }.execute("", &test_context());
            assert_eq!(result.action, Some(CommandAction::Shutdown));
        }
    }
}
