// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Non-interactive mode: send one prompt, stream the response to stdout.
//!
//! Output is plain text so it pipes cleanly into other tools; tool activity
//! renders as single prefixed lines.

use std::sync::Arc;

use futures::StreamExt;
use mogzi_config::Profile;
use mogzi_core::{AppService, ChatRequest, StreamingParser, ToolStatus, TurnPayload};

pub async fn run(
    service: Arc<dyn AppService>,
    profile: Profile,
    prompt: String,
) -> anyhow::Result<()> {
    let request = ChatRequest { prompt, history: Vec::new(), profile };
    let mut fragments = service.stream_chat(request).await?;
    let mut parser = StreamingParser::new();

    let mut turns = Vec::new();
    while let Some(fragment) = fragments.next().await {
        turns.extend(parser.push(fragment));
        print_turns(std::mem::take(&mut turns));
    }
    print_turns(parser.finish());
    Ok(())
}

fn print_turns(turns: Vec<TurnPayload>) {
    for turn in turns {
        match turn {
            TurnPayload::AssistantText { text } => println!("{text}"),
            TurnPayload::AssistantToolCall { tool_name, .. } => {
                eprintln!("[tool] {tool_name}");
            }
            TurnPayload::ToolResult { info, .. } => {
                let marker = match info.status {
                    ToolStatus::Success => "ok",
                    ToolStatus::Failed => "failed",
                };
                eprintln!("[tool {marker}] {}", info.description);
            }
            TurnPayload::UserText { .. } | TurnPayload::Info { .. } => {}
        }
    }
}
