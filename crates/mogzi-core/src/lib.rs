// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod diff;
mod fragment;
mod history;
mod service;
mod stream;
mod tool_response;
mod turn;

pub use diff::{DiffHunk, DiffLine, DiffLineKind, UnifiedDiff};
pub use fragment::ResponseFragment;
pub use history::HistoryManager;
pub use service::{AppService, ChatRequest, FragmentStream, ScriptedService};
pub use stream::StreamingParser;
pub use tool_response::{parse_tool_response, ToolResponseInfo, ToolStatus};
pub use turn::{
    Attachment, ConversationTurn, InfoLevel, SerializableTurn, StoredAttachment, TurnPayload,
};
