// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
/// One fragment of a streamed chat response.
///
/// Produced by the [`AppService`](crate::AppService) stream and consumed in
/// producer order by the [`StreamingParser`](crate::StreamingParser), which
/// segments the fragment sequence into discrete conversation turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFragment {
    /// A text chunk streamed from the model.
    TextDelta(String),
    /// The model has begun announcing a tool call.
    ToolCallStart { call_id: String, tool_name: String },
    /// A chunk of the tool call's argument string.
    ToolCallDelta { call_id: String, arguments: String },
    /// The tool call announcement is complete.
    ToolCallEnd { call_id: String },
    /// A tool finished; `payload` is the raw result document or plain text.
    ToolResult { call_id: String, payload: String },
}

impl ResponseFragment {
    /// True for fragments that belong to the tool side of the stream.
    pub fn is_tool(&self) -> bool {
        !matches!(self, ResponseFragment::TextDelta(_))
    }
}
