// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Message boundary detection over streamed response fragments.
//!
//! The model interleaves text deltas, tool-call announcements, and tool
//! results in one stream.  This parser segments that stream into discrete
//! conversation turns: a kind change (text → tool or tool → text) flushes the
//! pending turn, tool results pair with their call in id order, and
//! whitespace-only text never becomes a turn of its own.

use std::collections::HashMap;

use crate::fragment::ResponseFragment;
use crate::tool_response::parse_tool_response;
use crate::turn::TurnPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    None,
    Text,
    Tool,
}

#[derive(Debug)]
struct PendingCall {
    call_id: String,
    tool_name: String,
    arguments: String,
    emitted: bool,
}

/// Converts a fragment sequence into complete [`TurnPayload`]s.
///
/// `push` returns the turns completed by that fragment (usually none);
/// `finish` flushes whatever remains at end of stream.
pub struct StreamingParser {
    kind: PendingKind,
    text: String,
    /// Calls of the current tool group, in arrival order.
    calls: Vec<PendingCall>,
    /// `call_id → tool_name` for every call seen this stream, kept across
    /// group flushes so late results still resolve their tool name.
    known_names: HashMap<String, String>,
}

impl Default for StreamingParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingParser {
    pub fn new() -> Self {
        Self {
            kind: PendingKind::None,
            text: String::new(),
            calls: Vec::new(),
            known_names: HashMap::new(),
        }
    }

    /// Feed one fragment; returns the turns it completed, in order.
    pub fn push(&mut self, fragment: ResponseFragment) -> Vec<TurnPayload> {
        let mut out = Vec::new();
        match fragment {
            ResponseFragment::TextDelta(chunk) => {
                if self.kind == PendingKind::Tool {
                    self.flush_tool_group(&mut out);
                }
                self.kind = PendingKind::Text;
                self.text.push_str(&chunk);
            }
            ResponseFragment::ToolCallStart { call_id, tool_name } => {
                self.enter_tool_kind(&mut out);
                self.known_names.insert(call_id.clone(), tool_name.clone());
                self.calls.push(PendingCall {
                    call_id,
                    tool_name,
                    arguments: String::new(),
                    emitted: false,
                });
            }
            ResponseFragment::ToolCallDelta { call_id, arguments } => {
                self.enter_tool_kind(&mut out);
                self.call_mut(&call_id).arguments.push_str(&arguments);
            }
            ResponseFragment::ToolCallEnd { call_id } => {
                self.enter_tool_kind(&mut out);
                // The call stays pending; it is emitted when its result
                // arrives or when the group flushes.
                let _ = self.call_mut(&call_id);
            }
            ResponseFragment::ToolResult { call_id, payload } => {
                self.enter_tool_kind(&mut out);
                let call = self.call_mut(&call_id);
                let tool_name = call.tool_name.clone();
                if !call.emitted {
                    call.emitted = true;
                    out.push(TurnPayload::AssistantToolCall {
                        call_id: call_id.clone(),
                        tool_name: tool_name.clone(),
                        arguments: call.arguments.clone(),
                    });
                }
                out.push(TurnPayload::ToolResult {
                    call_id,
                    info: parse_tool_response(&tool_name, &payload),
                });
            }
        }
        out
    }

    /// End of stream: flush the pending turn if it is meaningful.
    pub fn finish(mut self) -> Vec<TurnPayload> {
        let mut out = Vec::new();
        match self.kind {
            PendingKind::Text => self.flush_text(&mut out),
            PendingKind::Tool => self.flush_tool_group(&mut out),
            PendingKind::None => {}
        }
        out
    }

    fn enter_tool_kind(&mut self, out: &mut Vec<TurnPayload>) {
        if self.kind == PendingKind::Text {
            self.flush_text(out);
        }
        self.kind = PendingKind::Tool;
    }

    /// Emit accumulated text as a turn unless it is whitespace-only.
    fn flush_text(&mut self, out: &mut Vec<TurnPayload>) {
        let text = std::mem::take(&mut self.text);
        if !text.trim().is_empty() {
            out.push(TurnPayload::AssistantText { text });
        }
    }

    /// Emit any not-yet-emitted calls of the current group, then end it.
    fn flush_tool_group(&mut self, out: &mut Vec<TurnPayload>) {
        for call in &mut self.calls {
            if !call.emitted {
                call.emitted = true;
                out.push(TurnPayload::AssistantToolCall {
                    call_id: call.call_id.clone(),
                    tool_name: call.tool_name.clone(),
                    arguments: call.arguments.clone(),
                });
            }
        }
        self.calls.clear();
    }

    /// Find the pending call for `call_id`, creating a placeholder when the
    /// stream references an id it never announced (tolerated, logged by the
    /// caller's rendering as an unknown tool).
    fn call_mut(&mut self, call_id: &str) -> &mut PendingCall {
        if let Some(idx) = self.calls.iter().position(|c| c.call_id == call_id) {
            return &mut self.calls[idx];
        }
        let tool_name = self
            .known_names
            .get(call_id)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        // A result for an already-flushed (emitted) call must not re-emit the
        // call turn; seed the placeholder accordingly.
        let emitted = self.known_names.contains_key(call_id);
        self.calls.push(PendingCall {
            call_id: call_id.to_string(),
            tool_name,
            arguments: String::new(),
            emitted,
        });
        let idx = self.calls.len() - 1;
        &mut self.calls[idx]
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
