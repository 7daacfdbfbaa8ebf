// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! In-memory conversation log used for rendering.
//!
//! Completed turns are immutable history; the pending turn is the live
//! streaming preview (re-rendered each frame with the animation).  Durable
//! persistence is the session store's job — the application forwards every
//! completed turn there after appending here.

use chrono::Utc;

use crate::tool_response::ToolResponseInfo;
use crate::turn::{Attachment, ConversationTurn, InfoLevel, TurnPayload};

#[derive(Debug, Default)]
pub struct HistoryManager {
    turns: Vec<ConversationTurn>,
    /// Live streaming preview; not part of durable history.
    pending_text: Option<String>,
    next_turn_id: u64,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, payload: TurnPayload) -> &ConversationTurn {
        let turn = ConversationTurn {
            turn_id: self.next_turn_id,
            timestamp: Utc::now(),
            payload,
        };
        self.next_turn_id += 1;
        self.turns.push(turn);
        let idx = self.turns.len() - 1;
        &self.turns[idx]
    }

    pub fn add_user(&mut self, text: impl Into<String>) -> &ConversationTurn {
        self.push(TurnPayload::UserText { text: text.into(), attachments: Vec::new() })
    }

    pub fn add_user_with_attachments(
        &mut self,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> &ConversationTurn {
        self.push(TurnPayload::UserText { text: text.into(), attachments })
    }

    pub fn add_assistant_text(&mut self, text: impl Into<String>) -> &ConversationTurn {
        self.push(TurnPayload::AssistantText { text: text.into() })
    }

    /// Append a completed turn produced by the streaming parser.
    pub fn add_payload(&mut self, payload: TurnPayload) -> &ConversationTurn {
        self.push(payload)
    }

    /// Append a whole tool group: each call followed by its result (when one
    /// exists), pairing by call id in call order.
    pub fn add_tool_group(
        &mut self,
        calls: Vec<(String, String, String)>,
        mut results: Vec<(String, ToolResponseInfo)>,
    ) {
        for (call_id, tool_name, arguments) in calls {
            self.push(TurnPayload::AssistantToolCall {
                call_id: call_id.clone(),
                tool_name,
                arguments,
            });
            if let Some(idx) = results.iter().position(|(id, _)| *id == call_id) {
                let (call_id, info) = results.remove(idx);
                self.push(TurnPayload::ToolResult { call_id, info });
            }
        }
    }

    pub fn add_info(&mut self, message: impl Into<String>, level: InfoLevel) -> &ConversationTurn {
        self.push(TurnPayload::Info { message: message.into(), level })
    }

    /// Reset in-memory history only; the on-disk session is untouched.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.pending_text = None;
        self.next_turn_id = 0;
    }

    /// Rebuild from a loaded session.
    pub fn replace(&mut self, turns: Vec<ConversationTurn>) {
        self.next_turn_id = turns.iter().map(|t| t.turn_id + 1).max().unwrap_or(0);
        self.turns = turns;
        self.pending_text = None;
    }

    // ── Streaming preview ─────────────────────────────────────────────────────

    pub fn set_pending_text(&mut self, text: impl Into<String>) {
        self.pending_text = Some(text.into());
    }

    pub fn append_pending_text(&mut self, chunk: &str) {
        self.pending_text.get_or_insert_with(String::new).push_str(chunk);
    }

    pub fn clear_pending(&mut self) {
        self.pending_text = None;
    }

    pub fn pending_text(&self) -> Option<&str> {
        self.pending_text.as_deref()
    }

    // ── Render access ─────────────────────────────────────────────────────────

    pub fn get_for_render(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
