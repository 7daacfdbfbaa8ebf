// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Conversation turns: the addressable units of a chat transcript.
//!
//! A [`ConversationTurn`] is what the history manager stores and the TUI
//! renders as one block.  [`SerializableTurn`] is its persistable form: a
//! tagged union with a stable `kind` discriminator, where large inline
//! binary payloads have been externalized to the session's `attachments/`
//! directory and are referenced by relative path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tool_response::ToolResponseInfo;

/// Severity of an [`TurnPayload::Info`] turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoLevel {
    Info,
    Warning,
    Error,
}

/// Binary payload attached to a user turn.
///
/// `Inline` exists only in memory, between the moment the user submits and
/// the moment the session store externalizes the bytes.  Persisted turns
/// always carry `Stored` attachments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Inline { data: Vec<u8>, media_type: String },
    Stored { path: String, media_type: String },
}

/// Externalized attachment reference as written to `session.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAttachment {
    /// Path relative to the session directory, e.g. `attachments/3-ab12cd.png`.
    pub path: String,
    pub media_type: String,
}

/// The content of one conversation turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnPayload {
    UserText {
        text: String,
        attachments: Vec<Attachment>,
    },
    AssistantText {
        text: String,
    },
    AssistantToolCall {
        call_id: String,
        tool_name: String,
        arguments: String,
    },
    ToolResult {
        call_id: String,
        info: ToolResponseInfo,
    },
    Info {
        message: String,
        level: InfoLevel,
    },
}

impl TurnPayload {
    /// True when this payload belongs to a tool group (call or result).
    pub fn is_tool(&self) -> bool {
        matches!(
            self,
            TurnPayload::AssistantToolCall { .. } | TurnPayload::ToolResult { .. }
        )
    }
}

/// One addressable unit of conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    /// Monotone per session.
    pub turn_id: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: TurnPayload,
}

// ── Persistable form ──────────────────────────────────────────────────────────

/// Persistable form of [`ConversationTurn`].
///
/// Unknown `kind` values fail the enclosing session load (and trigger
/// quarantine) rather than being silently dropped; unknown *fields* inside a
/// known variant are ignored by serde and therefore never fail a load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SerializableTurn {
    UserText {
        turn_id: u64,
        timestamp: DateTime<Utc>,
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        attachments: Vec<StoredAttachment>,
    },
    AssistantText {
        turn_id: u64,
        timestamp: DateTime<Utc>,
        text: String,
    },
    AssistantToolCall {
        turn_id: u64,
        timestamp: DateTime<Utc>,
        call_id: String,
        tool_name: String,
        arguments: String,
    },
    ToolResult {
        turn_id: u64,
        timestamp: DateTime<Utc>,
        call_id: String,
        info: ToolResponseInfo,
    },
    Info {
        turn_id: u64,
        timestamp: DateTime<Utc>,
        message: String,
        level: InfoLevel,
    },
}

impl SerializableTurn {
    /// Build the persistable form of `turn`.
    ///
    /// For user turns the caller supplies the already-externalized
    /// attachment references; all other variants ignore `attachments`.
    pub fn from_turn(turn: &ConversationTurn, attachments: Vec<StoredAttachment>) -> Self {
        match &turn.payload {
            TurnPayload::UserText { text, .. } => SerializableTurn::UserText {
                turn_id: turn.turn_id,
                timestamp: turn.timestamp,
                text: text.clone(),
                attachments,
            },
            TurnPayload::AssistantText { text } => SerializableTurn::AssistantText {
                turn_id: turn.turn_id,
                timestamp: turn.timestamp,
                text: text.clone(),
            },
            TurnPayload::AssistantToolCall { call_id, tool_name, arguments } => {
                SerializableTurn::AssistantToolCall {
                    turn_id: turn.turn_id,
                    timestamp: turn.timestamp,
                    call_id: call_id.clone(),
                    tool_name: tool_name.clone(),
                    arguments: arguments.clone(),
                }
            }
            TurnPayload::ToolResult { call_id, info } => SerializableTurn::ToolResult {
                turn_id: turn.turn_id,
                timestamp: turn.timestamp,
                call_id: call_id.clone(),
                info: info.clone(),
            },
            TurnPayload::Info { message, level } => SerializableTurn::Info {
                turn_id: turn.turn_id,
                timestamp: turn.timestamp,
                message: message.clone(),
                level: *level,
            },
        }
    }

    /// Rebuild the in-memory turn.  Stored attachments stay stored; they are
    /// resolved lazily against the session directory when rendered.
    pub fn into_turn(self) -> ConversationTurn {
        match self {
            SerializableTurn::UserText { turn_id, timestamp, text, attachments } => {
                ConversationTurn {
                    turn_id,
                    timestamp,
                    payload: TurnPayload::UserText {
                        text,
                        attachments: attachments
                            .into_iter()
                            .map(|a| Attachment::Stored { path: a.path, media_type: a.media_type })
                            .collect(),
                    },
                }
            }
            SerializableTurn::AssistantText { turn_id, timestamp, text } => ConversationTurn {
                turn_id,
                timestamp,
                payload: TurnPayload::AssistantText { text },
            },
            SerializableTurn::AssistantToolCall {
                turn_id,
                timestamp,
                call_id,
                tool_name,
                arguments,
            } => ConversationTurn {
                turn_id,
                timestamp,
                payload: TurnPayload::AssistantToolCall { call_id, tool_name, arguments },
            },
            SerializableTurn::ToolResult { turn_id, timestamp, call_id, info } => {
                ConversationTurn {
                    turn_id,
                    timestamp,
                    payload: TurnPayload::ToolResult { call_id, info },
                }
            }
            SerializableTurn::Info { turn_id, timestamp, message, level } => ConversationTurn {
                turn_id,
                timestamp,
                payload: TurnPayload::Info { message, level },
            },
        }
    }

    /// The user text of this turn, when it is a user turn.
    pub fn user_text(&self) -> Option<&str> {
        match self {
            SerializableTurn::UserText { text, .. } => Some(text),
            _ => None,
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
