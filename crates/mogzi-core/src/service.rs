// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The opaque chat service boundary.
//!
//! The LLM client and its tool implementations live behind [`AppService`]:
//! the core hands over the conversation so far and receives a stream of
//! [`ResponseFragment`]s back.  [`ScriptedService`] is the deterministic
//! in-process implementation used by tests and offline demo runs.

use std::pin::Pin;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::{stream, Stream};
use mogzi_config::Profile;

use crate::fragment::ResponseFragment;
use crate::turn::ConversationTurn;

pub type FragmentStream = Pin<Box<dyn Stream<Item = ResponseFragment> + Send>>;

/// One streaming chat exchange: the prior conversation plus the new prompt.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub prompt: String,
    pub history: Vec<ConversationTurn>,
    pub profile: Profile,
}

#[async_trait]
pub trait AppService: Send + Sync {
    /// Human-readable service name for status display.
    fn name(&self) -> &str;

    /// Model identifier as reported to users.
    fn model_name(&self) -> &str;

    /// Send a chat request and return a streaming response.
    async fn stream_chat(&self, req: ChatRequest) -> anyhow::Result<FragmentStream>;
}

// ── Scripted service ──────────────────────────────────────────────────────────

/// A pre-scripted service.  Each call to `stream_chat` pops the next fragment
/// script from the front of the queue.  Tests specify exact fragment
/// sequences — including tool calls — without any network access.
pub struct ScriptedService {
    scripts: Arc<Mutex<Vec<Vec<ResponseFragment>>>>,
    /// Echo the prompt once the scripts run out (the offline demo mode).
    echo_when_empty: bool,
    /// The last `ChatRequest` seen, for test inspection.
    pub last_request: Arc<Mutex<Option<ChatRequest>>>,
}

impl ScriptedService {
    /// Build a service from an ordered list of per-call fragment scripts.
    pub fn new(scripts: Vec<Vec<ResponseFragment>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            echo_when_empty: false,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Convenience: a service that always streams a single text reply.
    pub fn always_text(reply: impl Into<String>) -> Self {
        let r = reply.into();
        Self::new(vec![vec![ResponseFragment::TextDelta(r)]])
    }

    /// A service that echoes every prompt back.  This is what the `scripted`
    /// provider resolves to when no scripts are loaded.
    pub fn echo() -> Self {
        Self { echo_when_empty: true, ..Self::new(Vec::new()) }
    }
}

#[async_trait]
impl AppService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }

    async fn stream_chat(&self, req: ChatRequest) -> anyhow::Result<FragmentStream> {
        let prompt = req.prompt.clone();
        *self.last_request.lock().unwrap() = Some(req);
        let script = {
            let mut scripts = self.scripts.lock().unwrap();
            if scripts.is_empty() {
                if self.echo_when_empty {
                    vec![ResponseFragment::TextDelta(format!("echo: {prompt}"))]
                } else {
                    Vec::new()
                }
            } else {
                scripts.remove(0)
            }
        };
        Ok(Box::pin(stream::iter(script)))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
