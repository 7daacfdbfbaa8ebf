// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The per-submission streaming task and the fragment pump.
//!
//! One task is spawned per user submission; it forwards fragments from the
//! service stream into a bounded channel and stops when cancelled.  The
//! event loop drains the channel between keystrokes, feeds the boundary
//! parser, and commits completed turns.  After a cancel the channel is
//! drained to end-of-stream before the cancellation notice is emitted.

use futures::StreamExt;
use mogzi_core::{AppService, ChatRequest, InfoLevel, ResponseFragment, StreamingParser};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::mediator::AppEvent;
use crate::state::StateTag;

use super::App;

/// Message from the streaming task to the event loop.
#[derive(Debug)]
pub(crate) enum StreamMessage {
    Fragment(ResponseFragment),
    Failed(String),
}

/// State of the in-flight streaming request.
pub struct ActiveStream {
    pub(crate) rx: mpsc::Receiver<StreamMessage>,
    pub(crate) parser: StreamingParser,
    /// Dropping or firing this cancels the task.
    pub(crate) cancel: Option<oneshot::Sender<()>>,
    pub(crate) cancel_requested: bool,
}

/// Spawn the streaming task for one submission.
pub(crate) fn spawn_stream(service: Arc<dyn AppService>, request: ChatRequest) -> ActiveStream {
    let (tx, rx) = mpsc::channel::<StreamMessage>(64);
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        match service.stream_chat(request).await {
            Ok(mut fragments) => loop {
                tokio::select! {
                    _ = &mut cancel_rx => {
                        debug!("streaming task cancelled");
                        break;
                    }
                    item = fragments.next() => match item {
                        Some(fragment) => {
                            if tx.send(StreamMessage::Fragment(fragment)).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            },
            Err(e) => {
                let _ = tx.send(StreamMessage::Failed(format!("{e:#}"))).await;
            }
        }
    });

    ActiveStream { rx, parser: StreamingParser::new(), cancel: Some(cancel_tx), cancel_requested: false }
}

impl App {
    /// Drain buffered fragments, commit completed turns, and drive the
    /// thinking ↔ tool-execution transitions.  Consumes fragments strictly
    /// in producer order.
    pub(crate) async fn pump_stream(&mut self) {
        let Some(stream) = self.ctx.stream.as_mut() else { return };

        let mut completed = Vec::new();
        let mut failures: Vec<String> = Vec::new();
        let mut preview = String::new();
        let mut progress: Option<String> = None;
        let mut last_was_tool: Option<bool> = None;
        let mut ended = false;

        loop {
            match stream.rx.try_recv() {
                Ok(StreamMessage::Fragment(fragment)) => {
                    match &fragment {
                        ResponseFragment::TextDelta(chunk) => {
                            preview.push_str(chunk);
                            last_was_tool = Some(false);
                        }
                        ResponseFragment::ToolCallStart { tool_name, .. } => {
                            progress = Some(format!("Running {tool_name}…"));
                            last_was_tool = Some(true);
                        }
                        ResponseFragment::ToolResult { .. }
                        | ResponseFragment::ToolCallDelta { .. }
                        | ResponseFragment::ToolCallEnd { .. } => {
                            last_was_tool = Some(true);
                        }
                    }
                    completed.extend(stream.parser.push(fragment));
                }
                Ok(StreamMessage::Failed(message)) => failures.push(message),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    ended = true;
                    break;
                }
            }
        }

        let cancelled = stream.cancel_requested;
        if ended {
            if let Some(stream) = self.ctx.stream.take() {
                completed.extend(stream.parser.finish());
            }
        }

        if !preview.is_empty() {
            self.ctx.history.append_pending_text(&preview);
        }
        if let Some(message) = progress {
            self.ctx.mediator.notify(AppEvent::ToolProgress(message));
        }
        for turn in completed {
            self.commit_payload(turn).await;
        }
        for message in failures {
            self.commit_payload(mogzi_core::TurnPayload::Info {
                message: format!("chat service error: {message}"),
                level: InfoLevel::Error,
            })
            .await;
        }

        if ended {
            if cancelled {
                self.commit_payload(mogzi_core::TurnPayload::Info {
                    message: "Response was cancelled by user".into(),
                    level: InfoLevel::Info,
                })
                .await;
            }
            self.states.transition(&mut self.ctx, StateTag::Input);
        } else if let Some(is_tool) = last_was_tool {
            let target = if is_tool { StateTag::ToolExecution } else { StateTag::Thinking };
            self.states.transition(&mut self.ctx, target);
        }
    }

    /// Signal cancellation of the in-flight request.  Remaining buffered
    /// fragments are still drained before the notice turn is emitted.
    pub(crate) fn cancel_stream(&mut self) {
        let Some(stream) = self.ctx.stream.as_mut() else { return };
        stream.cancel_requested = true;
        if let Some(cancel) = stream.cancel.take() {
            let _ = cancel.send(());
        }
    }
}
