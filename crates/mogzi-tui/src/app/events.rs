// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Mediator event application: the one place where cross-component effects
//! touch the singletons.

use std::path::Path;

use mogzi_core::{Attachment, ChatRequest, InfoLevel, TurnPayload};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::commands::CommandAction;
use crate::mediator::AppEvent;
use crate::state::StateTag;

use super::stream::spawn_stream;
use super::App;

impl App {
    pub(crate) async fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SubmitUser(text) => self.submit_user(text).await,
            AppEvent::DispatchCommand(input) => self.dispatch_command(&input).await,
            AppEvent::CancelStream => self.cancel_stream(),
            AppEvent::Shutdown => self.ctx.shutdown = true,
            AppEvent::ClearHistory => {
                self.ctx.history.clear();
                self.reset_screen();
                self.commit_payload(TurnPayload::Info {
                    message: "chat history cleared".into(),
                    level: InfoLevel::Info,
                })
                .await;
            }
            AppEvent::ClearSession => self.clear_session().await,
            AppEvent::RenameSession(name) => self.rename_session(name).await,
            AppEvent::LoadSession(id) => self.load_session(id).await,
            AppEvent::EnterSelection(command) => self.enter_selection(&command).await,
            AppEvent::SetToolApprovals(mode) => {
                self.ctx.tool_approvals = mode;
                self.commit_payload(TurnPayload::Info {
                    message: format!("tool approvals set to {mode}"),
                    level: InfoLevel::Info,
                })
                .await;
            }
            AppEvent::Info { message, level } => {
                self.commit_payload(TurnPayload::Info { message, level }).await;
            }
            AppEvent::ToolProgress(message) => self.ctx.tool_progress = Some(message),
            AppEvent::StateChanged { from, to } => {
                debug!(?from, ?to, "state transition");
            }
            AppEvent::SessionChanged => {
                if let Some(session) = self.ctx.session.current().await {
                    self.ctx.session_name = session.name;
                }
            }
        }
    }

    /// A validated non-command line: record the turn, spawn the streaming
    /// task, and move to thinking.
    async fn submit_user(&mut self, text: String) {
        let attachments = mentioned_attachments(&text);
        self.commit_payload(TurnPayload::UserText { text: text.clone(), attachments })
            .await;
        let request = ChatRequest {
            prompt: text,
            history: self.ctx.history.get_for_render().to_vec(),
            profile: self.ctx.profile.clone(),
        };
        self.ctx.stream = Some(spawn_stream(self.ctx.service.clone(), request));
        self.states.transition(&mut self.ctx, StateTag::Thinking);
    }

    /// Slash-command dispatch: emit the command's message turn, then apply
    /// its effect.  No streaming request is ever issued here.
    async fn dispatch_command(&mut self, input: &str) {
        let cmd_ctx = self.ctx.command_context();
        let Some(result) = self.ctx.processor.dispatch(input, &cmd_ctx) else {
            return;
        };
        if let Some((message, level)) = result.message {
            self.commit_payload(TurnPayload::Info { message, level }).await;
        }
        match result.action {
            Some(CommandAction::Shutdown) => self.ctx.mediator.notify(AppEvent::Shutdown),
            Some(CommandAction::ClearHistory) => self.ctx.mediator.notify(AppEvent::ClearHistory),
            Some(CommandAction::ClearSession) => self.ctx.mediator.notify(AppEvent::ClearSession),
            Some(CommandAction::RenameSession(name)) => {
                self.ctx.mediator.notify(AppEvent::RenameSession(name));
            }
            Some(CommandAction::EnterSelection(command)) => {
                self.ctx.mediator.notify(AppEvent::EnterSelection(command.to_string()));
            }
            None => {}
        }
    }

    async fn clear_session(&mut self) {
        match self.ctx.session.clear_current().await {
            Ok(()) => {
                self.ctx.history.clear();
                self.reset_screen();
                self.commit_payload(TurnPayload::Info {
                    message: "session cleared".into(),
                    level: InfoLevel::Info,
                })
                .await;
            }
            Err(e) => {
                warn!("session clear failed: {e}");
                self.commit_payload(TurnPayload::Info {
                    message: "failed to save session".into(),
                    level: InfoLevel::Error,
                })
                .await;
            }
        }
    }

    async fn rename_session(&mut self, name: String) {
        match self.ctx.session.rename(&name).await {
            Ok(()) => {
                self.ctx.session_name = name.trim().to_string();
                self.commit_payload(TurnPayload::Info {
                    message: format!("session renamed to '{}'", self.ctx.session_name),
                    level: InfoLevel::Info,
                })
                .await;
            }
            Err(e) => {
                warn!("session rename failed: {e}");
                self.commit_payload(TurnPayload::Info {
                    message: "failed to save session".into(),
                    level: InfoLevel::Error,
                })
                .await;
            }
        }
    }

    /// Replace the current session atomically and rebuild in-memory history
    /// from the loaded one.
    async fn load_session(&mut self, id: Uuid) {
        match self.ctx.session.load(id).await {
            Ok(session) => {
                self.ctx.session_name = session.name.clone();
                let turns = self.ctx.session.history_turns().await;
                self.ctx.history.replace(turns);
                self.reset_screen();
                self.commit_payload(TurnPayload::Info {
                    message: format!("loaded session '{}'", session.name),
                    level: InfoLevel::Info,
                })
                .await;
            }
            Err(e) => {
                warn!("session load failed: {e}");
                self.commit_payload(TurnPayload::Info {
                    message: format!("failed to load session: {e}"),
                    level: InfoLevel::Error,
                })
                .await;
            }
        }
    }

    /// Interactive command: fetch what the provider needs, then switch the
    /// input context into user-selection mode.
    async fn enter_selection(&mut self, command: &str) {
        if command == "/session list" {
            match self.ctx.session.list().await {
                Ok(sessions) => self.ctx.session_list_provider.set_sessions(sessions),
                Err(e) => {
                    warn!("session list failed: {e}");
                    self.ctx.session_list_provider.set_sessions(Vec::new());
                }
            }
        }
        let activated = {
            let super::TuiContext { selection, input, .. } = &mut self.ctx;
            selection.activate(command, input)
        };
        if !activated {
            let message = if command == "/session list" {
                "no saved sessions".to_string()
            } else {
                format!("nothing to select for {command}")
            };
            self.commit_payload(TurnPayload::Info { message, level: InfoLevel::Info }).await;
        }
    }
}

/// Binary files mentioned as `@path` ride along as inline attachments; the
/// session store externalizes the bytes on persist.  Text files are left to
/// the assistant's own read tools.
fn mentioned_attachments(text: &str) -> Vec<Attachment> {
    text.split_whitespace()
        .filter_map(|word| word.strip_prefix('@'))
        .filter_map(|path| {
            let media_type = media_type_for(Path::new(path))?;
            match std::fs::read(path) {
                Ok(data) => Some(Attachment::Inline { data, media_type }),
                Err(e) => {
                    debug!(path, "mentioned file not attachable: {e}");
                    None
                }
            }
        })
        .collect()
}

fn media_type_for(path: &Path) -> Option<String> {
    let media_type = match path.extension()?.to_str()? {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(media_type.to_string())
}
