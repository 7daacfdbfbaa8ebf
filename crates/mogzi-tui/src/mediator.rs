// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The mediator: the sole channel for cross-component messages.
//!
//! Events are a closed sum type.  States, components, and key bindings call
//! [`Mediator::notify`]; the event loop drains the queue and applies each
//! event with full access to the singletons, still within the same loop
//! iteration (dispatch stays on the event-loop thread).  Components hold no
//! references to each other; per-frame reads go through the render context
//! instead of a query surface.

use std::collections::VecDeque;

use mogzi_config::ToolApprovals;
use mogzi_core::InfoLevel;
use uuid::Uuid;

use crate::state::StateTag;

/// Closed set of cross-component events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// A non-command line was submitted from the input state.
    SubmitUser(String),
    /// A `/`-prefixed line was submitted and must be dispatched.
    DispatchCommand(String),
    /// Cancel the in-flight streaming request, if any.
    CancelStream,
    /// End the event loop after the current iteration.
    Shutdown,
    /// Clear the in-memory history (the `/clear` effect).
    ClearHistory,
    /// Clear the on-disk session history, keeping its id.
    ClearSession,
    RenameSession(String),
    LoadSession(Uuid),
    /// Switch into user-selection mode for the named interactive command.
    EnterSelection(String),
    SetToolApprovals(ToolApprovals),
    /// Surface an informational turn.
    Info { message: String, level: InfoLevel },
    /// Tool progress line for the tool-execution state display.
    ToolProgress(String),
    /// A state transition happened (observability only).
    StateChanged { from: StateTag, to: StateTag },
    /// The active session was replaced or renamed.
    SessionChanged,
}

/// Exactly one mediator exists per process run.
#[derive(Debug, Default)]
pub struct Mediator {
    queue: VecDeque<AppEvent>,
}

impl Mediator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, event: AppEvent) {
        self.queue.push_back(event);
    }

    /// Take all queued events in notification order.
    pub fn drain(&mut self) -> Vec<AppEvent> {
        self.queue.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_notification_order() {
        let mut m = Mediator::new();
        m.notify(AppEvent::SubmitUser("a".into()));
        m.notify(AppEvent::CancelStream);
        m.notify(AppEvent::Shutdown);
        let events = m.drain();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], AppEvent::SubmitUser("a".into()));
        assert_eq!(events[2], AppEvent::Shutdown);
        assert!(m.is_empty());
    }

    #[test]
    fn drain_on_empty_mediator_is_empty() {
        let mut m = Mediator::new();
        assert!(m.drain().is_empty());
    }
}
