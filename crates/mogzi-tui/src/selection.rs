// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! User-selection mode: a modal list pick activated by interactive commands.
//!
//! Each provider answers for one command name; the manager populates the
//! input context's item list on activation and runs the provider's effect on
//! accept.  Navigation mirrors autocomplete.

use std::sync::{Arc, Mutex};

use mogzi_config::ToolApprovals;
use mogzi_session::SessionSummary;
use uuid::Uuid;

use crate::autocomplete::CompletionItem;
use crate::input::{InputContext, InputMode};

/// What an accepted selection asks the app to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEffect {
    SetToolApprovals(ToolApprovals),
    LoadSession(Uuid),
}

/// The provider capability set for user-selection mode.
pub trait SelectionProvider {
    /// Command that activates this provider (e.g. `/session list`).
    fn command_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn get_selections(&self) -> Vec<CompletionItem>;

    /// Map the accepted item's value to an effect.  `None` when the value
    /// does not resolve (the manager then just deactivates).
    fn on_selection(&self, value: &str) -> Option<SelectionEffect>;
}

// ── Manager ───────────────────────────────────────────────────────────────────

pub struct UserSelectionManager {
    providers: Vec<Arc<dyn SelectionProvider>>,
    active: Option<usize>,
}

impl UserSelectionManager {
    pub fn new(providers: Vec<Arc<dyn SelectionProvider>>) -> Self {
        Self { providers, active: None }
    }

    /// Enter selection mode for `command_name`.  Returns false when no
    /// provider matches or it has nothing to offer.
    pub fn activate(&mut self, command_name: &str, input: &mut InputContext) -> bool {
        let Some(idx) = self.providers.iter().position(|p| p.command_name() == command_name)
        else {
            return false;
        };
        let items = self.providers[idx].get_selections();
        if items.is_empty() {
            return false;
        }
        self.active = Some(idx);
        input.mode = InputMode::UserSelection;
        input.completion_items = items;
        input.selected_index = 0;
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Run the active provider's effect for the highlighted item, then leave
    /// selection mode.
    pub fn accept(&mut self, input: &mut InputContext) -> Option<SelectionEffect> {
        if input.mode != InputMode::UserSelection || input.completion_items.is_empty() {
            return None;
        }
        let provider = self.active.take().and_then(|i| self.providers.get(i))?;
        let index = input.selected_index.min(input.completion_items.len() - 1);
        let value = input.completion_items[index].value.clone();
        input.reset_completion();
        provider.on_selection(&value)
    }

    /// Leave selection mode without running any effect.
    pub fn cancel(&mut self, input: &mut InputContext) {
        self.active = None;
        if input.mode == InputMode::UserSelection {
            input.reset_completion();
        }
    }
}

// ── Tool approvals provider ───────────────────────────────────────────────────

pub struct ToolApprovalsProvider;

impl SelectionProvider for ToolApprovalsProvider {
    fn command_name(&self) -> &'static str {
        "/tool-approvals"
    }

    fn description(&self) -> &'static str {
        "Tool approval mode"
    }

    fn get_selections(&self) -> Vec<CompletionItem> {
        vec![
            CompletionItem::with_desc("readonly", "readonly", "only read-only tools run unattended"),
            CompletionItem::with_desc("all", "all", "all tools run unattended"),
        ]
    }

    fn on_selection(&self, value: &str) -> Option<SelectionEffect> {
        value.parse::<ToolApprovals>().ok().map(SelectionEffect::SetToolApprovals)
    }
}

// ── Session list provider ─────────────────────────────────────────────────────

/// Offers the top-N most recent sessions.  The listing snapshot is refreshed
/// by the app each time `/session list` runs, just before activation.
pub struct SessionListProvider {
    sessions: Mutex<Vec<SessionSummary>>,
    limit: usize,
}

impl SessionListProvider {
    pub fn new(limit: usize) -> Self {
        Self { sessions: Mutex::new(Vec::new()), limit }
    }

    /// Refresh the listing snapshot; the app calls this (it owns the store)
    /// each time `/session list` runs, just before activation.
    pub fn set_sessions(&self, sessions: Vec<SessionSummary>) {
        *self.sessions.lock().unwrap() = sessions;
    }
}

impl SelectionProvider for SessionListProvider {
    fn command_name(&self) -> &'static str {
        "/session list"
    }

    fn description(&self) -> &'static str {
        "Recent sessions"
    }

    fn get_selections(&self) -> Vec<CompletionItem> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .take(self.limit)
            .map(|s| {
                let label = if s.initial_prompt.is_empty() {
                    s.name.clone()
                } else {
                    format!("{} — {}", s.name, s.initial_prompt)
                };
                CompletionItem::with_desc(
                    s.id.to_string(),
                    label,
                    format!("{} turns", s.turn_count),
                )
            })
            .collect()
    }

    fn on_selection(&self, value: &str) -> Option<SelectionEffect> {
        value.parse::<Uuid>().ok().map(SelectionEffect::LoadSession)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn summary(name: &str, prompt: &str) -> SessionSummary {
        SessionSummary {
            id: Uuid::now_v7(),
            name: name.into(),
            initial_prompt: prompt.into(),
            last_modified_at: Utc::now(),
            turn_count: 3,
        }
    }

    #[test]
    fn tool_approvals_provider_offers_both_modes() {
        let items = ToolApprovalsProvider.get_selections();
        let values: Vec<&str> = items.iter().map(|i| i.value.as_str()).collect();
        assert_eq!(values, vec!["readonly", "all"]);
    }

    #[test]
    fn tool_approvals_selection_maps_to_effect() {
        assert_eq!(
            ToolApprovalsProvider.on_selection("all"),
            Some(SelectionEffect::SetToolApprovals(ToolApprovals::All))
        );
        assert_eq!(ToolApprovalsProvider.on_selection("bogus"), None);
    }

    #[test]
    fn activation_populates_items_and_mode() {
        let mut mgr = UserSelectionManager::new(vec![Arc::new(ToolApprovalsProvider)]);
        let mut input = InputContext::new();
        assert!(mgr.activate("/tool-approvals", &mut input));
        assert_eq!(input.mode, InputMode::UserSelection);
        assert_eq!(input.completion_items.len(), 2);
        assert_eq!(input.selected_index, 0);
        assert!(mgr.is_active());
    }

    #[test]
    fn activation_fails_for_unknown_command() {
        let mut mgr = UserSelectionManager::new(vec![Arc::new(ToolApprovalsProvider)]);
        let mut input = InputContext::new();
        assert!(!mgr.activate("/nope", &mut input));
        assert_eq!(input.mode, InputMode::Normal);
    }

    #[test]
    fn accept_runs_effect_and_deactivates() {
        let mut mgr = UserSelectionManager::new(vec![Arc::new(ToolApprovalsProvider)]);
        let mut input = InputContext::new();
        mgr.activate("/tool-approvals", &mut input);
        input.selected_index = 1;
        let effect = mgr.accept(&mut input);
        assert_eq!(effect, Some(SelectionEffect::SetToolApprovals(ToolApprovals::All)));
        assert_eq!(input.mode, InputMode::Normal);
        assert!(!mgr.is_active());
    }

    #[test]
    fn cancel_leaves_selection_mode_without_effect() {
        let mut mgr = UserSelectionManager::new(vec![Arc::new(ToolApprovalsProvider)]);
        let mut input = InputContext::new();
        mgr.activate("/tool-approvals", &mut input);
        mgr.cancel(&mut input);
        assert_eq!(input.mode, InputMode::Normal);
        assert!(input.completion_items.is_empty());
    }

    #[test]
    fn session_list_provider_respects_the_limit_and_order() {
        let provider = SessionListProvider::new(2);
        provider.set_sessions(vec![
            summary("newest", "fix the bug"),
            summary("middle", ""),
            summary("oldest", "old prompt"),
        ]);
        let items = provider.get_selections();
        assert_eq!(items.len(), 2);
        assert!(items[0].display.contains("newest"));
        assert!(items[0].display.contains("fix the bug"));
        assert_eq!(items[1].display, "middle");
    }

    #[test]
    fn session_selection_parses_the_uuid() {
        let provider = SessionListProvider::new(10);
        let s = summary("a", "");
        let id = s.id;
        provider.set_sessions(vec![s]);
        assert_eq!(provider.on_selection(&id.to_string()), Some(SelectionEffect::LoadSession(id)));
        assert_eq!(provider.on_selection("not-a-uuid"), None);
    }

    #[test]
    fn empty_session_list_does_not_activate() {
        let mut mgr =
            UserSelectionManager::new(vec![Arc::new(SessionListProvider::new(10))]);
        let mut input = InputContext::new();
        assert!(!mgr.activate("/session list", &mut input));
        assert_eq!(input.mode, InputMode::Normal);
    }
}
