// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The TUI state machine.
//!
//! Three states — input, thinking, tool-execution — each owning its share of
//! key handling and dynamic-region rendering.  The manager routes events to
//! the active state and performs enter/exit transitions; the transitions
//! themselves are driven by the event loop (submission, streaming progress,
//! stream end/cancel).

mod input;
mod thinking;
mod tool_exec;

use crossterm::event::KeyEvent;
use ratatui::text::Text;

use crate::app::TuiContext;
use crate::mediator::AppEvent;
use crate::render::RenderContext;

pub use input::InputState;
pub use thinking::ThinkingState;
pub use tool_exec::ToolExecutionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTag {
    Input,
    Thinking,
    ToolExecution,
}

/// Per-state behaviour.  States mutate only the [`TuiContext`] they are
/// handed; anything beyond that goes through the mediator.
pub trait State {
    fn tag(&self) -> StateTag;
    fn on_enter(&mut self, _ctx: &mut TuiContext, _previous: StateTag) {}
    fn on_exit(&mut self, _ctx: &mut TuiContext, _next: StateTag) {}
    fn handle_key(&mut self, ctx: &mut TuiContext, key: KeyEvent);
    fn handle_char(&mut self, ctx: &mut TuiContext, c: char);
    fn render_dynamic(&self, ctx: &RenderContext) -> Text<'static>;
}

pub struct StateManager {
    current: StateTag,
    input: InputState,
    thinking: ThinkingState,
    tool_exec: ToolExecutionState,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        Self {
            current: StateTag::Input,
            input: InputState::default(),
            thinking: ThinkingState::default(),
            tool_exec: ToolExecutionState::default(),
        }
    }

    pub fn current(&self) -> StateTag {
        self.current
    }

    fn active_mut(&mut self) -> &mut dyn State {
        match self.current {
            StateTag::Input => &mut self.input,
            StateTag::Thinking => &mut self.thinking,
            StateTag::ToolExecution => &mut self.tool_exec,
        }
    }

    fn active(&self) -> &dyn State {
        match self.current {
            StateTag::Input => &self.input,
            StateTag::Thinking => &self.thinking,
            StateTag::ToolExecution => &self.tool_exec,
        }
    }

    /// Exit the current state and enter `to`.  No-op when already there.
    pub fn transition(&mut self, ctx: &mut TuiContext, to: StateTag) {
        if self.current == to {
            return;
        }
        let from = self.current;
        self.active_mut().on_exit(ctx, to);
        self.current = to;
        self.active_mut().on_enter(ctx, from);
        ctx.mediator.notify(AppEvent::StateChanged { from, to });
    }

    pub fn handle_key(&mut self, ctx: &mut TuiContext, key: KeyEvent) {
        self.active_mut().handle_key(ctx, key);
    }

    pub fn handle_char(&mut self, ctx: &mut TuiContext, c: char) {
        self.active_mut().handle_char(ctx, c);
    }

    pub fn render_dynamic(&self, ctx: &RenderContext) -> Text<'static> {
        self.active().render_dynamic(ctx)
    }
}
