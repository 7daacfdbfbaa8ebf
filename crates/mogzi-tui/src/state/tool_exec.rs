// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Tool-execution state: shows the most recent tool progress message with
//! the same 4-frame animation as thinking.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::text::Text;

use crate::app::TuiContext;
use crate::components::progress_panel;
use crate::mediator::AppEvent;
use crate::render::RenderContext;

use super::{State, StateTag};

#[derive(Default)]
pub struct ToolExecutionState;

impl State for ToolExecutionState {
    fn tag(&self) -> StateTag {
        StateTag::ToolExecution
    }

    fn on_exit(&mut self, ctx: &mut TuiContext, _next: StateTag) {
        ctx.tool_progress = None;
    }

    fn handle_key(&mut self, ctx: &mut TuiContext, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            ctx.mediator.notify(AppEvent::CancelStream);
        }
    }

    fn handle_char(&mut self, _ctx: &mut TuiContext, _c: char) {}

    fn render_dynamic(&self, ctx: &RenderContext) -> Text<'static> {
        let label = ctx.tool_progress.unwrap_or("Running tool…").to_string();
        progress_panel(ctx, &label)
    }
}
