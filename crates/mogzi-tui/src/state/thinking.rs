// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Thinking state: animated placeholder while the response streams.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::text::Text;

use crate::app::TuiContext;
use crate::components::progress_panel;
use crate::mediator::AppEvent;
use crate::render::RenderContext;

use super::{State, StateTag};

#[derive(Default)]
pub struct ThinkingState;

impl State for ThinkingState {
    fn tag(&self) -> StateTag {
        StateTag::Thinking
    }

    fn handle_key(&mut self, ctx: &mut TuiContext, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            ctx.mediator.notify(AppEvent::CancelStream);
        }
    }

    fn handle_char(&mut self, _ctx: &mut TuiContext, _c: char) {}

    fn render_dynamic(&self, ctx: &RenderContext) -> Text<'static> {
        progress_panel(ctx, "Thinking…")
    }
}
