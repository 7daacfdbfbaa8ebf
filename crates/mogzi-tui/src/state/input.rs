// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Input state: line editing, history navigation, completion handling, and
//! submission.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::text::Text;

use crate::app::TuiContext;
use crate::autocomplete::{select_next, select_prev};
use crate::components::input_panel;
use crate::input::InputMode;
use crate::mediator::AppEvent;
use crate::render::RenderContext;

use super::{State, StateTag};

#[derive(Default)]
pub struct InputState;

impl State for InputState {
    fn tag(&self) -> StateTag {
        StateTag::Input
    }

    fn on_enter(&mut self, ctx: &mut TuiContext, _previous: StateTag) {
        ctx.history.clear_pending();
        ctx.tool_progress = None;
    }

    fn handle_key(&mut self, ctx: &mut TuiContext, key: KeyEvent) {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let mode = ctx.input.mode;

        match key.code {
            KeyCode::Enter => match mode {
                InputMode::Autocomplete => ctx.accept_autocomplete(),
                InputMode::UserSelection => ctx.accept_selection(),
                InputMode::Normal => self.submit(ctx),
            },
            KeyCode::Tab if mode == InputMode::Autocomplete => ctx.accept_autocomplete(),
            KeyCode::Esc => match mode {
                InputMode::Autocomplete => ctx.input.reset_completion(),
                InputMode::UserSelection => ctx.cancel_selection(),
                InputMode::Normal => {}
            },
            KeyCode::Backspace => {
                ctx.input.backspace();
                ctx.refresh_autocomplete();
            }
            KeyCode::Delete => {
                ctx.input.delete_forward();
                ctx.refresh_autocomplete();
            }
            KeyCode::Left => ctx.input.move_left(shift),
            KeyCode::Right => ctx.input.move_right(shift),
            KeyCode::Home => ctx.input.move_home(shift),
            KeyCode::End => ctx.input.move_end(shift),
            KeyCode::Up => match mode {
                InputMode::Normal => ctx.input.history_up(),
                _ => select_prev(&mut ctx.input),
            },
            KeyCode::Down => match mode {
                InputMode::Normal => ctx.input.history_down(),
                _ => select_next(&mut ctx.input),
            },
            _ => {}
        }
    }

    fn handle_char(&mut self, ctx: &mut TuiContext, c: char) {
        // The selection list is modal; typing is ignored until it closes.
        if ctx.input.mode == InputMode::UserSelection {
            return;
        }
        ctx.input.insert_char(c);
        ctx.refresh_autocomplete();
    }

    fn render_dynamic(&self, ctx: &RenderContext) -> Text<'static> {
        input_panel(ctx)
    }
}

impl InputState {
    /// Enter on a Normal-mode buffer: ignore empty input, record history,
    /// and route to command dispatch or submission.
    fn submit(&mut self, ctx: &mut TuiContext) {
        if ctx.input.buffer.trim().is_empty() {
            return;
        }
        let line = ctx.input.take_buffer();
        ctx.input.history.add(line.clone());
        if line.trim_start().starts_with('/') {
            ctx.mediator.notify(AppEvent::DispatchCommand(line));
        } else {
            ctx.mediator.notify(AppEvent::SubmitUser(line));
        }
    }
}
