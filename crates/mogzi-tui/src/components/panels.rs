// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The leaf panels of the dynamic region.

use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};

use crate::input::InputMode;
use crate::render::{spinner_frame, truncate_columns, wrap_columns, RenderContext};
use crate::state::StateTag;

use super::{Component, ComponentKind};

/// Maximum list rows shown by the autocomplete/selection overlays.
const LIST_ROWS: usize = 6;

// ── Welcome ───────────────────────────────────────────────────────────────────

pub struct WelcomeComponent;

impl Component for WelcomeComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Welcome
    }

    fn visible(&self, ctx: &RenderContext) -> bool {
        ctx.history_is_empty && ctx.state == StateTag::Input
    }

    fn render(&self, ctx: &RenderContext) -> Text<'static> {
        Text::from(vec![
            Line::from(Span::styled("mogzi — AI coding assistant", ctx.theme.accent)),
            Line::from(Span::styled(
                "Type a message and press Enter. /help lists commands.",
                ctx.theme.dim,
            )),
            Line::default(),
        ])
    }
}

// ── Overlay lists ─────────────────────────────────────────────────────────────

fn render_list(ctx: &RenderContext) -> Text<'static> {
    let items = &ctx.input.completion_items;
    let selected = ctx.input.selected_index;
    // Keep the highlighted row in view.
    let first = selected.saturating_sub(LIST_ROWS - 1);
    let mut lines = Vec::new();
    for (i, item) in items.iter().enumerate().skip(first).take(LIST_ROWS) {
        let marker = if i == selected { "▸ " } else { "  " };
        let style = if i == selected { ctx.theme.selected } else { Style::default() };
        let label = if item.display.is_empty() { &item.value } else { &item.display };
        let mut spans = vec![Span::styled(format!("{marker}{label}"), style)];
        if let Some(desc) = &item.description {
            spans.push(Span::styled(format!("  {desc}"), ctx.theme.dim));
        }
        lines.push(Line::from(spans));
    }
    if items.len() > LIST_ROWS {
        lines.push(Line::from(Span::styled(
            format!("  ({} of {})", selected + 1, items.len()),
            ctx.theme.dim,
        )));
    }
    Text::from(lines)
}

pub struct AutocompleteComponent;

impl Component for AutocompleteComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Autocomplete
    }

    fn visible(&self, ctx: &RenderContext) -> bool {
        ctx.input.mode == InputMode::Autocomplete && !ctx.input.completion_items.is_empty()
    }

    fn render(&self, ctx: &RenderContext) -> Text<'static> {
        render_list(ctx)
    }
}

pub struct UserSelectionComponent;

impl Component for UserSelectionComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::UserSelection
    }

    fn visible(&self, ctx: &RenderContext) -> bool {
        ctx.input.mode == InputMode::UserSelection && !ctx.input.completion_items.is_empty()
    }

    fn render(&self, ctx: &RenderContext) -> Text<'static> {
        let mut text = render_list(ctx);
        text.lines.push(Line::from(Span::styled(
            "  Enter to select · Esc to cancel",
            ctx.theme.dim,
        )));
        text
    }
}

// ── Footer ────────────────────────────────────────────────────────────────────

pub struct FooterComponent;

impl Component for FooterComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Footer
    }

    fn visible(&self, _ctx: &RenderContext) -> bool {
        true
    }

    fn render(&self, ctx: &RenderContext) -> Text<'static> {
        let hint = match ctx.state {
            StateTag::Input => "Enter send · /help commands",
            StateTag::Thinking | StateTag::ToolExecution => "Esc or Ctrl+C cancel",
        };
        Text::from(Line::from(vec![
            Span::styled(format!("{} ", ctx.session_name), ctx.theme.dim),
            Span::styled(format!("[{}] ", ctx.model_display), ctx.theme.dim),
            Span::styled(format!("approvals:{} ", ctx.tool_approvals), ctx.theme.dim),
            Span::styled(hint.to_string(), ctx.theme.dim),
        ]))
    }
}

// ── State-owned panels ────────────────────────────────────────────────────────

/// The prompt line with cursor and selection markers; rendered by the input
/// state.
pub fn input_panel(ctx: &RenderContext) -> Text<'static> {
    let input = ctx.input;
    let width = ctx.width.max(20) as usize - 2;
    let (before, after) = input.buffer.split_at(input.cursor.min(input.buffer.len()));
    let cursor_char = after.chars().next();
    let rest: String = match cursor_char {
        Some(c) => after[c.len_utf8()..].to_string(),
        None => String::new(),
    };

    let mut spans = vec![Span::styled("❯ ", ctx.theme.user)];
    spans.push(Span::raw(before.to_string()));
    spans.push(Span::styled(
        cursor_char.map(String::from).unwrap_or_else(|| " ".into()),
        ctx.theme.selected,
    ));
    spans.push(Span::raw(rest));

    let mut lines = vec![Line::from(spans)];
    if let Some((start, end)) = input.selection() {
        lines.push(Line::from(Span::styled(
            format!("  [{} chars selected]", input.buffer[start..end].chars().count()),
            ctx.theme.dim,
        )));
    }
    // Visual guard against overlong single-line prompts.
    if input.buffer.len() > width {
        lines.truncate(1);
        let mut wrapped: Vec<Line<'static>> = wrap_columns(&input.buffer, width)
            .into_iter()
            .map(|chunk| Line::from(Span::raw(chunk)))
            .collect();
        wrapped.insert(0, Line::from(Span::styled("❯", ctx.theme.user)));
        return Text::from(wrapped);
    }
    Text::from(lines)
}

/// Spinner + status line; rendered by the thinking and tool-execution states.
pub fn progress_panel(ctx: &RenderContext, label: &str) -> Text<'static> {
    let frame = spinner_frame(ctx.now_ms);
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{frame} "), ctx.theme.accent),
        Span::styled(label.to_string(), ctx.theme.dim),
    ])];
    if let Some(preview) = ctx.pending_text {
        if let Some(last) = preview.lines().filter(|l| !l.trim().is_empty()).last() {
            lines.push(Line::from(Span::styled(
                format!("  {}", truncate_columns(last, ctx.width.max(20) as usize - 4)),
                ctx.theme.dim,
            )));
        }
    }
    Text::from(lines)
}
