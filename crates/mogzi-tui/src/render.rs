// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Per-frame render context and the turn-card renderer for the static region.

use mogzi_config::ToolApprovals;
use mogzi_core::{
    ConversationTurn, DiffLineKind, InfoLevel, ToolStatus, TurnPayload, UnifiedDiff,
};
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use unicode_width::UnicodeWidthChar;

use crate::input::InputContext;
use crate::state::StateTag;
use crate::theme::Theme;

/// Everything a component may read while rendering one frame.
pub struct RenderContext<'a> {
    pub width: u16,
    pub height: u16,
    pub theme: &'a Theme,
    pub state: StateTag,
    pub input: &'a InputContext,
    /// Milliseconds since startup, drives the 4-frame animation.
    pub now_ms: u64,
    pub tool_progress: Option<&'a str>,
    /// Streaming text accumulated so far (thinking preview).
    pub pending_text: Option<&'a str>,
    pub session_name: &'a str,
    pub model_display: &'a str,
    pub tool_approvals: ToolApprovals,
    pub history_is_empty: bool,
}

// ── Animation ─────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: [&str; 4] = ["⠋", "⠙", "⠸", "⠴"];

/// Frame index is `floor(now_ms / 250) mod 4`.
pub fn spinner_frame(now_ms: u64) -> &'static str {
    SPINNER_FRAMES[((now_ms / 250) % 4) as usize]
}

// ── Turn cards ────────────────────────────────────────────────────────────────

/// Maximum diff lines shown per tool card before folding.
const DIFF_LINE_CAP: usize = 40;

/// Maximum characters of tool-call arguments shown inline.
const ARGS_CAP: usize = 60;

/// Render one conversation turn as a static-region block.
pub fn render_turn(turn: &ConversationTurn, theme: &Theme, width: u16) -> Text<'static> {
    let width = width.max(20) as usize;
    let mut lines: Vec<Line<'static>> = Vec::new();

    match &turn.payload {
        TurnPayload::UserText { text, attachments } => {
            push_prefixed(&mut lines, "❯ ", theme.user, text, Style::default(), width);
            for a in attachments {
                let label = match a {
                    mogzi_core::Attachment::Stored { path, .. } => path.clone(),
                    mogzi_core::Attachment::Inline { media_type, data } => {
                        format!("{media_type} ({} bytes)", data.len())
                    }
                };
                lines.push(Line::from(Span::styled(format!("  ⎘ {label}"), theme.dim)));
            }
        }
        TurnPayload::AssistantText { text } => {
            push_prefixed(&mut lines, "● ", theme.dim, text, theme.assistant, width);
        }
        TurnPayload::AssistantToolCall { tool_name, arguments, .. } => {
            let args = truncate_columns(arguments.trim(), ARGS_CAP);
            lines.push(Line::from(vec![
                Span::styled("⚙ ", theme.tool),
                Span::styled(tool_name.clone(), theme.tool),
                Span::styled(if args.is_empty() { String::new() } else { format!(" {args}") }, theme.dim),
            ]));
        }
        TurnPayload::ToolResult { info, .. } => {
            let (icon, style) = match info.status {
                ToolStatus::Success => ("✓ ", theme.accent),
                ToolStatus::Failed => ("✗ ", theme.error),
            };
            lines.push(Line::from(vec![
                Span::styled(icon, style),
                Span::styled(info.description.clone(), Style::default()),
            ]));
            if info.summary != info.description {
                for l in info.summary.lines().take(3) {
                    lines.push(Line::from(Span::styled(format!("  {l}"), theme.dim)));
                }
            }
            if let Some(err) = &info.error_message {
                push_prefixed(&mut lines, "  ", theme.error, err, theme.error, width);
            }
            if let Some(diff) = &info.diff {
                render_diff(&mut lines, diff, theme);
            }
        }
        TurnPayload::Info { message, level } => {
            let (icon, style) = match level {
                InfoLevel::Info => ("ℹ ", theme.info),
                InfoLevel::Warning => ("⚠ ", theme.warning),
                InfoLevel::Error => ("✖ ", theme.error),
            };
            push_prefixed(&mut lines, icon, style, message, style, width);
        }
    }

    lines.push(Line::default());
    Text::from(lines)
}

fn render_diff(lines: &mut Vec<Line<'static>>, diff: &UnifiedDiff, theme: &Theme) {
    let mut shown = 0usize;
    let total: usize = diff.hunks.iter().map(|h| h.lines.len()).sum();
    'outer: for hunk in &diff.hunks {
        lines.push(Line::from(Span::styled(
            format!(
                "  @@ -{},{} +{},{} @@",
                hunk.original_start, hunk.original_length, hunk.modified_start, hunk.modified_length
            ),
            theme.dim,
        )));
        for line in &hunk.lines {
            if shown >= DIFF_LINE_CAP {
                lines.push(Line::from(Span::styled(
                    format!("  … ({} more lines)", total - shown),
                    theme.dim,
                )));
                break 'outer;
            }
            let (prefix, style) = match line.kind {
                DiffLineKind::Added => ('+', theme.added),
                DiffLineKind::Removed => ('-', theme.removed),
                DiffLineKind::Context => (' ', theme.dim),
            };
            let number = line
                .modified_line
                .or(line.original_line)
                .map(|n| format!("{n:>4}"))
                .unwrap_or_else(|| "    ".into());
            lines.push(Line::from(vec![
                Span::styled(format!("  {number} "), theme.dim),
                Span::styled(format!("{prefix}{}", line.content), style),
            ]));
            shown += 1;
        }
    }
}

/// Push `text` wrapped to `width`, with `prefix` on the first line and
/// matching indentation on continuation lines.
fn push_prefixed(
    lines: &mut Vec<Line<'static>>,
    prefix: &str,
    prefix_style: Style,
    text: &str,
    style: Style,
    width: usize,
) {
    let indent = " ".repeat(prefix.chars().count());
    let inner = width.saturating_sub(prefix.chars().count()).max(10);
    let mut first = true;
    for source_line in text.lines() {
        for chunk in wrap_columns(source_line, inner) {
            let head = if first { prefix.to_string() } else { indent.clone() };
            let head_style = if first { prefix_style } else { Style::default() };
            lines.push(Line::from(vec![
                Span::styled(head, head_style),
                Span::styled(chunk, style),
            ]));
            first = false;
        }
    }
    if first {
        // Entirely empty text still renders its prefix line.
        lines.push(Line::from(Span::styled(prefix.to_string(), prefix_style)));
    }
}

/// Split a line into chunks of at most `width` visible columns.
pub(crate) fn wrap_columns(s: &str, width: usize) -> Vec<String> {
    if s.is_empty() {
        return vec![String::new()];
    }
    let width = width.max(1);
    let mut out = Vec::new();
    let mut current = String::new();
    let mut cols = 0usize;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if cols + w > width && !current.is_empty() {
            out.push(std::mem::take(&mut current));
            cols = 0;
        }
        current.push(c);
        cols += w;
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Truncate to `columns` visible columns with an ellipsis.
pub(crate) fn truncate_columns(s: &str, columns: usize) -> String {
    let mut width = 0usize;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > columns {
            out.push('…');
            return out;
        }
        width += w;
        out.push(c);
    }
    out
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
