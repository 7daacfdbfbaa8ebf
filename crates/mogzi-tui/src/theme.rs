// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use ratatui::style::{Color, Modifier, Style};

/// Styles used across the component tree.  Carried to every component
/// through the per-frame render context.
#[derive(Debug, Clone)]
pub struct Theme {
    pub user: Style,
    pub assistant: Style,
    pub info: Style,
    pub warning: Style,
    pub error: Style,
    pub tool: Style,
    pub dim: Style,
    pub accent: Style,
    pub added: Style,
    pub removed: Style,
    pub selected: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            user: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            assistant: Style::default(),
            info: Style::default().fg(Color::Blue),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),
            tool: Style::default().fg(Color::Magenta),
            dim: Style::default().fg(Color::DarkGray),
            accent: Style::default().fg(Color::Green),
            added: Style::default().fg(Color::Green),
            removed: Style::default().fg(Color::Red),
            selected: Style::default().fg(Color::Black).bg(Color::Cyan),
        }
    }
}
