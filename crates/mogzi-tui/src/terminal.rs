// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Scrollback terminal: append-only static region + one redrawn dynamic frame.
//!
//! Built on ratatui's inline viewport.  Committed history goes *above* the
//! viewport via `insert_before` and scrolls with the terminal like normal
//! output; the live frame is redrawn in place inside the viewport.  Terminal
//! write failures are logged and swallowed — rendering must never take the
//! application down.

use std::io::Stdout;

use ratatui::backend::CrosstermBackend;
use ratatui::text::Text;
use ratatui::widgets::{Paragraph, Widget};
use ratatui::{Terminal, TerminalOptions, Viewport};
use tracing::warn;

/// Rows reserved for the dynamic region.
const DYNAMIC_HEIGHT: u16 = 14;

pub struct ScrollbackTerminal {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ScrollbackTerminal {
    /// Enter raw mode and open an inline viewport at the bottom of the screen.
    pub fn initialize() -> anyhow::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        let backend = CrosstermBackend::new(std::io::stdout());
        let mut terminal = Terminal::with_options(
            backend,
            TerminalOptions { viewport: Viewport::Inline(DYNAMIC_HEIGHT) },
        )?;
        terminal.clear()?;
        Ok(Self { terminal })
    }

    /// Append content above the dynamic region.  The content is permanent
    /// and scrolls with the terminal; interleaved dynamic redraws never
    /// disturb it.
    pub fn write_static(&mut self, text: &Text<'static>) {
        let height = text.height().min(u16::MAX as usize) as u16;
        if height == 0 {
            return;
        }
        let paragraph = Paragraph::new(text.clone());
        if let Err(e) = self.terminal.insert_before(height, |buf| {
            paragraph.render(buf.area, buf);
        }) {
            warn!("static write failed: {e}");
        }
    }

    /// Replace the dynamic frame in place.
    pub fn set_dynamic(&mut self, text: Text<'static>) {
        if let Err(e) = self.terminal.draw(|frame| {
            frame.render_widget(Paragraph::new(text), frame.area());
        }) {
            warn!("dynamic redraw failed: {e}");
        }
    }

    /// Current terminal width in columns (fallback 80).
    pub fn width(&self) -> u16 {
        self.terminal.size().map(|s| s.width).unwrap_or(80)
    }

    /// Height of the dynamic region.
    pub fn dynamic_height(&self) -> u16 {
        DYNAMIC_HEIGHT
    }

    /// Wipe everything and start a new logical frame (used by `/clear` and
    /// session switches).
    pub fn reset(&mut self) {
        if let Err(e) = self.terminal.clear() {
            warn!("terminal clear failed: {e}");
        }
    }

    /// Blank the dynamic region, keep static output, and leave raw mode.
    pub fn shutdown(&mut self) {
        let _ = self.terminal.draw(|frame| {
            frame.render_widget(Paragraph::new(Text::default()), frame.area());
        });
        let _ = self.terminal.show_cursor();
        if let Err(e) = crossterm::terminal::disable_raw_mode() {
            warn!("failed to leave raw mode: {e}");
        }
    }
}
