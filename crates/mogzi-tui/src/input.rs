// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The input context: text buffer, cursor, selection, completion state, and
//! submitted-command history.
//!
//! The cursor is a byte index that always sits on a grapheme-cluster
//! boundary; Backspace/Delete consume one whole cluster (a base letter plus
//! its combining marks, a ZWJ emoji sequence) and Left/Right step across
//! clusters, never into them.  All mutation helpers preserve that invariant,
//! as well as `cursor ≤ buffer.len()` and selection endpoints within the
//! buffer.

use unicode_segmentation::UnicodeSegmentation;

use crate::autocomplete::CompletionItem;

/// Maximum entries kept in [`CommandHistory`].
const HISTORY_CAP: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Autocomplete,
    UserSelection,
}

#[derive(Debug, Default)]
pub struct InputContext {
    pub buffer: String,
    /// Byte index on a grapheme boundary, `0 ≤ cursor ≤ buffer.len()`.
    pub cursor: usize,
    /// Anchor of the active selection; the selection spans anchor↔cursor.
    selection_anchor: Option<usize>,
    pub mode: InputMode,
    pub completion_items: Vec<CompletionItem>,
    pub selected_index: usize,
    /// Index into the provider registry that produced `completion_items`.
    pub active_provider: Option<usize>,
    pub history: CommandHistory,
    /// Position while navigating history with Up/Down; `None` when not navigating.
    history_cursor: Option<usize>,
}

impl InputContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The selection as `[start, end)`, or `None` when empty.
    pub fn selection(&self) -> Option<(usize, usize)> {
        let anchor = self.selection_anchor?;
        if anchor == self.cursor {
            return None;
        }
        Some((anchor.min(self.cursor), anchor.max(self.cursor)))
    }

    pub fn clear_selection(&mut self) {
        self.selection_anchor = None;
    }

    /// Delete the selected range (if any); returns true when something was
    /// removed.
    pub fn delete_selection(&mut self) -> bool {
        let Some((start, end)) = self.selection() else { return false };
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
        self.selection_anchor = None;
        true
    }

    /// Insert a character at the cursor, deleting the selection first.
    pub fn insert_char(&mut self, c: char) {
        self.delete_selection();
        self.buffer.insert(self.cursor, c);
        self.cursor += c.len_utf8();
        self.history_cursor = None;
    }

    /// Remove the selection, or one grapheme before the cursor.  No-op on an
    /// empty buffer or at position 0.
    pub fn backspace(&mut self) {
        if self.delete_selection() {
            return;
        }
        if self.cursor == 0 {
            return;
        }
        let prev = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.replace_range(prev..self.cursor, "");
        self.cursor = prev;
    }

    /// Remove the selection, or one grapheme after the cursor.
    pub fn delete_forward(&mut self) {
        if self.delete_selection() {
            return;
        }
        if self.cursor >= self.buffer.len() {
            return;
        }
        let next = next_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.replace_range(self.cursor..next, "");
    }

    /// Move the cursor one grapheme left; with `extend` the selection grows
    /// from its anchor, otherwise any selection collapses.
    pub fn move_left(&mut self, extend: bool) {
        self.prepare_selection(extend);
        if self.cursor > 0 {
            self.cursor = prev_grapheme_boundary(&self.buffer, self.cursor);
        }
    }

    pub fn move_right(&mut self, extend: bool) {
        self.prepare_selection(extend);
        if self.cursor < self.buffer.len() {
            self.cursor = next_grapheme_boundary(&self.buffer, self.cursor);
        }
    }

    pub fn move_home(&mut self, extend: bool) {
        self.prepare_selection(extend);
        self.cursor = 0;
    }

    pub fn move_end(&mut self, extend: bool) {
        self.prepare_selection(extend);
        self.cursor = self.buffer.len();
    }

    fn prepare_selection(&mut self, extend: bool) {
        if extend {
            if self.selection_anchor.is_none() {
                self.selection_anchor = Some(self.cursor);
            }
        } else {
            self.selection_anchor = None;
        }
    }

    /// Replace the whole buffer and park the cursor at the end.
    pub fn set_buffer(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
        self.cursor = self.buffer.len();
        self.selection_anchor = None;
    }

    /// Take the buffer for submission, resetting cursor and selection.
    pub fn take_buffer(&mut self) -> String {
        self.cursor = 0;
        self.selection_anchor = None;
        self.history_cursor = None;
        std::mem::take(&mut self.buffer)
    }

    /// Leave any completion/selection mode and drop its items.
    pub fn reset_completion(&mut self) {
        self.mode = InputMode::Normal;
        self.completion_items.clear();
        self.selected_index = 0;
        self.active_provider = None;
    }

    // ── History navigation ────────────────────────────────────────────────────

    /// Up: first press recalls the most recent submission, further presses go
    /// older.  No-op when the history is empty.
    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let next = match self.history_cursor {
            None => self.history.len() - 1,
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_cursor = Some(next);
        if let Some(entry) = self.history.get(next) {
            self.set_buffer(entry.to_string());
        }
    }

    /// Down: newer entries, then an empty buffer beyond the newest.
    pub fn history_down(&mut self) {
        let Some(i) = self.history_cursor else { return };
        if i + 1 < self.history.len() {
            self.history_cursor = Some(i + 1);
            if let Some(entry) = self.history.get(i + 1) {
                self.set_buffer(entry.to_string());
            }
        } else {
            self.history_cursor = None;
            self.set_buffer("");
        }
    }
}

// ── Grapheme boundary helpers ─────────────────────────────────────────────────

/// Start of the grapheme cluster that ends at or spans `idx`; 0 at the front.
pub(crate) fn prev_grapheme_boundary(s: &str, idx: usize) -> usize {
    let idx = idx.min(s.len());
    s.grapheme_indices(true)
        .map(|(start, _)| start)
        .take_while(|&start| start < idx)
        .last()
        .unwrap_or(0)
}

/// End of the grapheme cluster that starts at or spans `idx`.
pub(crate) fn next_grapheme_boundary(s: &str, idx: usize) -> usize {
    let idx = idx.min(s.len());
    s.grapheme_indices(true)
        .map(|(start, cluster)| start + cluster.len())
        .find(|&end| end > idx)
        .unwrap_or(s.len())
}

// ── Command history ───────────────────────────────────────────────────────────

/// Submitted user inputs: deduplicated (first submission wins), capped at
/// 100 entries with the oldest dropped.
#[derive(Debug, Default)]
pub struct CommandHistory {
    entries: Vec<String>,
}

impl CommandHistory {
    pub fn add(&mut self, input: impl Into<String>) {
        let input = input.into();
        if input.is_empty() || self.entries.iter().any(|e| *e == input) {
            return;
        }
        self.entries.push(input);
        if self.entries.len() > HISTORY_CAP {
            self.entries.remove(0);
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
