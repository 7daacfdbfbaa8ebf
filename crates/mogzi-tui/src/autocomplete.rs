// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Autocomplete: trigger detection, suggestion fetch, and acceptance.
//!
//! Providers are consulted in registration order after every buffer
//! mutation; the first whose trigger matches becomes active.  Accepting a
//! suggestion applies the provider's `replace_partial` and leaves
//! autocomplete mode.

use std::path::Path;

use crate::commands::SlashCommandProcessor;
use crate::input::{InputContext, InputMode};

/// Maximum file-path suggestions offered at once.
const FILE_SUGGESTION_CAP: usize = 50;

/// A single item in the completion or selection list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    /// The value inserted (or passed to the selection provider) on accept.
    pub value: String,
    /// Label shown in the list; falls back to `value` when empty.
    pub display: String,
    /// Secondary description shown in muted style.
    pub description: Option<String>,
}

impl CompletionItem {
    pub fn simple(value: impl Into<String>) -> Self {
        let v = value.into();
        Self { display: v.clone(), value: v, description: None }
    }

    pub fn with_desc(
        value: impl Into<String>,
        display: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self { value: value.into(), display: display.into(), description: Some(description.into()) }
    }
}

/// The provider capability set.
pub trait CompletionProvider {
    /// Character that activates this provider.
    fn trigger_character(&self) -> char;

    /// Whether this provider applies to the buffer at the cursor.
    fn should_trigger(&self, buffer: &str, cursor: usize) -> bool;

    /// The partial text to complete (e.g. `/se`, or the path after `@`).
    fn extract_partial(&self, buffer: &str, cursor: usize) -> String;

    /// Apply `completion`, returning the new buffer and cursor.
    fn replace_partial(&self, buffer: &str, cursor: usize, completion: &str) -> (String, usize);

    fn get_suggestions(&self, partial: &str) -> Vec<CompletionItem>;
}

// ── Manager ───────────────────────────────────────────────────────────────────

pub struct AutocompleteManager {
    providers: Vec<Box<dyn CompletionProvider>>,
}

impl AutocompleteManager {
    pub fn new(providers: Vec<Box<dyn CompletionProvider>>) -> Self {
        Self { providers }
    }

    /// Re-evaluate triggers after a buffer mutation.  Does nothing while a
    /// user-selection list is active (that mode owns the item list).
    pub fn update(&self, input: &mut InputContext) {
        if input.mode == InputMode::UserSelection {
            return;
        }
        for (idx, provider) in self.providers.iter().enumerate() {
            if !provider.should_trigger(&input.buffer, input.cursor) {
                continue;
            }
            let partial = provider.extract_partial(&input.buffer, input.cursor);
            let items = provider.get_suggestions(&partial);
            if items.is_empty() {
                break;
            }
            input.mode = InputMode::Autocomplete;
            input.completion_items = items;
            input.selected_index = 0;
            input.active_provider = Some(idx);
            return;
        }
        if input.mode == InputMode::Autocomplete {
            input.reset_completion();
        }
    }

    /// Accept the highlighted suggestion.  No-op outside autocomplete mode or
    /// on an empty list.
    pub fn accept(&self, input: &mut InputContext) {
        if input.mode != InputMode::Autocomplete || input.completion_items.is_empty() {
            return;
        }
        let Some(provider) = input.active_provider.and_then(|i| self.providers.get(i)) else {
            input.reset_completion();
            return;
        };
        let index = input.selected_index.min(input.completion_items.len() - 1);
        let completion = input.completion_items[index].value.clone();
        let (buffer, cursor) = provider.replace_partial(&input.buffer, input.cursor, &completion);
        input.buffer = buffer;
        input.cursor = cursor;
        input.clear_selection();
        input.reset_completion();
    }
}

/// Cycle the highlighted index down, wrapping at the end.
pub fn select_next(input: &mut InputContext) {
    if input.completion_items.is_empty() {
        return;
    }
    input.selected_index = (input.selected_index + 1) % input.completion_items.len();
}

/// Cycle the highlighted index up, wrapping at the start.
pub fn select_prev(input: &mut InputContext) {
    if input.completion_items.is_empty() {
        return;
    }
    let len = input.completion_items.len();
    input.selected_index = input.selected_index.checked_sub(1).unwrap_or(len - 1);
}

// ── Slash command provider ────────────────────────────────────────────────────

/// Completes command names for a `/`-prefixed buffer.  The candidate list is
/// a snapshot of the (closed) registry taken at startup.
pub struct SlashCommandProvider {
    commands: Vec<(&'static str, &'static str)>,
}

impl SlashCommandProvider {
    pub fn new(processor: &SlashCommandProcessor) -> Self {
        Self { commands: processor.command_table() }
    }
}

impl CompletionProvider for SlashCommandProvider {
    fn trigger_character(&self) -> char {
        '/'
    }

    fn should_trigger(&self, buffer: &str, cursor: usize) -> bool {
        buffer.starts_with('/') && cursor > 0
    }

    fn extract_partial(&self, buffer: &str, cursor: usize) -> String {
        buffer[..cursor.min(buffer.len())].to_string()
    }

    fn replace_partial(&self, buffer: &str, cursor: usize, completion: &str) -> (String, usize) {
        let tail = &buffer[cursor.min(buffer.len())..];
        let new_buffer = format!("{completion}{tail}");
        (new_buffer, completion.len())
    }

    fn get_suggestions(&self, partial: &str) -> Vec<CompletionItem> {
        let partial = partial.to_lowercase();
        self.commands
            .iter()
            .filter(|(name, _)| name.starts_with(&partial))
            .map(|(name, desc)| CompletionItem::with_desc(*name, *name, *desc))
            .collect()
    }
}

// ── File path provider ────────────────────────────────────────────────────────

/// Completes filesystem paths after an `@` mention.
pub struct FilePathProvider;

impl FilePathProvider {
    /// Byte offset just past the `@` that governs the cursor, if any.
    fn mention_start(buffer: &str, cursor: usize) -> Option<usize> {
        let head = &buffer[..cursor.min(buffer.len())];
        let at = head.rfind('@')?;
        let mention = &head[at + 1..];
        if mention.chars().any(char::is_whitespace) {
            return None;
        }
        Some(at + 1)
    }
}

impl CompletionProvider for FilePathProvider {
    fn trigger_character(&self) -> char {
        '@'
    }

    fn should_trigger(&self, buffer: &str, cursor: usize) -> bool {
        Self::mention_start(buffer, cursor).is_some()
    }

    fn extract_partial(&self, buffer: &str, cursor: usize) -> String {
        match Self::mention_start(buffer, cursor) {
            Some(start) => buffer[start..cursor.min(buffer.len())].to_string(),
            None => String::new(),
        }
    }

    fn replace_partial(&self, buffer: &str, cursor: usize, completion: &str) -> (String, usize) {
        let Some(start) = Self::mention_start(buffer, cursor) else {
            return (buffer.to_string(), cursor);
        };
        let mut new_buffer = String::with_capacity(buffer.len() + completion.len());
        new_buffer.push_str(&buffer[..start]);
        new_buffer.push_str(completion);
        let new_cursor = new_buffer.len();
        new_buffer.push_str(&buffer[cursor.min(buffer.len())..]);
        (new_buffer, new_cursor)
    }

    fn get_suggestions(&self, partial: &str) -> Vec<CompletionItem> {
        let (dir, prefix) = match partial.rfind('/') {
            Some(i) => (&partial[..=i], &partial[i + 1..]),
            None => ("", partial),
        };
        let read_root = if dir.is_empty() { Path::new(".") } else { Path::new(dir) };
        let Ok(entries) = std::fs::read_dir(read_root) else {
            return Vec::new();
        };

        let mut items: Vec<CompletionItem> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                if !name.starts_with(prefix) || name.starts_with('.') && !prefix.starts_with('.') {
                    return None;
                }
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                let value = format!("{dir}{name}{}", if is_dir { "/" } else { "" });
                Some(CompletionItem::simple(value))
            })
            .collect();
        items.sort_by(|a, b| a.value.cmp(&b.value));
        items.truncate(FILE_SUGGESTION_CAP);
        items
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
