// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Keyboard event pipeline.
//!
//! One cooperative poll per loop iteration: drains every key event the
//! terminal has buffered, classifies each as a character event (printable,
//! no Ctrl/Alt) or a key event, and matches Ctrl/Alt combinations against
//! the registered bindings first — a matching binding short-circuits
//! normal dispatch.  Events are delivered strictly in arrival order.

use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::warn;

/// Actions that registered key bindings can trigger directly, ahead of the
/// state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundAction {
    /// Cancel the in-flight streaming request (Ctrl+C).  Never terminates
    /// the process.
    CancelStream,
}

#[derive(Debug, Clone, Copy)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
    pub action: BoundAction,
}

/// One classified pipeline event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Printable key with no Ctrl/Alt modifier.
    Char(char),
    /// Control key or modifier combination.
    Key(KeyEvent),
    /// A registered binding matched and short-circuited dispatch.
    Action(BoundAction),
}

/// Rolling pipeline statistics.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub events_processed: u64,
    pub last_event_time: Option<Instant>,
    pub is_running: bool,
    pub binding_count: usize,
}

pub struct KeyboardPipeline {
    bindings: Vec<KeyBinding>,
    stats: PipelineStats,
}

impl Default for KeyboardPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardPipeline {
    pub fn new() -> Self {
        Self { bindings: Vec::new(), stats: PipelineStats::default() }
    }

    pub fn register_binding(&mut self, code: KeyCode, modifiers: KeyModifiers, action: BoundAction) {
        self.bindings.push(KeyBinding { code, modifiers, action });
        self.stats.binding_count = self.bindings.len();
    }

    pub fn set_running(&mut self, running: bool) {
        self.stats.is_running = running;
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Drain all buffered terminal events without blocking.  Read failures
    /// are logged and end the drain for this iteration.
    pub fn poll_events(&mut self) -> Vec<PipelineEvent> {
        let mut out = Vec::new();
        loop {
            match crossterm::event::poll(Duration::ZERO) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!("terminal poll failed: {e}");
                    break;
                }
            }
            let event = match crossterm::event::read() {
                Ok(ev) => ev,
                Err(e) => {
                    warn!("terminal read failed: {e}");
                    break;
                }
            };
            if let Event::Key(key) = event {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                out.push(self.classify(key));
            }
        }
        out
    }

    /// Classify one key event, checking bindings before normal dispatch.
    pub fn classify(&mut self, key: KeyEvent) -> PipelineEvent {
        self.stats.events_processed += 1;
        self.stats.last_event_time = Some(Instant::now());

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        if ctrl || alt {
            if let Some(binding) = self
                .bindings
                .iter()
                .find(|b| b.code == key.code && key.modifiers.contains(b.modifiers))
            {
                return PipelineEvent::Action(binding.action);
            }
        }

        match key.code {
            KeyCode::Char(c) if !ctrl && !alt => PipelineEvent::Char(c),
            _ => PipelineEvent::Key(key),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
