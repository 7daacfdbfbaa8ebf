// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Component registry and frame composition.
//!
//! Components are pure: they read the per-frame [`RenderContext`] and return
//! renderable text, never performing I/O.  The manager stacks the visible
//! ones top-to-bottom (a flex column) around the active state's dynamic
//! content, which the state machine renders itself.

mod panels;

pub use panels::{input_panel, progress_panel};

use ratatui::text::Text;

use crate::render::RenderContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Welcome,
    Autocomplete,
    UserSelection,
    Footer,
}

/// A leaf renderer in the dynamic region.
pub trait Component {
    fn kind(&self) -> ComponentKind;
    fn visible(&self, ctx: &RenderContext) -> bool;
    fn render(&self, ctx: &RenderContext) -> Text<'static>;
}

pub struct ComponentManager {
    components: Vec<Box<dyn Component>>,
}

impl Default for ComponentManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ComponentManager {
    /// Registry with the standard panels in display order.
    pub fn with_defaults() -> Self {
        Self {
            components: vec![
                Box::new(panels::WelcomeComponent),
                Box::new(panels::AutocompleteComponent),
                Box::new(panels::UserSelectionComponent),
                Box::new(panels::FooterComponent),
            ],
        }
    }

    pub fn register(&mut self, component: Box<dyn Component>) {
        self.components.push(component);
    }

    /// Arrange one frame as a flex column: welcome panel, the active state's
    /// dynamic content, the overlay lists, then the footer.
    pub fn compose(&self, ctx: &RenderContext, state_content: Text<'static>) -> Text<'static> {
        let mut lines = Vec::new();
        self.render_kind(ComponentKind::Welcome, ctx, &mut lines);
        lines.extend(state_content.lines);
        self.render_kind(ComponentKind::Autocomplete, ctx, &mut lines);
        self.render_kind(ComponentKind::UserSelection, ctx, &mut lines);
        self.render_kind(ComponentKind::Footer, ctx, &mut lines);
        Text::from(lines)
    }

    fn render_kind(
        &self,
        kind: ComponentKind,
        ctx: &RenderContext,
        lines: &mut Vec<ratatui::text::Line<'static>>,
    ) {
        for component in &self.components {
            if component.kind() == kind && component.visible(ctx) {
                lines.extend(component.render(ctx).lines);
            }
        }
    }
}
