// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Top-level application state and the cooperative event loop.
//!
//! One `TuiContext` exists per run; it aggregates the singletons.  The loop
//! polls the keyboard, drains streaming fragments, applies mediator events,
//! redraws the dynamic region, and sleeps ~8 ms — every suspension point is
//! explicit.

pub(crate) mod events;
pub(crate) mod stream;

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use mogzi_config::{Config, Profile, ToolApprovals};
use mogzi_core::{AppService, HistoryManager, InfoLevel, TurnPayload};
use mogzi_session::SessionManager;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::autocomplete::{AutocompleteManager, FilePathProvider, SlashCommandProvider};
use crate::commands::{CommandContext, SlashCommandProcessor};
use crate::components::ComponentManager;
use crate::input::InputContext;
use crate::keyboard::{BoundAction, KeyboardPipeline, PipelineEvent};
use crate::mediator::{AppEvent, Mediator};
use crate::render::{render_turn, RenderContext};
use crate::selection::{
    SelectionEffect, SelectionProvider, SessionListProvider, ToolApprovalsProvider,
    UserSelectionManager,
};
use crate::state::StateManager;
use crate::terminal::ScrollbackTerminal;
use crate::theme::Theme;

use stream::ActiveStream;

/// Idle poll interval of the cooperative loop.
const POLL_INTERVAL: Duration = Duration::from_millis(8);

/// Options passed when constructing the app.
pub struct AppOptions {
    /// Load this session instead of creating a new one.
    pub session_id: Option<Uuid>,
    /// Submit this prompt immediately after startup.
    pub initial_prompt: Option<String>,
    /// `--profile` override; default comes from the config.
    pub profile: Option<String>,
    /// `--tool-approvals` override.
    pub tool_approvals: Option<ToolApprovals>,
    /// Session store root; defaults to `~/.mogzi/chats`.
    pub chats_root: Option<PathBuf>,
    /// Binary version string shown by `/status`.
    pub version: String,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            session_id: None,
            initial_prompt: None,
            profile: None,
            tool_approvals: None,
            chats_root: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// The singletons of one run, aggregated.  States and mediator handlers
/// receive `&mut TuiContext`; components see a per-frame [`RenderContext`]
/// built from it.
pub struct TuiContext {
    pub config: Arc<Config>,
    pub profile: Profile,
    pub profile_name: String,
    pub tool_approvals: ToolApprovals,
    pub history: HistoryManager,
    pub session: SessionManager,
    pub input: InputContext,
    pub mediator: Mediator,
    pub processor: SlashCommandProcessor,
    pub autocomplete: AutocompleteManager,
    pub selection: UserSelectionManager,
    pub session_list_provider: Arc<SessionListProvider>,
    pub service: Arc<dyn AppService>,
    pub(crate) stream: Option<ActiveStream>,
    pub tool_progress: Option<String>,
    pub session_name: String,
    pub model_display: String,
    pub version: String,
    pub shutdown: bool,
}

impl TuiContext {
    /// Re-evaluate autocomplete triggers after a buffer mutation.
    pub fn refresh_autocomplete(&mut self) {
        let Self { autocomplete, input, .. } = self;
        autocomplete.update(input);
    }

    /// Accept the highlighted autocomplete suggestion (Tab/Enter).
    pub fn accept_autocomplete(&mut self) {
        let Self { autocomplete, input, .. } = self;
        autocomplete.accept(input);
    }

    /// Accept the highlighted user-selection item and forward its effect.
    pub fn accept_selection(&mut self) {
        let effect = {
            let Self { selection, input, .. } = self;
            selection.accept(input)
        };
        match effect {
            Some(SelectionEffect::SetToolApprovals(mode)) => {
                self.mediator.notify(AppEvent::SetToolApprovals(mode));
            }
            Some(SelectionEffect::LoadSession(id)) => {
                self.mediator.notify(AppEvent::LoadSession(id));
            }
            None => {}
        }
    }

    pub fn cancel_selection(&mut self) {
        let Self { selection, input, .. } = self;
        selection.cancel(input);
    }

    /// Snapshot handed to slash commands.
    pub fn command_context(&self) -> CommandContext {
        CommandContext {
            profile_name: self.profile_name.clone(),
            provider: self.profile.provider.clone(),
            model: self.profile.model.clone(),
            tool_approvals: self.tool_approvals,
            session_name: self.session_name.clone(),
            working_dir: std::env::current_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "?".into()),
            version: self.version.clone(),
            platform: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

pub struct App {
    /// `None` until [`App::attach_terminal`]; tests run without one.
    terminal: Option<ScrollbackTerminal>,
    keyboard: KeyboardPipeline,
    states: StateManager,
    components: ComponentManager,
    theme: Theme,
    started: Instant,
    initial_prompt: Option<String>,
    session_id: Option<Uuid>,
    pub ctx: TuiContext,
}

impl App {
    pub fn new(config: Arc<Config>, service: Arc<dyn AppService>, options: AppOptions) -> Self {
        let profile_name = config.profile_name(options.profile.as_deref());
        let profile = config.profile(options.profile.as_deref());
        let tool_approvals = options.tool_approvals.unwrap_or(config.tool_approvals);
        let chats_root = options.chats_root.unwrap_or_else(mogzi_session::chats_dir);

        let processor = SlashCommandProcessor::with_builtins();
        let autocomplete = AutocompleteManager::new(vec![
            Box::new(SlashCommandProvider::new(&processor)),
            Box::new(FilePathProvider),
        ]);
        let session_list_provider =
            Arc::new(SessionListProvider::new(config.session_list_limit));
        let selection = UserSelectionManager::new(vec![
            Arc::new(ToolApprovalsProvider) as Arc<dyn SelectionProvider>,
            session_list_provider.clone(),
        ]);

        let mut keyboard = KeyboardPipeline::new();
        keyboard.register_binding(
            crossterm::event::KeyCode::Char('c'),
            crossterm::event::KeyModifiers::CONTROL,
            BoundAction::CancelStream,
        );

        let model_display = format!("{}/{}", profile.provider, profile.model);
        let ctx = TuiContext {
            config,
            profile,
            profile_name,
            tool_approvals,
            history: HistoryManager::new(),
            session: SessionManager::new(chats_root),
            input: InputContext::new(),
            mediator: Mediator::new(),
            processor,
            autocomplete,
            selection,
            session_list_provider,
            service,
            stream: None,
            tool_progress: None,
            session_name: String::new(),
            model_display,
            version: options.version,
            shutdown: false,
        };

        Self {
            terminal: None,
            keyboard,
            states: StateManager::new(),
            components: ComponentManager::with_defaults(),
            theme: Theme::default(),
            started: Instant::now(),
            initial_prompt: options.initial_prompt,
            session_id: options.session_id,
            ctx,
        }
    }

    /// Create or load the session.  A missing `--session` id is a startup
    /// error; a corrupt one is quarantined by the store and silently
    /// replaced.
    pub async fn startup(&mut self) -> anyhow::Result<()> {
        let session = match self.session_id {
            Some(id) => self.ctx.session.load(id).await.context("loading session")?,
            None => self.ctx.session.create_new().await.context("creating session")?,
        };
        self.ctx.session_name = session.name.clone();
        let turns = self.ctx.session.history_turns().await;
        if !turns.is_empty() {
            self.ctx.history.replace(turns);
        }
        debug!(session_id = %session.id, "session ready");
        Ok(())
    }

    /// Take over the terminal and replay any loaded history into the static
    /// region.
    pub fn attach_terminal(&mut self) -> anyhow::Result<()> {
        let mut terminal =
            ScrollbackTerminal::initialize().context("initializing terminal")?;
        let width = terminal.width();
        for turn in self.ctx.history.get_for_render() {
            terminal.write_static(&render_turn(turn, &self.theme, width));
        }
        self.terminal = Some(terminal);
        Ok(())
    }

    /// The cooperative event loop.  Returns when a shutdown is requested.
    pub async fn run(mut self) -> anyhow::Result<()> {
        self.keyboard.set_running(true);
        if let Some(prompt) = self.initial_prompt.take() {
            self.ctx.mediator.notify(AppEvent::SubmitUser(prompt));
        }

        loop {
            for event in self.keyboard.poll_events() {
                self.handle_pipeline_event(event);
            }
            self.pump_stream().await;
            self.apply_events().await;
            if self.ctx.shutdown {
                break;
            }
            self.render_frame();
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        self.keyboard.set_running(false);
        if let Some(terminal) = &mut self.terminal {
            terminal.shutdown();
        }
        Ok(())
    }

    pub(crate) fn handle_pipeline_event(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::Action(BoundAction::CancelStream) => {
                self.ctx.mediator.notify(AppEvent::CancelStream);
            }
            PipelineEvent::Char(c) => self.states.handle_char(&mut self.ctx, c),
            PipelineEvent::Key(key) => self.states.handle_key(&mut self.ctx, key),
        }
    }

    /// Drain the mediator until it settles; events may enqueue follow-ups.
    pub(crate) async fn apply_events(&mut self) {
        loop {
            let events = self.ctx.mediator.drain();
            if events.is_empty() {
                break;
            }
            for event in events {
                self.apply_event(event).await;
            }
        }
    }

    /// Append a completed turn: history, static region, durable store.
    ///
    /// Info turns are session-local notices and are not persisted; this is
    /// also what keeps `/clear` strictly in-memory.  A failed save keeps the
    /// turn in memory (the next append retries) and surfaces one
    /// non-persisted error notice — never a second save attempt.
    pub(crate) async fn commit_payload(&mut self, payload: TurnPayload) {
        if matches!(payload, TurnPayload::AssistantText { .. }) {
            self.ctx.history.clear_pending();
        }
        let persist = !matches!(payload, TurnPayload::Info { .. });
        let turn = self.ctx.history.add_payload(payload).clone();
        self.write_turn_static(&turn);

        if persist {
            if let Err(e) = self.ctx.session.add_message(&turn).await {
                warn!("session save failed: {e}");
                let notice = self
                    .ctx
                    .history
                    .add_info("failed to save session", InfoLevel::Error)
                    .clone();
                self.write_turn_static(&notice);
            }
        }
    }

    fn write_turn_static(&mut self, turn: &mogzi_core::ConversationTurn) {
        if let Some(terminal) = &mut self.terminal {
            let width = terminal.width();
            terminal.write_static(&render_turn(turn, &self.theme, width));
        }
    }

    /// Redraw the dynamic region.  A panic inside composition drops the
    /// frame and the loop continues.
    pub(crate) fn render_frame(&mut self) {
        let (width, height) = match &self.terminal {
            Some(t) => (t.width(), t.dynamic_height()),
            None => return,
        };
        let frame = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let rctx = RenderContext {
                width,
                height,
                theme: &self.theme,
                state: self.states.current(),
                input: &self.ctx.input,
                now_ms: self.started.elapsed().as_millis() as u64,
                tool_progress: self.ctx.tool_progress.as_deref(),
                pending_text: self.ctx.history.pending_text(),
                session_name: &self.ctx.session_name,
                model_display: &self.ctx.model_display,
                tool_approvals: self.ctx.tool_approvals,
                history_is_empty: self.ctx.history.is_empty(),
            };
            let state_content = self.states.render_dynamic(&rctx);
            self.components.compose(&rctx, state_content)
        }));
        match frame {
            Ok(text) => {
                if let Some(terminal) = &mut self.terminal {
                    terminal.set_dynamic(text);
                }
            }
            Err(_) => error!("render panicked; frame dropped"),
        }
    }

    /// Wipe the screen (used by `/clear` and session switches) and replay
    /// in-memory history.
    pub(crate) fn reset_screen(&mut self) {
        let Some(terminal) = &mut self.terminal else { return };
        terminal.reset();
        let width = terminal.width();
        let turns: Vec<_> = self.ctx.history.get_for_render().to_vec();
        for turn in &turns {
            terminal.write_static(&render_turn(turn, &self.theme, width));
        }
    }

    #[cfg(test)]
    pub(crate) fn states(&self) -> &StateManager {
        &self.states
    }
}

#[cfg(test)]
mod tests;
