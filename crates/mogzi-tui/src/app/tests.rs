// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! End-to-end scenarios driven through the pipeline-event entry point,
//! without a real terminal attached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use futures::StreamExt;
use mogzi_config::Config;
use mogzi_core::{
    AppService, ChatRequest, FragmentStream, InfoLevel, ResponseFragment, ScriptedService,
    TurnPayload,
};

use crate::keyboard::{BoundAction, PipelineEvent};
use crate::state::StateTag;

use super::{App, AppOptions};

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    }
}

async fn test_app(service: Arc<dyn AppService>) -> (App, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let options = AppOptions {
        chats_root: Some(tmp.path().join("chats")),
        ..AppOptions::default()
    };
    let mut app = App::new(Arc::new(Config::default()), service, options);
    app.startup().await.unwrap();
    (app, tmp)
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.handle_pipeline_event(PipelineEvent::Char(c));
    }
}

fn press(app: &mut App, code: KeyCode) {
    app.handle_pipeline_event(PipelineEvent::Key(key(code)));
}

/// Run pump/apply iterations until the stream is gone and the mediator is
/// quiet (bounded, so a hang fails the test instead of blocking it).
async fn settle(app: &mut App) {
    for _ in 0..100 {
        app.pump_stream().await;
        app.apply_events().await;
        if app.ctx.stream.is_none() && app.ctx.mediator.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("app did not settle");
}

fn payloads(app: &App) -> Vec<&TurnPayload> {
    app.ctx.history.get_for_render().iter().map(|t| &t.payload).collect()
}

/// A service whose stream never yields; used to exercise cancellation.
struct HangingService;

#[async_trait]
impl AppService for HangingService {
    fn name(&self) -> &str {
        "hanging"
    }
    fn model_name(&self) -> &str {
        "hanging-model"
    }
    async fn stream_chat(&self, _req: ChatRequest) -> anyhow::Result<FragmentStream> {
        Ok(futures::stream::pending().boxed())
    }
}

// ── Scenario: empty submission ────────────────────────────────────────────────

#[tokio::test]
async fn empty_submission_is_ignored_entirely() {
    let (mut app, _tmp) = test_app(Arc::new(ScriptedService::new(vec![]))).await;
    press(&mut app, KeyCode::Enter);
    app.apply_events().await;

    assert_eq!(app.states().current(), StateTag::Input);
    assert!(app.ctx.history.is_empty(), "no turn may be appended");
    let session = app.ctx.session.current().await.unwrap();
    assert!(session.history.is_empty(), "no session write may happen");
    assert!(app.ctx.stream.is_none());
}

// ── Scenario: /help ───────────────────────────────────────────────────────────

#[tokio::test]
async fn slash_help_emits_one_info_turn_and_no_stream() {
    let (mut app, _tmp) = test_app(Arc::new(ScriptedService::new(vec![]))).await;
    type_text(&mut app, "/help");
    // Autocomplete opened on "/h..."; Enter must not submit while it is up.
    app.ctx.input.reset_completion();
    press(&mut app, KeyCode::Enter);
    settle(&mut app).await;

    assert_eq!(app.states().current(), StateTag::Input, "no transition to thinking");
    assert!(app.ctx.stream.is_none(), "zero streaming requests");
    let turns = payloads(&app);
    assert_eq!(turns.len(), 1);
    match turns[0] {
        TurnPayload::Info { message, .. } => {
            for name in [
                "/help", "/clear", "/exit", "/quit", "/status", "/tool-approvals",
                "/session clear", "/session list", "/session rename",
            ] {
                assert!(message.contains(name), "help table missing {name}");
            }
        }
        other => panic!("expected info turn, got {other:?}"),
    }
}

// ── Scenario: streaming with tool calls ───────────────────────────────────────

#[tokio::test]
async fn streaming_with_tool_calls_yields_ordered_turns() {
    let payload = r#"<tool_response tool_name="read_file">
        <result status="SUCCESS" absolute_path="a.txt" /></tool_response>"#;
    let script = vec![
        ResponseFragment::TextDelta("Planning.".into()),
        ResponseFragment::ToolCallStart { call_id: "1".into(), tool_name: "read_file".into() },
        ResponseFragment::ToolCallEnd { call_id: "1".into() },
        ResponseFragment::ToolResult { call_id: "1".into(), payload: payload.into() },
        ResponseFragment::TextDelta("Done.".into()),
    ];
    let (mut app, _tmp) = test_app(Arc::new(ScriptedService::new(vec![script]))).await;

    type_text(&mut app, "go");
    press(&mut app, KeyCode::Enter);
    settle(&mut app).await;

    let turns = payloads(&app);
    assert_eq!(turns.len(), 5, "user + four streamed turns, got {turns:?}");
    assert!(matches!(turns[0], TurnPayload::UserText { text, .. } if text == "go"));
    assert!(matches!(turns[1], TurnPayload::AssistantText { text } if text == "Planning."));
    assert!(
        matches!(turns[2], TurnPayload::AssistantToolCall { call_id, tool_name, .. }
            if call_id == "1" && tool_name == "read_file")
    );
    match turns[3] {
        TurnPayload::ToolResult { call_id, info } => {
            assert_eq!(call_id, "1");
            assert_eq!(info.description, "Read a.txt");
        }
        other => panic!("expected tool result, got {other:?}"),
    }
    assert!(matches!(turns[4], TurnPayload::AssistantText { text } if text == "Done."));
    assert_eq!(app.states().current(), StateTag::Input, "stream end returns to input");

    // Conversation turns (not info chrome) are persisted as they complete.
    let session = app.ctx.session.current().await.unwrap();
    assert_eq!(session.history.len(), 5);
}

// ── Scenario: cancel during thinking ──────────────────────────────────────────

#[tokio::test]
async fn ctrl_c_during_thinking_cancels_and_returns_to_input() {
    let (mut app, _tmp) = test_app(Arc::new(HangingService)).await;
    type_text(&mut app, "hi");
    press(&mut app, KeyCode::Enter);
    app.apply_events().await;
    app.pump_stream().await;
    assert_eq!(app.states().current(), StateTag::Thinking);

    app.handle_pipeline_event(PipelineEvent::Action(BoundAction::CancelStream));
    settle(&mut app).await;

    assert_eq!(app.states().current(), StateTag::Input);
    let turns = payloads(&app);
    let cancel_notices = turns
        .iter()
        .filter(|p| matches!(p, TurnPayload::Info { message, .. }
            if message == "Response was cancelled by user"))
        .count();
    assert_eq!(cancel_notices, 1, "exactly one cancellation notice");
    assert!(
        !turns.iter().any(|p| matches!(p, TurnPayload::AssistantText { .. })),
        "no assistant text may be appended"
    );
}

#[tokio::test]
async fn esc_during_thinking_cancels_too() {
    let (mut app, _tmp) = test_app(Arc::new(HangingService)).await;
    type_text(&mut app, "hi");
    press(&mut app, KeyCode::Enter);
    app.apply_events().await;
    app.pump_stream().await;
    assert_eq!(app.states().current(), StateTag::Thinking);

    press(&mut app, KeyCode::Esc);
    settle(&mut app).await;
    assert_eq!(app.states().current(), StateTag::Input);
}

// ── Scenario: autocomplete of a slash command ─────────────────────────────────

#[tokio::test]
async fn tab_completes_session_commands() {
    let (mut app, _tmp) = test_app(Arc::new(ScriptedService::new(vec![]))).await;
    type_text(&mut app, "/se");
    let values: Vec<&str> =
        app.ctx.input.completion_items.iter().map(|i| i.value.as_str()).collect();
    assert_eq!(values, vec!["/session clear", "/session list", "/session rename"]);

    press(&mut app, KeyCode::Tab);
    assert_eq!(app.ctx.input.buffer, "/session clear");
    assert_eq!(app.ctx.input.mode, crate::input::InputMode::Normal);
}

// ── Command effects against the store ─────────────────────────────────────────

#[tokio::test]
async fn clear_command_leaves_disk_session_intact() {
    let script = vec![ResponseFragment::TextDelta("reply".into())];
    let (mut app, _tmp) = test_app(Arc::new(ScriptedService::new(vec![script]))).await;
    type_text(&mut app, "hello");
    press(&mut app, KeyCode::Enter);
    settle(&mut app).await;
    assert_eq!(app.ctx.session.current().await.unwrap().history.len(), 2);

    type_text(&mut app, "/clear");
    app.ctx.input.reset_completion();
    press(&mut app, KeyCode::Enter);
    settle(&mut app).await;

    // Memory holds only the confirmation notice; disk history is untouched.
    let turns = payloads(&app);
    assert_eq!(turns.len(), 1);
    assert!(matches!(turns[0], TurnPayload::Info { message, .. }
        if message == "chat history cleared"));
    assert_eq!(app.ctx.session.current().await.unwrap().history.len(), 2);
}

#[tokio::test]
async fn session_clear_command_empties_the_disk_session() {
    let script = vec![ResponseFragment::TextDelta("reply".into())];
    let (mut app, _tmp) = test_app(Arc::new(ScriptedService::new(vec![script]))).await;
    type_text(&mut app, "hello");
    press(&mut app, KeyCode::Enter);
    settle(&mut app).await;

    let id_before = app.ctx.session.current().await.unwrap().id;
    type_text(&mut app, "/session clear");
    app.ctx.input.reset_completion();
    press(&mut app, KeyCode::Enter);
    settle(&mut app).await;

    let session = app.ctx.session.current().await.unwrap();
    assert_eq!(session.id, id_before, "session id is preserved");
    assert!(session.history.is_empty());
    assert!(session.initial_prompt.is_empty());
}

#[tokio::test]
async fn session_rename_command_updates_store_and_footer_name() {
    let (mut app, _tmp) = test_app(Arc::new(ScriptedService::new(vec![]))).await;
    type_text(&mut app, "/session rename my project");
    app.ctx.input.reset_completion();
    press(&mut app, KeyCode::Enter);
    settle(&mut app).await;

    assert_eq!(app.ctx.session_name, "my project");
    assert_eq!(app.ctx.session.current().await.unwrap().name, "my project");
}

#[tokio::test]
async fn unknown_command_emits_the_hint_turn() {
    let (mut app, _tmp) = test_app(Arc::new(ScriptedService::new(vec![]))).await;
    type_text(&mut app, "/bogus");
    app.ctx.input.reset_completion();
    press(&mut app, KeyCode::Enter);
    settle(&mut app).await;

    let turns = payloads(&app);
    assert_eq!(turns.len(), 1);
    assert!(matches!(turns[0], TurnPayload::Info { message, level: InfoLevel::Info }
        if message == "Unknown command: /bogus. Tip: Type /help to see available commands."));
    assert!(app.ctx.stream.is_none());
}

#[tokio::test]
async fn tool_approvals_selection_flow_updates_mode() {
    let (mut app, _tmp) = test_app(Arc::new(ScriptedService::new(vec![]))).await;
    type_text(&mut app, "/tool-approvals");
    app.ctx.input.reset_completion();
    press(&mut app, KeyCode::Enter);
    settle(&mut app).await;
    assert_eq!(app.ctx.input.mode, crate::input::InputMode::UserSelection);

    press(&mut app, KeyCode::Down); // readonly → all
    press(&mut app, KeyCode::Enter);
    settle(&mut app).await;

    assert_eq!(app.ctx.tool_approvals, mogzi_config::ToolApprovals::All);
    assert_eq!(app.ctx.input.mode, crate::input::InputMode::Normal);
}

#[tokio::test]
async fn mentioned_image_is_attached_and_externalized() {
    let script = vec![ResponseFragment::TextDelta("looks fine".into())];
    let (mut app, tmp) = test_app(Arc::new(ScriptedService::new(vec![script]))).await;
    let image = tmp.path().join("shot.png");
    std::fs::write(&image, [0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a]).unwrap();

    type_text(&mut app, &format!("what is wrong in @{}", image.display()));
    // The @mention opens path completion; close it so Enter submits.
    app.ctx.input.reset_completion();
    press(&mut app, KeyCode::Enter);
    settle(&mut app).await;

    let session = app.ctx.session.current().await.unwrap();
    let stored = match &session.history[0] {
        mogzi_core::SerializableTurn::UserText { attachments, .. } => attachments.clone(),
        other => panic!("expected user turn, got {other:?}"),
    };
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].media_type, "image/png");
    assert!(stored[0].path.starts_with("attachments/0-"));
    assert!(stored[0].path.ends_with(".png"));
}

#[tokio::test]
async fn exit_command_requests_shutdown() {
    let (mut app, _tmp) = test_app(Arc::new(ScriptedService::new(vec![]))).await;
    type_text(&mut app, "/exit");
    app.ctx.input.reset_completion();
    press(&mut app, KeyCode::Enter);
    app.apply_events().await;
    assert!(app.ctx.shutdown);
}
