// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Durable session store.
//!
//! Layout: `<chats root>/<uuid-v7>/session.json`, with attachments under
//! `attachments/` next to it.  Saves go through a temp-file-and-rename so a
//! crash mid-write never leaves a truncated `session.json`; unreadable
//! session files are quarantined as `session.corrupted[.N]` and replaced by
//! a fresh session.  All writes are serialized behind one async mutex.

use std::path::{Path, PathBuf};

use mogzi_core::{Attachment, ConversationTurn, SerializableTurn, StoredAttachment, TurnPayload};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};
use unicode_width::UnicodeWidthChar;
use uuid::Uuid;

use crate::session::{Session, SessionSummary};

/// Visible columns kept of the first user message.
const INITIAL_PROMPT_COLUMNS: usize = 50;

const SESSION_FILE: &str = "session.json";
const TMP_FILE: &str = "session.tmp";
const CORRUPTED_FILE: &str = "session.corrupted";
const ATTACHMENTS_DIR: &str = "attachments";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session io: {0}")]
    Io(#[from] std::io::Error),
    #[error("session parse: {0}")]
    Parse(String),
    #[error("attachment write failed: {0}")]
    Attachment(String),
    #[error("session name must not be empty")]
    InvalidName,
    #[error("no session found with id {0}")]
    NotFound(Uuid),
    #[error("no active session")]
    NoSession,
}

pub struct SessionManager {
    chats_root: PathBuf,
    current: Mutex<Option<Session>>,
}

impl SessionManager {
    pub fn new(chats_root: impl Into<PathBuf>) -> Self {
        Self { chats_root: chats_root.into(), current: Mutex::new(None) }
    }

    fn session_dir(&self, id: Uuid) -> PathBuf {
        self.chats_root.join(id.to_string())
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Create a fresh session (v7 id, timestamp name) and persist immediately.
    pub async fn create_new(&self) -> Result<Session, SessionError> {
        let mut session = Session::new_at(chrono::Utc::now());
        save_to_dir(&self.session_dir(session.id), &mut session).await?;
        let mut guard = self.current.lock().await;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Load a session by id, replacing the current one atomically.
    ///
    /// A missing directory is an error; an unreadable `session.json` is
    /// quarantined and silently replaced by a fresh session.
    pub async fn load(&self, id: Uuid) -> Result<Session, SessionError> {
        let dir = self.session_dir(id);
        let path = dir.join(SESSION_FILE);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SessionError::NotFound(id));
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Session>(&text) {
            Ok(session) => {
                let mut guard = self.current.lock().await;
                *guard = Some(session.clone());
                Ok(session)
            }
            Err(e) => {
                error!(session_id = %id, "session.json unreadable, quarantining: {e}");
                quarantine(&dir).await?;
                self.create_new().await
            }
        }
    }

    /// Persist the current session: bump `last_modified_at`, write
    /// `session.tmp`, atomically rename over `session.json`.
    pub async fn save_current(&self) -> Result<(), SessionError> {
        let mut guard = self.current.lock().await;
        let session = guard.as_mut().ok_or(SessionError::NoSession)?;
        save_to_dir(&self.session_dir(session.id), session).await
    }

    /// Empty history and initial prompt, keeping the session id; persists.
    pub async fn clear_current(&self) -> Result<(), SessionError> {
        let mut guard = self.current.lock().await;
        let session = guard.as_mut().ok_or(SessionError::NoSession)?;
        session.history.clear();
        session.initial_prompt.clear();
        save_to_dir(&self.session_dir(session.id), session).await
    }

    /// Rename the current session; the name is trimmed and must be non-empty.
    pub async fn rename(&self, name: &str) -> Result<(), SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidName);
        }
        let mut guard = self.current.lock().await;
        let session = guard.as_mut().ok_or(SessionError::NoSession)?;
        session.name = name.to_string();
        save_to_dir(&self.session_dir(session.id), session).await
    }

    /// Append one turn, derive the initial prompt from the first user text,
    /// externalize inline attachments, and persist.
    ///
    /// Attachment write failures fail the whole call without touching the
    /// in-memory session; a failed save leaves the appended turn in memory so
    /// the next append retries the write.
    pub async fn add_message(&self, turn: &ConversationTurn) -> Result<(), SessionError> {
        let mut guard = self.current.lock().await;
        let session = guard.as_mut().ok_or(SessionError::NoSession)?;
        let dir = self.session_dir(session.id);

        let stored = match &turn.payload {
            TurnPayload::UserText { attachments, .. } if !attachments.is_empty() => {
                externalize_attachments(&dir, session.history.len(), attachments).await?
            }
            _ => Vec::new(),
        };

        if session.initial_prompt.is_empty() {
            if let TurnPayload::UserText { text, .. } = &turn.payload {
                session.initial_prompt = truncate_visible(text, INITIAL_PROMPT_COLUMNS);
            }
        }
        session.history.push(SerializableTurn::from_turn(turn, stored));
        save_to_dir(&dir, session).await
    }

    /// Enumerate all sessions under the chats root, most recent first.
    /// Directories with a missing or corrupt `session.json` are skipped.
    pub async fn list(&self) -> Result<Vec<SessionSummary>, SessionError> {
        let mut out: Vec<SessionSummary> = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.chats_root).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match tokio::fs::read_to_string(path.join(SESSION_FILE)).await {
                Ok(text) => match serde_json::from_str::<Session>(&text) {
                    Ok(session) => out.push(SessionSummary::from(&session)),
                    Err(e) => debug!(dir = %path.display(), "skipping unparseable session: {e}"),
                },
                Err(e) => debug!(dir = %path.display(), "skipping unreadable session: {e}"),
            }
        }
        out.sort_by(|a, b| {
            b.last_modified_at
                .cmp(&a.last_modified_at)
                .then(b.id.cmp(&a.id))
        });
        Ok(out)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// Snapshot of the current session.
    pub async fn current(&self) -> Option<Session> {
        self.current.lock().await.clone()
    }

    /// Rebuild in-memory conversation turns from the current session.
    pub async fn history_turns(&self) -> Vec<ConversationTurn> {
        match self.current.lock().await.as_ref() {
            Some(s) => s.history.iter().cloned().map(SerializableTurn::into_turn).collect(),
            None => Vec::new(),
        }
    }
}

// ── Disk helpers ──────────────────────────────────────────────────────────────

/// Write `session` under `dir` atomically.  The target file is never
/// truncated in place; on any failure the temp file is removed and the
/// previous `session.json` stays intact.
async fn save_to_dir(dir: &Path, session: &mut Session) -> Result<(), SessionError> {
    session.last_modified_at = chrono::Utc::now();
    tokio::fs::create_dir_all(dir).await?;

    let json = serde_json::to_string_pretty(session)
        .map_err(|e| SessionError::Parse(e.to_string()))?;
    let tmp = dir.join(TMP_FILE);
    let target = dir.join(SESSION_FILE);

    if let Err(e) = tokio::fs::write(&tmp, json.as_bytes()).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&tmp, &target).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

/// Rename a bad `session.json` to `session.corrupted`, appending `.N` when
/// earlier quarantined versions already exist.
async fn quarantine(dir: &Path) -> Result<(), SessionError> {
    let source = dir.join(SESSION_FILE);
    let mut target = dir.join(CORRUPTED_FILE);
    let mut n = 0u32;
    while tokio::fs::try_exists(&target).await.unwrap_or(false) {
        n += 1;
        target = dir.join(format!("{CORRUPTED_FILE}.{n}"));
    }
    warn!(from = %source.display(), to = %target.display(), "quarantining session file");
    tokio::fs::rename(&source, &target).await?;
    Ok(())
}

/// Write inline attachments to `attachments/{turn_index}-{hash}.{ext}` and
/// return the stored references.  Already-stored attachments pass through.
async fn externalize_attachments(
    dir: &Path,
    turn_index: usize,
    attachments: &[Attachment],
) -> Result<Vec<StoredAttachment>, SessionError> {
    let mut stored = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        match attachment {
            Attachment::Stored { path, media_type } => {
                stored.push(StoredAttachment { path: path.clone(), media_type: media_type.clone() });
            }
            Attachment::Inline { data, media_type } => {
                let hash = hex::encode(&Sha256::digest(data)[..6]);
                let rel = format!(
                    "{ATTACHMENTS_DIR}/{turn_index}-{hash}.{}",
                    extension_for(media_type)
                );
                let attachments_dir = dir.join(ATTACHMENTS_DIR);
                tokio::fs::create_dir_all(&attachments_dir)
                    .await
                    .map_err(|e| SessionError::Attachment(e.to_string()))?;
                tokio::fs::write(dir.join(&rel), data)
                    .await
                    .map_err(|e| SessionError::Attachment(e.to_string()))?;
                stored.push(StoredAttachment { path: rel, media_type: media_type.clone() });
            }
        }
    }
    Ok(stored)
}

fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        "text/plain" => "txt",
        _ => "bin",
    }
}

/// Truncate to at most `columns` visible terminal columns, appending an
/// ellipsis when anything was cut.  Newlines collapse to spaces first.
fn truncate_visible(text: &str, columns: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    let mut width = 0usize;
    let mut out = String::new();
    for c in flat.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mogzi_core::InfoLevel;

    fn user_turn(id: u64, text: &str) -> ConversationTurn {
        ConversationTurn {
            turn_id: id,
            timestamp: Utc::now(),
            payload: TurnPayload::UserText { text: text.into(), attachments: vec![] },
        }
    }

    fn manager() -> (tempfile::TempDir, SessionManager) {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = SessionManager::new(tmp.path().join("chats"));
        (tmp, mgr)
    }

    // ── Create / save / load ──────────────────────────────────────────────────

    #[tokio::test]
    async fn create_new_persists_immediately() {
        let (_tmp, mgr) = manager();
        let s = mgr.create_new().await.unwrap();
        let path = mgr.session_dir(s.id).join(SESSION_FILE);
        assert!(path.is_file());
        let loaded: Session =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(loaded.id, s.id);
    }

    #[tokio::test]
    async fn save_then_load_round_trips_ignoring_last_modified() {
        let (_tmp, mgr) = manager();
        let created = mgr.create_new().await.unwrap();
        mgr.add_message(&user_turn(0, "first message")).await.unwrap();
        mgr.rename("my session").await.unwrap();
        let before = mgr.current().await.unwrap();

        let loaded = mgr.load(created.id).await.unwrap();
        assert_eq!(loaded.id, before.id);
        assert_eq!(loaded.name, "my session");
        assert_eq!(loaded.initial_prompt, before.initial_prompt);
        assert_eq!(loaded.history, before.history);
    }

    #[tokio::test]
    async fn load_of_unknown_id_is_not_found() {
        let (_tmp, mgr) = manager();
        let err = mgr.load(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }

    #[tokio::test]
    async fn save_never_leaves_a_tmp_file_behind() {
        let (_tmp, mgr) = manager();
        let s = mgr.create_new().await.unwrap();
        mgr.save_current().await.unwrap();
        assert!(!mgr.session_dir(s.id).join(TMP_FILE).exists());
    }

    // ── Corruption quarantine ─────────────────────────────────────────────────

    #[tokio::test]
    async fn corrupted_session_is_quarantined_and_replaced() {
        let (_tmp, mgr) = manager();
        let s = mgr.create_new().await.unwrap();
        let dir = mgr.session_dir(s.id);
        std::fs::write(dir.join(SESSION_FILE), b"{not json").unwrap();

        let fresh = mgr.load(s.id).await.unwrap();
        assert_ne!(fresh.id, s.id, "quarantine must yield a fresh session id");
        assert!(fresh.history.is_empty());
        assert!(dir.join(CORRUPTED_FILE).exists());
    }

    #[tokio::test]
    async fn repeated_corruption_appends_numeric_suffix() {
        let (_tmp, mgr) = manager();
        let s = mgr.create_new().await.unwrap();
        let dir = mgr.session_dir(s.id);
        std::fs::write(dir.join(SESSION_FILE), b"bad").unwrap();
        mgr.load(s.id).await.unwrap();
        std::fs::write(dir.join(SESSION_FILE), b"bad again").unwrap();
        mgr.load(s.id).await.unwrap();
        assert!(dir.join(CORRUPTED_FILE).exists());
        assert!(dir.join(format!("{CORRUPTED_FILE}.1")).exists());
    }

    // ── History / initial prompt ──────────────────────────────────────────────

    #[tokio::test]
    async fn persisted_history_len_matches_appended_turns() {
        let (_tmp, mgr) = manager();
        let s = mgr.create_new().await.unwrap();
        for i in 0..5 {
            mgr.add_message(&user_turn(i, &format!("msg {i}"))).await.unwrap();
        }
        let loaded = mgr.load(s.id).await.unwrap();
        assert_eq!(loaded.history.len(), 5);
    }

    #[tokio::test]
    async fn initial_prompt_set_from_first_user_text_only() {
        let (_tmp, mgr) = manager();
        mgr.create_new().await.unwrap();
        let info = ConversationTurn {
            turn_id: 0,
            timestamp: Utc::now(),
            payload: TurnPayload::Info { message: "welcome".into(), level: InfoLevel::Info },
        };
        mgr.add_message(&info).await.unwrap();
        mgr.add_message(&user_turn(1, "the real question")).await.unwrap();
        mgr.add_message(&user_turn(2, "a later question")).await.unwrap();
        let s = mgr.current().await.unwrap();
        assert_eq!(s.initial_prompt, "the real question");
    }

    #[tokio::test]
    async fn initial_prompt_is_truncated_to_fifty_columns() {
        let (_tmp, mgr) = manager();
        mgr.create_new().await.unwrap();
        let long = "x".repeat(80);
        mgr.add_message(&user_turn(0, &long)).await.unwrap();
        let s = mgr.current().await.unwrap();
        assert_eq!(s.initial_prompt.chars().count(), 51);
        assert!(s.initial_prompt.ends_with('…'));
    }

    // ── Clear / rename ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn clear_current_empties_history_and_prompt_but_keeps_id() {
        let (_tmp, mgr) = manager();
        let s = mgr.create_new().await.unwrap();
        mgr.add_message(&user_turn(0, "hello")).await.unwrap();
        mgr.clear_current().await.unwrap();
        let loaded = mgr.load(s.id).await.unwrap();
        assert_eq!(loaded.id, s.id);
        assert!(loaded.history.is_empty());
        assert!(loaded.initial_prompt.is_empty());
    }

    #[tokio::test]
    async fn rename_persists_trimmed_name() {
        let (_tmp, mgr) = manager();
        let s = mgr.create_new().await.unwrap();
        mgr.rename("  spaced out  ").await.unwrap();
        let loaded = mgr.load(s.id).await.unwrap();
        assert_eq!(loaded.name, "spaced out");
    }

    #[tokio::test]
    async fn rename_to_empty_is_rejected() {
        let (_tmp, mgr) = manager();
        mgr.create_new().await.unwrap();
        assert!(matches!(mgr.rename("   ").await, Err(SessionError::InvalidName)));
    }

    // ── Listing ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn list_returns_sessions_most_recent_first() {
        let (_tmp, mgr) = manager();
        let a = mgr.create_new().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let b = mgr.create_new().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        // Touch session `a` so it becomes the most recent.
        mgr.load(a.id).await.unwrap();
        mgr.add_message(&user_turn(0, "bump")).await.unwrap();

        let listed = mgr.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, a.id);
        assert_eq!(listed[1].id, b.id);
    }

    #[tokio::test]
    async fn list_skips_corrupt_directories() {
        let (_tmp, mgr) = manager();
        let a = mgr.create_new().await.unwrap();
        let bad_dir = mgr.chats_root.join("not-a-session");
        std::fs::create_dir_all(&bad_dir).unwrap();
        std::fs::write(bad_dir.join(SESSION_FILE), b"garbage").unwrap();

        let listed = mgr.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, a.id);
    }

    #[tokio::test]
    async fn list_of_missing_root_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = SessionManager::new(tmp.path().join("nonexistent"));
        assert!(mgr.list().await.unwrap().is_empty());
    }

    // ── Attachments ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn inline_attachments_are_externalized_by_turn_and_hash() {
        let (_tmp, mgr) = manager();
        let s = mgr.create_new().await.unwrap();
        let turn = ConversationTurn {
            turn_id: 0,
            timestamp: Utc::now(),
            payload: TurnPayload::UserText {
                text: "see attached".into(),
                attachments: vec![Attachment::Inline {
                    data: vec![0x89, 0x50, 0x4e, 0x47],
                    media_type: "image/png".into(),
                }],
            },
        };
        mgr.add_message(&turn).await.unwrap();

        let session = mgr.current().await.unwrap();
        let stored = match &session.history[0] {
            SerializableTurn::UserText { attachments, .. } => attachments.clone(),
            other => panic!("unexpected turn: {other:?}"),
        };
        assert_eq!(stored.len(), 1);
        assert!(stored[0].path.starts_with("attachments/0-"));
        assert!(stored[0].path.ends_with(".png"));
        assert!(mgr.session_dir(s.id).join(&stored[0].path).is_file());
    }
}
