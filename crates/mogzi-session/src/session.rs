// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use chrono::{DateTime, Utc};
use mogzi_core::SerializableTurn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One durable chat session as written to `session.json`.
///
/// Fields not known to this version are preserved round-trip through the
/// flattened `extra` map, so a newer mogzi can add fields without older
/// builds destroying them on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Time-ordered v7 UUID; doubles as the directory name.
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    /// First user message, truncated to 50 visible columns.
    #[serde(default)]
    pub initial_prompt: String,
    #[serde(default)]
    pub history: Vec<SerializableTurn>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Session {
    /// A fresh session named after its creation instant.
    pub fn new_at(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: now.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            created_at: now,
            last_modified_at: now,
            initial_prompt: String::new(),
            history: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Lightweight listing entry for `/session list`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub id: Uuid,
    pub name: String,
    pub initial_prompt: String,
    pub last_modified_at: DateTime<Utc>,
    pub turn_count: usize,
}

impl From<&Session> for SessionSummary {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            initial_prompt: s.initial_prompt.clone(),
            last_modified_at: s.last_modified_at,
            turn_count: s.history.len(),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_name_is_creation_timestamp() {
        let now = "2026-03-01T09:30:00Z".parse().unwrap();
        let s = Session::new_at(now);
        assert_eq!(s.name, "2026-03-01 09:30:00 UTC");
        assert_eq!(s.created_at, s.last_modified_at);
        assert!(s.history.is_empty());
    }

    #[test]
    fn ids_are_time_ordered() {
        let a = Session::new_at(Utc::now());
        // v7 ordering is only guaranteed across millisecond boundaries.
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = Session::new_at(Utc::now());
        assert!(a.id < b.id, "v7 uuids must sort by creation time");
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let json = r#"{
            "id": "01929ad0-7d77-7d77-8d77-0123456789ab",
            "name": "n",
            "created_at": "2026-01-01T00:00:00Z",
            "last_modified_at": "2026-01-01T00:00:00Z",
            "initial_prompt": "",
            "history": [],
            "pinned": true
        }"#;
        let s: Session = serde_json::from_str(json).unwrap();
        assert_eq!(s.extra.get("pinned"), Some(&serde_json::Value::Bool(true)));
        let out = serde_json::to_value(&s).unwrap();
        assert_eq!(out["pinned"], serde_json::Value::Bool(true));
    }
}
