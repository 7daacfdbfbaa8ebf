// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! On-disk locations of durable state.
//!
//! Everything lives under `<home>/.mogzi/`: chat sessions in `chats/`
//! (one directory per session id), daily log files in `logs/`.

use std::path::PathBuf;

/// Root of all durable mogzi state.
pub fn mogzi_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mogzi")
}

/// Directory holding one subdirectory per session.
pub fn chats_dir() -> PathBuf {
    mogzi_home().join("chats")
}

/// Directory holding daily-rolled log files.
pub fn logs_dir() -> PathBuf {
    mogzi_home().join("logs")
}
