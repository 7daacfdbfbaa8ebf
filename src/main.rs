// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;
mod headless;

use std::io::{IsTerminal, Read};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use mogzi_config::{Profile, ToolApprovals};
use mogzi_core::{AppService, ScriptedService};
use mogzi_tui::{format_status, App, AppOptions, CommandContext};
use tracing_subscriber::{filter::EnvFilter, prelude::*};

/// Log files older than this many days are deleted at startup.
const LOG_RETENTION_DAYS: i64 = 30;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = cli::parse();
    match run(cli).await {
        Ok(()) => {}
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: cli::Cli) -> anyhow::Result<()> {
    if cli.version {
        println!("mogzi {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let tool_approvals = cli
        .tool_approvals
        .as_deref()
        .map(ToolApprovals::from_str)
        .transpose()?;
    let session_id = cli
        .session
        .as_deref()
        .map(uuid::Uuid::parse_str)
        .transpose()
        .context("invalid --session id")?;

    let config = Arc::new(mogzi_config::load(cli.config.as_deref())?);
    let profile = config.profile(cli.profile.as_deref());
    let profile_name = config.profile_name(cli.profile.as_deref());

    if cli.status {
        let ctx = CommandContext {
            profile_name,
            provider: profile.provider.clone(),
            model: profile.model.clone(),
            tool_approvals: tool_approvals.unwrap_or(config.tool_approvals),
            session_name: "(none)".into(),
            working_dir: std::env::current_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "?".into()),
            version: env!("CARGO_PKG_VERSION").into(),
            platform: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
        };
        println!("{}", format_status(&ctx));
        return Ok(());
    }

    // Piped stdin first, then positional words, joined by whitespace.
    let stdin_text = if std::io::stdin().is_terminal() {
        String::new()
    } else {
        let mut buf = String::new();
        let _ = std::io::stdin().read_to_string(&mut buf);
        buf
    };
    let mut prompt_parts: Vec<String> = Vec::new();
    if !stdin_text.trim().is_empty() {
        prompt_parts.push(stdin_text.trim().to_string());
    }
    prompt_parts.extend(cli.prompt.iter().cloned());
    let mut prompt = if prompt_parts.is_empty() { None } else { Some(prompt_parts.join(" ")) };

    let interactive = cli.chat || prompt.is_none();
    let _log_guard = init_logging(interactive);
    cleanup_old_logs();

    let service = service_for_profile(&profile)?;

    if !interactive {
        if let Some(prompt) = prompt.take() {
            return headless::run(service, profile, prompt).await;
        }
    }

    let options = AppOptions {
        session_id,
        initial_prompt: prompt,
        profile: cli.profile.clone(),
        tool_approvals,
        chats_root: None,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let mut app = App::new(config, service, options);
    app.startup().await?;
    app.attach_terminal()?;
    app.run().await
}

/// Resolve the chat service for a profile.  Only the in-process scripted
/// provider ships with this build; anything else is a startup error.
fn service_for_profile(profile: &Profile) -> anyhow::Result<Arc<dyn AppService>> {
    match profile.provider.as_str() {
        "scripted" => Ok(Arc::new(ScriptedService::echo())),
        other => anyhow::bail!(
            "chat provider '{other}' is not bundled with this build; \
             set the profile's provider to \"scripted\""
        ),
    }
}

/// In interactive mode nothing may be written to stderr (it corrupts the
/// display); logs go to a daily file under `~/.mogzi/logs/`.  Headless runs
/// log to stderr, filtered by `MOGZI_LOG`.
fn init_logging(is_tui: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_env("MOGZI_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    if !is_tui {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init();
        return None;
    }

    let dir = mogzi_session::logs_dir();
    if std::fs::create_dir_all(&dir).is_err() {
        return None;
    }
    let date = chrono::Utc::now().format("%Y-%m-%d");
    let path = dir.join(format!("mogzi-{date}.log"));
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path).ok()?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
        .try_init();
    Some(guard)
}

/// Delete `mogzi-YYYY-MM-DD.log` files older than the retention window.
fn cleanup_old_logs() {
    let dir = mogzi_session::logs_dir();
    let Ok(entries) = std::fs::read_dir(&dir) else { return };
    let cutoff = chrono::Utc::now().date_naive() - chrono::Duration::days(LOG_RETENTION_DAYS);
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(date_part) = name.strip_prefix("mogzi-").and_then(|s| s.strip_suffix(".log"))
        else {
            continue;
        };
        if let Ok(date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
            if date < cutoff {
                let _ = std::fs::remove_file(entry.path());
            }
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
