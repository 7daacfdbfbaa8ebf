// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Tool result payload parsing.
//!
//! Tools report their outcome as a small XML document rooted at
//! `<tool_response tool_name="...">`.  This module extracts status,
//! a one-line description, a summary, and (for file-editing tools) a
//! unified diff for the tool card.  Payloads that are not structured
//! documents fall back to a truncated plain-text summary.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diff::UnifiedDiff;

/// Prefix that marks a structured tool-response document.
const SENTINEL: &str = "<tool_response";

/// Maximum characters of an opaque payload kept as the summary.
const SUMMARY_LIMIT: usize = 200;

/// Maximum characters of a shell command shown in the description.
const COMMAND_LIMIT: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Failed,
}

/// Display-ready information extracted from a tool result payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponseInfo {
    pub tool_name: String,
    pub status: ToolStatus,
    /// One-line description, e.g. `Read /tmp/a.txt`.
    pub description: String,
    /// Longer free-text summary (notes or truncated raw payload).
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<UnifiedDiff>,
    /// The unparsed payload as received from the tool.
    pub raw: String,
}

/// Parse a tool result payload into display info.  Never fails: malformed
/// structured documents degrade to the opaque-text path.
pub fn parse_tool_response(tool_name: &str, payload: &str) -> ToolResponseInfo {
    if payload.trim_start().starts_with(SENTINEL) {
        match parse_structured(tool_name, payload) {
            Ok(info) => return info,
            Err(e) => debug!(tool_name, "structured tool response unparseable: {e}"),
        }
    }
    opaque_info(tool_name, payload)
}

// ── Structured document ───────────────────────────────────────────────────────

#[derive(Default)]
struct RawDoc {
    tool_name: Option<String>,
    status: Option<String>,
    absolute_path: Option<String>,
    command: Option<String>,
    notes: Option<String>,
    error: Option<String>,
    content_on_disk: Option<String>,
    old_content: Option<String>,
    patch: Option<String>,
    completion_message: Option<String>,
}

fn parse_structured(fallback_tool_name: &str, payload: &str) -> Result<ToolResponseInfo, String> {
    let doc = read_document(payload)?;

    let tool_name = doc.tool_name.clone().unwrap_or_else(|| fallback_tool_name.to_string());

    // An error element forces FAILED regardless of the result attribute.
    let status = if doc.error.is_some() {
        ToolStatus::Failed
    } else if doc.status.as_deref() == Some("FAILED") {
        ToolStatus::Failed
    } else {
        ToolStatus::Success
    };

    let description = describe(&tool_name, doc.absolute_path.as_deref(), doc.command.as_deref())
        .or_else(|| first_line(doc.notes.as_deref()))
        .or_else(|| first_line(doc.completion_message.as_deref()))
        .unwrap_or_else(|| tool_name.clone());

    let summary = doc
        .notes
        .clone()
        .or_else(|| doc.completion_message.clone())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| description.clone());

    let diff = build_diff(&doc);

    Ok(ToolResponseInfo {
        tool_name,
        status,
        description,
        summary,
        error_message: doc.error.map(|e| e.trim().to_string()),
        file_path: doc.absolute_path,
        new_content: doc.content_on_disk,
        diff,
        raw: payload.to_string(),
    })
}

/// Read the XML document, tolerating unknown elements and attributes.
fn read_document(payload: &str) -> Result<RawDoc, String> {
    let mut reader = Reader::from_str(payload.trim());
    reader.config_mut().trim_text(false);

    let mut doc = RawDoc::default();
    let mut capture: Option<&'static str> = None;
    let mut captured = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                match e.local_name().as_ref() {
                    b"tool_response" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"tool_name" {
                                doc.tool_name =
                                    attr.unescape_value().ok().map(|v| v.into_owned());
                            }
                        }
                    }
                    b"result" => {
                        for attr in e.attributes().flatten() {
                            let value = attr.unescape_value().ok().map(|v| v.into_owned());
                            match attr.key.as_ref() {
                                b"status" => doc.status = value,
                                b"absolute_path" => doc.absolute_path = value,
                                b"command" => doc.command = value,
                                _ => {}
                            }
                        }
                    }
                    b"notes" => capture = Some("notes"),
                    b"error" => capture = Some("error"),
                    b"content_on_disk" => capture = Some("content_on_disk"),
                    b"old_content" => capture = Some("old_content"),
                    b"patch" => capture = Some("patch"),
                    b"completion_message" => capture = Some("completion_message"),
                    // Unknown elements are skipped without capturing text.
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                if capture.is_some() {
                    captured.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Ok(Event::CData(t)) => {
                if capture.is_some() {
                    captured.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                // Only the matching end tag closes a capture; end tags of
                // unknown elements nested inside a captured one are ignored.
                if capture.map(str::as_bytes) == Some(e.local_name().as_ref()) {
                    let field = capture.take().unwrap_or_default();
                    let text = std::mem::take(&mut captured);
                    let slot = match field {
                        "notes" => &mut doc.notes,
                        "error" => &mut doc.error,
                        "content_on_disk" => &mut doc.content_on_disk,
                        "old_content" => &mut doc.old_content,
                        "patch" => &mut doc.patch,
                        "completion_message" => &mut doc.completion_message,
                        _ => unreachable!(),
                    };
                    *slot = Some(text);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
    }

    Ok(doc)
}

/// One-line description for the closed set of known tool kinds.
fn describe(tool_name: &str, file_path: Option<&str>, command: Option<&str>) -> Option<String> {
    let path = file_path.unwrap_or("");
    let with_path = |verb: &str| {
        if path.is_empty() { None } else { Some(format!("{verb} {path}")) }
    };
    match tool_name {
        "read_file" | "read_text_file" => with_path("Read"),
        "write_file" | "write_to_file" => with_path("Created"),
        "edit_file" | "replace_in_file" => with_path("Modified"),
        "list_directory" | "list_files" => with_path("Listed"),
        "grep" | "search_files" | "search_file_content" => with_path("Searched"),
        "apply_patch" | "apply_code_patch" => with_path("Patched"),
        "shell" | "execute_command" | "run_shell_command" => {
            let cmd = command?;
            Some(format!("Executed: {}", truncate_chars(cmd.trim(), COMMAND_LIMIT)))
        }
        _ => None,
    }
}

fn build_diff(doc: &RawDoc) -> Option<UnifiedDiff> {
    if let Some(patch) = &doc.patch {
        match UnifiedDiff::parse(patch) {
            Ok(d) => return Some(d),
            Err(e) => {
                debug!("tool response patch unparseable: {e}");
                return None;
            }
        }
    }
    match (&doc.old_content, &doc.content_on_disk, &doc.absolute_path) {
        (Some(old), Some(new), Some(path)) => {
            Some(UnifiedDiff::compute(path, path, old, new))
        }
        _ => None,
    }
}

// ── Opaque payloads ───────────────────────────────────────────────────────────

fn opaque_info(tool_name: &str, payload: &str) -> ToolResponseInfo {
    ToolResponseInfo {
        tool_name: tool_name.to_string(),
        status: ToolStatus::Success,
        description: tool_name.to_string(),
        summary: truncate_chars(payload.trim(), SUMMARY_LIMIT),
        error_message: None,
        file_path: None,
        new_content: None,
        diff: None,
        raw: payload.to_string(),
    }
}

fn first_line(text: Option<&str>) -> Option<String> {
    let line = text?.trim().lines().next()?.trim();
    if line.is_empty() { None } else { Some(line.to_string()) }
}

fn truncate_chars(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        s.to_string()
    } else {
        let cut: String = s.chars().take(limit).collect();
        format!("{cut}…")
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffLineKind;

    #[test]
    fn structured_read_result_has_derived_description() {
        let payload = r#"<tool_response tool_name="read_file">
            <result status="SUCCESS" absolute_path="a.txt" />
            <notes>Read 12 lines</notes>
        </tool_response>"#;
        let info = parse_tool_response("read_file", payload);
        assert_eq!(info.status, ToolStatus::Success);
        assert_eq!(info.description, "Read a.txt");
        assert_eq!(info.summary, "Read 12 lines");
        assert_eq!(info.file_path.as_deref(), Some("a.txt"));
    }

    #[test]
    fn error_element_forces_failed_status() {
        let payload = r#"<tool_response tool_name="write_file">
            <result status="SUCCESS" absolute_path="b.txt" />
            <error>disk full</error>
        </tool_response>"#;
        let info = parse_tool_response("write_file", payload);
        assert_eq!(info.status, ToolStatus::Failed);
        assert_eq!(info.error_message.as_deref(), Some("disk full"));
    }

    #[test]
    fn failed_status_attribute_is_respected() {
        let payload = r#"<tool_response tool_name="read_file">
            <result status="FAILED" absolute_path="missing.txt" />
        </tool_response>"#;
        let info = parse_tool_response("read_file", payload);
        assert_eq!(info.status, ToolStatus::Failed);
    }

    #[test]
    fn shell_description_truncates_long_commands() {
        let long_cmd = "cargo test --workspace --all-features -- --nocapture ".repeat(4);
        let payload = format!(
            r#"<tool_response tool_name="execute_command"><result status="SUCCESS" command="{}" /></tool_response>"#,
            long_cmd.trim()
        );
        let info = parse_tool_response("execute_command", &payload);
        assert!(info.description.starts_with("Executed: cargo test"));
        assert!(info.description.ends_with('…'));
    }

    #[test]
    fn edit_tool_with_both_contents_produces_a_diff() {
        let payload = r#"<tool_response tool_name="edit_file">
            <result status="SUCCESS" absolute_path="src/lib.rs" />
            <old_content>fn a() {}
</old_content>
            <content_on_disk>fn b() {}
</content_on_disk>
        </tool_response>"#;
        let info = parse_tool_response("edit_file", payload);
        assert_eq!(info.description, "Modified src/lib.rs");
        let diff = info.diff.expect("edit tools must carry a diff");
        assert_eq!(diff.original_path, "src/lib.rs");
        assert_eq!(diff.change_counts(), (1, 1));
    }

    #[test]
    fn patch_tool_diff_is_parsed_directly() {
        let payload = "<tool_response tool_name=\"apply_patch\">\
            <result status=\"SUCCESS\" absolute_path=\"x.rs\" />\
            <patch>--- x.rs\n+++ x.rs\n@@ -1,1 +1,1 @@\n-old\n+new\n</patch>\
            </tool_response>";
        let info = parse_tool_response("apply_patch", payload);
        assert_eq!(info.description, "Patched x.rs");
        let diff = info.diff.unwrap();
        assert_eq!(diff.hunks[0].lines[0].kind, DiffLineKind::Removed);
    }

    #[test]
    fn unknown_elements_are_tolerated() {
        let payload = r#"<tool_response tool_name="read_file">
            <result status="SUCCESS" absolute_path="a.txt" />
            <telemetry spans="3">opaque</telemetry>
        </tool_response>"#;
        let info = parse_tool_response("read_file", payload);
        assert_eq!(info.description, "Read a.txt");
        assert_eq!(info.status, ToolStatus::Success);
    }

    #[test]
    fn completion_message_substitutes_for_notes() {
        let payload = r#"<tool_response tool_name="attempt_completion">
            <result status="SUCCESS" />
            <completion_message>All tasks done.</completion_message>
        </tool_response>"#;
        let info = parse_tool_response("attempt_completion", payload);
        assert_eq!(info.summary, "All tasks done.");
        assert_eq!(info.description, "All tasks done.");
    }

    #[test]
    fn opaque_payload_is_truncated_with_ellipsis() {
        let payload = "x".repeat(500);
        let info = parse_tool_response("mystery_tool", &payload);
        assert_eq!(info.status, ToolStatus::Success);
        assert_eq!(info.summary.chars().count(), 201);
        assert!(info.summary.ends_with('…'));
        assert_eq!(info.raw, payload);
    }

    #[test]
    fn short_opaque_payload_kept_verbatim() {
        let info = parse_tool_response("mystery_tool", "all good");
        assert_eq!(info.summary, "all good");
        assert_eq!(info.description, "mystery_tool");
    }

    #[test]
    fn malformed_structured_payload_falls_back_to_opaque() {
        let payload = "<tool_response tool_name=\"read_file\"><result status=";
        let info = parse_tool_response("read_file", payload);
        assert_eq!(info.status, ToolStatus::Success);
        assert!(info.summary.starts_with("<tool_response"));
    }
}
