// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Unified diff model: compute from old/new content, format, and parse.
//!
//! Edit-like tool results carry both sides of a file change; `compute` turns
//! them into a structured diff with 3 context lines.  Patch-like tools ship a
//! pre-formed unified diff which `parse` reads back into the same structure.
//! `parse(format(d)) == d` holds for every well-formed diff.

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

/// Number of unchanged lines shown around each change.
const CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedDiff {
    pub original_path: String,
    pub modified_path: String,
    pub hunks: Vec<DiffHunk>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    pub original_start: u32,
    pub original_length: u32,
    pub modified_start: u32,
    pub modified_length: u32,
    pub lines: Vec<DiffLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffLineKind {
    Context,
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    pub content: String,
    pub original_line: Option<u32>,
    pub modified_line: Option<u32>,
}

impl UnifiedDiff {
    /// Compute a unified diff between `old` and `new` with 3 context lines.
    pub fn compute(original_path: &str, modified_path: &str, old: &str, new: &str) -> Self {
        let diff = TextDiff::from_lines(old, new);
        let mut hunks = Vec::new();

        for group in diff.grouped_ops(CONTEXT_LINES) {
            let Some(first) = group.first() else { continue };
            let old_range_start = first.old_range().start as u32;
            let new_range_start = first.new_range().start as u32;

            let mut raw: Vec<(DiffLineKind, String)> = Vec::new();
            for op in &group {
                for change in diff.iter_changes(op) {
                    let kind = match change.tag() {
                        ChangeTag::Equal => DiffLineKind::Context,
                        ChangeTag::Delete => DiffLineKind::Removed,
                        ChangeTag::Insert => DiffLineKind::Added,
                    };
                    let value = change.value();
                    let content = value.strip_suffix('\n').unwrap_or(value).to_string();
                    raw.push((kind, content));
                }
            }

            let original_length =
                raw.iter().filter(|(k, _)| *k != DiffLineKind::Added).count() as u32;
            let modified_length =
                raw.iter().filter(|(k, _)| *k != DiffLineKind::Removed).count() as u32;
            // Unified convention: a zero-length side reports the line *before*
            // the change (0 allowed), a non-empty side its first line, 1-based.
            let original_start =
                if original_length == 0 { old_range_start } else { old_range_start + 1 };
            let modified_start =
                if modified_length == 0 { new_range_start } else { new_range_start + 1 };

            hunks.push(DiffHunk::from_raw_lines(
                original_start,
                original_length,
                modified_start,
                modified_length,
                raw,
            ));
        }

        UnifiedDiff {
            original_path: original_path.to_string(),
            modified_path: modified_path.to_string(),
            hunks,
        }
    }

    /// Render in standard unified format.
    pub fn format(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("--- {}\n", self.original_path));
        out.push_str(&format!("+++ {}\n", self.modified_path));
        for hunk in &self.hunks {
            out.push_str(&format!(
                "@@ -{},{} +{},{} @@\n",
                hunk.original_start, hunk.original_length, hunk.modified_start, hunk.modified_length
            ));
            for line in &hunk.lines {
                let prefix = match line.kind {
                    DiffLineKind::Context => ' ',
                    DiffLineKind::Added => '+',
                    DiffLineKind::Removed => '-',
                };
                out.push(prefix);
                out.push_str(&line.content);
                out.push('\n');
            }
        }
        out
    }

    /// Parse a unified diff.
    ///
    /// Accepts optional markdown ` ```diff ` fences and the
    /// `\ No newline at end of file` marker; both are stripped/skipped.
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = strip_markdown_fence(text);
        let mut original_path = String::new();
        let mut modified_path = String::new();
        let mut hunks: Vec<DiffHunk> = Vec::new();
        let mut current: Option<(u32, u32, u32, u32, Vec<(DiffLineKind, String)>)> = None;

        let flush = |cur: &mut Option<(u32, u32, u32, u32, Vec<(DiffLineKind, String)>)>,
                     hunks: &mut Vec<DiffHunk>| {
            if let Some((os, ol, ms, ml, raw)) = cur.take() {
                hunks.push(DiffHunk::from_raw_lines(os, ol, ms, ml, raw));
            }
        };

        for line in text.lines() {
            if let Some(p) = line.strip_prefix("--- ") {
                original_path = p.trim_end().to_string();
                continue;
            }
            if let Some(p) = line.strip_prefix("+++ ") {
                modified_path = p.trim_end().to_string();
                continue;
            }
            if line.starts_with("\\ ") {
                continue;
            }
            if line.starts_with("@@") {
                flush(&mut current, &mut hunks);
                let (os, ol, ms, ml) = parse_hunk_header(line)?;
                current = Some((os, ol, ms, ml, Vec::new()));
                continue;
            }
            if let Some((_, _, _, _, raw)) = current.as_mut() {
                let (kind, content) = match line.chars().next() {
                    Some(' ') => (DiffLineKind::Context, &line[1..]),
                    Some('+') => (DiffLineKind::Added, &line[1..]),
                    Some('-') => (DiffLineKind::Removed, &line[1..]),
                    // An empty line inside a hunk is a context line whose
                    // content is empty (some producers drop the space).
                    None => (DiffLineKind::Context, ""),
                    _ => return Err(format!("unexpected diff line: {line:?}")),
                };
                raw.push((kind, content.to_string()));
            }
        }
        flush(&mut current, &mut hunks);

        if hunks.is_empty() && original_path.is_empty() && modified_path.is_empty() {
            return Err("no unified diff content found".to_string());
        }

        Ok(UnifiedDiff { original_path, modified_path, hunks })
    }

    /// Total count of added/removed lines, for one-line summaries.
    pub fn change_counts(&self) -> (usize, usize) {
        let mut added = 0;
        let mut removed = 0;
        for hunk in &self.hunks {
            for line in &hunk.lines {
                match line.kind {
                    DiffLineKind::Added => added += 1,
                    DiffLineKind::Removed => removed += 1,
                    DiffLineKind::Context => {}
                }
            }
        }
        (added, removed)
    }
}

impl DiffHunk {
    /// Assign line numbers by walking the raw lines with two counters seeded
    /// from the hunk header.  `compute` and `parse` both go through here so
    /// the numbering is identical on either path.
    fn from_raw_lines(
        original_start: u32,
        original_length: u32,
        modified_start: u32,
        modified_length: u32,
        raw: Vec<(DiffLineKind, String)>,
    ) -> Self {
        let mut old_ln = original_start;
        let mut new_ln = modified_start;
        let lines = raw
            .into_iter()
            .map(|(kind, content)| {
                let (original_line, modified_line) = match kind {
                    DiffLineKind::Context => {
                        let pair = (Some(old_ln), Some(new_ln));
                        old_ln += 1;
                        new_ln += 1;
                        pair
                    }
                    DiffLineKind::Removed => {
                        let pair = (Some(old_ln), None);
                        old_ln += 1;
                        pair
                    }
                    DiffLineKind::Added => {
                        let pair = (None, Some(new_ln));
                        new_ln += 1;
                        pair
                    }
                };
                DiffLine { kind, content, original_line, modified_line }
            })
            .collect();
        DiffHunk { original_start, original_length, modified_start, modified_length, lines }
    }
}

/// Parse `@@ -a,b +c,d @@` (the `,b` / `,d` parts default to 1 when omitted).
fn parse_hunk_header(line: &str) -> Result<(u32, u32, u32, u32), String> {
    let inner = line
        .trim_start_matches('@')
        .trim_end()
        .trim_end_matches('@')
        .trim();
    let mut parts = inner.split_whitespace();
    let old = parts.next().ok_or_else(|| format!("bad hunk header: {line:?}"))?;
    let new = parts.next().ok_or_else(|| format!("bad hunk header: {line:?}"))?;

    let parse_side = |s: &str, sign: char| -> Result<(u32, u32), String> {
        let s = s
            .strip_prefix(sign)
            .ok_or_else(|| format!("bad hunk range {s:?} in {line:?}"))?;
        let (start, len) = match s.split_once(',') {
            Some((a, b)) => (a, b),
            None => (s, "1"),
        };
        let start = start.parse().map_err(|_| format!("bad hunk start in {line:?}"))?;
        let len = len.parse().map_err(|_| format!("bad hunk length in {line:?}"))?;
        Ok((start, len))
    };

    let (os, ol) = parse_side(old, '-')?;
    let (ms, ml) = parse_side(new, '+')?;
    Ok((os, ol, ms, ml))
}

/// Strip a leading ` ```diff ` / trailing ` ``` ` markdown fence if present.
fn strip_markdown_fence(diff: &str) -> &str {
    let t = diff.trim_start();
    if t.starts_with("```") {
        if let Some(nl) = t.find('\n') {
            let body = &t[nl + 1..];
            if let Some(close) = body.rfind("\n```") {
                return &body[..close + 1];
            }
            return body;
        }
    }
    diff
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const OLD: &str = "fn main() {\n    println!(\"a\");\n    println!(\"b\");\n    println!(\"c\");\n}\n";
    const NEW: &str = "fn main() {\n    println!(\"a\");\n    println!(\"B\");\n    println!(\"c\");\n}\n";

    #[test]
    fn compute_produces_single_hunk_for_one_line_change() {
        let d = UnifiedDiff::compute("a.rs", "a.rs", OLD, NEW);
        assert_eq!(d.hunks.len(), 1);
        let h = &d.hunks[0];
        assert_eq!(h.original_start, 1);
        assert_eq!(h.original_length, 5);
        assert_eq!(h.modified_length, 5);
        assert_eq!(d.change_counts(), (1, 1));
    }

    #[test]
    fn compute_assigns_line_numbers_to_both_sides_of_context() {
        let d = UnifiedDiff::compute("a.rs", "a.rs", OLD, NEW);
        let first = &d.hunks[0].lines[0];
        assert_eq!(first.kind, DiffLineKind::Context);
        assert_eq!(first.original_line, Some(1));
        assert_eq!(first.modified_line, Some(1));
        let removed = d.hunks[0].lines.iter().find(|l| l.kind == DiffLineKind::Removed).unwrap();
        assert_eq!(removed.original_line, Some(3));
        assert_eq!(removed.modified_line, None);
    }

    #[test]
    fn compute_identical_content_yields_no_hunks() {
        let d = UnifiedDiff::compute("a", "a", OLD, OLD);
        assert!(d.hunks.is_empty());
    }

    #[test]
    fn compute_insert_into_empty_file_starts_at_zero() {
        let d = UnifiedDiff::compute("a", "a", "", "x\ny\n");
        assert_eq!(d.hunks.len(), 1);
        let h = &d.hunks[0];
        assert_eq!((h.original_start, h.original_length), (0, 0));
        assert_eq!((h.modified_start, h.modified_length), (1, 2));
    }

    #[test]
    fn format_emits_standard_unified_text() {
        let d = UnifiedDiff::compute("old.rs", "new.rs", OLD, NEW);
        let text = d.format();
        assert!(text.starts_with("--- old.rs\n+++ new.rs\n@@ -1,5 +1,5 @@\n"));
        assert!(text.contains("-    println!(\"b\");\n"));
        assert!(text.contains("+    println!(\"B\");\n"));
    }

    #[test]
    fn parse_format_round_trip_is_identity() {
        let d = UnifiedDiff::compute("src/lib.rs", "src/lib.rs", OLD, NEW);
        let parsed = UnifiedDiff::parse(&d.format()).unwrap();
        assert_eq!(parsed, d);
    }

    #[test]
    fn parse_format_round_trip_for_multi_hunk_diff() {
        let old: String = (1..=40).map(|i| format!("line {i}\n")).collect();
        let new = old.replace("line 5\n", "LINE 5\n").replace("line 35\n", "LINE 35\n");
        let d = UnifiedDiff::compute("f", "f", &old, &new);
        assert_eq!(d.hunks.len(), 2);
        assert_eq!(UnifiedDiff::parse(&d.format()).unwrap(), d);
    }

    #[test]
    fn parse_accepts_markdown_fenced_diff() {
        let d = UnifiedDiff::compute("a", "a", OLD, NEW);
        let fenced = format!("```diff\n{}```", d.format());
        assert_eq!(UnifiedDiff::parse(&fenced).unwrap(), d);
    }

    #[test]
    fn parse_skips_no_newline_marker() {
        let text = "--- a\n+++ a\n@@ -1,1 +1,1 @@\n-x\n+y\n\\ No newline at end of file\n";
        let d = UnifiedDiff::parse(text).unwrap();
        assert_eq!(d.hunks[0].lines.len(), 2);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(UnifiedDiff::parse("this is not a diff").is_err());
    }

    #[test]
    fn parse_hunk_header_allows_omitted_lengths() {
        assert_eq!(parse_hunk_header("@@ -3 +4 @@").unwrap(), (3, 1, 4, 1));
        assert_eq!(parse_hunk_header("@@ -1,5 +2,6 @@ extra").unwrap(), (1, 5, 2, 6));
    }
}
