// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Fenced-code lexer: the top-level split of a reply into prose and code.

use serde::{Deserialize, Serialize};

use crate::inline::{fragments, Fragment};

const FENCE: &str = "```";

/// Language reported for a fence that carries no tag.
pub const DEFAULT_LANGUAGE: &str = "text";

/// One renderable block of an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text { fragments: Vec<Fragment> },
    Code { language: String, code: String },
}

impl Segment {
    fn text(raw: &str) -> Self {
        Segment::Text { fragments: fragments(raw) }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Segment::Code { .. })
    }

    /// Source text of a prose segment; `None` for code.
    pub fn raw_text(&self) -> Option<String> {
        match self {
            Segment::Text { fragments } => Some(fragments.iter().map(|f| f.raw()).collect()),
            Segment::Code { .. } => None,
        }
    }
}

/// A matched fence: byte span in the source plus its parts.
struct Fence<'a> {
    start: usize,
    end: usize,
    language: &'a str,
    body: &'a str,
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '+' | '-' | '#' | '.')
}

/// Try to match a complete fence whose opener starts at byte `open`.
///
/// The opener is three backticks, an optional tag, then a newline.  The body
/// runs to the first following triple backtick.
fn fence_at(raw: &str, open: usize) -> Option<Fence<'_>> {
    let after_ticks = open + FENCE.len();
    let rest = &raw[after_ticks..];
    let tag_len = rest.find(|c: char| !is_tag_char(c)).unwrap_or(rest.len());
    let rest = &rest[tag_len..];
    let newline = if rest.starts_with('\n') {
        1
    } else if rest.starts_with("\r\n") {
        2
    } else {
        return None;
    };
    let body_start = after_ticks + tag_len + newline;
    let close = body_start + raw[body_start..].find(FENCE)?;
    Some(Fence {
        start: open,
        end: close + FENCE.len(),
        language: &raw[after_ticks..after_ticks + tag_len],
        body: &raw[body_start..close],
    })
}

/// First complete fence at or after byte `from`.  Triple backticks that do
/// not open a complete fence are skipped over and stay literal text.
fn next_fence(raw: &str, from: usize) -> Option<Fence<'_>> {
    let mut search = from;
    while let Some(rel) = raw[search..].find(FENCE) {
        let open = search + rel;
        if let Some(fence) = fence_at(raw, open) {
            return Some(fence);
        }
        search = open + 1;
    }
    None
}

/// Split `raw` into prose and code segments in document order.
///
/// Input without any complete fence (including the empty string) yields
/// exactly one [`Segment::Text`].  Prose between two adjacent fences is only
/// emitted when non-empty.
pub fn segment(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0usize;

    while let Some(fence) = next_fence(raw, last) {
        if fence.start > last {
            segments.push(Segment::text(&raw[last..fence.start]));
        }
        let language = if fence.language.is_empty() {
            DEFAULT_LANGUAGE
        } else {
            fence.language
        };
        segments.push(Segment::Code {
            language: language.to_string(),
            code: fence.body.trim().to_string(),
        });
        last = fence.end;
    }

    if last < raw.len() || segments.is_empty() {
        segments.push(Segment::text(&raw[last..]));
    }
    segments
}
