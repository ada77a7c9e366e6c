// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Terminal rendering of assistant replies.
//!
//! Replies are segmented at render time; the stored text is never modified.

use crossterm::style::Stylize;
use tutor_content::{segment, split_lines, Fragment, Segment};

/// Render a reply as terminal text.  With `color` off the output is plain
/// text with code blocks still framed.
pub fn render_reply(raw: &str, color: bool) -> String {
    let mut out: Vec<String> = Vec::new();
    for seg in segment(raw) {
        match seg {
            Segment::Text { fragments } => out.push(render_prose(&fragments, color)),
            Segment::Code { language, code } => out.push(render_code(&language, &code, color)),
        }
    }
    out.join("\n")
}

fn render_prose(fragments: &[Fragment], color: bool) -> String {
    split_lines(fragments)
        .map(|line| {
            let mut s = String::new();
            for frag in line {
                match frag {
                    Fragment::Bold(t) if color => s.push_str(&t.as_str().bold().to_string()),
                    other => s.push_str(other.text()),
                }
            }
            s
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_code(language: &str, code: &str, color: bool) -> String {
    let frame = |s: &str| if color { s.dim().to_string() } else { s.to_string() };
    let mut out = frame(&format!("┌─ {language}"));
    out.push('\n');
    for line in code.lines() {
        let line = if color { line.cyan().to_string() } else { line.to_string() };
        out.push_str(&format!("{} {line}\n", frame("│")));
    }
    out.push_str(&frame("└─"));
    out
}
