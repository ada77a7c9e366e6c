// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Line-by-line `**bold**` lexer for prose segments.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

const BOLD: &str = "**";

/// One run of prose inside a text segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum Fragment {
    Normal(String),
    /// Text between a pair of `**` markers (markers not included).
    Bold(String),
    /// A `\n` from the source text.
    LineBreak,
}

impl Fragment {
    /// The source text this fragment was lexed from, markers included.
    pub fn raw(&self) -> Cow<'_, str> {
        match self {
            Fragment::Normal(t) => Cow::Borrowed(t),
            Fragment::Bold(t) => Cow::Owned(format!("{BOLD}{t}{BOLD}")),
            Fragment::LineBreak => Cow::Borrowed("\n"),
        }
    }

    /// Display text without markup.
    pub fn text(&self) -> &str {
        match self {
            Fragment::Normal(t) | Fragment::Bold(t) => t,
            Fragment::LineBreak => "\n",
        }
    }
}

/// Lex `text` into fragments.  Lines are separated by [`Fragment::LineBreak`];
/// every line contributes at least one fragment, so an empty line yields
/// `Normal("")`.
pub fn fragments(text: &str) -> Vec<Fragment> {
    let mut out = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push(Fragment::LineBreak);
        }
        lex_line(line, &mut out);
    }
    out
}

/// Split a fragment sequence back into lines at each [`Fragment::LineBreak`].
pub fn split_lines(fragments: &[Fragment]) -> impl Iterator<Item = &[Fragment]> {
    fragments.split(|f| matches!(f, Fragment::LineBreak))
}

fn lex_line(line: &str, out: &mut Vec<Fragment>) {
    let first = out.len();
    let mut last = 0usize;

    while let Some(rel) = line[last..].find(BOLD) {
        let open = last + rel;
        let inner = open + BOLD.len();
        // An unterminated `**` stays literal, and so does everything after it:
        // any later opener would need a closer that does not exist either.
        let Some(close_rel) = line[inner..].find(BOLD) else {
            break;
        };
        let close = inner + close_rel;
        if open > last {
            out.push(Fragment::Normal(line[last..open].to_string()));
        }
        out.push(Fragment::Bold(line[inner..close].to_string()));
        last = close + BOLD.len();
    }

    if last < line.len() {
        out.push(Fragment::Normal(line[last..].to_string()));
    }
    if out.len() == first {
        out.push(Fragment::Normal(line.to_string()));
    }
}
