// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Slash command parser for the chat loop.
//!
//! Supported syntax:
//!   /command
//!   /command arg
//!   /edit <n> free text with spaces
//!
//! Message numbers typed by the user are 1-based and count only the user's
//! own messages, as printed by `/list`.

use anyhow::{bail, Context};

/// One line of chat input after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Plain text to send as a new message.
    Send(String),
    List,
    /// Replace the user's `message`-th (0-based) message with `text`.
    Edit { message: usize, text: String },
    Delete { message: usize },
    /// List starter suggestions, or send the n-th (0-based) one.
    Suggest(Option<usize>),
    Help,
    Quit,
}

pub const HELP: &str = "\
/list               show the conversation with your messages numbered
/edit <n> <text>    rewrite your message n and regenerate from there
/delete <n>         delete your message n and its reply
/suggest [n]        list starter prompts, or send prompt n
/help               show this help
/quit               leave the chat";

/// Parse one input line.  Blank lines yield `None`.
pub fn parse(input: &str) -> anyhow::Result<Option<ChatCommand>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    let Some(body) = input.strip_prefix('/') else {
        return Ok(Some(ChatCommand::Send(input.to_string())));
    };

    let (name, rest) = split_word(body);
    let cmd = match name {
        "list" | "ls" => ChatCommand::List,
        "edit" => {
            let (n, text) = split_word(rest);
            ChatCommand::Edit { message: number(n)?, text: text.to_string() }
        }
        "delete" | "del" => ChatCommand::Delete { message: number(rest)? },
        "suggest" => {
            if rest.is_empty() {
                ChatCommand::Suggest(None)
            } else {
                ChatCommand::Suggest(Some(number(rest)?))
            }
        }
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "" => bail!("missing command name, try /help"),
        other => bail!("unknown command /{other}, try /help"),
    };
    Ok(Some(cmd))
}

/// Split off the first whitespace-delimited word; the remainder is trimmed
/// but otherwise kept verbatim.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], s[pos..].trim()),
        None => (s, ""),
    }
}

/// Convert a 1-based number typed by the user into a 0-based index.
fn number(s: &str) -> anyhow::Result<usize> {
    let n: usize = s
        .trim()
        .parse()
        .with_context(|| format!("expected a number, got {s:?}"))?;
    if n == 0 {
        bail!("numbers start at 1");
    }
    Ok(n - 1)
}
