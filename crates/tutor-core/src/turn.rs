// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The `Turn` type and helpers that operate on turn slices without needing
//! access to the full store.

use serde::{Deserialize, Serialize};
use tutor_model::{ChatRecord, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub sender: Sender,
    pub text: String,
    /// Thread key shared by a user message and its reply; kept across edits.
    pub conversation_id: String,
    /// Assigned once the pair is durably stored.
    pub record_id: Option<RecordId>,
    /// Added locally and not yet confirmed by the record store.
    pub pending: bool,
}

impl Turn {
    pub fn pending_user(text: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            conversation_id: conversation_id.into(),
            record_id: None,
            pending: true,
        }
    }

    pub fn assistant(
        text: impl Into<String>,
        conversation_id: impl Into<String>,
        record_id: Option<RecordId>,
    ) -> Self {
        let pending = record_id.is_none();
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            conversation_id: conversation_id.into(),
            record_id,
            pending,
        }
    }

    /// Expand a stored record into its user turn and assistant turn.
    pub fn pair_from_record(rec: ChatRecord) -> [Turn; 2] {
        [
            Turn {
                sender: Sender::User,
                text: rec.user_message,
                conversation_id: rec.conversation_id.clone(),
                record_id: Some(rec.record_id.clone()),
                pending: false,
            },
            Turn {
                sender: Sender::Assistant,
                text: rec.bot_message,
                conversation_id: rec.conversation_id,
                record_id: Some(rec.record_id),
                pending: false,
            },
        ]
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Index of the turn paired with the user turn at `index`.
///
/// Persisted turns pair with the nearest later turn carrying the same record
/// id.  Positions are never assumed: earlier edits and deletions shift them.
/// A turn without a record id pairs with the nearest later assistant turn of
/// the same thread that has no record id either.
pub fn find_pair(turns: &[Turn], index: usize) -> Option<usize> {
    let turn = turns.get(index)?;
    let later = turns.iter().enumerate().skip(index + 1);
    match &turn.record_id {
        Some(id) => later
            .filter(|(_, t)| t.record_id.as_ref() == Some(id))
            .map(|(i, _)| i)
            .next(),
        None => later
            .filter(|(_, t)| {
                t.sender == Sender::Assistant
                    && t.record_id.is_none()
                    && t.conversation_id == turn.conversation_id
            })
            .map(|(i, _)| i)
            .next(),
    }
}

/// Position of the `n`-th (0-based) user turn.
pub fn nth_user_turn(turns: &[Turn], n: usize) -> Option<usize> {
    turns
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_user())
        .map(|(i, _)| i)
        .nth(n)
}

/// Return a short single-line preview of a turn for use in listings and
/// confirmation messages.
pub fn turn_short_preview(turn: Option<&Turn>) -> String {
    const MAX: usize = 60;
    let Some(turn) = turn else {
        return "(unknown)".into();
    };
    // Collapse to first line and truncate.
    let first_line = turn.text.trim().lines().next().unwrap_or("").trim();
    if first_line.chars().count() > MAX {
        format!("\"{}…\"", first_line.chars().take(MAX).collect::<String>())
    } else {
        format!("\"{first_line}\"")
    }
}
