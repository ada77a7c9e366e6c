// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use tutor_model::RecordOp;

use crate::Turn;

/// Events emitted by the store while an operation runs.
/// The rendering layer subscribes to these to show optimistic state, such as
/// the pending user turn, while the store is waiting on a collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    /// The sequence was replaced by persisted history
    HistoryLoaded { turns: usize },
    /// A turn was appended at `index`
    TurnAdded { index: usize, turn: Turn },
    /// The sequence was cut back to `len` turns by an edit
    Truncated { len: usize, removed: usize },
    /// A pending user turn was confirmed durable
    Persisted { index: usize, record_id: String },
    /// A failed operation put the sequence back to `len` turns
    RolledBack { len: usize },
    /// Turns at these (pre-removal) indices were removed
    Removed { indices: Vec<usize> },
    /// The reply is shown but the record store did not accept it
    PersistenceWarning { op: RecordOp, reason: String },
}
