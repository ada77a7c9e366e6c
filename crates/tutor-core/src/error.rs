// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;
use tutor_model::RecordOp;

/// Failure of one conversation operation.  Nothing here is fatal to the
/// process; every variant is scoped to the operation that returned it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The assistant reply could not be obtained.  Local state has been
    /// rolled back.
    #[error("completion failed: {0}")]
    CompletionFailed(String),

    /// The record store rejected an operation.  For create and update the
    /// reply is already in local state (see [`StoreError::is_warning`]); for
    /// delete and load nothing was changed locally.
    #[error("persistence failed ({op}): {reason}")]
    PersistenceFailed { op: RecordOp, reason: String },

    #[error("no turn at index {0}")]
    InvalidIndex(usize),

    #[error("turn {0} is not a user message")]
    NotUserTurn(usize),

    #[error("turn {0} has no record id")]
    NotPersisted(usize),

    #[error("no edit in progress")]
    NotEditing,
}

impl StoreError {
    pub(crate) fn persistence(op: RecordOp, err: anyhow::Error) -> Self {
        StoreError::PersistenceFailed { op, reason: format!("{err:#}") }
    }

    /// True when local state was updated despite the failure, so the caller
    /// should warn that history may not be durable rather than report that
    /// the operation failed.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            StoreError::PersistenceFailed { op: RecordOp::Create | RecordOp::Update, .. }
        )
    }
}

/// Result of an operation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Input was empty after trimming; nothing happened.
    Skipped,
}
