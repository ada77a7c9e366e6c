// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The conversation store: owns the ordered turn sequence and keeps it in
//! step with the completion endpoint and the record store.
//!
//! Every mutating operation takes `&mut self`, so at most one of them can be
//! in flight per store.  Operations suspend only while awaiting a
//! collaborator.  Local state is updated optimistically and rolled back when
//! the completion call fails.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tutor_config::EditFailurePolicy;
use tutor_model::{
    Collaborators, CompletionProvider, NewRecord, RecordId, RecordOp, RecordStore, RecordUpdate,
    SessionContext,
};
use uuid::Uuid;

use crate::{find_pair, ConversationEvent, Outcome, StoreError, Turn};

/// How the reply of a send is written to the record store.
enum Persist {
    Create,
    Update(RecordId),
}

pub struct ConversationStore {
    completion: Arc<dyn CompletionProvider>,
    records: Arc<dyn RecordStore>,
    session: SessionContext,
    turns: Vec<Turn>,
    editing_index: Option<usize>,
    edit_failure: EditFailurePolicy,
    events: Option<mpsc::UnboundedSender<ConversationEvent>>,
}

impl ConversationStore {
    pub fn new(collaborators: Collaborators, session: SessionContext) -> Self {
        Self::from_parts(collaborators.completion, collaborators.records, session)
    }

    pub fn from_parts(
        completion: Arc<dyn CompletionProvider>,
        records: Arc<dyn RecordStore>,
        session: SessionContext,
    ) -> Self {
        Self {
            completion,
            records,
            session,
            turns: Vec::new(),
            editing_index: None,
            edit_failure: EditFailurePolicy::default(),
            events: None,
        }
    }

    pub fn with_edit_failure(mut self, policy: EditFailurePolicy) -> Self {
        self.edit_failure = policy;
        self
    }

    /// Subscribe to [`ConversationEvent`]s.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<ConversationEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn editing_index(&self) -> Option<usize> {
        self.editing_index
    }

    /// True while a user turn is waiting for confirmation.
    pub fn has_pending(&self) -> bool {
        self.turns.iter().any(|t| t.pending)
    }

    fn emit(&self, event: ConversationEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is rendering.
            let _ = tx.send(event);
        }
    }

    fn user_turn(&self, index: usize) -> Result<&Turn, StoreError> {
        let turn = self.turns.get(index).ok_or(StoreError::InvalidIndex(index))?;
        if !turn.is_user() {
            return Err(StoreError::NotUserTurn(index));
        }
        Ok(turn)
    }

    // ── History ───────────────────────────────────────────────────────────────

    /// Replace the sequence with the persisted history, each record expanded
    /// into its user and assistant turn.  Returns the number of records.
    pub async fn load_history(&mut self) -> Result<usize, StoreError> {
        let records = self
            .records
            .load_history()
            .await
            .map_err(|e| StoreError::persistence(RecordOp::Load, e))?;
        let count = records.len();
        self.turns = records.into_iter().flat_map(Turn::pair_from_record).collect();
        self.editing_index = None;
        info!(records = count, "conversation history loaded");
        self.emit(ConversationEvent::HistoryLoaded { turns: self.turns.len() });
        Ok(count)
    }

    // ── Append ────────────────────────────────────────────────────────────────

    /// Send a new user message in a fresh thread.
    pub async fn append(&mut self, user_text: &str) -> Result<Outcome, StoreError> {
        if user_text.trim().is_empty() {
            debug!("append skipped: empty message");
            return Ok(Outcome::Skipped);
        }
        let conversation_id = Uuid::new_v4().to_string();
        self.send(user_text, conversation_id, Persist::Create).await
    }

    /// Push a pending user turn, obtain the reply and persist the pair.
    ///
    /// On completion failure the pending turn is removed again, leaving the
    /// sequence exactly as it was on entry.  On persistence failure the reply
    /// is kept and the error returned as a warning.
    async fn send(
        &mut self,
        text: &str,
        conversation_id: String,
        persist: Persist,
    ) -> Result<Outcome, StoreError> {
        let user_index = self.turns.len();
        let user_turn = Turn::pending_user(text, conversation_id.clone());
        self.turns.push(user_turn.clone());
        self.emit(ConversationEvent::TurnAdded { index: user_index, turn: user_turn });
        debug!(%conversation_id, index = user_index, provider = self.completion.name(), "requesting reply");

        let reply = match self.completion.complete_turn(text, &conversation_id).await {
            Ok(reply) => reply.response,
            Err(e) => {
                self.turns.truncate(user_index);
                warn!(%conversation_id, "completion failed, pending turn removed: {e:#}");
                self.emit(ConversationEvent::RolledBack { len: self.turns.len() });
                return Err(StoreError::CompletionFailed(format!("{e:#}")));
            }
        };

        let (op, stored) = match persist {
            Persist::Create => {
                let record = NewRecord {
                    user_message: text.to_string(),
                    bot_message: reply.clone(),
                    user_id: self.session.user_id.clone(),
                    conversation_id: conversation_id.clone(),
                };
                (RecordOp::Create, self.records.create_record(record).await.map_err(|e| (e, None)))
            }
            Persist::Update(record_id) => {
                let update = RecordUpdate {
                    user_message: text.to_string(),
                    bot_message: reply.clone(),
                    conversation_id: conversation_id.clone(),
                };
                let stored = match self.records.update_record(&record_id, update).await {
                    Ok(()) => Ok(record_id),
                    // The record still exists server-side, only its content is stale.
                    Err(e) => Err((e, Some(record_id))),
                };
                (RecordOp::Update, stored)
            }
        };

        match stored {
            Ok(record_id) => {
                self.confirm(user_index, record_id.clone());
                self.push_reply(reply, conversation_id, Some(record_id));
                Ok(Outcome::Completed)
            }
            Err((e, known_id)) => {
                let err = StoreError::persistence(op, e);
                warn!(%conversation_id, "{err}; reply kept in memory only");
                if let Some(id) = &known_id {
                    self.confirm(user_index, id.clone());
                }
                self.push_reply(reply, conversation_id, known_id);
                if let StoreError::PersistenceFailed { op, reason } = &err {
                    self.emit(ConversationEvent::PersistenceWarning { op: *op, reason: reason.clone() });
                }
                Err(err)
            }
        }
    }

    fn confirm(&mut self, index: usize, record_id: RecordId) {
        if let Some(turn) = self.turns.get_mut(index) {
            turn.record_id = Some(record_id.clone());
            turn.pending = false;
        }
        debug!(index, %record_id, "turn persisted");
        self.emit(ConversationEvent::Persisted { index, record_id });
    }

    fn push_reply(&mut self, reply: String, conversation_id: String, record_id: Option<RecordId>) {
        let index = self.turns.len();
        let turn = Turn::assistant(reply, conversation_id, record_id);
        self.turns.push(turn.clone());
        self.emit(ConversationEvent::TurnAdded { index, turn });
    }

    // ── Edit ──────────────────────────────────────────────────────────────────

    /// Revise the user turn at `index`.  The turn and everything after it is
    /// discarded, then the new text is sent under the original conversation
    /// id.  A turn that already has a record is overwritten in place; one that
    /// never reached the record store gets a fresh record.
    ///
    /// Later records are not deleted server-side; they reappear on the next
    /// history load.
    pub async fn edit(&mut self, index: usize, new_text: &str) -> Result<Outcome, StoreError> {
        if new_text.trim().is_empty() {
            debug!(index, "edit cancelled: empty text");
            self.editing_index = None;
            return Ok(Outcome::Skipped);
        }
        let original = self.user_turn(index)?;
        let conversation_id = original.conversation_id.clone();
        let persist = match &original.record_id {
            Some(id) => Persist::Update(id.clone()),
            None => Persist::Create,
        };

        let suffix = self.turns.split_off(index);
        self.editing_index = None;
        info!(index, removed = suffix.len(), %conversation_id, "conversation truncated for edit");
        self.emit(ConversationEvent::Truncated { len: index, removed: suffix.len() });

        let result = self.send(new_text, conversation_id, persist).await;
        if let Err(StoreError::CompletionFailed(_)) = &result {
            if self.edit_failure == EditFailurePolicy::Restore {
                self.turns.truncate(index);
                self.turns.extend(suffix);
                info!(len = self.turns.len(), "edit failed, previous turns restored");
                self.emit(ConversationEvent::RolledBack { len: self.turns.len() });
            }
        }
        result
    }

    /// Mark the user turn at `index` as being edited and return its text for
    /// the input field.
    pub fn start_editing(&mut self, index: usize) -> Result<&str, StoreError> {
        self.user_turn(index)?;
        self.editing_index = Some(index);
        Ok(&self.turns[index].text)
    }

    pub fn cancel_editing(&mut self) {
        self.editing_index = None;
    }

    /// Submit the edit started with [`start_editing`](Self::start_editing).
    pub async fn commit_edit(&mut self, new_text: &str) -> Result<Outcome, StoreError> {
        let index = self.editing_index.ok_or(StoreError::NotEditing)?;
        self.edit(index, new_text).await
    }

    // ── Delete ────────────────────────────────────────────────────────────────

    /// Remove the user turn at `index` together with its reply.
    ///
    /// A pending turn never reached the record store and is dropped locally.
    /// Otherwise the record is deleted first and local state is only touched
    /// once that succeeded.
    pub async fn delete(&mut self, index: usize) -> Result<Outcome, StoreError> {
        let turn = self.user_turn(index)?;
        let pending = turn.pending;
        let record_id = turn.record_id.clone();

        if !pending {
            let record_id = record_id.ok_or(StoreError::NotPersisted(index))?;
            self.records
                .delete_record(&record_id)
                .await
                .map_err(|e| StoreError::persistence(RecordOp::Delete, e))?;
            debug!(index, %record_id, "record deleted");
        }

        let mut indices = vec![index];
        if let Some(partner) = find_pair(&self.turns, index) {
            indices.push(partner);
        }
        for &i in indices.iter().rev() {
            self.turns.remove(i);
        }
        self.editing_index = self.editing_index.and_then(|e| {
            if indices.contains(&e) {
                None
            } else {
                Some(e - indices.iter().filter(|&&i| i < e).count())
            }
        });
        info!(?indices, local_only = pending, "turns removed");
        self.emit(ConversationEvent::Removed { indices });
        Ok(Outcome::Completed)
    }
}
