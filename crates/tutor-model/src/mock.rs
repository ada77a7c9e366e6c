// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, bail};
use async_trait::async_trait;

use crate::{
    ChatRecord, CompletionReply, CompletionRequest, NewRecord, RecordId, RecordOp, RecordUpdate,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Deterministic mock provider.  Echoes the message back as the reply.
#[derive(Default)]
pub struct MockProvider;

#[async_trait]
impl crate::CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete_turn(
        &self,
        message: &str,
        _conversation_id: &str,
    ) -> anyhow::Result<CompletionReply> {
        Ok(CompletionReply { response: format!("MOCK: {message}") })
    }
}

/// A pre-scripted mock provider.  Each call to `complete_turn` pops the next
/// script from the front of the queue: `Ok(text)` becomes the reply,
/// `Err(reason)` becomes a failed call.
pub struct ScriptedMockProvider {
    scripts: Arc<Mutex<VecDeque<Result<String, String>>>>,
    /// Every request seen by this provider, oldest first.
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedMockProvider {
    pub fn new(scripts: Vec<Result<String, String>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Convenience: provider whose replies are `replies`, in order.
    pub fn replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    /// Convenience: provider that always returns a single text reply.
    pub fn always_text(reply: impl Into<String>) -> Self {
        Self::new(vec![Ok(reply.into())])
    }

    /// Convenience: provider whose first call fails.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::new(vec![Err(reason.into())])
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        lock(&self.requests).last().cloned()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl crate::CompletionProvider for ScriptedMockProvider {
    fn name(&self) -> &str {
        "scripted-mock"
    }

    async fn complete_turn(
        &self,
        message: &str,
        conversation_id: &str,
    ) -> anyhow::Result<CompletionReply> {
        lock(&self.requests).push(CompletionRequest {
            message: message.to_string(),
            conversation_id: conversation_id.to_string(),
        });
        // Default fallback when all scripts are consumed
        let script = lock(&self.scripts)
            .pop_front()
            .unwrap_or_else(|| Ok("[no more scripts]".to_string()));
        match script {
            Ok(response) => Ok(CompletionReply { response }),
            Err(reason) => Err(anyhow!(reason)),
        }
    }
}

// ─── Record store ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordState {
    records: Vec<ChatRecord>,
    next_id: u64,
    failing: HashSet<RecordOp>,
}

/// In-memory record store.  Useful for testing and for running without a
/// backend.  Individual operations can be switched to fail.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    state: Arc<Mutex<RecordState>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with already-persisted records, oldest first.
    pub fn with_records(records: Vec<ChatRecord>) -> Self {
        let next_id = records.len() as u64;
        Self {
            state: Arc::new(Mutex::new(RecordState { records, next_id, ..Default::default() })),
        }
    }

    /// Make every subsequent `op` fail (or succeed again when `failing` is false).
    pub fn set_failing(&self, op: RecordOp, failing: bool) {
        let mut state = lock(&self.state);
        if failing {
            state.failing.insert(op);
        } else {
            state.failing.remove(&op);
        }
    }

    /// Snapshot of the stored records, oldest first.
    pub fn records(&self) -> Vec<ChatRecord> {
        lock(&self.state).records.clone()
    }

    fn check(state: &RecordState, op: RecordOp) -> anyhow::Result<()> {
        if state.failing.contains(&op) {
            bail!("record store unavailable ({op})");
        }
        Ok(())
    }
}

#[async_trait]
impl crate::RecordStore for InMemoryRecordStore {
    async fn create_record(&self, record: NewRecord) -> anyhow::Result<RecordId> {
        let mut state = lock(&self.state);
        Self::check(&state, RecordOp::Create)?;
        state.next_id += 1;
        let record_id = format!("rec-{}", state.next_id);
        state.records.push(ChatRecord {
            record_id: record_id.clone(),
            conversation_id: record.conversation_id,
            user_message: record.user_message,
            bot_message: record.bot_message,
        });
        Ok(record_id)
    }

    async fn update_record(&self, record_id: &str, update: RecordUpdate) -> anyhow::Result<()> {
        let mut state = lock(&self.state);
        Self::check(&state, RecordOp::Update)?;
        let rec = state
            .records
            .iter_mut()
            .find(|r| r.record_id == record_id)
            .ok_or_else(|| anyhow!("record not found: {record_id}"))?;
        rec.user_message = update.user_message;
        rec.bot_message = update.bot_message;
        rec.conversation_id = update.conversation_id;
        Ok(())
    }

    async fn delete_record(&self, record_id: &str) -> anyhow::Result<()> {
        let mut state = lock(&self.state);
        Self::check(&state, RecordOp::Delete)?;
        let before = state.records.len();
        state.records.retain(|r| r.record_id != record_id);
        if state.records.len() == before {
            bail!("record not found: {record_id}");
        }
        Ok(())
    }

    async fn load_history(&self) -> anyhow::Result<Vec<ChatRecord>> {
        let state = lock(&self.state);
        Self::check(&state, RecordOp::Load)?;
        Ok(state.records.clone())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
