// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;

use crate::{ChatRecord, NewRecord, RecordId, RecordUpdate};

/// Durable storage of user/assistant turn pairs.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Store a new pair and return the identifier assigned to it.
    async fn create_record(&self, record: NewRecord) -> anyhow::Result<RecordId>;

    /// Overwrite the pair stored under `record_id`.
    async fn update_record(&self, record_id: &str, update: RecordUpdate) -> anyhow::Result<()>;

    async fn delete_record(&self, record_id: &str) -> anyhow::Result<()>;

    /// All stored pairs, oldest first.
    async fn load_history(&self) -> anyhow::Result<Vec<ChatRecord>>;
}
