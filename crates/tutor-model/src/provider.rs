// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;

use crate::CompletionReply;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider name for logs and status display.
    fn name(&self) -> &str;

    /// Ask the assistant to answer `message` within thread `conversation_id`.
    ///
    /// Transport and server failures are returned as errors; timeouts and
    /// retries are the implementation's business.
    async fn complete_turn(
        &self,
        message: &str,
        conversation_id: &str,
    ) -> anyhow::Result<CompletionReply>;
}
