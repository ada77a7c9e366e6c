// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! JSON-over-HTTP collaborators for the hosted tutoring backend.

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::{
    ChatRecord, CompletionReply, CompletionRequest, NewRecord, RecordId, RecordUpdate,
    SessionContext,
};

/// Turn a non-2xx response into an error carrying status and body text.
async fn check_status(what: &str, resp: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    bail!("{what} error {status}: {text}");
}

// ─── Completion ───────────────────────────────────────────────────────────────

/// Completion endpoint: `POST <url>` with `{message, conversationId}`,
/// answered by `{response}`.
pub struct HttpCompletionProvider {
    client: reqwest::Client,
    url: String,
    session: SessionContext,
}

impl HttpCompletionProvider {
    pub fn new(url: impl Into<String>, session: SessionContext) -> Self {
        Self { client: reqwest::Client::new(), url: url.into(), session }
    }
}

#[async_trait]
impl crate::CompletionProvider for HttpCompletionProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn complete_turn(
        &self,
        message: &str,
        conversation_id: &str,
    ) -> anyhow::Result<CompletionReply> {
        let body = CompletionRequest {
            message: message.to_string(),
            conversation_id: conversation_id.to_string(),
        };
        debug!(url = %self.url, conversation_id, "sending completion request");

        let req = self.session.authorize(self.client.post(&self.url).json(&body));
        let resp = req.send().await.context("completion request failed")?;
        let resp = check_status("completion", resp).await?;
        resp.json::<CompletionReply>()
            .await
            .context("decoding completion reply")
    }
}

// ─── Record store ─────────────────────────────────────────────────────────────

/// Shape of the create response; only the identifier is used.
#[derive(Deserialize)]
struct CreatedRecord {
    #[serde(rename = "_id", alias = "recordId", alias = "id")]
    record_id: RecordId,
}

/// REST record store rooted at `base_url`:
/// `POST /api/chat`, `PUT /api/chat/{id}`, `DELETE /api/chat/{id}`,
/// `GET /api/chats`.
pub struct HttpRecordStore {
    client: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl HttpRecordStore {
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    fn chat_url(&self, record_id: Option<&str>) -> String {
        match record_id {
            Some(id) => format!("{}/api/chat/{id}", self.base_url),
            None => format!("{}/api/chat", self.base_url),
        }
    }
}

#[async_trait]
impl crate::RecordStore for HttpRecordStore {
    async fn create_record(&self, record: NewRecord) -> anyhow::Result<RecordId> {
        let url = self.chat_url(None);
        debug!(%url, conversation_id = %record.conversation_id, "creating record");
        let req = self.session.authorize(self.client.post(&url).json(&record));
        let resp = req.send().await.context("create record request failed")?;
        let resp = check_status("create record", resp).await?;
        let created: CreatedRecord = resp.json().await.context("decoding created record")?;
        Ok(created.record_id)
    }

    async fn update_record(&self, record_id: &str, update: RecordUpdate) -> anyhow::Result<()> {
        let url = self.chat_url(Some(record_id));
        debug!(%url, record_id, "updating record");
        let req = self.session.authorize(self.client.put(&url).json(&update));
        let resp = req.send().await.context("update record request failed")?;
        check_status("update record", resp).await?;
        Ok(())
    }

    async fn delete_record(&self, record_id: &str) -> anyhow::Result<()> {
        let url = self.chat_url(Some(record_id));
        debug!(%url, record_id, "deleting record");
        let req = self.session.authorize(self.client.delete(&url));
        let resp = req.send().await.context("delete record request failed")?;
        check_status("delete record", resp).await?;
        Ok(())
    }

    async fn load_history(&self) -> anyhow::Result<Vec<ChatRecord>> {
        let url = format!("{}/api/chats", self.base_url);
        debug!(%url, "loading history");
        let req = self.session.authorize(self.client.get(&url));
        let resp = req.send().await.context("history request failed")?;
        let resp = check_status("history", resp).await?;
        resp.json().await.context("decoding history")
    }
}
