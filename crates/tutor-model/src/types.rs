// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// Identifier the record store assigns to a persisted user/assistant pair.
pub type RecordId = String;

/// Body of a completion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub message: String,
    pub conversation_id: String,
}

/// Reply of a completion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReply {
    pub response: String,
}

/// A turn pair to be stored for the first time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub user_message: String,
    pub bot_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub conversation_id: String,
}

/// Replacement content for an existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUpdate {
    pub user_message: String,
    pub bot_message: String,
    pub conversation_id: String,
}

/// A persisted turn pair as returned by the history listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    #[serde(rename = "_id", alias = "recordId", alias = "id")]
    pub record_id: RecordId,
    pub conversation_id: String,
    pub user_message: String,
    pub bot_message: String,
}

/// Record-store operation, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordOp {
    Create,
    Update,
    Delete,
    Load,
}

impl std::fmt::Display for RecordOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordOp::Create => write!(f, "create"),
            RecordOp::Update => write!(f, "update"),
            RecordOp::Delete => write!(f, "delete"),
            RecordOp::Load => write!(f, "load"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_record_reads_mongo_style_id() {
        let rec: ChatRecord = serde_json::from_str(
            r#"{"_id":"abc","conversationId":"c1","userMessage":"q","botMessage":"a","__v":0}"#,
        )
        .unwrap();
        assert_eq!(rec.record_id, "abc");
        assert_eq!(rec.conversation_id, "c1");
    }

    #[test]
    fn new_record_omits_missing_user_id() {
        let body = serde_json::to_value(NewRecord {
            user_message: "q".into(),
            bot_message: "a".into(),
            user_id: None,
            conversation_id: "c".into(),
        })
        .unwrap();
        assert!(body.get("userId").is_none());
        assert_eq!(body["userMessage"], "q");
        assert_eq!(body["conversationId"], "c");
    }
}
