// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Where replies come from and where conversation records are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Collaborator implementation: "http" | "mock"
    pub provider: String,
    /// Base URL of the record store (`/api/chat`, `/api/chats` are appended)
    pub api_url: String,
    /// Full URL of the completion endpoint
    pub completion_url: String,
    /// Environment variable that holds the bearer token (read at runtime)
    pub token_env: Option<String>,
    /// Explicit bearer token; prefer token_env in config files to avoid
    /// secrets in version-controlled files
    pub token: Option<String>,
    /// Identifier of the signed-in user, sent with every created record
    pub user_id: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: "http".into(),
            api_url: "http://localhost:5000".into(),
            completion_url: "http://localhost:8000/chat".into(),
            token_env: Some("TUTOR_TOKEN".into()),
            token: None,
            user_id: None,
        }
    }
}

impl BackendConfig {
    /// Resolve the bearer token: explicit value first, then the named
    /// environment variable.
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(t) = &self.token {
            return Some(t.clone());
        }
        self.token_env
            .as_deref()
            .and_then(|env| std::env::var(env).ok())
            .filter(|t| !t.is_empty())
    }
}

/// What happens to the discarded suffix when an edit's completion call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EditFailurePolicy {
    /// The turns after the edited one stay discarded.
    #[default]
    Discard,
    /// The whole pre-edit conversation is put back.
    Restore,
}

impl std::fmt::Display for EditFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditFailurePolicy::Discard => write!(f, "discard"),
            EditFailurePolicy::Restore => write!(f, "restore"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Starter prompts listed by `/suggest`
    pub suggestions: Vec<String>,
    pub edit_failure: EditFailurePolicy,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            suggestions: vec![
                "Explain binary search complexity".into(),
                "How do I implement a bubble sort?".into(),
                "What's the best way to solve this sorting problem?".into(),
                "Help me understand merge sort".into(),
            ],
            edit_failure: EditFailurePolicy::Discard,
        }
    }
}
