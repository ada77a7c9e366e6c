// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use tutor_config::BackendConfig;

/// Who is talking to the backend.  Handed explicitly to every collaborator
/// that needs credentials; nothing reads ambient auth state.
#[derive(Clone, Default)]
pub struct SessionContext {
    pub user_id: Option<String>,
    pub token: Option<String>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(user_id: Option<String>, token: Option<String>) -> Self {
        Self { user_id, token }
    }

    pub fn from_backend(cfg: &BackendConfig) -> Self {
        Self { user_id: cfg.user_id.clone(), token: cfg.resolve_token() }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Attach the bearer token, if any, to an outgoing request.
    pub(crate) fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("user_id", &self.user_id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
