// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Boundary to the services the conversation store depends on: the remote
//! completion endpoint and the remote record store.

mod types;
mod session;
mod provider;
mod records;
mod http;
mod mock;

use std::sync::Arc;

pub use types::*;
pub use session::SessionContext;
pub use provider::CompletionProvider;
pub use records::RecordStore;
pub use http::{HttpCompletionProvider, HttpRecordStore};
pub use mock::{InMemoryRecordStore, MockProvider, ScriptedMockProvider};

use anyhow::bail;
use tutor_config::BackendConfig;

/// The pair of collaborators a conversation store is built from.
#[derive(Clone)]
pub struct Collaborators {
    pub completion: Arc<dyn CompletionProvider>,
    pub records: Arc<dyn RecordStore>,
}

/// Construct both collaborators from configuration.
///
/// Provider selection:
/// - `"http"` → [`HttpCompletionProvider`] + [`HttpRecordStore`]
/// - `"mock"` → [`MockProvider`] (echo-back) + [`InMemoryRecordStore`]
pub fn from_config(cfg: &BackendConfig, session: &SessionContext) -> anyhow::Result<Collaborators> {
    match cfg.provider.as_str() {
        "http" => Ok(Collaborators {
            completion: Arc::new(HttpCompletionProvider::new(
                cfg.completion_url.clone(),
                session.clone(),
            )),
            records: Arc::new(HttpRecordStore::new(cfg.api_url.clone(), session.clone())),
        }),
        "mock" => Ok(Collaborators {
            completion: Arc::new(MockProvider),
            records: Arc::new(InMemoryRecordStore::new()),
        }),
        other => bail!("unknown backend provider: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_selects_mock() {
        let cfg = BackendConfig { provider: "mock".into(), ..BackendConfig::default() };
        let c = from_config(&cfg, &SessionContext::anonymous()).unwrap();
        assert_eq!(c.completion.name(), "mock");
    }

    #[test]
    fn from_config_selects_http() {
        let c = from_config(&BackendConfig::default(), &SessionContext::anonymous()).unwrap();
        assert_eq!(c.completion.name(), "http");
    }

    #[test]
    fn from_config_rejects_unknown_provider() {
        let cfg = BackendConfig { provider: "carrier-pigeon".into(), ..BackendConfig::default() };
        let err = from_config(&cfg, &SessionContext::anonymous()).err().unwrap();
        assert!(err.to_string().contains("carrier-pigeon"));
    }
}
