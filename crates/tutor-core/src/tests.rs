/// Tests for the conversation store.
///
/// Uses ScriptedMockProvider and InMemoryRecordStore so every scenario is
/// deterministic and requires no network access.
#[cfg(test)]
mod store_tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;
    use tutor_config::{BackendConfig, EditFailurePolicy};
    use tutor_model::{
        from_config, ChatRecord, InMemoryRecordStore, RecordOp, ScriptedMockProvider,
        SessionContext,
    };

    use crate::{ConversationEvent, ConversationStore, Outcome, Sender, StoreError, Turn};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn seeded_records(n: usize) -> InMemoryRecordStore {
        InMemoryRecordStore::with_records(
            (1..=n)
                .map(|i| ChatRecord {
                    record_id: format!("rec-{i}"),
                    conversation_id: format!("conv-{i}"),
                    user_message: format!("question {i}"),
                    bot_message: format!("answer {i}"),
                })
                .collect(),
        )
    }

    fn store_with(model: &Arc<ScriptedMockProvider>, records: &InMemoryRecordStore) -> ConversationStore {
        ConversationStore::from_parts(
            model.clone(),
            Arc::new(records.clone()),
            SessionContext::new(Some("u1".into()), None),
        )
    }

    /// A store loaded with `n` persisted pairs (2n turns).
    async fn loaded(
        model: &Arc<ScriptedMockProvider>,
        n: usize,
    ) -> (ConversationStore, InMemoryRecordStore) {
        let records = seeded_records(n);
        let mut store = store_with(model, &records);
        store.load_history().await.unwrap();
        (store, records)
    }

    fn texts(store: &ConversationStore) -> Vec<&str> {
        store.turns().iter().map(|t| t.text.as_str()).collect()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ConversationEvent>) -> Vec<ConversationEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    // ── History ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn load_history_expands_each_record_into_two_turns() {
        let model = Arc::new(ScriptedMockProvider::replies(Vec::<String>::new()));
        let records = seeded_records(2);
        let mut store = store_with(&model, &records);

        assert_eq!(store.load_history().await.unwrap(), 2);
        assert_eq!(store.len(), 4);
        assert_eq!(texts(&store), ["question 1", "answer 1", "question 2", "answer 2"]);
        for pair in store.turns().chunks(2) {
            assert_eq!(pair[0].sender, Sender::User);
            assert_eq!(pair[1].sender, Sender::Assistant);
            assert_eq!(pair[0].record_id, pair[1].record_id);
            assert_eq!(pair[0].conversation_id, pair[1].conversation_id);
            assert!(!pair[0].pending && !pair[1].pending);
        }
    }

    #[tokio::test]
    async fn load_history_failure_leaves_turns_untouched() {
        let model = Arc::new(ScriptedMockProvider::replies(["fresh"]));
        let records = InMemoryRecordStore::new();
        let mut store = store_with(&model, &records);
        store.append("hello").await.unwrap();
        let before = store.turns().to_vec();

        records.set_failing(RecordOp::Load, true);
        let err = store.load_history().await.unwrap_err();
        assert!(matches!(err, StoreError::PersistenceFailed { op: RecordOp::Load, .. }));
        assert!(!err.is_warning());
        assert_eq!(store.turns(), before.as_slice());
    }

    // ── Append ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn append_adds_pair_sharing_conversation_and_record_id() {
        let model = Arc::new(ScriptedMockProvider::always_text("n log n is fast"));
        let records = InMemoryRecordStore::new();
        let mut store = store_with(&model, &records);

        let outcome = store.append("What is O(n log n)?").await.unwrap();
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(store.len(), 2);

        let (user, reply) = (&store.turns()[0], &store.turns()[1]);
        assert_eq!(user.sender, Sender::User);
        assert_eq!(user.text, "What is O(n log n)?");
        assert_eq!(reply.sender, Sender::Assistant);
        assert_eq!(reply.text, "n log n is fast");
        assert_eq!(user.conversation_id, reply.conversation_id);
        assert_eq!(user.record_id, Some("rec-1".to_string()));
        assert_eq!(user.record_id, reply.record_id);
        assert!(!user.pending && !reply.pending);

        let stored = records.records();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_message, "What is O(n log n)?");
        assert_eq!(stored[0].bot_message, "n log n is fast");
        assert_eq!(stored[0].conversation_id, user.conversation_id);
    }

    #[tokio::test]
    async fn append_sends_text_and_conversation_id_to_provider() {
        let model = Arc::new(ScriptedMockProvider::always_text("ok"));
        let mut store = store_with(&model, &InMemoryRecordStore::new());

        store.append("explain recursion").await.unwrap();
        let req = model.last_request().unwrap();
        assert_eq!(req.message, "explain recursion");
        assert_eq!(req.conversation_id, store.turns()[0].conversation_id);
    }

    #[tokio::test]
    async fn each_append_gets_a_fresh_conversation_id() {
        let model = Arc::new(ScriptedMockProvider::replies(["one", "two"]));
        let mut store = store_with(&model, &InMemoryRecordStore::new());

        store.append("first").await.unwrap();
        store.append("second").await.unwrap();
        assert_eq!(store.len(), 4);
        assert_ne!(store.turns()[0].conversation_id, store.turns()[2].conversation_id);
        assert_ne!(store.turns()[0].record_id, store.turns()[2].record_id);
    }

    #[tokio::test]
    async fn append_completion_failure_leaves_turns_exactly_as_before() {
        let model = Arc::new(ScriptedMockProvider::failing("upstream timeout"));
        let (mut store, records) = loaded(&model, 2).await;
        let before = store.turns().to_vec();

        let err = store.append("will fail").await.unwrap_err();
        match &err {
            StoreError::CompletionFailed(reason) => assert!(reason.contains("upstream timeout")),
            other => panic!("expected CompletionFailed, got {other:?}"),
        }
        assert!(!err.is_warning());
        assert_eq!(store.turns(), before.as_slice());
        assert!(!store.has_pending());
        assert_eq!(records.records().len(), 2, "no record may be left behind");
    }

    #[tokio::test]
    async fn append_create_failure_keeps_reply_and_warns() {
        let model = Arc::new(ScriptedMockProvider::always_text("still answered"));
        let records = InMemoryRecordStore::new();
        records.set_failing(RecordOp::Create, true);
        let mut store = store_with(&model, &records);

        let err = store.append("hello").await.unwrap_err();
        assert!(matches!(err, StoreError::PersistenceFailed { op: RecordOp::Create, .. }));
        assert!(err.is_warning());

        assert_eq!(texts(&store), ["hello", "still answered"]);
        assert!(store.turns()[0].pending);
        assert_eq!(store.turns()[0].record_id, None);
        assert_eq!(store.turns()[1].record_id, None);
        assert!(records.records().is_empty());
    }

    #[tokio::test]
    async fn empty_append_is_skipped_without_calling_provider() {
        let model = Arc::new(ScriptedMockProvider::always_text("unused"));
        let mut store = store_with(&model, &InMemoryRecordStore::new());

        assert_eq!(store.append("   \n\t").await.unwrap(), Outcome::Skipped);
        assert!(store.is_empty());
        assert_eq!(model.call_count(), 0);
    }

    // ── Edit ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn edit_third_of_six_truncates_and_reuses_conversation() {
        let model = Arc::new(ScriptedMockProvider::always_text("revised answer"));
        let (mut store, records) = loaded(&model, 3).await;
        assert_eq!(store.len(), 6);

        let outcome = store.edit(2, "question 2, revised").await.unwrap();
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(store.len(), 2 + 2);
        assert_eq!(
            texts(&store),
            ["question 1", "answer 1", "question 2, revised", "revised answer"]
        );
        assert_eq!(store.turns()[2].conversation_id, "conv-2");
        assert_eq!(store.turns()[3].conversation_id, "conv-2");
        assert_eq!(store.turns()[2].record_id, Some("rec-2".to_string()));
        assert_eq!(model.last_request().unwrap().conversation_id, "conv-2");

        // Overwritten in place, not duplicated.
        let stored = records.records();
        assert_eq!(stored.len(), 3);
        let rec = stored.iter().find(|r| r.record_id == "rec-2").unwrap();
        assert_eq!(rec.user_message, "question 2, revised");
        assert_eq!(rec.bot_message, "revised answer");
    }

    #[tokio::test]
    async fn edit_of_latest_turn_replaces_last_pair() {
        let model = Arc::new(ScriptedMockProvider::always_text("new last"));
        let (mut store, _records) = loaded(&model, 3).await;

        store.edit(4, "question 3 again").await.unwrap();
        assert_eq!(store.len(), 6);
        assert_eq!(store.turns()[5].text, "new last");
        assert_eq!(store.turns()[5].record_id, Some("rec-3".to_string()));
    }

    #[tokio::test]
    async fn edit_completion_failure_discards_suffix_by_default() {
        let model = Arc::new(ScriptedMockProvider::failing("model down"));
        let (mut store, records) = loaded(&model, 3).await;

        let err = store.edit(2, "retry").await.unwrap_err();
        assert!(matches!(err, StoreError::CompletionFailed(_)));
        assert_eq!(texts(&store), ["question 1", "answer 1"]);
        // The server side is not touched.
        assert_eq!(records.records().len(), 3);
    }

    #[tokio::test]
    async fn edit_completion_failure_restores_when_configured() {
        let model = Arc::new(ScriptedMockProvider::failing("model down"));
        let (store, _records) = loaded(&model, 3).await;
        let mut store = store.with_edit_failure(EditFailurePolicy::Restore);
        let before = store.turns().to_vec();

        store.edit(2, "retry").await.unwrap_err();
        assert_eq!(store.turns(), before.as_slice());
    }

    #[tokio::test]
    async fn edit_update_failure_keeps_reply_and_record_id() {
        let model = Arc::new(ScriptedMockProvider::always_text("fresh reply"));
        let (mut store, records) = loaded(&model, 3).await;
        records.set_failing(RecordOp::Update, true);

        let err = store.edit(2, "changed").await.unwrap_err();
        assert!(matches!(err, StoreError::PersistenceFailed { op: RecordOp::Update, .. }));
        assert!(err.is_warning());
        assert_eq!(texts(&store), ["question 1", "answer 1", "changed", "fresh reply"]);
        assert_eq!(store.turns()[2].record_id, Some("rec-2".to_string()));
        assert_eq!(store.turns()[3].record_id, Some("rec-2".to_string()));
        assert!(!store.has_pending());
    }

    #[tokio::test]
    async fn edit_of_unpersisted_turn_creates_record() {
        let model = Arc::new(ScriptedMockProvider::replies(["first", "second"]));
        let records = InMemoryRecordStore::new();
        records.set_failing(RecordOp::Create, true);
        let mut store = store_with(&model, &records);
        store.append("hello").await.unwrap_err();
        let conversation_id = store.turns()[0].conversation_id.clone();

        records.set_failing(RecordOp::Create, false);
        store.edit(0, "hello again").await.unwrap();
        assert_eq!(texts(&store), ["hello again", "second"]);
        assert_eq!(store.turns()[0].conversation_id, conversation_id);
        assert_eq!(store.turns()[0].record_id, Some("rec-1".to_string()));
        assert_eq!(records.records().len(), 1);
    }

    #[tokio::test]
    async fn empty_edit_cancels_without_mutation() {
        let model = Arc::new(ScriptedMockProvider::always_text("unused"));
        let (mut store, _records) = loaded(&model, 2).await;
        let before = store.turns().to_vec();
        store.start_editing(0).unwrap();

        assert_eq!(store.edit(0, "  ").await.unwrap(), Outcome::Skipped);
        assert_eq!(store.turns(), before.as_slice());
        assert_eq!(store.editing_index(), None);
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn edit_rejects_assistant_turn_and_bad_index() {
        let model = Arc::new(ScriptedMockProvider::always_text("unused"));
        let (mut store, _records) = loaded(&model, 1).await;

        assert_eq!(store.edit(1, "x").await.unwrap_err(), StoreError::NotUserTurn(1));
        assert_eq!(store.edit(7, "x").await.unwrap_err(), StoreError::InvalidIndex(7));
        assert_eq!(store.len(), 2);
    }

    // ── Editing session ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn start_editing_returns_text_and_commit_edits() {
        let model = Arc::new(ScriptedMockProvider::always_text("better answer"));
        let (mut store, _records) = loaded(&model, 2).await;

        assert_eq!(store.start_editing(2).unwrap(), "question 2");
        assert_eq!(store.editing_index(), Some(2));
        store.commit_edit("question 2 reworded").await.unwrap();
        assert_eq!(store.editing_index(), None);
        assert_eq!(store.turns()[2].text, "question 2 reworded");
        assert_eq!(store.turns()[3].text, "better answer");
    }

    #[tokio::test]
    async fn editing_session_rules() {
        let model = Arc::new(ScriptedMockProvider::always_text("unused"));
        let (mut store, _records) = loaded(&model, 1).await;

        assert_eq!(store.start_editing(1).unwrap_err(), StoreError::NotUserTurn(1));
        assert_eq!(store.editing_index(), None);
        assert_eq!(store.commit_edit("x").await.unwrap_err(), StoreError::NotEditing);

        store.start_editing(0).unwrap();
        store.cancel_editing();
        assert_eq!(store.editing_index(), None);
    }

    // ── Delete ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn delete_persisted_turn_removes_exactly_its_pair() {
        let model = Arc::new(ScriptedMockProvider::always_text("unused"));
        let (mut store, records) = loaded(&model, 3).await;

        assert_eq!(store.delete(2).await.unwrap(), Outcome::Completed);
        assert_eq!(texts(&store), ["question 1", "answer 1", "question 3", "answer 3"]);
        let ids: Vec<_> = records.records().into_iter().map(|r| r.record_id).collect();
        assert_eq!(ids, ["rec-1", "rec-3"]);
    }

    #[tokio::test]
    async fn delete_pending_turn_is_local_only() {
        let model = Arc::new(ScriptedMockProvider::always_text("unsynced reply"));
        let records = InMemoryRecordStore::new();
        records.set_failing(RecordOp::Create, true);
        let mut store = store_with(&model, &records);
        store.append("never stored").await.unwrap_err();
        // A remote call would fail; a local removal must not make one.
        records.set_failing(RecordOp::Delete, true);

        store.delete(0).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_remote_failure_changes_nothing() {
        let model = Arc::new(ScriptedMockProvider::always_text("unused"));
        let (mut store, records) = loaded(&model, 2).await;
        records.set_failing(RecordOp::Delete, true);
        let before = store.turns().to_vec();

        let err = store.delete(0).await.unwrap_err();
        assert!(matches!(err, StoreError::PersistenceFailed { op: RecordOp::Delete, .. }));
        assert!(!err.is_warning());
        assert_eq!(store.turns(), before.as_slice());
        assert_eq!(records.records().len(), 2);
    }

    #[tokio::test]
    async fn delete_rejects_assistant_turn() {
        let model = Arc::new(ScriptedMockProvider::always_text("unused"));
        let (mut store, _records) = loaded(&model, 1).await;
        assert_eq!(store.delete(1).await.unwrap_err(), StoreError::NotUserTurn(1));
    }

    #[tokio::test]
    async fn delete_shifts_or_clears_editing_index() {
        let model = Arc::new(ScriptedMockProvider::always_text("unused"));
        let (mut store, _records) = loaded(&model, 3).await;

        store.start_editing(4).unwrap();
        store.delete(0).await.unwrap();
        assert_eq!(store.editing_index(), Some(2));
        assert_eq!(store.turns()[2].text, "question 3");

        store.delete(2).await.unwrap();
        assert_eq!(store.editing_index(), None);
    }

    // ── Events ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn append_emits_pending_turn_then_confirmation_then_reply() {
        let model = Arc::new(ScriptedMockProvider::always_text("hi there"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = store_with(&model, &InMemoryRecordStore::new()).with_events(tx);

        store.append("hello").await.unwrap();
        let events = drain(&mut rx);
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], ConversationEvent::TurnAdded { index: 0, turn } if turn.pending));
        assert_eq!(
            events[1],
            ConversationEvent::Persisted { index: 0, record_id: "rec-1".into() }
        );
        assert!(matches!(&events[2], ConversationEvent::TurnAdded { index: 1, turn: Turn { sender: Sender::Assistant, .. } }));
    }

    #[tokio::test]
    async fn failed_append_emits_rollback() {
        let model = Arc::new(ScriptedMockProvider::failing("nope"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = store_with(&model, &InMemoryRecordStore::new()).with_events(tx);

        store.append("hello").await.unwrap_err();
        let events = drain(&mut rx);
        assert!(matches!(events[0], ConversationEvent::TurnAdded { index: 0, .. }));
        assert_eq!(events[1], ConversationEvent::RolledBack { len: 0 });
    }

    #[tokio::test]
    async fn edit_emits_truncation_and_delete_emits_removed_indices() {
        let model = Arc::new(ScriptedMockProvider::always_text("again"));
        let records = seeded_records(3);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = store_with(&model, &records).with_events(tx);
        store.load_history().await.unwrap();
        assert_eq!(drain(&mut rx), [ConversationEvent::HistoryLoaded { turns: 6 }]);

        store.edit(2, "changed").await.unwrap();
        let events = drain(&mut rx);
        assert_eq!(events[0], ConversationEvent::Truncated { len: 2, removed: 4 });

        store.delete(0).await.unwrap();
        assert_eq!(drain(&mut rx), [ConversationEvent::Removed { indices: vec![0, 1] }]);
    }

    #[tokio::test]
    async fn persistence_warning_event_on_create_failure() {
        let model = Arc::new(ScriptedMockProvider::always_text("reply"));
        let records = InMemoryRecordStore::new();
        records.set_failing(RecordOp::Create, true);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = store_with(&model, &records).with_events(tx);

        store.append("hello").await.unwrap_err();
        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, ConversationEvent::PersistenceWarning { op: RecordOp::Create, .. })));
        assert!(!events.iter().any(|e| matches!(e, ConversationEvent::Persisted { .. })));
    }

    // ── Construction from configuration ──────────────────────────────────────

    #[tokio::test]
    async fn store_from_mock_backend_echoes() {
        let cfg = BackendConfig { provider: "mock".into(), ..BackendConfig::default() };
        let session = SessionContext::from_backend(&cfg);
        let collaborators = from_config(&cfg, &session).unwrap();
        let mut store = ConversationStore::new(collaborators, session);

        store.append("ping").await.unwrap();
        assert_eq!(store.turns()[1].text, "MOCK: ping");
        assert_eq!(store.turns()[1].record_id, Some("rec-1".to_string()));
    }
}
