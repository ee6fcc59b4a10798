// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processing-path behavior behind the ingress: journaling on failure,
//! trigger dispatch on success.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use wahook_core::event::RawEvent;
use wahook_gateway::handlers::process_event;
use wahook_gateway::GatewayState;
use wahook_ingest::Normalizer;
use wahook_recovery::FailureJournal;
use wahook_rules::RuleEngine;
use wahook_test_utils::{MockStore, RecordingActionSink, RecordingNotifier};

struct Harness {
    _dir: tempfile::TempDir,
    state: Arc<GatewayState<MockStore, RecordingNotifier, RecordingActionSink>>,
    store: Arc<MockStore>,
    journal: Arc<FailureJournal>,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let journal = Arc::new(FailureJournal::new(dir.path()));
    journal.ensure_dirs().await.unwrap();
    let store = MockStore::new();
    let notifier = RecordingNotifier::new();
    let normalizer = Arc::new(Normalizer::new(Arc::clone(&store), Arc::clone(&notifier)));
    let engine = Arc::new(
        RuleEngine::new(
            Arc::clone(&store),
            RecordingActionSink::new(),
            notifier,
            Duration::from_secs(5),
            0,
        )
        .unwrap(),
    );
    let state = Arc::new(GatewayState {
        normalizer,
        journal: Arc::clone(&journal),
        engine,
        store: Arc::clone(&store),
        default_instance: "default".to_string(),
    });
    Harness {
        _dir: dir,
        state,
        store,
        journal,
    }
}

fn delivery() -> RawEvent {
    RawEvent::new(
        "inst-1",
        "messages.upsert",
        json!({"data": {"messages": [{
            "key": {"id": "A1", "remoteJid": "555@c.us"},
            "message": {"conversation": "hello"},
            "messageTimestamp": 1_700_000_000
        }]}}),
        None,
    )
}

#[tokio::test]
async fn successful_delivery_persists_and_leaves_no_journal_entry() {
    let h = harness().await;
    process_event(Arc::clone(&h.state), delivery()).await;

    assert_eq!(h.store.message_count(), 1);
    assert!(h.journal.pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn store_failure_lands_in_the_journal_not_the_caller() {
    let h = harness().await;
    h.store.fail_writes();

    process_event(Arc::clone(&h.state), delivery()).await;

    let pending = h.journal.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].event_type, "messages.upsert");
    assert_eq!(pending[0].retry_count, 0);
}

#[tokio::test]
async fn unknown_event_is_ignored_without_journaling() {
    let h = harness().await;
    let raw = RawEvent::new("inst-1", "presence.update", json!({"data": {}}), None);

    process_event(Arc::clone(&h.state), raw).await;

    assert_eq!(h.store.message_count(), 0);
    assert!(h.journal.pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_payload_is_journaled_for_recovery() {
    let h = harness().await;
    let raw = RawEvent::new(
        "inst-1",
        "messages.upsert",
        json!({"data": {"noise": true}}),
        None,
    );

    process_event(Arc::clone(&h.state), raw).await;

    let pending = h.journal.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert!(pending[0].error.contains("malformed payload"));
}
