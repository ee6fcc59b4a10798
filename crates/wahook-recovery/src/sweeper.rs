// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The periodic retry sweeper.
//!
//! A single timer drives sweeps; sweeps never overlap and records within
//! a sweep are processed sequentially, which keeps backoff accounting and
//! dead-lettering free of races. A health probe against the store gates
//! each sweep so retry budget is not burned against a known-down
//! dependency. A replayed event takes the same path as a live delivery:
//! its triggers go to the rule engine.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use wahook_core::event::RawEvent;
use wahook_core::time::now_rfc3339;
use wahook_core::types::{FailedEventRecord, HealthStatus};
use wahook_core::{ActionSink, Notifier, StoreGateway};
use wahook_ingest::Normalizer;
use wahook_rules::RuleEngine;

use crate::journal::FailureJournal;
use crate::sanitize::sanitize;

/// What one sweep did, for logging and tests.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub replayed: usize,
    pub retried: usize,
    pub dead_lettered: usize,
    pub deferred: usize,
}

pub struct Sweeper<S, N, A> {
    journal: Arc<FailureJournal>,
    normalizer: Arc<Normalizer<S, N>>,
    engine: Arc<RuleEngine<S, A, N>>,
    store: Arc<S>,
    backoff_secs: Vec<u64>,
    max_retries: u32,
    interval: Duration,
}

impl<S, N, A> Sweeper<S, N, A>
where
    S: StoreGateway,
    N: Notifier,
    A: ActionSink,
{
    pub fn new(
        journal: Arc<FailureJournal>,
        normalizer: Arc<Normalizer<S, N>>,
        engine: Arc<RuleEngine<S, A, N>>,
        store: Arc<S>,
        backoff_secs: Vec<u64>,
        max_retries: u32,
        interval: Duration,
    ) -> Self {
        debug_assert!(!backoff_secs.is_empty());
        Self {
            journal,
            normalizer,
            engine,
            store,
            backoff_secs,
            max_retries,
            interval,
        }
    }

    /// Run sweeps until cancelled. The timer skips missed ticks instead
    /// of bursting, so sweeps cannot pile up behind a slow store.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("recovery sweeper shutting down");
                    return;
                }
                _ = timer.tick() => {
                    let stats = self.sweep_once().await;
                    if stats != SweepStats::default() {
                        tracing::info!(
                            replayed = stats.replayed,
                            retried = stats.retried,
                            dead_lettered = stats.dead_lettered,
                            deferred = stats.deferred,
                            "recovery sweep finished"
                        );
                    }
                }
            }
        }
    }

    /// One full sweep over the pending journal.
    pub async fn sweep_once(&self) -> SweepStats {
        let mut stats = SweepStats::default();

        match self.store.health_check().await {
            Ok(HealthStatus::Healthy) => {}
            Ok(status) => {
                tracing::warn!(?status, "store not healthy, deferring all retries this cycle");
                return stats;
            }
            Err(e) => {
                tracing::warn!(error = %e, "health probe failed, deferring all retries");
                return stats;
            }
        }

        let records = match self.journal.pending().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "could not list journal");
                return stats;
            }
        };

        for record in records {
            if !self.is_due(&record) {
                stats.deferred += 1;
                continue;
            }
            self.replay(record, &mut stats).await;
        }
        stats
    }

    /// A record is due once the backoff interval for its retry count has
    /// elapsed since the last attempt (or since capture, before the
    /// first attempt). The last backoff entry is reused beyond the end
    /// of the schedule.
    fn is_due(&self, record: &FailedEventRecord) -> bool {
        let idx = (record.retry_count as usize).min(self.backoff_secs.len() - 1);
        let wait = Duration::from_secs(self.backoff_secs[idx]);
        let reference = record
            .last_retry_at
            .as_deref()
            .unwrap_or(&record.timestamp);
        match DateTime::parse_from_rfc3339(reference) {
            Ok(ts) => Utc::now() - ts.with_timezone(&Utc) >= chrono::Duration::from_std(wait)
                .unwrap_or_else(|_| chrono::Duration::zero()),
            // An unparseable timestamp should not pin the record forever.
            Err(_) => true,
        }
    }

    async fn replay(&self, mut record: FailedEventRecord, stats: &mut SweepStats) {
        let raw = RawEvent::new(
            record.instance_id.clone(),
            record.event_type.clone(),
            sanitize(&record.payload),
            record.sender.clone(),
        );

        match self.normalizer.process(&raw).await {
            Ok(outcome) => {
                // Rule dispatch is awaited here so a record is retired
                // only after its replay has fully run.
                for trigger in outcome.triggers {
                    self.engine.evaluate(&trigger).await;
                }
                if let Err(e) = self.journal.delete(&record.id).await {
                    tracing::error!(id = %record.id, error = %e, "replayed but could not delete journal entry");
                }
                stats.replayed += 1;
            }
            Err(e) => {
                record.retry_count += 1;
                record.last_retry_at = Some(now_rfc3339());
                record.error = e.to_string();
                if record.retry_count >= self.max_retries {
                    if let Err(e) = self.journal.dead_letter(&record).await {
                        tracing::error!(id = %record.id, error = %e, "dead-letter move failed");
                    }
                    stats.dead_lettered += 1;
                } else {
                    if let Err(e) = self.journal.update(&record).await {
                        tracing::error!(id = %record.id, error = %e, "could not persist retry accounting");
                    }
                    stats.retried += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use wahook_core::types::{ActionRule, ActionType, RuleAction, TriggerPermission, TriggerType};
    use wahook_test_utils::{MockStore, RecordingActionSink, RecordingNotifier};

    fn engine(
        store: &Arc<MockStore>,
        sink: &Arc<RecordingActionSink>,
    ) -> Arc<RuleEngine<MockStore, RecordingActionSink, RecordingNotifier>> {
        Arc::new(
            RuleEngine::new(
                Arc::clone(store),
                Arc::clone(sink),
                RecordingNotifier::new(),
                Duration::from_secs(5),
                0,
            )
            .unwrap(),
        )
    }

    fn failing_error() -> wahook_core::WahookError {
        wahook_core::WahookError::Persistence {
            entity: "message".into(),
            source: Box::new(std::io::Error::other("store down")),
        }
    }

    fn message_event() -> RawEvent {
        RawEvent::new(
            "inst-1",
            "messages.upsert",
            json!({"data": {"messages": [{
                "key": {"id": "A1", "remoteJid": "123@g.us", "participant": "555@c.us"},
                "message": {"conversation": "hi"},
                "messageTimestamp": 1_700_000_000
            }]}}),
            None,
        )
    }

    struct Harness {
        _dir: tempfile::TempDir,
        journal: Arc<FailureJournal>,
        store: Arc<MockStore>,
        sink: Arc<RecordingActionSink>,
        sweeper: Sweeper<MockStore, RecordingNotifier, RecordingActionSink>,
    }

    async fn harness(max_retries: u32) -> Harness {
        let dir = tempdir().unwrap();
        let journal = Arc::new(FailureJournal::new(dir.path()));
        journal.ensure_dirs().await.unwrap();
        let store = MockStore::new();
        let sink = RecordingActionSink::new();
        let normalizer = Arc::new(Normalizer::new(
            Arc::clone(&store),
            RecordingNotifier::new(),
        ));
        let sweeper = Sweeper::new(
            Arc::clone(&journal),
            normalizer,
            engine(&store, &sink),
            Arc::clone(&store),
            vec![0],
            max_retries,
            Duration::from_secs(30),
        );
        Harness {
            _dir: dir,
            journal,
            store,
            sink,
            sweeper,
        }
    }

    #[tokio::test]
    async fn successful_replay_deletes_the_record() {
        let h = harness(5).await;
        h.journal
            .capture(&message_event(), &failing_error())
            .await
            .unwrap();

        let stats = h.sweeper.sweep_once().await;
        assert_eq!(stats.replayed, 1);
        assert!(h.journal.pending().await.unwrap().is_empty());
        assert_eq!(h.store.message_count(), 1);
    }

    #[tokio::test]
    async fn replayed_event_fires_matching_rules() {
        let h = harness(5).await;
        h.store.seed_rule(ActionRule {
            id: 1,
            name: "note on message".into(),
            is_active: true,
            trigger_type: TriggerType::MessageReceived,
            trigger_permission: TriggerPermission::Anyone,
            allowed_users: vec![],
            priority: 0,
            creator_jid: None,
            conditions: vec![],
            actions: vec![RuleAction {
                action_type: ActionType::CreateNote,
                order: 1,
                target_entity_id: None,
                parameters: json!({"body": "{{content}}"}),
                template_id: None,
                conditional: false,
                condition_expression: None,
            }],
            cooldown_minutes: 0,
            max_executions_per_day: 0,
            last_executed_at: None,
            execution_count: 0,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        });
        h.journal
            .capture(&message_event(), &failing_error())
            .await
            .unwrap();

        let stats = h.sweeper.sweep_once().await;
        assert_eq!(stats.replayed, 1);

        let executed = h.sink.executed.lock().unwrap();
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].1, ActionType::CreateNote);
        assert_eq!(executed[0].2["body"], "hi");
        drop(executed);
        assert_eq!(h.store.executions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_replay_increments_retry_accounting() {
        let h = harness(5).await;
        h.journal
            .capture(&message_event(), &failing_error())
            .await
            .unwrap();
        h.store.fail_writes();

        let stats = h.sweeper.sweep_once().await;
        assert_eq!(stats.retried, 1);

        let pending = h.journal.pending().await.unwrap();
        assert_eq!(pending[0].retry_count, 1);
        assert!(pending[0].last_retry_at.is_some());
    }

    #[tokio::test]
    async fn exhausted_records_move_to_dead_letter_and_stay_there() {
        let h = harness(2).await;
        h.journal
            .capture(&message_event(), &failing_error())
            .await
            .unwrap();
        h.store.fail_writes();

        let first = h.sweeper.sweep_once().await;
        assert_eq!(first.retried, 1);
        let second = h.sweeper.sweep_once().await;
        assert_eq!(second.dead_lettered, 1);

        assert!(h.journal.pending().await.unwrap().is_empty());
        assert_eq!(h.journal.dead_letters().await.unwrap().len(), 1);

        // Dead-lettered records are out of the sweep's reach for good.
        h.store.heal();
        let third = h.sweeper.sweep_once().await;
        assert_eq!(third, SweepStats::default());
        assert_eq!(h.store.message_count(), 0);
    }

    #[tokio::test]
    async fn unhealthy_store_defers_the_whole_sweep() {
        let h = harness(5).await;
        h.journal
            .capture(&message_event(), &failing_error())
            .await
            .unwrap();
        h.store.go_unhealthy();

        let stats = h.sweeper.sweep_once().await;
        assert_eq!(stats, SweepStats::default());

        // Retry budget untouched.
        let pending = h.journal.pending().await.unwrap();
        assert_eq!(pending[0].retry_count, 0);
    }

    #[tokio::test]
    async fn records_inside_their_backoff_window_are_deferred() {
        let h = harness(5).await;
        let mut record = h
            .journal
            .capture(&message_event(), &failing_error())
            .await
            .unwrap();
        record.retry_count = 1;
        record.last_retry_at = Some(now_rfc3339());
        h.journal.update(&record).await.unwrap();

        // Rebuild with a long backoff so the record is not yet due.
        let sweeper = Sweeper::new(
            Arc::clone(&h.journal),
            Arc::new(Normalizer::new(
                Arc::clone(&h.store),
                RecordingNotifier::new(),
            )),
            engine(&h.store, &h.sink),
            Arc::clone(&h.store),
            vec![1, 3600],
            5,
            Duration::from_secs(30),
        );
        let stats = sweeper.sweep_once().await;
        assert_eq!(stats.deferred, 1);
        assert_eq!(stats.replayed, 0);
    }

    #[tokio::test]
    async fn replay_sanitizes_before_normalizing() {
        let h = harness(5).await;
        // Bare digit-run chat id, missing the domain suffix.
        let broken = RawEvent::new(
            "inst-1",
            "messages.upsert",
            json!({"data": {"messages": [{
                "key": {"id": "B1", "remoteJid": "123456789012345678", "participant": "555@c.us"},
                "message": {"conversation": "rescue me"}
            }]}}),
            None,
        );
        h.journal.capture(&broken, &failing_error()).await.unwrap();

        let stats = h.sweeper.sweep_once().await;
        assert_eq!(stats.replayed, 1);

        let message = h
            .store
            .get_message("B1", "inst-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.chat_jid, "123456789012345678@g.us");
    }
}
