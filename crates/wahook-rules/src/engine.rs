// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The rule engine.
//!
//! `dispatch` is fire-and-forget: it runs as a detached task, catches and
//! logs its own failures, and never blocks or fails the event path that
//! produced the trigger. Cooldown and daily-cap checks run under a
//! per-rule lock so two concurrent triggers cannot both pass the cap
//! check before either records its execution.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;

use wahook_core::time::now_rfc3339;
use wahook_core::types::{
    ActionRule, ActionType, ExecutionStatus, RuleExecution, Trigger,
};
use wahook_core::{ActionSink, Notifier, StoreGateway, WahookError};

use crate::matcher::{conditions_match, permitted};
use crate::template::{render, render_params};

pub struct RuleEngine<S, A, N> {
    store: Arc<S>,
    sink: Arc<A>,
    notifier: Arc<N>,
    http: reqwest::Client,
    // Daily cap for rules that do not set their own. 0 disables it.
    default_daily_cap: i64,
    locks: DashMap<i64, Arc<Mutex<()>>>,
    // Executions this process performed, so a cooldown check does not
    // depend on re-reading the rule row inside the lock.
    recent: DashMap<i64, DateTime<Utc>>,
}

impl<S, A, N> RuleEngine<S, A, N>
where
    S: StoreGateway,
    A: ActionSink,
    N: Notifier,
{
    pub fn new(
        store: Arc<S>,
        sink: Arc<A>,
        notifier: Arc<N>,
        webhook_timeout: Duration,
        default_daily_cap: i64,
    ) -> Result<Self, WahookError> {
        let http = reqwest::Client::builder()
            .timeout(webhook_timeout)
            .build()
            .map_err(|e| WahookError::Http {
                message: "could not build webhook client".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            store,
            sink,
            notifier,
            http,
            default_daily_cap,
            locks: DashMap::new(),
            recent: DashMap::new(),
        })
    }

    /// Evaluate rules for a trigger as a detached task.
    pub fn dispatch(self: &Arc<Self>, trigger: Trigger) {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.evaluate(&trigger).await;
        });
    }

    /// The full matching and execution pipeline. Public for tests and for
    /// callers that want to await completion.
    pub async fn evaluate(&self, trigger: &Trigger) {
        let rules = match self.store.rules_by_trigger(trigger.trigger_type).await {
            Ok(rules) => rules,
            Err(e) => {
                tracing::error!(error = %e, "could not load rules for trigger");
                return;
            }
        };

        let mut matched: Vec<ActionRule> = rules
            .into_iter()
            .filter(|r| permitted(r, trigger) && conditions_match(r, trigger))
            .collect();
        matched.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        // All matching rules execute; one rule's failure never blocks
        // another's.
        for rule in &matched {
            self.execute_rule(rule, trigger).await;
        }
    }

    async fn execute_rule(&self, rule: &ActionRule, trigger: &Trigger) {
        let lock = self
            .locks
            .entry(rule.id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        if self.in_cooldown(rule) {
            tracing::debug!(rule = %rule.name, "skipping rule inside its cooldown window");
            return;
        }
        let daily_cap = if rule.max_executions_per_day > 0 {
            rule.max_executions_per_day
        } else {
            self.default_daily_cap
        };
        if daily_cap > 0 {
            match self.store.execution_count_today(rule.id).await {
                Ok(count) if count >= daily_cap => {
                    tracing::debug!(rule = %rule.name, count, "skipping rule at its daily cap");
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(rule = %rule.name, error = %e, "daily cap check failed");
                    return;
                }
            }
        }

        let started = Instant::now();
        let mut executed: i64 = 0;
        let mut failed: i64 = 0;
        let mut skipped: i64 = 0;
        let mut first_error: Option<String> = None;

        for action in &rule.actions {
            if action.conditional {
                let expr = action
                    .condition_expression
                    .as_deref()
                    .map(|e| render(e, trigger))
                    .unwrap_or_default();
                if !truthy(&expr) {
                    skipped += 1;
                    continue;
                }
            }

            let params = render_params(&action.parameters, trigger);
            let result = match action.action_type {
                ActionType::WebhookCall => self.webhook_call(&params).await,
                other => {
                    self.sink
                        .execute(&trigger.instance_id, other, &params)
                        .await
                }
            };
            match result {
                Ok(()) => {
                    executed += 1;
                    if action.action_type == ActionType::CreateTask {
                        self.notifier.notify_new_task(&params).await;
                    }
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        rule = %rule.name,
                        action = %action.action_type,
                        error = %e,
                        "rule action failed"
                    );
                    first_error.get_or_insert_with(|| e.to_string());
                }
            }
        }

        let status = if failed == 0 && executed == 0 && skipped > 0 {
            ExecutionStatus::Skipped
        } else if failed == 0 {
            ExecutionStatus::Success
        } else if executed > 0 {
            ExecutionStatus::Partial
        } else {
            ExecutionStatus::Failed
        };

        let now = Utc::now();
        let executed_at = now_rfc3339();
        if let Err(e) = self.store.touch_rule_execution(rule.id, &executed_at).await {
            tracing::error!(rule = %rule.name, error = %e, "could not update rule counters");
        }
        let execution = RuleExecution {
            rule_id: rule.id,
            trigger_snapshot: serde_json::to_value(trigger).unwrap_or(Value::Null),
            status,
            error_message: first_error,
            actions_executed: executed,
            actions_failed: failed,
            duration_ms: started.elapsed().as_millis() as i64,
            executed_at,
        };
        if let Err(e) = self.store.save_rule_execution(&execution).await {
            tracing::error!(rule = %rule.name, error = %e, "could not record rule execution");
        }
        self.recent.insert(rule.id, now);
    }

    fn in_cooldown(&self, rule: &ActionRule) -> bool {
        if rule.cooldown_minutes <= 0 {
            return false;
        }
        let from_store = rule
            .last_executed_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc));
        let from_memory = self.recent.get(&rule.id).map(|e| *e.value());
        let last = match (from_store, from_memory) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        match last {
            Some(last) => Utc::now() < last + chrono::Duration::minutes(rule.cooldown_minutes),
            None => false,
        }
    }

    /// `webhook_call` actions go straight out over HTTP: `url` required,
    /// `method` optional (POST default), `body` optional (the rendered
    /// parameters are sent when absent).
    async fn webhook_call(&self, params: &Value) -> Result<(), WahookError> {
        let url = params
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| WahookError::ActionExecution {
                action: ActionType::WebhookCall.to_string(),
                message: "webhook_call action has no url parameter".into(),
            })?;
        let method = params
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("POST")
            .to_ascii_uppercase();
        let body = params.get("body").cloned().unwrap_or_else(|| params.clone());

        let request = match method.as_str() {
            "GET" => self.http.get(url),
            "PUT" => self.http.put(url).json(&body),
            _ => self.http.post(url).json(&body),
        };
        let response = request.send().await.map_err(|e| WahookError::Http {
            message: format!("webhook call to {url} failed"),
            source: Some(Box::new(e)),
        })?;
        response.error_for_status().map_err(|e| WahookError::Http {
            message: format!("webhook call to {url} returned an error status"),
            source: Some(Box::new(e)),
        })?;
        Ok(())
    }
}

fn truthy(value: &str) -> bool {
    !value.is_empty() && value != "false" && value != "0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wahook_core::types::{
        GroupOperator, RuleAction, TriggerPermission, TriggerType,
    };
    use wahook_test_utils::{MockStore, RecordingActionSink, RecordingNotifier};

    fn engine(
        store: &Arc<MockStore>,
        sink: &Arc<RecordingActionSink>,
    ) -> RuleEngine<MockStore, RecordingActionSink, RecordingNotifier> {
        RuleEngine::new(
            Arc::clone(store),
            Arc::clone(sink),
            RecordingNotifier::new(),
            Duration::from_secs(5),
            0,
        )
        .unwrap()
    }

    fn trigger(content: &str) -> Trigger {
        let mut context = HashMap::new();
        context.insert("content".to_string(), content.to_string());
        context.insert("sender".to_string(), "555@c.us".to_string());
        Trigger {
            trigger_type: TriggerType::MessageReceived,
            value: content.into(),
            instance_id: "inst-1".into(),
            actor_jid: Some("555@c.us".into()),
            context,
        }
    }

    fn action(action_type: ActionType, order: i64, params: Value) -> RuleAction {
        RuleAction {
            action_type,
            order,
            target_entity_id: None,
            parameters: params,
            template_id: None,
            conditional: false,
            condition_expression: None,
        }
    }

    fn rule(id: i64, name: &str, actions: Vec<RuleAction>) -> ActionRule {
        ActionRule {
            id,
            name: name.into(),
            is_active: true,
            trigger_type: TriggerType::MessageReceived,
            trigger_permission: TriggerPermission::Anyone,
            allowed_users: vec![],
            priority: 0,
            creator_jid: Some("me@c.us".into()),
            conditions: vec![],
            actions,
            cooldown_minutes: 0,
            max_executions_per_day: 0,
            last_executed_at: None,
            execution_count: 0,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[tokio::test]
    async fn matching_rule_executes_actions_with_templates() {
        let store = MockStore::new();
        let sink = RecordingActionSink::new();
        store.seed_rule(rule(
            1,
            "task on message",
            vec![action(
                ActionType::CreateTask,
                1,
                serde_json::json!({"title": "Follow up: {{content}}"}),
            )],
        ));

        engine(&store, &sink).evaluate(&trigger("pay invoice")).await;

        let executed = sink.executed.lock().unwrap();
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].1, ActionType::CreateTask);
        assert_eq!(executed[0].2["title"], "Follow up: pay invoice");
        drop(executed);

        let executions = store.executions.lock().unwrap();
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].status, ExecutionStatus::Success);
        assert_eq!(executions[0].actions_executed, 1);
    }

    #[tokio::test]
    async fn execution_order_is_priority_then_recency() {
        let store = MockStore::new();
        let sink = RecordingActionSink::new();
        let mut low = rule(
            1,
            "low",
            vec![action(ActionType::CreateNote, 1, serde_json::json!({"tag": "low"}))],
        );
        low.priority = 1;
        let mut high = rule(
            2,
            "high",
            vec![action(ActionType::CreateNote, 1, serde_json::json!({"tag": "high"}))],
        );
        high.priority = 10;
        store.seed_rule(low);
        store.seed_rule(high);

        engine(&store, &sink).evaluate(&trigger("x")).await;

        let executed = sink.executed.lock().unwrap();
        assert_eq!(executed[0].2["tag"], "high");
        assert_eq!(executed[1].2["tag"], "low");
    }

    #[tokio::test]
    async fn one_rules_failure_never_blocks_another() {
        let store = MockStore::new();
        let sink = RecordingActionSink::new();
        sink.fail_on(ActionType::SendMessage);
        let mut failing = rule(
            1,
            "failing",
            vec![action(ActionType::SendMessage, 1, serde_json::json!({}))],
        );
        failing.priority = 10;
        store.seed_rule(failing);
        store.seed_rule(rule(
            2,
            "healthy",
            vec![action(ActionType::CreateNote, 1, serde_json::json!({}))],
        ));

        engine(&store, &sink).evaluate(&trigger("x")).await;

        let executions = store.executions.lock().unwrap();
        assert_eq!(executions.len(), 2);
        let failed = executions.iter().find(|e| e.rule_id == 1).unwrap();
        assert_eq!(failed.status, ExecutionStatus::Failed);
        assert!(failed.error_message.as_ref().unwrap().contains("injected"));
        let healthy = executions.iter().find(|e| e.rule_id == 2).unwrap();
        assert_eq!(healthy.status, ExecutionStatus::Success);
    }

    #[tokio::test]
    async fn partial_status_when_some_actions_fail() {
        let store = MockStore::new();
        let sink = RecordingActionSink::new();
        sink.fail_on(ActionType::AddLabel);
        store.seed_rule(rule(
            1,
            "mixed",
            vec![
                action(ActionType::CreateNote, 1, serde_json::json!({})),
                action(ActionType::AddLabel, 2, serde_json::json!({})),
            ],
        ));

        engine(&store, &sink).evaluate(&trigger("x")).await;

        let executions = store.executions.lock().unwrap();
        assert_eq!(executions[0].status, ExecutionStatus::Partial);
        assert_eq!(executions[0].actions_executed, 1);
        assert_eq!(executions[0].actions_failed, 1);
    }

    #[tokio::test]
    async fn cooldown_window_blocks_and_then_releases() {
        let store = MockStore::new();
        let sink = RecordingActionSink::new();
        let mut r = rule(
            1,
            "cooled",
            vec![action(ActionType::CreateNote, 1, serde_json::json!({}))],
        );
        r.cooldown_minutes = 10;
        r.last_executed_at = Some(
            (Utc::now() - chrono::Duration::minutes(5))
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        );
        store.seed_rule(r.clone());

        let eng = engine(&store, &sink);
        eng.evaluate(&trigger("x")).await;
        assert!(store.executions.lock().unwrap().is_empty());

        // Past the window the rule fires.
        store.rules.lock().unwrap()[0].last_executed_at = Some(
            (Utc::now() - chrono::Duration::minutes(11))
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        );
        eng.evaluate(&trigger("x")).await;
        assert_eq!(store.executions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn daily_cap_stops_execution() {
        let store = MockStore::new();
        let sink = RecordingActionSink::new();
        let mut r = rule(
            1,
            "capped",
            vec![action(ActionType::CreateNote, 1, serde_json::json!({}))],
        );
        r.max_executions_per_day = 2;
        store.seed_rule(r);

        let eng = engine(&store, &sink);
        for _ in 0..5 {
            eng.evaluate(&trigger("x")).await;
        }
        assert_eq!(store.executions.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn engine_default_caps_rules_without_their_own() {
        let store = MockStore::new();
        let sink = RecordingActionSink::new();
        // max_executions_per_day stays 0, so the engine default applies.
        store.seed_rule(rule(
            1,
            "uncapped",
            vec![action(ActionType::CreateNote, 1, serde_json::json!({}))],
        ));

        let eng = RuleEngine::new(
            Arc::clone(&store),
            Arc::clone(&sink),
            RecordingNotifier::new(),
            Duration::from_secs(5),
            2,
        )
        .unwrap();
        for _ in 0..5 {
            eng.evaluate(&trigger("x")).await;
        }
        assert_eq!(store.executions.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rule_cap_takes_precedence_over_engine_default() {
        let store = MockStore::new();
        let sink = RecordingActionSink::new();
        let mut r = rule(
            1,
            "own cap",
            vec![action(ActionType::CreateNote, 1, serde_json::json!({}))],
        );
        r.max_executions_per_day = 3;
        store.seed_rule(r);

        let eng = RuleEngine::new(
            Arc::clone(&store),
            Arc::clone(&sink),
            RecordingNotifier::new(),
            Duration::from_secs(5),
            1,
        )
        .unwrap();
        for _ in 0..5 {
            eng.evaluate(&trigger("x")).await;
        }
        assert_eq!(store.executions.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn permission_me_requires_the_creator() {
        let store = MockStore::new();
        let sink = RecordingActionSink::new();
        let mut r = rule(
            1,
            "mine",
            vec![action(ActionType::CreateNote, 1, serde_json::json!({}))],
        );
        r.trigger_permission = TriggerPermission::Me;
        r.creator_jid = Some("me@c.us".into());
        store.seed_rule(r);

        // Actor is 555@c.us, not the creator.
        engine(&store, &sink).evaluate(&trigger("x")).await;
        assert!(store.executions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn conditional_actions_skip_on_falsy_expression() {
        let store = MockStore::new();
        let sink = RecordingActionSink::new();
        let mut conditional = action(ActionType::CreateNote, 1, serde_json::json!({}));
        conditional.conditional = true;
        conditional.condition_expression = Some("{{missing_field}}".into());
        store.seed_rule(rule(1, "conditional", vec![conditional]));

        engine(&store, &sink).evaluate(&trigger("x")).await;

        let executions = store.executions.lock().unwrap();
        assert_eq!(executions[0].status, ExecutionStatus::Skipped);
        assert_eq!(executions[0].actions_executed, 0);
    }

    #[tokio::test]
    async fn condition_filter_applies_before_execution() {
        let store = MockStore::new();
        let sink = RecordingActionSink::new();
        let mut r = rule(
            1,
            "keyworded",
            vec![action(ActionType::CreateNote, 1, serde_json::json!({}))],
        );
        r.conditions = vec![wahook_core::types::RuleCondition {
            kind: "context_field".into(),
            operator: wahook_core::types::ConditionOperator::Contains,
            field_name: "content".into(),
            value: "invoice".into(),
            group_index: 0,
            group_operator: GroupOperator::And,
            negated: false,
        }];
        store.seed_rule(r);

        let eng = engine(&store, &sink);
        eng.evaluate(&trigger("hello there")).await;
        assert!(store.executions.lock().unwrap().is_empty());

        eng.evaluate(&trigger("the invoice is due")).await;
        assert_eq!(store.executions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn webhook_call_without_url_records_a_failure() {
        let store = MockStore::new();
        let sink = RecordingActionSink::new();
        store.seed_rule(rule(
            1,
            "bad webhook",
            vec![action(ActionType::WebhookCall, 1, serde_json::json!({"body": {}}))],
        ));

        engine(&store, &sink).evaluate(&trigger("x")).await;

        let executions = store.executions.lock().unwrap();
        assert_eq!(executions[0].status, ExecutionStatus::Failed);
        assert!(executions[0]
            .error_message
            .as_ref()
            .unwrap()
            .contains("no url"));
    }
}
