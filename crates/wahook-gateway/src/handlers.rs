// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the webhook ingress.
//!
//! The ingress acknowledges every delivery with HTTP 200 before
//! processing it. Processing runs as a detached task; its failures are
//! captured to the recovery journal, never surfaced to the webhook
//! sender.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use wahook_core::event::RawEvent;
use wahook_core::types::HealthStatus;
use wahook_core::{ActionSink, Notifier, StoreGateway};

use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

fn raw_event<S, N, A>(
    state: &GatewayState<S, N, A>,
    event_from_path: Option<String>,
    body: Value,
) -> RawEvent {
    let event = event_from_path
        .or_else(|| {
            body.get("event")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default();
    let instance_id = body
        .get("instance")
        .or_else(|| body.get("instanceId"))
        .and_then(Value::as_str)
        .unwrap_or(&state.default_instance)
        .to_string();
    let sender = body
        .get("sender")
        .and_then(Value::as_str)
        .map(str::to_string);
    RawEvent::new(instance_id, event, body, sender)
}

/// Normalize one delivery and hand its triggers to the rule engine.
/// Recoverable failures go to the journal; nothing propagates.
pub async fn process_event<S, N, A>(state: Arc<GatewayState<S, N, A>>, raw: RawEvent)
where
    S: StoreGateway,
    N: Notifier,
    A: ActionSink,
{
    match state.normalizer.process(&raw).await {
        Ok(outcome) => {
            for trigger in outcome.triggers {
                state.engine.dispatch(trigger);
            }
        }
        Err(e) if e.is_recoverable() => {
            if let Err(journal_err) = state.journal.capture(&raw, &e).await {
                tracing::error!(
                    event = %raw.event,
                    error = %e,
                    journal_error = %journal_err,
                    "failed event could not be journaled"
                );
            }
        }
        Err(e) => {
            tracing::error!(event = %raw.event, error = %e, "unrecoverable processing error");
        }
    }
}

fn ack_and_process<S, N, A>(state: Arc<GatewayState<S, N, A>>, raw: RawEvent) -> Response
where
    S: StoreGateway,
    N: Notifier,
    A: ActionSink,
{
    tokio::spawn(process_event(state, raw));
    (StatusCode::OK, Json(AckResponse { status: "accepted" })).into_response()
}

/// POST /webhook — event type taken from the body's `event` field.
pub async fn post_webhook<S, N, A>(
    State(state): State<Arc<GatewayState<S, N, A>>>,
    Json(body): Json<Value>,
) -> Response
where
    S: StoreGateway,
    N: Notifier,
    A: ActionSink,
{
    let raw = raw_event(&state, None, body);
    ack_and_process(state, raw)
}

/// POST /webhook/{event} — event type encoded in the URL path, with `-`
/// standing in for `.` (handled by event-type parsing).
pub async fn post_webhook_event<S, N, A>(
    State(state): State<Arc<GatewayState<S, N, A>>>,
    Path(event): Path<String>,
    Json(body): Json<Value>,
) -> Response
where
    S: StoreGateway,
    N: Notifier,
    A: ActionSink,
{
    let raw = raw_event(&state, Some(event), body);
    ack_and_process(state, raw)
}

/// GET /health — liveness plus the store gateway's probe.
pub async fn get_health<S, N, A>(
    State(state): State<Arc<GatewayState<S, N, A>>>,
) -> Response
where
    S: StoreGateway,
    N: Notifier,
    A: ActionSink,
{
    let (code, status) = match state.store.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "healthy".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (StatusCode::OK, format!("degraded: {reason}")),
        Ok(HealthStatus::Unhealthy(reason)) => {
            (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {reason}"))
        }
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {e}")),
    };
    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
        .into_response()
}
