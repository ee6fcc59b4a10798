// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingress HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the webhook ingress.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use wahook_core::{ActionSink, Notifier, StoreGateway, WahookError};
use wahook_ingest::Normalizer;
use wahook_recovery::FailureJournal;
use wahook_rules::RuleEngine;

use crate::handlers;

/// Shared state for axum request handlers. Cloned per request via `Arc`.
pub struct GatewayState<S, N, A> {
    pub normalizer: Arc<Normalizer<S, N>>,
    pub journal: Arc<FailureJournal>,
    pub engine: Arc<RuleEngine<S, A, N>>,
    pub store: Arc<S>,
    /// Instance attributed to deliveries that carry no instance field.
    pub default_instance: String,
}

/// Ingress server configuration (mirrors ServerConfig from wahook-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

pub fn router<S, N, A>(state: Arc<GatewayState<S, N, A>>) -> Router
where
    S: StoreGateway,
    N: Notifier,
    A: ActionSink,
{
    Router::new()
        .route("/webhook", post(handlers::post_webhook::<S, N, A>))
        .route(
            "/webhook/{event}",
            post(handlers::post_webhook_event::<S, N, A>),
        )
        .route("/health", get(handlers::get_health::<S, N, A>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until the process is shut down.
pub async fn start_server<S, N, A>(
    config: &ServerConfig,
    state: Arc<GatewayState<S, N, A>>,
) -> Result<(), WahookError>
where
    S: StoreGateway,
    N: Notifier,
    A: ActionSink,
{
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WahookError::Http {
            message: format!("failed to bind ingress to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Webhook ingress listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| WahookError::Http {
            message: format!("ingress server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
