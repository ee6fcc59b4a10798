// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wahook serve` command implementation.
//!
//! The composition root: opens the SQLite store, builds the normalizer,
//! recovery sweeper, and rule engine, and runs the webhook ingress until
//! a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use wahook_config::model::WahookConfig;
use wahook_core::traits::NullNotifier;
use wahook_core::WahookError;
use wahook_gateway::{GatewayState, ServerConfig};
use wahook_ingest::Normalizer;
use wahook_recovery::{FailureJournal, Sweeper};
use wahook_rules::{LoggingSink, RuleEngine};
use wahook_storage::{Database, SqliteStore};

use crate::shutdown;

/// Runs the `wahook serve` command.
pub async fn run_serve(config: WahookConfig) -> Result<(), WahookError> {
    init_tracing(&config.engine.log_level);

    info!(name = %config.engine.name, "starting wahook serve");

    let db = Database::open(&config.storage.database_path).await?;
    let store = Arc::new(SqliteStore::new(db.clone()));

    let journal = Arc::new(FailureJournal::new(&config.recovery.journal_dir));
    journal.ensure_dirs().await?;

    let notifier = Arc::new(NullNotifier);
    let normalizer = Arc::new(Normalizer::new(Arc::clone(&store), Arc::clone(&notifier)));
    let engine = Arc::new(RuleEngine::new(
        Arc::clone(&store),
        Arc::new(LoggingSink),
        Arc::clone(&notifier),
        Duration::from_secs(config.rules.webhook_timeout_secs),
        config.rules.default_max_executions_per_day,
    )?);

    let cancel = shutdown::install_signal_handler();

    let sweeper = Sweeper::new(
        Arc::clone(&journal),
        Arc::clone(&normalizer),
        Arc::clone(&engine),
        Arc::clone(&store),
        config.recovery.backoff_secs.clone(),
        config.recovery.max_retries,
        Duration::from_secs(config.recovery.sweep_interval_secs),
    );
    let sweeper_handle = tokio::spawn(sweeper.run(cancel.clone()));

    let state = Arc::new(GatewayState {
        normalizer,
        journal,
        engine,
        store,
        default_instance: config.server.default_instance.clone(),
    });
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    tokio::select! {
        result = wahook_gateway::start_server(&server_config, state) => {
            result?;
        }
        _ = cancel.cancelled() => {
            info!("shutdown signal received, stopping ingress");
        }
    }

    let _ = sweeper_handle.await;
    db.close().await?;
    info!("wahook serve shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wahook={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
