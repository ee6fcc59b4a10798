// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Default action sink used when no external collaborator is wired in.

use async_trait::async_trait;

use wahook_core::types::ActionType;
use wahook_core::{ActionSink, WahookError};

/// Logs every action at info level instead of performing a side effect.
/// Deployments integrate real task/note/calendar backends by providing
/// their own [`ActionSink`].
#[derive(Debug, Default)]
pub struct LoggingSink;

#[async_trait]
impl ActionSink for LoggingSink {
    async fn execute(
        &self,
        instance_id: &str,
        action_type: ActionType,
        parameters: &serde_json::Value,
    ) -> Result<(), WahookError> {
        tracing::info!(
            instance = instance_id,
            action = %action_type,
            parameters = %parameters,
            "rule action executed"
        );
        Ok(())
    }
}
