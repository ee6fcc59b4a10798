// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Side-effect sink contract for rule actions.
//!
//! The rule engine substitutes template variables into an action's
//! parameters and hands the result to the sink. `webhook_call` actions
//! are dispatched by the engine itself over HTTP and never reach a sink.

use async_trait::async_trait;

use crate::error::WahookError;
use crate::types::ActionType;

#[async_trait]
pub trait ActionSink: Send + Sync + 'static {
    /// Execute one side-effect action. Errors are recorded in the rule
    /// execution audit; they never abort other actions or rules.
    async fn execute(
        &self,
        instance_id: &str,
        action_type: ActionType,
        parameters: &serde_json::Value,
    ) -> Result<(), WahookError>;
}
