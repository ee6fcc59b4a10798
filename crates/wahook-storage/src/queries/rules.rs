// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation rule reads and the append-only execution audit.

use std::str::FromStr;

use rusqlite::params;

use wahook_core::WahookError;
use wahook_core::types::{
    ActionRule, ActionType, ConditionOperator, ExecutionStatus, GroupOperator, RuleAction,
    RuleCondition, RuleExecution, TriggerPermission, TriggerType,
};

use crate::database::Database;

fn conv_err<E: std::error::Error + Send + Sync + 'static>(
    idx: usize,
    e: E,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

/// Insert a rule together with its conditions and actions. Returns the
/// assigned rule id. Used for seeding and by the management surface.
pub async fn insert_rule(db: &Database, rule: &ActionRule) -> Result<i64, WahookError> {
    let r = rule.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let allowed = serde_json::to_string(&r.allowed_users)
                .map_err(|e| conv_err(0, e))?;
            tx.execute(
                "INSERT INTO rules (name, is_active, trigger_type, trigger_permission,
                                    allowed_users, priority, creator_jid, cooldown_minutes,
                                    max_executions_per_day, last_executed_at,
                                    execution_count, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    r.name,
                    r.is_active,
                    r.trigger_type.to_string(),
                    r.trigger_permission.to_string(),
                    allowed,
                    r.priority,
                    r.creator_jid,
                    r.cooldown_minutes,
                    r.max_executions_per_day,
                    r.last_executed_at,
                    r.execution_count,
                    r.created_at,
                ],
            )?;
            let rule_id = tx.last_insert_rowid();

            for cond in &r.conditions {
                tx.execute(
                    "INSERT INTO rule_conditions (rule_id, kind, operator, field_name,
                                                  value, group_index, group_operator, negated)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        rule_id,
                        cond.kind,
                        cond.operator.to_string(),
                        cond.field_name,
                        cond.value,
                        cond.group_index,
                        cond.group_operator.to_string(),
                        cond.negated,
                    ],
                )?;
            }
            for action in &r.actions {
                tx.execute(
                    "INSERT INTO rule_actions (rule_id, action_type, action_order,
                                               target_entity_id, parameters, template_id,
                                               conditional, condition_expression)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        rule_id,
                        action.action_type.to_string(),
                        action.order,
                        action.target_entity_id,
                        action.parameters.to_string(),
                        action.template_id,
                        action.conditional,
                        action.condition_expression,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(rule_id)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Active rules for one trigger type, with conditions and actions loaded.
/// Actions come back sorted by `action_order`.
pub async fn rules_by_trigger(
    db: &Database,
    trigger_type: TriggerType,
) -> Result<Vec<ActionRule>, WahookError> {
    let trigger = trigger_type.to_string();
    db.connection()
        .call(move |conn| {
            let mut rules = Vec::new();
            {
                let mut stmt = conn.prepare(
                    "SELECT id, name, is_active, trigger_type, trigger_permission,
                            allowed_users, priority, creator_jid, cooldown_minutes,
                            max_executions_per_day, last_executed_at, execution_count,
                            created_at
                     FROM rules WHERE trigger_type = ?1 AND is_active = 1",
                )?;
                let rows = stmt.query_map(params![trigger], |row| {
                    let trigger_text: String = row.get(3)?;
                    let permission_text: String = row.get(4)?;
                    let allowed_text: String = row.get(5)?;
                    Ok(ActionRule {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        is_active: row.get(2)?,
                        trigger_type: TriggerType::from_str(&trigger_text)
                            .map_err(|e| conv_err(3, e))?,
                        trigger_permission: TriggerPermission::from_str(&permission_text)
                            .map_err(|e| conv_err(4, e))?,
                        allowed_users: serde_json::from_str(&allowed_text)
                            .map_err(|e| conv_err(5, e))?,
                        priority: row.get(6)?,
                        creator_jid: row.get(7)?,
                        conditions: Vec::new(),
                        actions: Vec::new(),
                        cooldown_minutes: row.get(8)?,
                        max_executions_per_day: row.get(9)?,
                        last_executed_at: row.get(10)?,
                        execution_count: row.get(11)?,
                        created_at: row.get(12)?,
                    })
                })?;
                for row in rows {
                    rules.push(row?);
                }
            }

            for rule in &mut rules {
                let mut stmt = conn.prepare(
                    "SELECT kind, operator, field_name, value, group_index,
                            group_operator, negated
                     FROM rule_conditions WHERE rule_id = ?1 ORDER BY id ASC",
                )?;
                let rows = stmt.query_map(params![rule.id], |row| {
                    let op_text: String = row.get(1)?;
                    let group_op_text: String = row.get(5)?;
                    Ok(RuleCondition {
                        kind: row.get(0)?,
                        operator: ConditionOperator::from_str(&op_text)
                            .map_err(|e| conv_err(1, e))?,
                        field_name: row.get(2)?,
                        value: row.get(3)?,
                        group_index: row.get(4)?,
                        group_operator: GroupOperator::from_str(&group_op_text)
                            .map_err(|e| conv_err(5, e))?,
                        negated: row.get(6)?,
                    })
                })?;
                for row in rows {
                    rule.conditions.push(row?);
                }

                let mut stmt = conn.prepare(
                    "SELECT action_type, action_order, target_entity_id, parameters,
                            template_id, conditional, condition_expression
                     FROM rule_actions WHERE rule_id = ?1 ORDER BY action_order ASC, id ASC",
                )?;
                let rows = stmt.query_map(params![rule.id], |row| {
                    let type_text: String = row.get(0)?;
                    let params_text: String = row.get(3)?;
                    Ok(RuleAction {
                        action_type: ActionType::from_str(&type_text)
                            .map_err(|e| conv_err(0, e))?,
                        order: row.get(1)?,
                        target_entity_id: row.get(2)?,
                        parameters: serde_json::from_str(&params_text)
                            .map_err(|e| conv_err(3, e))?,
                        template_id: row.get(4)?,
                        conditional: row.get(5)?,
                        condition_expression: row.get(6)?,
                    })
                })?;
                for row in rows {
                    rule.actions.push(row?);
                }
            }

            Ok(rules)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Append one execution audit row.
pub async fn save_rule_execution(
    db: &Database,
    execution: &RuleExecution,
) -> Result<(), WahookError> {
    let e = execution.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO rule_executions (rule_id, trigger_snapshot, status,
                                              error_message, actions_executed,
                                              actions_failed, duration_ms, executed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    e.rule_id,
                    e.trigger_snapshot.to_string(),
                    e.status.to_string(),
                    e.error_message,
                    e.actions_executed,
                    e.actions_failed,
                    e.duration_ms,
                    e.executed_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Executions recorded for this rule since UTC midnight. RFC 3339 text
/// compares lexicographically, so a prefix bound suffices.
pub async fn execution_count_today(db: &Database, rule_id: i64) -> Result<i64, WahookError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM rule_executions
                 WHERE rule_id = ?1
                   AND executed_at >= strftime('%Y-%m-%dT00:00:00.000Z', 'now')",
                params![rule_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Bump `last_executed_at` and the lifetime execution counter.
pub async fn touch_rule_execution(
    db: &Database,
    rule_id: i64,
    executed_at: &str,
) -> Result<(), WahookError> {
    let executed_at = executed_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE rules SET last_executed_at = ?2,
                 execution_count = execution_count + 1
                 WHERE id = ?1",
                params![rule_id, executed_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
