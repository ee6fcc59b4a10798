// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule matching: permission filter and condition evaluation.
//!
//! Text operators compare case-insensitively, matching how keyword rules
//! are written in practice; `matches_regex` uses the pattern verbatim and
//! an invalid pattern simply never matches.

use std::collections::BTreeMap;

use wahook_core::types::{
    ActionRule, ConditionOperator, GroupOperator, RuleCondition, Trigger, TriggerPermission,
};

/// Permission check against the trigger's actor.
pub fn permitted(rule: &ActionRule, trigger: &Trigger) -> bool {
    match rule.trigger_permission {
        TriggerPermission::Anyone => true,
        TriggerPermission::Me => match (&rule.creator_jid, &trigger.actor_jid) {
            (Some(creator), Some(actor)) => creator == actor,
            _ => false,
        },
        TriggerPermission::Users => trigger
            .actor_jid
            .as_ref()
            .is_some_and(|actor| rule.allowed_users.iter().any(|u| u == actor)),
    }
}

/// Evaluate all condition groups. Conditions sharing a group index
/// combine with that group's operator; groups combine with AND. A rule
/// with zero conditions always matches.
pub fn conditions_match(rule: &ActionRule, trigger: &Trigger) -> bool {
    if rule.conditions.is_empty() {
        return true;
    }

    let mut groups: BTreeMap<i64, Vec<&RuleCondition>> = BTreeMap::new();
    for cond in &rule.conditions {
        groups.entry(cond.group_index).or_default().push(cond);
    }

    groups.values().all(|conds| {
        let op = conds[0].group_operator;
        match op {
            GroupOperator::And => conds.iter().all(|c| eval(c, trigger)),
            GroupOperator::Or => conds.iter().any(|c| eval(c, trigger)),
        }
    })
}

fn eval(cond: &RuleCondition, trigger: &Trigger) -> bool {
    let actual = trigger.field(&cond.field_name).unwrap_or("");
    let result = apply(cond.operator, actual, &cond.value);
    if cond.negated { !result } else { result }
}

fn apply(operator: ConditionOperator, actual: &str, expected: &str) -> bool {
    let a = actual.to_lowercase();
    let e = expected.to_lowercase();
    match operator {
        ConditionOperator::Equals => a == e,
        ConditionOperator::NotEquals => a != e,
        ConditionOperator::Contains => a.contains(&e),
        ConditionOperator::NotContains => !a.contains(&e),
        ConditionOperator::StartsWith => a.starts_with(&e),
        ConditionOperator::EndsWith => a.ends_with(&e),
        ConditionOperator::MatchesRegex => match regex::Regex::new(expected) {
            Ok(re) => re.is_match(actual),
            Err(err) => {
                tracing::warn!(pattern = expected, error = %err, "invalid rule regex");
                false
            }
        },
        ConditionOperator::GreaterThan => match (actual.parse::<f64>(), expected.parse::<f64>()) {
            (Ok(a), Ok(e)) => a > e,
            _ => false,
        },
        ConditionOperator::LessThan => match (actual.parse::<f64>(), expected.parse::<f64>()) {
            (Ok(a), Ok(e)) => a < e,
            _ => false,
        },
        ConditionOperator::InList => e.split(',').map(str::trim).any(|item| item == a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wahook_core::types::TriggerType;

    fn trigger(fields: &[(&str, &str)]) -> Trigger {
        let mut context = HashMap::new();
        for (k, v) in fields {
            context.insert((*k).to_string(), (*v).to_string());
        }
        Trigger {
            trigger_type: TriggerType::MessageReceived,
            value: String::new(),
            instance_id: "inst-1".into(),
            actor_jid: Some("555@c.us".into()),
            context,
        }
    }

    fn cond(
        operator: ConditionOperator,
        field: &str,
        value: &str,
        group: i64,
        group_op: GroupOperator,
        negated: bool,
    ) -> RuleCondition {
        RuleCondition {
            kind: "context_field".into(),
            operator,
            field_name: field.into(),
            value: value.into(),
            group_index: group,
            group_operator: group_op,
            negated,
        }
    }

    fn rule_with(conditions: Vec<RuleCondition>) -> ActionRule {
        ActionRule {
            id: 1,
            name: "r".into(),
            is_active: true,
            trigger_type: TriggerType::MessageReceived,
            trigger_permission: TriggerPermission::Anyone,
            allowed_users: vec![],
            priority: 0,
            creator_jid: Some("me@c.us".into()),
            conditions,
            actions: vec![],
            cooldown_minutes: 0,
            max_executions_per_day: 0,
            last_executed_at: None,
            execution_count: 0,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn operators_behave() {
        let t = trigger(&[("content", "Please send the INVOICE today"), ("count", "7")]);
        let cases = [
            (ConditionOperator::Contains, "content", "invoice", true),
            (ConditionOperator::NotContains, "content", "receipt", true),
            (ConditionOperator::StartsWith, "content", "please", true),
            (ConditionOperator::EndsWith, "content", "today", true),
            (ConditionOperator::Equals, "count", "7", true),
            (ConditionOperator::NotEquals, "count", "8", true),
            (ConditionOperator::GreaterThan, "count", "5", true),
            (ConditionOperator::LessThan, "count", "5", false),
            (ConditionOperator::MatchesRegex, "content", r"INVOICE|receipt", true),
            (ConditionOperator::InList, "count", "5, 6, 7", true),
        ];
        for (op, field, value, expected) in cases {
            let c = cond(op, field, value, 0, GroupOperator::And, false);
            assert_eq!(eval(&c, &t), expected, "{op:?} {field} {value}");
        }
    }

    #[test]
    fn negation_inverts() {
        let t = trigger(&[("content", "hello")]);
        let c = cond(
            ConditionOperator::Contains,
            "content",
            "hello",
            0,
            GroupOperator::And,
            true,
        );
        assert!(!eval(&c, &t));
    }

    #[test]
    fn missing_field_compares_as_empty() {
        let t = trigger(&[]);
        let c = cond(
            ConditionOperator::NotEquals,
            "content",
            "x",
            0,
            GroupOperator::And,
            false,
        );
        assert!(eval(&c, &t));
    }

    #[test]
    fn invalid_regex_never_matches() {
        let t = trigger(&[("content", "anything")]);
        let c = cond(
            ConditionOperator::MatchesRegex,
            "content",
            "(unclosed",
            0,
            GroupOperator::And,
            false,
        );
        assert!(!eval(&c, &t));
    }

    #[test]
    fn groups_or_within_and_across() {
        let t = trigger(&[("content", "send the invoice"), ("sender", "555@c.us")]);
        // Group 0: invoice OR receipt. Group 1: sender equals.
        let rule = rule_with(vec![
            cond(ConditionOperator::Contains, "content", "invoice", 0, GroupOperator::Or, false),
            cond(ConditionOperator::Contains, "content", "receipt", 0, GroupOperator::Or, false),
            cond(ConditionOperator::Equals, "sender", "555@c.us", 1, GroupOperator::And, false),
        ]);
        assert!(conditions_match(&rule, &t));

        let t2 = trigger(&[("content", "send the invoice"), ("sender", "666@c.us")]);
        assert!(!conditions_match(&rule, &t2));
    }

    #[test]
    fn zero_conditions_always_match() {
        assert!(conditions_match(&rule_with(vec![]), &trigger(&[])));
    }

    #[test]
    fn permission_filters() {
        let mut rule = rule_with(vec![]);
        let t = trigger(&[]);

        rule.trigger_permission = TriggerPermission::Anyone;
        assert!(permitted(&rule, &t));

        rule.trigger_permission = TriggerPermission::Me;
        assert!(!permitted(&rule, &t));
        rule.creator_jid = Some("555@c.us".into());
        assert!(permitted(&rule, &t));

        rule.trigger_permission = TriggerPermission::Users;
        assert!(!permitted(&rule, &t));
        rule.allowed_users = vec!["555@c.us".into()];
        assert!(permitted(&rule, &t));
    }
}
