//! Compile raw rule entries into validated [`Rule`]s.
//!
//! A broken event, condition or action is dropped with a warning and the rest
//! of its rule survives; a rule left without any event, or whose code is
//! already taken, is dropped entirely.

use std::collections::HashSet;

use homewire_domain::error::{HomewireError, ValidationError};
use homewire_domain::rule::{Action, ConditionPattern, EventPattern, Rule, RuleDefinition};

use crate::ports::RuleEntry;

/// Compile every entry, in order, skipping the malformed ones.
#[must_use]
pub fn compile(entries: Vec<RuleEntry>) -> Vec<Rule> {
    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(entries.len());

    for entry in entries {
        let key = entry.code.clone();
        match compile_entry(entry) {
            Ok(rule) => {
                if seen.insert(rule.code.clone()) {
                    rules.push(rule);
                } else {
                    tracing::warn!(rule = %rule.code, "duplicate rule code, skipping");
                }
            }
            Err(err) => tracing::warn!(rule = %key, error = %err, "skipping malformed rule"),
        }
    }

    rules
}

fn compile_entry(entry: RuleEntry) -> Result<Rule, HomewireError> {
    let RuleEntry { code, definition } = entry;
    let definition: RuleDefinition =
        serde_json::from_value(definition).map_err(|err| ValidationError::InvalidDefinition {
            what: "rule",
            reason: err.to_string(),
        })?;

    let mut builder = Rule::builder().code(code.as_str());
    if let Some(name) = definition.name {
        builder = builder.name(name);
    }
    builder = parse_items(&code, "event", definition.events, EventPattern::from_definition)
        .into_iter()
        .fold(builder, |b, event| b.event(event));
    builder = parse_items(
        &code,
        "condition",
        definition.conditions,
        ConditionPattern::from_definition,
    )
    .into_iter()
    .fold(builder, |b, condition| b.condition(condition));
    builder = parse_items(&code, "action", definition.actions, Action::from_definition)
        .into_iter()
        .fold(builder, |b, action| b.action(action));

    builder.build()
}

fn parse_items<T>(
    rule: &str,
    what: &'static str,
    values: Vec<serde_json::Value>,
    parse: impl Fn(serde_json::Value) -> Result<T, ValidationError>,
) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match parse(value) {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::warn!(rule, what, index, error = %err, "skipping malformed rule item");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn entry(code: &str, definition: serde_json::Value) -> RuleEntry {
        RuleEntry::new(code, definition)
    }

    #[test]
    fn should_compile_rules_in_declaration_order() {
        let rules = compile(vec![
            entry("b", json!({"events": [{"type": "x"}]})),
            entry("a", json!({"events": [{"type": "y"}]})),
        ]);
        let codes: Vec<_> = rules.iter().map(|r| r.code.to_string()).collect();
        assert_eq!(codes, ["b", "a"]);
    }

    #[test]
    fn should_skip_malformed_item_but_keep_rule() {
        let rules = compile(vec![entry(
            "r1",
            json!({
                "name": "Garage",
                "events": [{"type": "door-open"}, {"payload": {}}],
                "actions": [{"type": "tts-do-say"}, {"delay": 3}]
            }),
        )]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].events.len(), 1);
        assert_eq!(rules[0].actions.len(), 1);
        assert_eq!(rules[0].name, "Garage");
    }

    #[test]
    fn should_skip_rule_when_no_event_is_valid() {
        let rules = compile(vec![
            entry("broken", json!({"events": [{"payload": {}}]})),
            entry("ok", json!({"events": [{"type": "x"}]})),
        ]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].code, "ok");
    }

    #[test]
    fn should_skip_rule_when_definition_is_not_an_object() {
        let rules = compile(vec![entry("weird", json!(42))]);
        assert!(rules.is_empty());
    }

    #[test]
    fn should_skip_rule_with_unknown_operator() {
        let rules = compile(vec![entry(
            "r",
            json!({"events": [{"type": "x", "payload": {"k": ["almost", 1]}}]}),
        )]);
        assert!(rules.is_empty());
    }

    #[test]
    fn should_keep_first_rule_when_codes_collide() {
        let rules = compile(vec![
            entry("Night Mode", json!({"events": [{"type": "first"}]})),
            entry("night_mode", json!({"events": [{"type": "second"}]})),
        ]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].events[0].message_type, "first");
    }

    #[test]
    fn should_derive_code_from_name_when_key_is_blank() {
        let rules = compile(vec![entry(
            " ",
            json!({"name": "Front Door", "events": [{"type": "x"}]}),
        )]);
        assert_eq!(rules[0].code, "front_door");
    }
}
