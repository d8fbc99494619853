//! Rule — event → condition → action bindings.
//!
//! A rule fires when *any* of its [`EventPattern`]s matches an incoming
//! message and, if it declares conditions, *any* [`ConditionPattern`] holds
//! against the global variables. Every [`Action`] is then sent, in order.

mod action;
mod condition;
mod event;

pub use action::Action;
pub use condition::ConditionPattern;
pub use event::EventPattern;

use serde::{Deserialize, Serialize};

use crate::code::RuleCode;
use crate::error::{HomewireError, ValidationError};
use crate::message::Message;
use crate::template::{self, Variables};

/// A loaded rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub code: RuleCode,
    pub name: String,
    pub events: Vec<EventPattern>,
    pub conditions: Vec<ConditionPattern>,
    pub actions: Vec<Action>,
}

impl Rule {
    /// Create a builder for constructing a [`Rule`].
    #[must_use]
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HomewireError::Validation`] when:
    /// - `code` is empty ([`ValidationError::EmptyCode`])
    /// - `events` is empty ([`ValidationError::NoEvents`])
    pub fn validate(&self) -> Result<(), HomewireError> {
        if self.code.is_empty() {
            return Err(ValidationError::EmptyCode.into());
        }
        if self.events.is_empty() {
            return Err(ValidationError::NoEvents.into());
        }
        Ok(())
    }

    /// Decide whether `message` fires this rule.
    ///
    /// On success returns the variable set actions are rendered with: the
    /// message payload's top-level keys, overlaid with every variable
    /// extracted by the matching event and condition.
    #[must_use]
    pub fn evaluate(&self, message: &Message, globals: &Variables) -> Option<Variables> {
        let extracted = self.events.iter().find_map(|event| {
            let from_event = event.matches(message, globals)?;
            if self.conditions.is_empty() {
                return Some(from_event);
            }
            let from_condition = self
                .conditions
                .iter()
                .find_map(|condition| condition.matches(globals))?;
            Some(template::merge(&from_event, &from_condition))
        })?;

        Some(template::merge(
            &template::from_payload(&message.payload),
            &extracted,
        ))
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code, self.name)
    }
}

/// Step-by-step builder for [`Rule`].
#[derive(Debug, Default)]
pub struct RuleBuilder {
    code: Option<String>,
    name: Option<String>,
    events: Vec<EventPattern>,
    conditions: Vec<ConditionPattern>,
    actions: Vec<Action>,
}

impl RuleBuilder {
    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn event(mut self, event: EventPattern) -> Self {
        self.events.push(event);
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: ConditionPattern) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Consume the builder, validate, and return a [`Rule`].
    ///
    /// The code is slug-normalised and derived from the name when absent;
    /// the name defaults to the code.
    ///
    /// # Errors
    ///
    /// Returns [`HomewireError::Validation`] if the code ends up empty or no
    /// event was given.
    pub fn build(self) -> Result<Rule, HomewireError> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.code.clone())
            .unwrap_or_default();
        let rule = Rule {
            code: RuleCode::derive(self.code.as_deref(), &name),
            name,
            events: self.events,
            conditions: self.conditions,
            actions: self.actions,
        };
        rule.validate()?;
        Ok(rule)
    }
}

/// Raw configuration entry of one rule, before per-item validation.
///
/// Events, conditions and actions are kept as JSON so that a single
/// malformed item can be reported and skipped without rejecting the rule.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleDefinition {
    pub name: Option<String>,
    pub events: Vec<serde_json::Value>,
    pub conditions: Vec<serde_json::Value>,
    pub actions: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::message::Recipient;

    fn garage_rule() -> Rule {
        Rule::builder()
            .code("r1")
            .event(EventPattern::new("door-open").with("room", json!("garage")))
            .action(
                Action::new("tts-do-say")
                    .to(Recipient::All)
                    .payload(json!({"text": "Garage door opened"})),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_rule_with_derived_name() {
        let rule = garage_rule();
        assert_eq!(rule.code, "r1");
        assert_eq!(rule.name, "r1");
        assert_eq!(rule.actions.len(), 1);
    }

    #[test]
    fn should_derive_code_from_name_when_missing() {
        let rule = Rule::builder()
            .name("Garage Alert")
            .event(EventPattern::new("door-open"))
            .build()
            .unwrap();
        assert_eq!(rule.code, "garage_alert");
        assert_eq!(rule.name, "Garage Alert");
    }

    #[test]
    fn should_return_validation_error_when_code_and_name_missing() {
        let result = Rule::builder().event(EventPattern::new("x")).build();
        assert!(matches!(
            result,
            Err(HomewireError::Validation(ValidationError::EmptyCode))
        ));
    }

    #[test]
    fn should_return_validation_error_when_events_missing() {
        let result = Rule::builder().code("lonely").build();
        assert!(matches!(
            result,
            Err(HomewireError::Validation(ValidationError::NoEvents))
        ));
    }

    #[test]
    fn should_fire_when_event_matches_without_conditions() {
        let rule = garage_rule();
        let m = Message::broadcast("sensor", "door-open", json!({"room": "garage"}));
        let vars = rule.evaluate(&m, &Variables::new()).unwrap();
        assert_eq!(vars["room"], "garage");
    }

    #[test]
    fn should_not_fire_when_event_does_not_match() {
        let rule = garage_rule();
        let m = Message::broadcast("sensor", "door-open", json!({"room": "kitchen"}));
        assert!(rule.evaluate(&m, &Variables::new()).is_none());
    }

    #[test]
    fn should_fire_when_any_condition_holds() {
        let rule = Rule::builder()
            .code("night")
            .event(EventPattern::new("motion"))
            .condition(ConditionPattern::new().with("runlevel", json!("home")))
            .condition(ConditionPattern::new().with("runlevel", json!("away")))
            .build()
            .unwrap();
        let globals = json!({"runlevel": "away"}).as_object().unwrap().clone();
        let m = Message::broadcast("", "motion", serde_json::Value::Null);
        assert!(rule.evaluate(&m, &globals).is_some());

        let home_only = json!({"runlevel": "sleep"}).as_object().unwrap().clone();
        assert!(rule.evaluate(&m, &home_only).is_none());
    }

    #[test]
    fn should_fire_when_second_event_matches() {
        let rule = Rule::builder()
            .code("either")
            .event(EventPattern::new("a"))
            .event(EventPattern::new("b"))
            .build()
            .unwrap();
        let m = Message::broadcast("", "b", serde_json::Value::Null);
        assert!(rule.evaluate(&m, &Variables::new()).is_some());
    }

    #[test]
    fn should_overlay_extracted_variables_on_payload() {
        let rule = Rule::builder()
            .code("digits")
            .event(EventPattern::new("chat").with("text", json!(["regex", r"(?P<text>\d+)"])))
            .build()
            .unwrap();
        let m = Message::broadcast("bot", "chat", json!({"text": "open 42", "user": "ann"}));
        let vars = rule.evaluate(&m, &Variables::new()).unwrap();
        assert_eq!(vars["text"], "42");
        assert_eq!(vars["user"], "ann");
    }

    #[test]
    fn should_deserialize_definition_with_defaults() {
        let def: RuleDefinition =
            serde_json::from_value(json!({"events": [{"type": "x"}]})).unwrap();
        assert!(def.name.is_none());
        assert_eq!(def.events.len(), 1);
        assert!(def.actions.is_empty());
    }
}
