//! Event pattern — the message shape that activates a rule.

use serde::{Deserialize, Serialize};

use crate::code::ComponentCode;
use crate::error::ValidationError;
use crate::message::Message;
use crate::pattern;
use crate::template::{self, Variables};

/// A message template matched against every message seen by the rule engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPattern {
    /// Message type; must be identical to the incoming message's type.
    #[serde(rename = "type")]
    pub message_type: String,
    /// Payload pattern; see [`crate::pattern`].
    #[serde(default)]
    pub payload: serde_json::Map<String, serde_json::Value>,
    /// Only match messages sent by this component.
    #[serde(
        default,
        rename = "component_from",
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<ComponentCode>,
}

impl EventPattern {
    /// Pattern matching any message of `message_type`.
    #[must_use]
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            payload: serde_json::Map::new(),
            source: None,
        }
    }

    /// Add a payload key pattern.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, expected: serde_json::Value) -> Self {
        self.payload.insert(key.into(), expected);
        self
    }

    /// Restrict the pattern to messages sent by `source`.
    #[must_use]
    pub fn from_source(mut self, source: impl Into<ComponentCode>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Parse a configuration entry (`{type, payload, component_from}`).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDefinition`] when the entry is not a
    /// valid event, or an operator error from its payload pattern.
    pub fn from_definition(value: serde_json::Value) -> Result<Self, ValidationError> {
        let event: Self =
            serde_json::from_value(value).map_err(|err| ValidationError::InvalidDefinition {
                what: "event",
                reason: err.to_string(),
            })?;
        pattern::validate_object(&event.payload)?;
        Ok(event)
    }

    /// Match `message`, substituting `globals` into the pattern first.
    ///
    /// Returns the variables extracted by the payload pattern, or `None`.
    #[must_use]
    pub fn matches(&self, message: &Message, globals: &Variables) -> Option<Variables> {
        if message.message_type != self.message_type {
            return None;
        }
        if let Some(source) = &self.source {
            if message.from != *source {
                return None;
            }
        }

        let resolved = template::substitute(
            &serde_json::Value::Object(self.payload.clone()),
            globals,
        );
        let empty = serde_json::Map::new();
        let target = message.payload_object().unwrap_or(&empty);
        pattern::match_object(resolved.as_object()?, target)
    }
}

impl std::fmt::Display for EventPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => write!(f, "event({}, from {source})", self.message_type),
            None => write!(f, "event({})", self.message_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn door(room: &str) -> Message {
        Message::broadcast("sensor", "door-open", json!({ "room": room }))
    }

    #[test]
    fn should_match_when_type_and_payload_match() {
        let p = EventPattern::new("door-open").with("room", json!("garage"));
        assert_eq!(p.matches(&door("garage"), &Variables::new()), Some(Variables::new()));
    }

    #[test]
    fn should_not_match_when_payload_differs() {
        let p = EventPattern::new("door-open").with("room", json!("garage"));
        assert!(p.matches(&door("kitchen"), &Variables::new()).is_none());
    }

    #[test]
    fn should_not_match_when_type_differs() {
        let p = EventPattern::new("door-close");
        assert!(p.matches(&door("garage"), &Variables::new()).is_none());
    }

    #[test]
    fn should_treat_missing_payload_as_empty_object() {
        let p = EventPattern::new("ping");
        let m = Message::broadcast("", "ping", serde_json::Value::Null);
        assert!(p.matches(&m, &Variables::new()).is_some());

        let keyed = EventPattern::new("ping").with("k", json!("v"));
        assert!(keyed.matches(&m, &Variables::new()).is_none());
    }

    #[test]
    fn should_filter_on_source_component() {
        let p = EventPattern::new("door-open").from_source("sensor");
        assert!(p.matches(&door("garage"), &Variables::new()).is_some());

        let other = EventPattern::new("door-open").from_source("camera");
        assert!(other.matches(&door("garage"), &Variables::new()).is_none());
    }

    #[test]
    fn should_substitute_globals_into_pattern() {
        let p = EventPattern::new("door-open").with("room", json!("%watched%"));
        let mut globals = Variables::new();
        globals.insert("watched".to_string(), json!("garage"));
        assert!(p.matches(&door("garage"), &globals).is_some());
        assert!(p.matches(&door("kitchen"), &globals).is_none());
    }

    #[test]
    fn should_parse_definition_with_source() {
        let p = EventPattern::from_definition(json!({
            "type": "signal-event-recognized",
            "payload": {"device_code": "gate"},
            "component_from": "ook"
        }))
        .unwrap();
        assert_eq!(p.message_type, "signal-event-recognized");
        assert_eq!(p.source, Some(ComponentCode::from("ook")));
    }

    #[test]
    fn should_reject_definition_without_type() {
        let err = EventPattern::from_definition(json!({"payload": {}})).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDefinition { what: "event", .. }));
    }

    #[test]
    fn should_reject_definition_with_unknown_operator() {
        let err = EventPattern::from_definition(json!({
            "type": "x",
            "payload": {"k": ["nearly", 1]}
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownOperator(_)));
    }
}
