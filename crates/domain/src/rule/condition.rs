//! Condition — a guard evaluated against the global variable snapshot.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::pattern;
use crate::template::{self, Variables};

/// A payload pattern matched against the process-wide variables.
///
/// Conditions of a rule are OR-ed: the rule fires if *any* condition holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionPattern {
    #[serde(default)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl ConditionPattern {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable pattern.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, expected: serde_json::Value) -> Self {
        self.payload.insert(key.into(), expected);
        self
    }

    /// Parse a configuration entry (`{payload}`).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDefinition`] when the entry is not a
    /// valid condition, or an operator error from its pattern.
    pub fn from_definition(value: serde_json::Value) -> Result<Self, ValidationError> {
        let condition: Self =
            serde_json::from_value(value).map_err(|err| ValidationError::InvalidDefinition {
                what: "condition",
                reason: err.to_string(),
            })?;
        pattern::validate_object(&condition.payload)?;
        Ok(condition)
    }

    /// Match the pattern (with `globals` substituted) against `globals`.
    #[must_use]
    pub fn matches(&self, globals: &Variables) -> Option<Variables> {
        let resolved = template::substitute(
            &serde_json::Value::Object(self.payload.clone()),
            globals,
        );
        pattern::match_object(resolved.as_object()?, globals)
    }
}

impl std::fmt::Display for ConditionPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("condition(")?;
        for (i, key) in self.payload.keys().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(key)?;
        }
        f.write_str(")")
    }
}
