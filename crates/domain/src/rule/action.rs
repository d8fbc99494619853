//! Action — the message sent when a rule fires.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::code::ComponentCode;
use crate::error::ValidationError;
use crate::message::{Message, Recipient};
use crate::template::{self, Variables};

/// A message template sent, in order, every time its rule fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Recipient of the rendered message; broadcast-all when omitted.
    #[serde(default, rename = "component_to")]
    pub target: Recipient,
    /// Type of the rendered message.
    #[serde(rename = "type")]
    pub message_type: String,
    /// Payload template; `%name%` tokens are substituted at fire time.
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Send from an independent task instead of inline.
    #[serde(default, rename = "async")]
    pub detached: bool,
    /// Seconds to wait before sending.
    #[serde(default)]
    pub delay: u64,
}

impl Action {
    /// Broadcast action of `message_type` with an empty payload.
    #[must_use]
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            target: Recipient::All,
            message_type: message_type.into(),
            payload: serde_json::Value::Null,
            detached: false,
            delay: 0,
        }
    }

    #[must_use]
    pub fn to(mut self, target: Recipient) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    #[must_use]
    pub fn detached(mut self, detached: bool) -> Self {
        self.detached = detached;
        self
    }

    #[must_use]
    pub fn delay_secs(mut self, seconds: u64) -> Self {
        self.delay = seconds;
        self
    }

    /// The configured delay as a [`Duration`].
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay)
    }

    /// Parse a configuration entry
    /// (`{component_to, type, payload, async, delay}`).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDefinition`] when the entry is not a
    /// valid action.
    pub fn from_definition(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_json::from_value(value).map_err(|err| ValidationError::InvalidDefinition {
            what: "action",
            reason: err.to_string(),
        })
    }

    /// Build the message to send, with `variables` substituted into a copy
    /// of the payload template.
    #[must_use]
    pub fn render(&self, from: &ComponentCode, variables: &Variables) -> Message {
        Message::new(
            from.clone(),
            self.target.clone(),
            self.message_type.clone(),
            template::substitute(&self.payload, variables),
        )
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "send({} -> {})", self.message_type, self.target)?;
        if self.delay > 0 {
            write!(f, " after {}s", self.delay)?;
        }
        if self.detached {
            f.write_str(" async")?;
        }
        Ok(())
    }
}
