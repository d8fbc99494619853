//! Message — a typed request or event routed by the intercom.
//!
//! A message names its sender, its [`Recipient`], a type string
//! (`"door-open"`, `"signal-do-learn"`, …) and an optional JSON payload.
//! Messages are immutable once created; the rule engine builds fresh copies
//! when it substitutes variables into action templates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::code::ComponentCode;
use crate::error::ValidationError;

/// Recipient token addressing every registered component.
pub const BROADCAST_ALL: &str = "_all";

/// Prefix of the recipient token addressing every component of one type
/// (`"_type:signal-manager"`).
pub const BROADCAST_TYPE_PREFIX: &str = "_type:";

/// Who a [`Message`] is addressed to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecipientRepr", into = "RecipientRepr")]
pub enum Recipient {
    /// Every registered component, in registration order.
    #[default]
    All,
    /// Every component registered under the given type tag.
    Type(String),
    /// A single component.
    Code(ComponentCode),
    /// An explicit list of components, visited in list order.
    List(Vec<ComponentCode>),
}

impl Recipient {
    /// Parse the textual recipient form: `"_all"`, `"_type:<tag>"` or a code.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw == BROADCAST_ALL {
            return Self::All;
        }
        match raw.strip_prefix(BROADCAST_TYPE_PREFIX) {
            Some(tag) if !tag.is_empty() => Self::Type(tag.to_string()),
            _ => Self::Code(ComponentCode::from(raw)),
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(BROADCAST_ALL),
            Self::Type(tag) => write!(f, "{BROADCAST_TYPE_PREFIX}{tag}"),
            Self::Code(code) => write!(f, "{code}"),
            Self::List(codes) => {
                f.write_str("[")?;
                for (i, code) in codes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{code}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RecipientRepr {
    One(String),
    Many(Vec<ComponentCode>),
}

impl From<RecipientRepr> for Recipient {
    fn from(repr: RecipientRepr) -> Self {
        match repr {
            RecipientRepr::One(raw) => Self::parse(&raw),
            RecipientRepr::Many(codes) => Self::List(codes),
        }
    }
}

impl From<Recipient> for RecipientRepr {
    fn from(recipient: Recipient) -> Self {
        match recipient {
            Recipient::List(codes) => Self::Many(codes),
            other => Self::One(other.to_string()),
        }
    }
}

/// A request or event travelling through the intercom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Sender code; empty for external senders.
    #[serde(default)]
    pub from: ComponentCode,
    /// Recipient specification.
    #[serde(default)]
    pub to: Recipient,
    /// Event or command identifier.
    #[serde(rename = "message")]
    pub message_type: String,
    /// Arbitrary JSON payload; `Null` when absent.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Message {
    /// Create a message.
    #[must_use]
    pub fn new(
        from: impl Into<ComponentCode>,
        to: Recipient,
        message_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            from: from.into(),
            to,
            message_type: message_type.into(),
            payload,
        }
    }

    /// Create a message addressed to every component.
    #[must_use]
    pub fn broadcast(
        from: impl Into<ComponentCode>,
        message_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self::new(from, Recipient::All, message_type, payload)
    }

    /// The payload as a JSON object, if it is one.
    #[must_use]
    pub fn payload_object(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.payload.as_object()
    }

    /// Fetch a payload key, failing with [`ValidationError::MissingParameter`]
    /// when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingParameter`] when `key` is not present.
    pub fn require(&self, key: &'static str) -> Result<&serde_json::Value, ValidationError> {
        self.payload
            .get(key)
            .ok_or(ValidationError::MissingParameter(key))
    }

    /// Fetch a payload key rendered as text (numbers and booleans included).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingParameter`] when `key` is not present
    /// or is `null`.
    pub fn require_text(&self, key: &'static str) -> Result<String, ValidationError> {
        match self.require(key)? {
            serde_json::Value::Null => Err(ValidationError::MissingParameter(key)),
            value => Ok(crate::template::render_value(value)),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} -> {})", self.message_type, self.from, self.to)
    }
}
