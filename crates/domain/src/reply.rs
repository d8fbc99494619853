//! Reply — the outcome of delivering a [`Message`](crate::message::Message).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker used in the wire form of a reply (`{"message": "reply", …}`).
pub const REPLY_MESSAGE: &str = "reply";

/// Outcome category of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplyStatus {
    Success,
    Failure,
    /// No recipient handled the message. A valid outcome, not an error.
    NotFound,
    /// A side effect failed without invalidating the caller's own outcome.
    NonBlockingFailure,
}

impl fmt::Display for ReplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::NotFound => "not-found",
            Self::NonBlockingFailure => "non-blocking-failure",
        })
    }
}

/// A status plus an optional JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub status: ReplyStatus,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Reply {
    #[must_use]
    pub fn new(status: ReplyStatus, payload: serde_json::Value) -> Self {
        Self { status, payload }
    }

    #[must_use]
    pub fn success() -> Self {
        Self::new(ReplyStatus::Success, serde_json::Value::Null)
    }

    #[must_use]
    pub fn success_with(payload: serde_json::Value) -> Self {
        Self::new(ReplyStatus::Success, payload)
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(ReplyStatus::NotFound, serde_json::Value::Null)
    }

    /// Failure carrying `{"message": <text>}`.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(
            ReplyStatus::Failure,
            serde_json::json!({ "message": message.into() }),
        )
    }

    /// Non-blocking failure carrying `{"message": <text>}`.
    #[must_use]
    pub fn non_blocking_failure(message: impl Into<String>) -> Self {
        Self::new(
            ReplyStatus::NonBlockingFailure,
            serde_json::json!({ "message": message.into() }),
        )
    }

    /// `true` unless the status is [`ReplyStatus::NotFound`].
    #[must_use]
    pub fn is_handled(&self) -> bool {
        self.status != ReplyStatus::NotFound
    }

    /// Wire form: `{"message": "reply", "status": …, "payload": …}`.
    #[must_use]
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({
            "message": REPLY_MESSAGE,
            "status": self.status,
            "payload": self.payload,
        })
    }

    /// Fold per-recipient replies into one, in delivery order.
    ///
    /// - no reply other than `not-found` → `not-found`;
    /// - otherwise `failure` if any recipient failed, else `success`;
    /// - the payload maps each handling recipient's code to its wire reply.
    pub fn aggregate<K, I>(replies: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Reply)>,
    {
        let mut found = false;
        let mut status = ReplyStatus::Success;
        let mut payload = serde_json::Map::new();

        for (code, reply) in replies {
            if !reply.is_handled() {
                continue;
            }
            found = true;
            if reply.status == ReplyStatus::Failure {
                status = ReplyStatus::Failure;
            }
            payload.insert(code.into(), reply.to_wire());
        }

        if !found {
            return Self::not_found();
        }
        Self::new(status, serde_json::Value::Object(payload))
    }
}
