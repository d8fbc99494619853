//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`HomewireError`] via `#[from]` or an explicit `From` impl.

/// Top-level error shared by every crate of the workspace.
#[derive(Debug, thiserror::Error)]
pub enum HomewireError {
    /// A domain invariant or a required parameter was violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A looked-up item does not exist.
    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// A persistence backend failed (file access, encoding, …).
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A hardware or network transport failed.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A code (component, rule, device) is empty after normalisation.
    #[error("code must not be empty")]
    EmptyCode,

    /// A rule was declared without any event pattern.
    #[error("rule has no events")]
    NoEvents,

    /// Two registered items share the same code.
    #[error("duplicate code {0:?}")]
    DuplicateCode(String),

    /// A command payload lacks a required key.
    #[error("Missing {0} parameter")]
    MissingParameter(&'static str),

    /// A configuration entry could not be interpreted.
    #[error("invalid {what}: {reason}")]
    InvalidDefinition {
        /// Kind of entry (`"event"`, `"action"`, `"signal device"`, …).
        what: &'static str,
        /// Human-readable cause.
        reason: String,
    },

    /// A pattern names an operator that does not exist.
    #[error("unknown operator {0:?}")]
    UnknownOperator(String),
}

/// Returned when a lookup by code finds nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id:?} not found")]
pub struct NotFoundError {
    /// Kind of item that was looked up (`"Component"`, `"Signal"`, …).
    pub entity: &'static str,
    /// The code that was searched for.
    pub id: String,
}
