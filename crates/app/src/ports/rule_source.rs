//! Rule source port — where rule definitions are read from.

use homewire_domain::error::HomewireError;

/// One raw rule definition, keyed by its configured code.
///
/// The definition is kept as JSON (`{name, events, conditions, actions}`) so
/// that the engine can validate each item separately and skip the broken ones.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEntry {
    pub code: String,
    pub definition: serde_json::Value,
}

impl RuleEntry {
    #[must_use]
    pub fn new(code: impl Into<String>, definition: serde_json::Value) -> Self {
        Self {
            code: code.into(),
            definition,
        }
    }
}

/// Provider of rule definitions, read at startup and on every reload.
pub trait RuleSource: Send + Sync {
    /// Read every rule entry, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`HomewireError::Storage`] when the whole document cannot be
    /// read or parsed. Individual malformed rules are not errors.
    fn load(&self) -> Result<Vec<RuleEntry>, HomewireError>;
}

impl<T: RuleSource + ?Sized> RuleSource for std::sync::Arc<T> {
    fn load(&self) -> Result<Vec<RuleEntry>, HomewireError> {
        (**self).load()
    }
}
