//! Component registry — every registered component, keyed by code and
//! grouped by type tag.
//!
//! The registry is filled once at startup and is read-only afterwards, so
//! lookups need no locking.

use std::collections::HashMap;
use std::sync::Arc;

use homewire_domain::code::ComponentCode;
use homewire_domain::error::{HomewireError, ValidationError};
use homewire_domain::message::Recipient;

use crate::ports::Component;

/// One registered component.
#[derive(Clone)]
pub struct ComponentRecord {
    pub code: ComponentCode,
    pub name: String,
    pub kind: String,
    pub instance: Arc<dyn Component>,
}

impl std::fmt::Debug for ComponentRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRecord")
            .field("code", &self.code)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Components in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<ComponentRecord>,
    by_code: HashMap<ComponentCode, usize>,
    by_kind: HashMap<String, Vec<usize>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyCode`] for an empty code and
    /// [`ValidationError::DuplicateCode`] when the code is already taken.
    pub fn register(&mut self, component: Arc<dyn Component>) -> Result<(), HomewireError> {
        let code = component.code().clone();
        if code.is_empty() {
            return Err(ValidationError::EmptyCode.into());
        }
        if self.by_code.contains_key(&code) {
            return Err(ValidationError::DuplicateCode(code.to_string()).into());
        }

        let index = self.records.len();
        let kind = component.kind().to_string();
        self.by_code.insert(code.clone(), index);
        self.by_kind.entry(kind.clone()).or_default().push(index);
        self.records.push(ComponentRecord {
            code,
            name: component.name().to_string(),
            kind,
            instance: component,
        });
        Ok(())
    }

    /// Look up a component by code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&ComponentRecord> {
        self.by_code.get(code).map(|&index| &self.records[index])
    }

    /// Components of the given type tag, in registration order.
    pub fn of_kind<'a>(&'a self, kind: &str) -> impl Iterator<Item = &'a ComponentRecord> + use<'a> {
        self.by_kind
            .get(kind)
            .into_iter()
            .flatten()
            .map(|&index| &self.records[index])
    }

    /// Components addressed by `recipient`, in delivery order.
    ///
    /// Unknown codes are logged and skipped.
    #[must_use]
    pub fn resolve(&self, recipient: &Recipient) -> Vec<&ComponentRecord> {
        match recipient {
            Recipient::All => self.records.iter().collect(),
            Recipient::Type(kind) => self.of_kind(kind).collect(),
            Recipient::Code(code) => self.lookup(code).into_iter().collect(),
            Recipient::List(codes) => codes.iter().filter_map(|code| self.lookup(code)).collect(),
        }
    }

    fn lookup(&self, code: &ComponentCode) -> Option<&ComponentRecord> {
        let record = self.get(code.as_str());
        if record.is_none() {
            tracing::warn!(component = %code, "unknown recipient, skipping");
        }
        record
    }

    /// Every component, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
