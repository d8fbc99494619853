//! TOML-backed [`RuleSource`].
//!
//! Each top-level table is one rule, keyed by its code:
//!
//! ```toml
//! [garage-open]
//! name = "Garage open"
//! events = [{ type = "signal-event-recognized", payload = { device_code = "garage" } }]
//! conditions = [{ payload = { runlevel = "away" } }]
//! actions = [{ component_to = "notifier", type = "notify-do-send", payload = { text = "Garage opened" } }]
//! ```

use std::path::{Path, PathBuf};

use homewire_app::ports::{RuleEntry, RuleSource};
use homewire_domain::error::HomewireError;

use crate::read_table;

/// Reads rule definitions from a TOML document on every load.
#[derive(Debug, Clone)]
pub struct TomlRuleSource {
    path: PathBuf,
}

impl TomlRuleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleSource for TomlRuleSource {
    fn load(&self) -> Result<Vec<RuleEntry>, HomewireError> {
        let Some(table) = read_table(&self.path)? else {
            tracing::warn!(path = %self.path.display(), "rules file not found, no rules loaded");
            return Ok(Vec::new());
        };

        let mut entries = Vec::with_capacity(table.len());
        for (code, value) in table {
            match serde_json::to_value(&value) {
                Ok(definition) => entries.push(RuleEntry::new(code, definition)),
                Err(err) => tracing::warn!(rule = %code, error = %err, "skipping rule"),
            }
        }
        tracing::debug!(path = %self.path.display(), count = entries.len(), "rules read");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    fn source_with(content: &str) -> (tempfile::NamedTempFile, TomlRuleSource) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let source = TomlRuleSource::new(file.path());
        (file, source)
    }

    #[test]
    fn should_read_one_entry_per_table_in_declaration_order() {
        let (_file, source) = source_with(
            r#"
[zeta]
name = "Last alphabetically"
events = [{ type = "a" }]

[alpha]
name = "First alphabetically"
events = [{ type = "b" }]
"#,
        );

        let entries = source.load().unwrap();

        let codes: Vec<&str> = entries.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, ["zeta", "alpha"]);
    }

    #[test]
    fn should_convert_nested_definition_to_json() {
        let (_file, source) = source_with(
            r#"
[garage-open]
name = "Garage open"
events = [{ type = "signal-event-recognized", payload = { device_code = "garage" } }]
conditions = [{ payload = { runlevel = "away" } }]

[[garage-open.actions]]
component_to = "notifier"
type = "notify-do-send"
delay = 5
payload = { text = "Garage opened" }
"#,
        );

        let entries = source.load().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].definition,
            json!({
                "name": "Garage open",
                "events": [{"type": "signal-event-recognized", "payload": {"device_code": "garage"}}],
                "conditions": [{"payload": {"runlevel": "away"}}],
                "actions": [{
                    "component_to": "notifier",
                    "type": "notify-do-send",
                    "delay": 5,
                    "payload": {"text": "Garage opened"}
                }]
            })
        );
    }

    #[test]
    fn should_return_no_rules_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let source = TomlRuleSource::new(dir.path().join("rules.toml"));

        assert!(source.load().unwrap().is_empty());
    }

    #[test]
    fn should_fail_when_document_is_not_toml() {
        let (_file, source) = source_with("[unterminated");

        let err = source.load().unwrap_err();

        assert!(matches!(err, HomewireError::Storage(_)));
    }
}
