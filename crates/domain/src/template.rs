//! Template engine — `%name%` variable substitution.
//!
//! Templates are plain strings or arbitrary JSON documents whose string
//! leaves may contain `%name%` tokens. A token whose variable is unknown is
//! left untouched so that a later pass (or a human) can spot it.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// A flat set of named values available to templates and patterns.
pub type Variables = serde_json::Map<String, serde_json::Value>;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%([\w\-]+?)%").expect("token pattern is valid"));

/// Render a JSON value as the text a template token expands to.
///
/// Strings are used verbatim, `null` renders empty, numbers and booleans use
/// their JSON spelling, and containers render as compact JSON.
#[must_use]
pub fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Replace every `%name%` token in `text` whose variable is known.
#[must_use]
pub fn substitute_str(text: &str, variables: &Variables) -> String {
    TOKEN
        .replace_all(text, |caps: &Captures<'_>| {
            variables
                .get(&caps[1])
                .map_or_else(|| caps[0].to_string(), render_value)
        })
        .into_owned()
}

/// Substitute variables into every string leaf of `template`, descending
/// into objects and arrays.
#[must_use]
pub fn substitute(template: &serde_json::Value, variables: &Variables) -> serde_json::Value {
    match template {
        serde_json::Value::String(s) => serde_json::Value::String(substitute_str(s, variables)),
        serde_json::Value::Array(items) => serde_json::Value::Array(
            items.iter().map(|item| substitute(item, variables)).collect(),
        ),
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, variables)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Layer `overrides` on top of `base`; keys in `overrides` win.
#[must_use]
pub fn merge(base: &Variables, overrides: &Variables) -> Variables {
    let mut out = base.clone();
    for (k, v) in overrides {
        out.insert(k.clone(), v.clone());
    }
    out
}

/// Variables contributed by a message payload (its top-level keys).
#[must_use]
pub fn from_payload(payload: &serde_json::Value) -> Variables {
    payload.as_object().cloned().unwrap_or_default()
}
