//! Pattern operators used by rule events and conditions.
//!
//! A pattern is a JSON object whose keys must all be present in the target
//! object. Each pattern value is either a plain value (compared with the
//! default case-insensitive equality) or a list whose first element names an
//! [`Operator`] and whose remaining elements are the expected values, all of
//! which must match.
//!
//! `regex`/`iregex` contribute their named capture groups as variables.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{LazyLock, Mutex, PoisonError};

use regex::{Regex, RegexBuilder};

use crate::error::ValidationError;
use crate::template::{Variables, render_value};

/// Comparison operator applied between an expected and an actual value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    /// Case-insensitive equality; the default when no operator is given.
    #[default]
    Ieq,
    /// Case-insensitive inequality.
    Ineq,
    /// The actual value contains the expected text.
    Contains,
    Icontains,
    /// The expected value is a regular expression searched in the actual text.
    Regex,
    Iregex,
    Gt,
    Lt,
    Gteq,
    Lteq,
}

impl Operator {
    /// Name used in configuration files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Ieq => "ieq",
            Self::Ineq => "ineq",
            Self::Contains => "contains",
            Self::Icontains => "icontains",
            Self::Regex => "regex",
            Self::Iregex => "iregex",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Gteq => "gteq",
            Self::Lteq => "lteq",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "eq" => Self::Eq,
            "neq" => Self::Neq,
            "ieq" => Self::Ieq,
            "ineq" => Self::Ineq,
            "contains" => Self::Contains,
            "icontains" => Self::Icontains,
            "regex" => Self::Regex,
            "iregex" => Self::Iregex,
            "gt" => Self::Gt,
            "lt" => Self::Lt,
            "gteq" => Self::Gteq,
            "lteq" => Self::Lteq,
            other => return Err(ValidationError::UnknownOperator(other.to_string())),
        })
    }
}

/// Compare one `expected` value against `actual` with `op`.
///
/// Returns the variables extracted by the match (named regex groups, empty
/// for other operators), or `None` when the values do not match. Invalid
/// regular expressions and non-numeric input to numeric operators are
/// non-matches.
#[must_use]
pub fn match_value(
    op: Operator,
    expected: &serde_json::Value,
    actual: &serde_json::Value,
) -> Option<Variables> {
    let matched = match op {
        Operator::Eq => render_value(actual) == render_value(expected),
        Operator::Neq => render_value(actual) != render_value(expected),
        Operator::Ieq => render_value(actual).to_lowercase() == render_value(expected).to_lowercase(),
        Operator::Ineq => {
            render_value(actual).to_lowercase() != render_value(expected).to_lowercase()
        }
        // Reads as "actual contains expected". Older hub rule files used the
        // reverse (actual is a substring of expected); those must be rewritten.
        Operator::Contains => render_value(actual).contains(&render_value(expected)),
        Operator::Icontains => render_value(actual)
            .to_lowercase()
            .contains(&render_value(expected).to_lowercase()),
        Operator::Regex => return search(&render_value(expected), &render_value(actual), false),
        Operator::Iregex => return search(&render_value(expected), &render_value(actual), true),
        Operator::Gt => compare(expected, actual, |a, e| a > e),
        Operator::Lt => compare(expected, actual, |a, e| a < e),
        Operator::Gteq => compare(expected, actual, |a, e| a >= e),
        Operator::Lteq => compare(expected, actual, |a, e| a <= e),
    };
    matched.then(Variables::new)
}

/// Most distinct patterns kept per case mode before the cache is reset.
const COMPILED_LIMIT: usize = 256;

/// Compiled patterns, case-sensitive then case-insensitive. Invalid
/// patterns are kept as `None`.
static COMPILED: LazyLock<Mutex<[HashMap<String, Option<Regex>>; 2]>> =
    LazyLock::new(|| Mutex::new([HashMap::new(), HashMap::new()]));

fn compiled(pattern: &str, case_insensitive: bool) -> Option<Regex> {
    let mut caches = COMPILED.lock().unwrap_or_else(PoisonError::into_inner);
    let cache = &mut caches[usize::from(case_insensitive)];
    if let Some(hit) = cache.get(pattern) {
        return hit.clone();
    }

    let re = RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .ok();
    if cache.len() >= COMPILED_LIMIT {
        cache.clear();
    }
    cache.insert(pattern.to_string(), re.clone());
    re
}

fn search(pattern: &str, text: &str, case_insensitive: bool) -> Option<Variables> {
    let re = compiled(pattern, case_insensitive)?;
    let caps = re.captures(text)?;
    let mut out = Variables::new();
    for name in re.capture_names().flatten() {
        if let Some(m) = caps.name(name) {
            out.insert(
                name.to_string(),
                serde_json::Value::String(m.as_str().to_string()),
            );
        }
    }
    Some(out)
}

fn compare(
    expected: &serde_json::Value,
    actual: &serde_json::Value,
    cmp: impl Fn(f64, f64) -> bool,
) -> bool {
    match (as_number(actual), as_number(expected)) {
        (Some(a), Some(e)) => cmp(a, e),
        _ => false,
    }
}

fn as_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One pattern key's operator and expected values.
#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    pub op: Operator,
    pub expected: Vec<serde_json::Value>,
}

impl Expectation {
    /// Interpret a pattern value: `[op, v1, v2, …]` or a bare value (`ieq`).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownOperator`] when the list head is not
    /// an operator name and [`ValidationError::InvalidDefinition`] when the
    /// list is empty or its head is not a string.
    pub fn parse(value: &serde_json::Value) -> Result<Self, ValidationError> {
        let serde_json::Value::Array(items) = value else {
            return Ok(Self {
                op: Operator::Ieq,
                expected: vec![value.clone()],
            });
        };
        let Some((head, rest)) = items.split_first() else {
            return Err(ValidationError::InvalidDefinition {
                what: "pattern",
                reason: "operator list is empty".to_string(),
            });
        };
        let Some(name) = head.as_str() else {
            return Err(ValidationError::InvalidDefinition {
                what: "pattern",
                reason: format!("operator must be a string, got {head}"),
            });
        };
        Ok(Self {
            op: name.parse()?,
            expected: rest.to_vec(),
        })
    }

    /// Every expected value must match `actual`; extracted variables are unioned.
    #[must_use]
    pub fn evaluate(&self, actual: &serde_json::Value) -> Option<Variables> {
        let mut out = Variables::new();
        for expected in &self.expected {
            out.extend(match_value(self.op, expected, actual)?);
        }
        Some(out)
    }
}

/// Check that every key of `pattern` is present in `target` and matches.
///
/// Returns the union of variables extracted by every key, or `None` on the
/// first missing or mismatching key. Malformed pattern values never match.
#[must_use]
pub fn match_object(
    pattern: &serde_json::Map<String, serde_json::Value>,
    target: &serde_json::Map<String, serde_json::Value>,
) -> Option<Variables> {
    let mut out = Variables::new();
    for (key, raw) in pattern {
        let actual = target.get(key)?;
        let expectation = Expectation::parse(raw).ok()?;
        out.extend(expectation.evaluate(actual)?);
    }
    Some(out)
}

/// Validate every value of a pattern object without evaluating it.
///
/// # Errors
///
/// Returns the first [`Expectation::parse`] error.
pub fn validate_object(
    pattern: &serde_json::Map<String, serde_json::Value>,
) -> Result<(), ValidationError> {
    for raw in pattern.values() {
        Expectation::parse(raw)?;
    }
    Ok(())
}
