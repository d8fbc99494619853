//! Typed string codes.
//!
//! Components, rules, devices and subs are addressed by human-chosen codes
//! rather than generated identifiers. Rule, device and sub codes are derived
//! from display names with [`slugify`].

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalise a display name into a code: lower-cased, every run of
/// non-word characters replaced by a single `_`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_gap = false;
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() || ch == '_' {
            out.push(ch);
            in_gap = false;
        } else if !in_gap {
            out.push('_');
            in_gap = true;
        }
    }
    out
}

macro_rules! define_code {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing code verbatim.
            #[must_use]
            pub fn new(code: impl Into<String>) -> Self {
                Self(code.into())
            }

            /// Borrow the code as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// `true` for the empty code.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                Self(code.to_string())
            }
        }

        impl From<String> for $name {
            fn from(code: String) -> Self {
                Self(code)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

define_code!(
    /// Unique code of a registered component.
    ComponentCode
);

define_code!(
    /// Unique, slug-normalised code of a [`Rule`](crate::rule::Rule).
    RuleCode
);

impl RuleCode {
    /// Build a rule code from an explicit code or, when that is empty,
    /// from the rule's display name. Both are slug-normalised.
    #[must_use]
    pub fn derive(code: Option<&str>, name: &str) -> Self {
        match code {
            Some(code) if !code.trim().is_empty() => Self(slugify(code)),
            _ => Self(slugify(name)),
        }
    }
}
