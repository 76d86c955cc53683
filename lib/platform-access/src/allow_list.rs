//! The set of identities permitted to sign in.
//!
//! The allow-list is configured as a single semicolon-delimited string
//! (e.g. `"alice@example.com; bob@example.com"`). It is parsed once at
//! start-up and never mutated afterwards, so it can be shared across
//! requests without synchronization.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Separator between entries in the configured allow-list string.
pub const SEPARATOR: char = ';';

/// Ordered list of permitted identities (UPNs or email addresses).
///
/// Entries are trimmed and never empty. Matching is case-insensitive.
/// An empty list permits nobody.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    /// Entries as configured (trimmed).
    entries: Vec<String>,
    /// Lowercased copies of `entries`, same order.
    normalized: Vec<String>,
}

impl AllowList {
    /// Parses a possibly-absent configuration value.
    ///
    /// Splits on `;`, trims every segment and drops the empty ones.
    /// `None` yields an empty list.
    #[must_use]
    pub fn load(raw: Option<&str>) -> Self {
        let entries: Vec<String> = raw
            .unwrap_or_default()
            .split(SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<String>) -> Self {
        let normalized = entries.iter().map(|e| fold_case(e)).collect();
        Self {
            entries,
            normalized,
        }
    }

    /// Returns true if `identity` matches any entry, ignoring case.
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        let identity = fold_case(identity);
        self.normalized.iter().any(|e| *e == identity)
    }

    /// Returns the entries in configuration order.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Maps every char to its simple (single-char) uppercase form.
///
/// Chars whose uppercase expands to several chars (`ß`) are kept as is.
fn fold_case(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) => u,
                _ => c,
            }
        })
        .collect()
}

impl FromStr for AllowList {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::load(Some(s)))
    }
}

impl fmt::Display for AllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entries.join(";"))
    }
}

impl Serialize for AllowList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AllowList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::load(raw.as_deref()))
    }
}
