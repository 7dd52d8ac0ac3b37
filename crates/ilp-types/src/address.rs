//! ILP addresses: dot-separated ASCII identifiers rooted at the global `g` scheme.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^g(\.[A-Za-z0-9_~-]+)*$").expect("static regex is valid"));

/// A validated ILP address (`g.example.alice`-style).
///
/// Construction always validates the regex and length bound; there is no way
/// to hold an `IlpAddress` that doesn't satisfy both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IlpAddress(String);

/// Error returned when a string fails ILP address validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address length {0} is outside the allowed range 1..=1023")]
    Length(usize),
    #[error("address {0:?} does not match the ILP address grammar")]
    InvalidFormat(String),
}

impl IlpAddress {
    /// Validate and wrap `s` as an [`IlpAddress`].
    pub fn parse(s: impl Into<String>) -> Result<Self, AddressError> {
        let s = s.into();
        if s.is_empty() || s.len() > 1023 {
            return Err(AddressError::Length(s.len()));
        }
        if !ADDRESS_RE.is_match(&s) {
            return Err(AddressError::InvalidFormat(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Dot-separated labels, e.g. `g.example.alice` -> `["g", "example", "alice"]`.
    pub fn labels(&self) -> Vec<&str> {
        self.0.split('.').collect()
    }

    /// Whether `self` is a dot-aligned prefix of `other` (or equal to it).
    ///
    /// `g.a` is a prefix of `g.a` and `g.a.x`, but not of `g.ab`.
    pub fn is_prefix_of(&self, other: &IlpAddress) -> bool {
        let mine = self.labels();
        let theirs = other.labels();
        if mine.len() > theirs.len() {
            return false;
        }
        mine.iter().zip(theirs.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for IlpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for IlpAddress {
    type Error = AddressError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for IlpAddress {
    type Error = AddressError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_root() {
        assert!(IlpAddress::parse("g").is_ok());
    }

    #[test]
    fn accepts_nested() {
        assert!(IlpAddress::parse("g.example.alice").is_ok());
    }

    #[test]
    fn rejects_missing_root() {
        assert!(IlpAddress::parse("example.alice").is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(IlpAddress::parse("").is_err());
    }

    #[test]
    fn rejects_too_long() {
        let long = format!("g.{}", "a".repeat(1022));
        assert!(IlpAddress::parse(long).is_err());
    }

    #[test]
    fn prefix_is_label_aligned() {
        let a = IlpAddress::parse("g.a").unwrap();
        let ab = IlpAddress::parse("g.ab").unwrap();
        let a_x = IlpAddress::parse("g.a.x").unwrap();
        assert!(a.is_prefix_of(&a));
        assert!(a.is_prefix_of(&a_x));
        assert!(!a.is_prefix_of(&ab));
    }
}
