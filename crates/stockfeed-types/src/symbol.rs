//! Ticker symbols.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ValidationError;

/// A validated, upper-cased ticker symbol (e.g. `VNM`, `^VNINDEX`, `BRK-B`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Maximum symbol length in characters.
    pub const MAX_LEN: usize = 16;

    /// Parses and normalizes a symbol.
    ///
    /// Surrounding whitespace is trimmed and letters are upper-cased. The
    /// first character must be alphanumeric or `^`; the rest may also
    /// contain `.`, `-`, `=`, `^` and `_`.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is empty, too long, or contains
    /// characters outside the accepted set.
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        if trimmed.len() > Self::MAX_LEN {
            return Err(ValidationError::MalformedSymbol(raw.to_string()));
        }

        let mut chars = trimmed.chars();
        let first_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '^');
        let rest_ok =
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '=' | '^' | '_'));
        if !first_ok || !rest_ok {
            return Err(ValidationError::MalformedSymbol(raw.to_string()));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the symbol names an index (`^` prefix).
    #[must_use]
    pub fn is_index(&self) -> bool {
        self.0.starts_with('^')
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}
