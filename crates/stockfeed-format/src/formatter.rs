//! Output format abstraction.

use std::io::Write;

use stockfeed_types::Table;
use thiserror::Error;

use crate::{CsvFormatter, JsonFormatter};

/// Output format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// Comma-separated values.
    #[default]
    Csv,
    /// Tab-separated values.
    Tsv,
    /// JSON array of row objects.
    Json,
    /// Newline-delimited JSON, one row object per line.
    Ndjson,
}

impl OutputFormat {
    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
        }
    }

    /// Returns all available formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Csv, Self::Tsv, Self::Json, Self::Ndjson]
    }

    /// Writes a table with this format's default formatter.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_table<W: Write>(&self, table: &Table, writer: W) -> Result<(), FormatError> {
        match self {
            Self::Csv => CsvFormatter::new().write_table(table, writer),
            Self::Tsv => CsvFormatter::tsv().write_table(table, writer),
            Self::Json => JsonFormatter::new().write_table(table, writer),
            Self::Ndjson => JsonFormatter::ndjson().write_table(table, writer),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" | "tab" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            _ => Err(FormatError::UnknownFormat(s.to_string())),
        }
    }
}

/// Errors that can occur during formatting.
#[derive(Error, Debug)]
pub enum FormatError {
    /// Unknown output format.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// Trait for table formatters.
pub trait Formatter: Send + Sync {
    /// Writes a table to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, table: &Table, writer: W) -> Result<(), FormatError>;

    /// Returns the file extension for this format.
    fn extension(&self) -> &str;

    /// Formats a table into a string.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    fn render(&self, table: &Table) -> Result<String, FormatError> {
        let mut buf = Vec::new();
        self.write_table(table, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
