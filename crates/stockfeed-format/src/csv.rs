//! CSV output format.

use std::io::Write;

use ::csv::{Terminator, WriterBuilder};
use stockfeed_types::Table;

use crate::{FormatError, Formatter};

/// CSV formatter.
///
/// Fields holding the delimiter, a quote or a line break are quoted, with
/// embedded quotes doubled. Nulls are written as empty fields.
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    /// Field delimiter (default: comma).
    delimiter: u8,
    /// Whether to include header row.
    include_header: bool,
}

impl CsvFormatter {
    /// Creates a new CSV formatter with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delimiter: b',',
            include_header: true,
        }
    }

    /// Sets the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether to include a header row.
    #[must_use]
    pub const fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Creates a tab-separated values (TSV) formatter.
    #[must_use]
    pub const fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            include_header: true,
        }
    }
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for CsvFormatter {
    fn write_table<W: Write>(&self, table: &Table, writer: W) -> Result<(), FormatError> {
        let mut wtr = WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.include_header)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(writer);

        if self.include_header {
            wtr.write_record(table.column_names())?;
        }
        for row in table.rows() {
            wtr.write_record(row.values().iter().map(ToString::to_string))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn extension(&self) -> &str {
        if self.delimiter == b'\t' { "tsv" } else { "csv" }
    }
}
