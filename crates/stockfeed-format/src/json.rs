//! JSON output format.

use std::io::Write;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use stockfeed_types::{Row, Table};

use crate::{FormatError, Formatter};

/// JSON output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// JSON array (standard JSON).
    #[default]
    Array,
    /// Newline-delimited JSON (NDJSON/JSONL).
    Ndjson,
}

/// JSON formatter.
///
/// Each row becomes an object keyed by column name, in column order. Dates
/// are `YYYY-MM-DD` strings, timestamps RFC 3339 in UTC, and nulls `null`.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    /// Output style.
    style: JsonStyle,
    /// Whether to pretty-print (only for array style).
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter with default settings (array style).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            style: JsonStyle::Array,
            pretty: false,
        }
    }

    /// Creates a new NDJSON formatter.
    #[must_use]
    pub const fn ndjson() -> Self {
        Self {
            style: JsonStyle::Ndjson,
            pretty: false,
        }
    }

    /// Sets whether to pretty-print output (array style only).
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Sets the output style.
    #[must_use]
    pub const fn with_style(mut self, style: JsonStyle) -> Self {
        self.style = style;
        self
    }
}

struct RowObject<'a>(Row<'a>);

impl Serialize for RowObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.values().len()))?;
        for (name, value) in self.0.iter() {
            map.serialize_entry(name, &value.to_json())?;
        }
        map.end()
    }
}

struct RowArray<'a>(&'a Table);

impl Serialize for RowArray<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for row in self.0.rows() {
            seq.serialize_element(&RowObject(row))?;
        }
        seq.end()
    }
}

impl Formatter for JsonFormatter {
    fn write_table<W: Write>(&self, table: &Table, mut writer: W) -> Result<(), FormatError> {
        match self.style {
            JsonStyle::Array => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut writer, &RowArray(table))?;
                } else {
                    serde_json::to_writer(&mut writer, &RowArray(table))?;
                }
                writeln!(writer)?;
            }
            JsonStyle::Ndjson => {
                for row in table.rows() {
                    serde_json::to_writer(&mut writer, &RowObject(row))?;
                    writeln!(writer)?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn extension(&self) -> &str {
        match self.style {
            JsonStyle::Array => "json",
            JsonStyle::Ndjson => "ndjson",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stockfeed_types::{Column, ColumnType, Value};

    fn profile() -> Table {
        Table::new(
            vec![
                Column::new("symbol", ColumnType::Text),
                Column::new("listed", ColumnType::Date),
                Column::new("employees", ColumnType::Integer),
                Column::new("beta", ColumnType::Float),
            ],
            vec![
                vec![
                    Value::Text("VNM".into()),
                    Value::Date(NaiveDate::from_ymd_opt(2006, 1, 19).unwrap()),
                    Value::Integer(9000),
                    Value::Null,
                ],
                vec![
                    Value::Text("FPT".into()),
                    Value::Null,
                    Value::Integer(48000),
                    Value::Float(1.25),
                ],
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_json_array_keeps_column_order() {
        let result = JsonFormatter::new().render(&profile()).unwrap();
        assert_eq!(
            result,
            "[{\"symbol\":\"VNM\",\"listed\":\"2006-01-19\",\"employees\":9000,\"beta\":null},\
             {\"symbol\":\"FPT\",\"listed\":null,\"employees\":48000,\"beta\":1.25}]\n"
        );
    }

    #[test]
    fn test_json_pretty_parses_back() {
        let result = JsonFormatter::new()
            .with_pretty(true)
            .render(&profile())
            .unwrap();
        assert!(result.contains("\n  {"));
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed[1]["employees"], 48000);
    }

    #[test]
    fn test_ndjson() {
        let formatter = JsonFormatter::ndjson();
        let result = formatter.render(&profile()).unwrap();
        let lines: Vec<_> = result.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("{\"symbol\":\"VNM\""));
        assert_eq!(formatter.extension(), "ndjson");
    }

    #[test]
    fn test_empty_table() {
        let table = Table::empty(vec![Column::new("symbol", ColumnType::Text)]);
        assert_eq!(JsonFormatter::new().render(&table).unwrap(), "[]\n");
        assert_eq!(JsonFormatter::ndjson().render(&table).unwrap(), "");
    }
}
