//! Normalized tabular results.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Calendar date.
    Date,
    /// UTC timestamp.
    DateTime,
    /// 64-bit float.
    Float,
    /// 64-bit signed integer.
    Integer,
    /// UTF-8 string.
    Text,
}

impl ColumnType {
    /// Returns the type name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed scalar cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Absent optional field.
    Null,
    /// Calendar date.
    Date(NaiveDate),
    /// UTC timestamp.
    DateTime(DateTime<Utc>),
    /// Floating point number.
    Float(f64),
    /// Integer number.
    Integer(i64),
    /// String.
    Text(String),
}

impl Value {
    /// Returns the type of a non-null value.
    #[must_use]
    pub const fn column_type(&self) -> Option<ColumnType> {
        match self {
            Self::Null => None,
            Self::Date(_) => Some(ColumnType::Date),
            Self::DateTime(_) => Some(ColumnType::DateTime),
            Self::Float(_) => Some(ColumnType::Float),
            Self::Integer(_) => Some(ColumnType::Integer),
            Self::Text(_) => Some(ColumnType::Text),
        }
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as a float; integers are widened.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the value as an integer.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a date; timestamps are truncated to their UTC date.
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::DateTime(dt) => Some(dt.date_naive()),
            _ => None,
        }
    }

    /// Returns the value as a timestamp; dates map to midnight UTC.
    #[must_use]
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(d.and_time(NaiveTime::MIN).and_utc()),
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Returns the value as a string slice.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the value into plain JSON (dates as ISO 8601 strings).
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Self::DateTime(dt) => {
                serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            }
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Integer(v) => serde_json::Value::from(*v),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            Self::Float(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column data type.
    pub dtype: ColumnType,
}

impl Column {
    /// Creates a new column.
    #[must_use]
    pub fn new(name: impl Into<String>, dtype: ColumnType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }
}

/// Errors raised when assembling or editing a table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A row had a different number of cells than the table has columns.
    #[error("row {row} has {found} cells, expected {expected}")]
    WidthMismatch {
        /// Row index.
        row: usize,
        /// Number of columns.
        expected: usize,
        /// Number of cells in the row.
        found: usize,
    },

    /// A cell's type did not match its column.
    #[error("row {row} column '{column}' holds {found}, expected {expected}")]
    TypeMismatch {
        /// Row index.
        row: usize,
        /// Column name.
        column: String,
        /// Declared column type.
        expected: ColumnType,
        /// Type of the offending value.
        found: ColumnType,
    },

    /// Column name not present in the table.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// Two columns shared a name.
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    /// The time column held a null or non-temporal value.
    #[error("row {0} has no usable time value")]
    MissingTime(usize),

    /// Row index out of bounds.
    #[error("row {0} out of bounds")]
    RowOutOfBounds(usize),

    /// Two tables combined row-wise had different columns.
    #[error("column layouts differ")]
    ColumnMismatch,

    /// A reordering was requested on a table kept in time order.
    #[error("table is ordered by its time column")]
    TimeOrdered,
}

/// How a time column orders a table's rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeIndex {
    /// Ascending, one row per time; the last row supplied for a time wins.
    #[default]
    Unique,
    /// Ascending, rows sharing a time all kept in supply order.
    Sorted,
}

/// Ordered rows of typed cells, optionally indexed by a time column.
///
/// When a time column is set, rows are kept sorted ascending by it; with
/// [`TimeIndex::Unique`] no two rows share a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableRepr")]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
    time_column: Option<usize>,
    time_index: TimeIndex,
}

/// Unchecked serialized form of [`Table`].
#[derive(Deserialize)]
struct TableRepr {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
    time_column: Option<usize>,
    #[serde(default)]
    time_index: TimeIndex,
}

impl TryFrom<TableRepr> for Table {
    type Error = TableError;

    fn try_from(repr: TableRepr) -> Result<Self, Self::Error> {
        let time_column = repr
            .time_column
            .map(|idx| {
                repr.columns
                    .get(idx)
                    .map(|c| c.name.clone())
                    .ok_or_else(|| TableError::UnknownColumn(format!("#{idx}")))
            })
            .transpose()?;
        Self::with_time_index(
            repr.columns,
            repr.rows,
            time_column.as_deref(),
            repr.time_index,
        )
    }
}

impl Table {
    /// Assembles a table, checking row widths and cell types.
    ///
    /// If `time_column` names a column, rows are sorted ascending by it and
    /// rows sharing a time are collapsed to the last one supplied.
    ///
    /// # Errors
    ///
    /// Returns an error if a row has the wrong width, a cell has the wrong
    /// type, a column name repeats, or a time cell is not temporal.
    pub fn new(
        columns: Vec<Column>,
        rows: Vec<Vec<Value>>,
        time_column: Option<&str>,
    ) -> Result<Self, TableError> {
        Self::with_time_index(columns, rows, time_column, TimeIndex::Unique)
    }

    /// Assembles a table like [`Table::new`], choosing whether rows sharing
    /// a time are collapsed or all kept.
    ///
    /// # Errors
    ///
    /// See [`Table::new`].
    pub fn with_time_index(
        columns: Vec<Column>,
        rows: Vec<Vec<Value>>,
        time_column: Option<&str>,
        time_index: TimeIndex,
    ) -> Result<Self, TableError> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
        }

        let time_column = time_column
            .map(|name| {
                columns
                    .iter()
                    .position(|c| c.name == name)
                    .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
            })
            .transpose()?;

        for (row_idx, row) in rows.iter().enumerate() {
            check_row(&columns, row_idx, row)?;
        }

        let mut table = Self {
            columns,
            rows,
            time_column,
            time_index,
        };
        table.index_by_time()?;
        Ok(table)
    }

    /// Creates an empty table with the given columns and no time index.
    #[must_use]
    pub const fn empty(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            time_column: None,
            time_index: TimeIndex::Unique,
        }
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the columns in order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Returns the position of a column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Returns the time index column, if any.
    #[must_use]
    pub fn time_column(&self) -> Option<&Column> {
        self.time_column.map(|i| &self.columns[i])
    }

    /// Returns how the time column orders rows.
    #[must_use]
    pub const fn time_index(&self) -> TimeIndex {
        self.time_index
    }

    /// Returns a view of one row.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// Iterates over rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// Iterates over one column's cells, or returns None for an unknown column.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Returns the time index values in order.
    #[must_use]
    pub fn times(&self) -> Vec<DateTime<Utc>> {
        self.time_column.map_or_else(Vec::new, |idx| {
            self.rows
                .iter()
                .filter_map(|r| r[idx].as_datetime())
                .collect()
        })
    }

    /// Overwrites one cell.
    ///
    /// Changing a time cell re-sorts the table. On error the table is left
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown column, an out-of-bounds row, a value
    /// whose type does not match the column, or a null time value.
    pub fn set(&mut self, row: usize, column: &str, value: Value) -> Result<(), TableError> {
        let col = self
            .column_index(column)
            .ok_or_else(|| TableError::UnknownColumn(column.to_string()))?;
        if row >= self.rows.len() {
            return Err(TableError::RowOutOfBounds(row));
        }
        check_cell(&self.columns[col], row, &value)?;
        if self.time_column == Some(col) && value.as_datetime().is_none() {
            return Err(TableError::MissingTime(row));
        }
        self.rows[row][col] = value;
        if self.time_column == Some(col) {
            self.index_by_time()?;
        }
        Ok(())
    }

    /// Keeps the first `n` rows.
    pub fn truncate(&mut self, n: usize) {
        self.rows.truncate(n);
    }

    /// Keeps the last `n` rows.
    pub fn keep_last(&mut self, n: usize) {
        let len = self.rows.len();
        if n < len {
            self.rows.drain(..len - n);
        }
    }

    /// Keeps the rows matching a predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&Row<'_>) -> bool) {
        let columns = &self.columns;
        self.rows.retain(|values| keep(&Row { columns, values }));
    }

    /// Appends another table's rows, re-sorting by time if indexed.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ColumnMismatch`] if the column layouts, time
    /// columns or time index modes differ; the table is left unchanged.
    pub fn append(&mut self, other: Self) -> Result<(), TableError> {
        if self.columns != other.columns
            || self.time_column != other.time_column
            || self.time_index != other.time_index
        {
            return Err(TableError::ColumnMismatch);
        }
        self.rows.extend(other.rows);
        self.index_by_time()
    }

    /// Reorders rows with a stable sort.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::TimeOrdered`] for a table with a time index,
    /// whose order is fixed.
    pub fn sort_by(
        &mut self,
        mut compare: impl FnMut(&Row<'_>, &Row<'_>) -> std::cmp::Ordering,
    ) -> Result<(), TableError> {
        if self.time_column.is_some() {
            return Err(TableError::TimeOrdered);
        }
        let columns = &self.columns;
        self.rows.sort_by(|a, b| {
            compare(
                &Row { columns, values: a },
                &Row { columns, values: b },
            )
        });
        Ok(())
    }

    /// Sorts by the time column; under [`TimeIndex::Unique`] rows sharing a
    /// time collapse to the last one supplied.
    ///
    /// Every time cell is checked before rows move, so an error leaves the
    /// rows untouched.
    fn index_by_time(&mut self) -> Result<(), TableError> {
        let Some(idx) = self.time_column else {
            return Ok(());
        };

        let keys = self
            .rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| row[idx].as_datetime().ok_or(TableError::MissingTime(row_idx)))
            .collect::<Result<Vec<_>, _>>()?;
        let mut keyed: Vec<_> = keys.into_iter().zip(std::mem::take(&mut self.rows)).collect();

        // Stable sort keeps supply order within equal times.
        keyed.sort_by_key(|(key, _)| *key);

        if self.time_index == TimeIndex::Sorted {
            self.rows = keyed.into_iter().map(|(_, row)| row).collect();
            return Ok(());
        }

        let mut rows: Vec<Vec<Value>> = Vec::with_capacity(keyed.len());
        let mut last_key = None;
        for (key, row) in keyed {
            if last_key == Some(key) {
                if let Some(prev) = rows.last_mut() {
                    *prev = row;
                }
            } else {
                rows.push(row);
                last_key = Some(key);
            }
        }
        self.rows = rows;
        Ok(())
    }
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [Column],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    /// Returns the cell for a column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .map(|i| &self.values[i])
    }

    /// Returns the cells in column order.
    #[must_use]
    pub const fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Iterates over `(column name, cell)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .zip(self.values.iter())
    }
}

fn check_row(columns: &[Column], row_idx: usize, row: &[Value]) -> Result<(), TableError> {
    if row.len() != columns.len() {
        return Err(TableError::WidthMismatch {
            row: row_idx,
            expected: columns.len(),
            found: row.len(),
        });
    }
    columns
        .iter()
        .zip(row)
        .try_for_each(|(column, value)| check_cell(column, row_idx, value))
}

fn check_cell(column: &Column, row: usize, value: &Value) -> Result<(), TableError> {
    match value.column_type() {
        Some(found) if found != column.dtype => Err(TableError::TypeMismatch {
            row,
            column: column.name.clone(),
            expected: column.dtype,
            found,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn price_columns() -> Vec<Column> {
        vec![
            Column::new("time", ColumnType::Date),
            Column::new("close", ColumnType::Float),
        ]
    }

    #[test]
    fn test_table_sorts_by_time() {
        let table = Table::new(
            price_columns(),
            vec![
                vec![date(2022, 1, 5), Value::Float(3.0)],
                vec![date(2022, 1, 3), Value::Float(1.0)],
                vec![date(2022, 1, 4), Value::Float(2.0)],
            ],
            Some("time"),
        )
        .unwrap();

        let closes: Vec<_> = table
            .column("close")
            .unwrap()
            .filter_map(Value::as_f64)
            .collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
        assert_eq!(table.time_column().unwrap().name, "time");
    }

    #[test]
    fn test_duplicate_times_keep_last() {
        let table = Table::new(
            price_columns(),
            vec![
                vec![date(2022, 1, 3), Value::Float(1.0)],
                vec![date(2022, 1, 3), Value::Float(1.5)],
                vec![date(2022, 1, 4), Value::Float(2.0)],
            ],
            Some("time"),
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.row(0).unwrap().get("close"), Some(&Value::Float(1.5)));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let result = Table::new(
            price_columns(),
            vec![vec![date(2022, 1, 3), Value::Text("x".into())]],
            None,
        );
        assert!(matches!(result, Err(TableError::TypeMismatch { .. })));
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let result = Table::new(price_columns(), vec![vec![date(2022, 1, 3)]], None);
        assert!(matches!(
            result,
            Err(TableError::WidthMismatch {
                row: 0,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_null_time_rejected() {
        let result = Table::new(
            price_columns(),
            vec![vec![Value::Null, Value::Float(1.0)]],
            Some("time"),
        );
        assert_eq!(result.unwrap_err(), TableError::MissingTime(0));
    }

    #[test]
    fn test_set_and_clone_are_independent() {
        let original = Table::new(
            price_columns(),
            vec![vec![date(2022, 1, 3), Value::Float(1.0)]],
            Some("time"),
        )
        .unwrap();

        let mut copy = original.clone();
        copy.set(0, "close", Value::Float(9.0)).unwrap();

        assert_eq!(original.row(0).unwrap().get("close"), Some(&Value::Float(1.0)));
        assert_eq!(copy.row(0).unwrap().get("close"), Some(&Value::Float(9.0)));
        assert!(copy.set(0, "close", Value::Integer(1)).is_err());
        assert!(copy.set(3, "close", Value::Float(1.0)).is_err());
    }

    #[test]
    fn test_sorted_index_keeps_shared_times() {
        let table = Table::with_time_index(
            price_columns(),
            vec![
                vec![date(2022, 1, 4), Value::Float(3.0)],
                vec![date(2022, 1, 3), Value::Float(1.0)],
                vec![date(2022, 1, 4), Value::Float(4.0)],
                vec![date(2022, 1, 3), Value::Float(2.0)],
            ],
            Some("time"),
            TimeIndex::Sorted,
        )
        .unwrap();

        let closes: Vec<_> = table
            .column("close")
            .unwrap()
            .filter_map(Value::as_f64)
            .collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(table.time_index(), TimeIndex::Sorted);
    }

    #[test]
    fn test_failed_time_edit_leaves_table_unchanged() {
        let mut table = Table::new(
            price_columns(),
            vec![
                vec![date(2022, 1, 3), Value::Float(1.0)],
                vec![date(2022, 1, 4), Value::Float(2.0)],
            ],
            Some("time"),
        )
        .unwrap();
        let before = table.clone();

        assert_eq!(table.set(0, "time", Value::Null), Err(TableError::MissingTime(0)));
        assert_eq!(table, before);
        assert_eq!(table.len(), 2);

        table.set(0, "time", date(2022, 1, 9)).unwrap();
        assert_eq!(table.row(1).unwrap().get("close"), Some(&Value::Float(1.0)));
    }

    #[test]
    fn test_append_and_sort_by() {
        let columns = vec![
            Column::new("contract", ColumnType::Text),
            Column::new("volume", ColumnType::Integer),
        ];
        let mut table = Table::new(
            columns.clone(),
            vec![vec![Value::Text("A".into()), Value::Integer(5)]],
            None,
        )
        .unwrap();
        let other = Table::new(
            columns,
            vec![vec![Value::Text("B".into()), Value::Integer(9)]],
            None,
        )
        .unwrap();

        table.append(other).unwrap();
        table
            .sort_by(|a, b| {
                let key = |row: &Row<'_>| row.get("volume").and_then(Value::as_i64);
                key(b).cmp(&key(a))
            })
            .unwrap();
        assert_eq!(table.row(0).unwrap().get("contract").unwrap().as_str(), Some("B"));

        let mismatched = Table::empty(price_columns());
        assert_eq!(table.append(mismatched), Err(TableError::ColumnMismatch));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_time_indexed_table_cannot_be_reordered() {
        let mut table = Table::new(
            price_columns(),
            vec![vec![date(2022, 1, 3), Value::Float(1.0)]],
            Some("time"),
        )
        .unwrap();
        assert_eq!(
            table.sort_by(|_, _| std::cmp::Ordering::Equal),
            Err(TableError::TimeOrdered)
        );
    }

    #[test]
    fn test_keep_last() {
        let mut table = Table::new(
            price_columns(),
            (1..=5)
                .map(|d| vec![date(2022, 1, d), Value::Float(f64::from(d))])
                .collect(),
            Some("time"),
        )
        .unwrap();

        table.keep_last(2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.row(0).unwrap().get("close"), Some(&Value::Float(4.0)));
    }

    #[test]
    fn test_value_json() {
        assert_eq!(date(2022, 1, 3).to_json(), serde_json::json!("2022-01-03"));
        assert_eq!(Value::Integer(1000).to_json(), serde_json::json!(1000));
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_table_serde_round_trip_preserves_types() {
        let table = Table::new(
            price_columns(),
            vec![vec![date(2022, 1, 3), Value::Float(10.5)]],
            Some("time"),
        )
        .unwrap();
        let json = serde_json::to_string(&table).unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);

        let sorted = Table::with_time_index(
            price_columns(),
            vec![
                vec![date(2022, 1, 3), Value::Float(1.0)],
                vec![date(2022, 1, 3), Value::Float(2.0)],
            ],
            Some("time"),
            TimeIndex::Sorted,
        )
        .unwrap();
        let json = serde_json::to_string(&sorted).unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back, sorted);
    }

    #[test]
    fn test_deserialize_rejects_inconsistent_table() {
        let json = r#"{
            "columns": [{"name": "time", "dtype": "date"}],
            "rows": [[{"type": "date", "value": "2022-01-03"}, {"type": "null"}]],
            "time_column": 0
        }"#;
        assert!(serde_json::from_str::<Table>(json).is_err());

        let json = r#"{"columns": [], "rows": [], "time_column": 3}"#;
        assert!(serde_json::from_str::<Table>(json).is_err());
    }
}
