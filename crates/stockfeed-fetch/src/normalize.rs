//! Payload normalization into typed, time-indexed tables.
//!
//! A [`Schema`] says where the rows live in the payload, which field is the
//! time index, and how each known field is typed. Unknown fields are either
//! dropped or kept with an inferred type.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map, Value as Json};
use stockfeed_types::{Column, ColumnType, DataKind, FeedError, Result, Table, TimeIndex, Value};

/// Envelope key used by every upstream endpoint.
pub const DEFAULT_ENVELOPE: &str = "data";

/// Where the time index comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSpec {
    /// Rows have no time index and keep upstream order.
    None,
    /// A single date or timestamp field.
    Field {
        /// Output column name.
        name: &'static str,
        /// Upstream field names, tried in order.
        aliases: &'static [&'static str],
        /// Either [`ColumnType::Date`] or [`ColumnType::DateTime`].
        dtype: ColumnType,
    },
    /// A fiscal year plus optional quarter, mapped to the period-end date.
    ///
    /// A missing, zero or out-of-range quarter means the whole year.
    YearQuarter {
        /// Output column name.
        name: &'static str,
        /// Upstream year field names.
        year: &'static [&'static str],
        /// Upstream quarter field names.
        quarter: &'static [&'static str],
    },
}

impl TimeSpec {
    fn output(&self) -> Option<(&'static str, ColumnType)> {
        match self {
            Self::None => None,
            Self::Field { name, dtype, .. } => Some((*name, *dtype)),
            Self::YearQuarter { name, .. } => Some((*name, ColumnType::Date)),
        }
    }

    fn source_fields(&self) -> Vec<&'static str> {
        match self {
            Self::None => Vec::new(),
            Self::Field { name, aliases, .. } => {
                std::iter::once(*name).chain(aliases.iter().copied()).collect()
            }
            Self::YearQuarter { year, quarter, .. } => {
                year.iter().chain(quarter.iter()).copied().collect()
            }
        }
    }
}

/// A typed output column and the upstream fields that feed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Output column name; also matched as an upstream field.
    pub name: &'static str,
    /// Alternative upstream field names, tried after `name`.
    pub aliases: &'static [&'static str],
    /// Output type.
    pub dtype: ColumnType,
    /// Rows without a value for this column are rejected.
    pub required: bool,
}

impl ColumnSpec {
    /// A column every row must carry.
    #[must_use]
    pub const fn required(name: &'static str, dtype: ColumnType) -> Self {
        Self {
            name,
            aliases: &[],
            dtype,
            required: true,
        }
    }

    /// A column that may be absent or null.
    #[must_use]
    pub const fn optional(name: &'static str, dtype: ColumnType) -> Self {
        Self {
            name,
            aliases: &[],
            dtype,
            required: false,
        }
    }

    /// Sets the alternative upstream field names.
    #[must_use]
    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    fn source_fields(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

/// Shape and typing rules for one data kind's payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    kind: DataKind,
    envelope: &'static str,
    time: TimeSpec,
    time_index: TimeIndex,
    columns: Vec<ColumnSpec>,
    keep_extra: bool,
    scalar_field: Option<&'static str>,
}

impl Schema {
    /// Creates a schema with the default envelope, no time index, no columns
    /// and unknown fields dropped.
    #[must_use]
    pub const fn new(kind: DataKind) -> Self {
        Self {
            kind,
            envelope: DEFAULT_ENVELOPE,
            time: TimeSpec::None,
            time_index: TimeIndex::Unique,
            columns: Vec::new(),
            keep_extra: false,
            scalar_field: None,
        }
    }

    /// Sets the key that holds the rows in an object payload.
    #[must_use]
    pub const fn envelope(mut self, key: &'static str) -> Self {
        self.envelope = key;
        self
    }

    /// Sets the time index.
    #[must_use]
    pub fn time(mut self, time: TimeSpec) -> Self {
        self.time = time;
        self
    }

    /// Sets whether rows sharing a time collapse to one or are all kept.
    #[must_use]
    pub const fn time_index(mut self, time_index: TimeIndex) -> Self {
        self.time_index = time_index;
        self
    }

    /// Appends a typed column.
    #[must_use]
    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    /// Keeps fields not named by the schema, inferring their types.
    #[must_use]
    pub const fn keep_extra(mut self, keep: bool) -> Self {
        self.keep_extra = keep;
        self
    }

    /// Accepts rows given as bare values, reading each as `{field: value}`.
    #[must_use]
    pub const fn scalar_rows(mut self, field: &'static str) -> Self {
        self.scalar_field = Some(field);
        self
    }

    /// Returns the data kind the schema describes.
    #[must_use]
    pub const fn kind(&self) -> DataKind {
        self.kind
    }

    /// Parses and normalizes a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Schema::normalize`]; a body that is not JSON is
    /// [`FeedError::MalformedPayload`].
    pub fn normalize_bytes(&self, body: &[u8], subject: &str) -> Result<Table> {
        let payload: Json = serde_json::from_slice(body)
            .map_err(|e| FeedError::MalformedPayload(format!("body is not JSON: {e}")))?;
        self.normalize(&payload, subject)
    }

    /// Normalizes a JSON payload into a table.
    ///
    /// The payload may be the row list itself, an object whose envelope key
    /// holds a row list, or an object whose envelope key holds one row.
    /// Rows come back sorted by time. Under [`TimeIndex::Unique`] there is
    /// one row per time value (the last one supplied wins); under
    /// [`TimeIndex::Sorted`] every row is kept.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::EmptyResult`] when there are no rows and
    /// [`FeedError::MalformedPayload`] when the payload or a row does not
    /// fit the schema.
    pub fn normalize(&self, payload: &Json, subject: &str) -> Result<Table> {
        let rows = self.extract_rows(payload)?;
        if rows.is_empty() {
            return Err(FeedError::EmptyResult {
                kind: self.kind,
                subject: subject.to_string(),
            });
        }

        let extras = if self.keep_extra {
            self.infer_extras(&rows)
        } else {
            Vec::new()
        };

        let mut columns = Vec::with_capacity(1 + self.columns.len() + extras.len());
        if let Some((name, dtype)) = self.time.output() {
            columns.push(Column::new(name, dtype));
        }
        columns.extend(self.columns.iter().map(|c| Column::new(c.name, c.dtype)));
        columns.extend(extras.iter().map(|(key, dtype)| Column::new(key.clone(), *dtype)));

        let mut out = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let mut values = Vec::with_capacity(columns.len());
            if let Some(time) = self.time_value(row, idx)? {
                values.push(time);
            }
            for spec in &self.columns {
                values.push(column_value(row, idx, spec)?);
            }
            for (key, dtype) in &extras {
                let value = row
                    .get(key)
                    .map_or(Ok(Value::Null), |json| coerce(json, *dtype))
                    .map_err(|reason| malformed(idx, key, &reason))?;
                values.push(value);
            }
            out.push(values);
        }

        let time_column = self.time.output().map(|(name, _)| name);
        Ok(Table::with_time_index(
            columns,
            out,
            time_column,
            self.time_index,
        )?)
    }

    fn extract_rows<'a>(&self, payload: &'a Json) -> Result<Vec<Cow<'a, Map<String, Json>>>> {
        let items: Vec<&Json> = match payload {
            Json::Array(items) => items.iter().collect(),
            Json::Object(object) => match object.get(self.envelope) {
                Some(Json::Array(items)) => items.iter().collect(),
                Some(single @ Json::Object(_)) => vec![single],
                Some(Json::Null) => Vec::new(),
                Some(other) => {
                    return Err(FeedError::MalformedPayload(format!(
                        "'{}' holds {}, expected a list or an object",
                        self.envelope,
                        json_type(other)
                    )));
                }
                None => {
                    return Err(FeedError::MalformedPayload(format!(
                        "payload has no '{}' key",
                        self.envelope
                    )));
                }
            },
            other => {
                return Err(FeedError::MalformedPayload(format!(
                    "payload is {}, expected a list or an object",
                    json_type(other)
                )));
            }
        };

        items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match (item, self.scalar_field) {
                (Json::Object(row), _) => Ok(Cow::Borrowed(row)),
                (Json::Array(_), _) | (_, None) => {
                    Err(FeedError::MalformedPayload(format!(
                        "row {idx} is {}, expected an object",
                        json_type(item)
                    )))
                }
                (scalar, Some(field)) => {
                    let mut row = Map::new();
                    row.insert(field.to_string(), scalar.clone());
                    Ok(Cow::Owned(row))
                }
            })
            .collect()
    }

    fn time_value(&self, row: &Map<String, Json>, idx: usize) -> Result<Option<Value>> {
        match &self.time {
            TimeSpec::None => Ok(None),
            TimeSpec::Field {
                name,
                aliases,
                dtype,
            } => {
                let spec = ColumnSpec::required(*name, *dtype).aliases(*aliases);
                column_value(row, idx, &spec).map(Some)
            }
            TimeSpec::YearQuarter {
                name,
                year,
                quarter,
            } => {
                let year_spec = ColumnSpec::required("year", ColumnType::Integer).aliases(*year);
                let quarter_spec =
                    ColumnSpec::optional("quarter", ColumnType::Integer).aliases(*quarter);

                let year = column_value(row, idx, &year_spec)?
                    .as_i64()
                    .and_then(|y| i32::try_from(y).ok())
                    .ok_or_else(|| malformed(idx, name, "year out of range"))?;
                let quarter = column_value(row, idx, &quarter_spec)?.as_i64();
                period_end(year, quarter)
                    .map(|date| Some(Value::Date(date)))
                    .ok_or_else(|| malformed(idx, name, &format!("invalid year {year}")))
            }
        }
    }

    /// Types for fields the schema does not name, in first-seen order.
    fn infer_extras(&self, rows: &[Cow<'_, Map<String, Json>>]) -> Vec<(String, ColumnType)> {
        let known: Vec<&str> = self
            .time
            .source_fields()
            .into_iter()
            .chain(self.columns.iter().flat_map(ColumnSpec::source_fields))
            .chain(self.time.output().map(|(name, _)| name))
            .collect();

        let mut keys: Vec<String> = Vec::new();
        for row in rows {
            for key in row.keys() {
                if !known.contains(&key.as_str()) && !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }

        keys.into_iter()
            .map(|key| {
                let dtype = infer_type(rows.iter().filter_map(|row| row.get(&key)));
                (key, dtype)
            })
            .collect()
    }
}

fn malformed(row: usize, field: &str, reason: &str) -> FeedError {
    FeedError::MalformedPayload(format!("row {row} field '{field}': {reason}"))
}

/// Returns the first present upstream field for a column, null included.
fn lookup<'a>(row: &'a Map<String, Json>, spec: &ColumnSpec) -> Option<&'a Json> {
    spec.source_fields().find_map(|field| row.get(field))
}

fn column_value(row: &Map<String, Json>, idx: usize, spec: &ColumnSpec) -> Result<Value> {
    let value = match lookup(row, spec) {
        Some(json) => {
            coerce(json, spec.dtype).map_err(|reason| malformed(idx, spec.name, &reason))?
        }
        None => Value::Null,
    };
    if spec.required && value.is_null() {
        return Err(malformed(idx, spec.name, "required value is missing"));
    }
    Ok(value)
}

/// Converts one JSON field to a cell of the given type.
///
/// Null and blank strings become [`Value::Null`].
fn coerce(json: &Json, dtype: ColumnType) -> std::result::Result<Value, String> {
    if is_blank(json) {
        return Ok(Value::Null);
    }
    match dtype {
        ColumnType::Float => as_float(json)
            .map(Value::Float)
            .ok_or_else(|| format!("expected a number, got {json}")),
        ColumnType::Integer => as_integer(json)
            .map(Value::Integer)
            .ok_or_else(|| format!("expected an integer, got {json}")),
        ColumnType::Text => Ok(Value::Text(match json {
            Json::String(s) => s.clone(),
            other => other.to_string(),
        })),
        ColumnType::Date => as_timestamp(json)
            .map(|(ts, _)| Value::Date(ts.date_naive()))
            .ok_or_else(|| format!("expected a date, got {json}")),
        ColumnType::DateTime => as_timestamp(json)
            .map(|(ts, _)| Value::DateTime(ts))
            .ok_or_else(|| format!("expected a timestamp, got {json}")),
    }
}

fn is_blank(json: &Json) -> bool {
    match json {
        Json::Null => true,
        Json::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Reads a finite float; `NaN` and infinities are rejected.
fn as_float(json: &Json) -> Option<f64> {
    let value = match json {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn as_integer(json: &Json) -> Option<i64> {
    match json {
        Json::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
        Json::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn whole_number(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64)
        .then_some(value as i64)
}

/// Parses a timestamp, returning whether it carried a time of day.
///
/// Accepts `YYYY-MM-DD`, RFC 3339, `YYYY-MM-DD HH:MM:SS`, and Unix seconds as
/// a number or a digit string.
fn as_timestamp(json: &Json) -> Option<(DateTime<Utc>, bool)> {
    match json {
        Json::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|ts| (ts, true)),
        Json::String(s) => parse_timestamp(s.trim()),
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<(DateTime<Utc>, bool)> {
    if let Ok(date) = NaiveDate::parse_from_str(s, stockfeed_types::DATE_FORMAT) {
        return Some((date.and_time(NaiveTime::MIN).and_utc(), false));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some((ts.with_timezone(&Utc), true));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some((naive.and_utc(), true));
        }
    }
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|ts| (ts, true));
    }
    None
}

/// Picks the narrowest type every non-blank value converts to.
///
/// Numbers and numeric strings become integers or floats; strings that all
/// parse as dates or timestamps become dates or timestamps; anything else is
/// text. Bare numbers are never read as timestamps here.
fn infer_type<'a>(values: impl Iterator<Item = &'a Json>) -> ColumnType {
    let mut all_integer = true;
    let mut all_numeric = true;
    let mut all_date = true;
    let mut all_timestamp = true;
    let mut seen = false;

    for json in values.filter(|json| !is_blank(json)) {
        seen = true;
        let numeric = match json {
            Json::Number(_) => true,
            Json::String(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
            _ => false,
        };
        all_numeric &= numeric;
        all_integer &= numeric && as_integer(json).is_some();

        let temporal = match json {
            Json::String(s) => parse_timestamp(s.trim()).filter(|_| !numeric),
            _ => None,
        };
        all_timestamp &= temporal.is_some();
        all_date &= temporal.is_some_and(|(_, has_time)| !has_time);
    }

    if !seen {
        ColumnType::Text
    } else if all_integer {
        ColumnType::Integer
    } else if all_numeric {
        ColumnType::Float
    } else if all_date {
        ColumnType::Date
    } else if all_timestamp {
        ColumnType::DateTime
    } else {
        ColumnType::Text
    }
}

/// Last day of a fiscal quarter, or of the year when `quarter` is not 1-4.
fn period_end(year: i32, quarter: Option<i64>) -> Option<NaiveDate> {
    let (month, day) = match quarter {
        Some(1) => (3, 31),
        Some(2) => (6, 30),
        Some(3) => (9, 30),
        _ => (12, 31),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn json_type(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "a list",
        Json::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn price_schema() -> Schema {
        Schema::new(DataKind::PriceHistory)
            .time(TimeSpec::Field {
                name: "time",
                aliases: &["tradingDate"],
                dtype: ColumnType::Date,
            })
            .column(ColumnSpec::optional("open", ColumnType::Float))
            .column(ColumnSpec::required("close", ColumnType::Float))
            .column(ColumnSpec::optional("volume", ColumnType::Integer))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let payload =
            json!([{"time": "2022-01-03", "open": "10.0", "close": "10.5", "volume": "1000"}]);
        let table = price_schema().normalize(&payload, "VNM").unwrap();

        assert_eq!(table.len(), 1);
        let row = table.row(0).unwrap();
        assert_eq!(row.get("time").unwrap().as_date(), Some(date(2022, 1, 3)));
        assert_relative_eq!(row.get("open").unwrap().as_f64().unwrap(), 10.0);
        assert_relative_eq!(row.get("close").unwrap().as_f64().unwrap(), 10.5);
        assert_eq!(row.get("volume").unwrap().as_i64(), Some(1000));
    }

    #[test]
    fn test_empty_data_is_empty_result() {
        let err = price_schema()
            .normalize(&json!({"data": []}), "VNM")
            .unwrap_err();
        assert!(matches!(
            err,
            FeedError::EmptyResult {
                kind: DataKind::PriceHistory,
                ref subject
            } if subject == "VNM"
        ));

        let err = price_schema()
            .normalize(&json!({"data": null}), "VNM")
            .unwrap_err();
        assert!(matches!(err, FeedError::EmptyResult { .. }));
    }

    #[test]
    fn test_rows_are_sorted_and_deduplicated() {
        let payload = json!({"data": [
            {"tradingDate": "2022-01-05", "close": 3},
            {"tradingDate": "2022-01-03", "close": 1},
            {"tradingDate": "2022-01-05", "close": 3.5},
            {"tradingDate": "2022-01-04", "close": 2},
        ]});
        let table = price_schema().normalize(&payload, "VNM").unwrap();

        let times: Vec<_> = table
            .column("time")
            .unwrap()
            .filter_map(Value::as_date)
            .collect();
        assert_eq!(times, vec![date(2022, 1, 3), date(2022, 1, 4), date(2022, 1, 5)]);
        assert_eq!(table.row(2).unwrap().get("close"), Some(&Value::Float(3.5)));
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let payload = json!([
            {"time": "2022-01-03", "close": 1.0},
            {"time": "2022-01-04", "open": 1.0},
        ]);
        let err = price_schema().normalize(&payload, "VNM").unwrap_err();
        let FeedError::MalformedPayload(message) = err else {
            panic!("expected MalformedPayload, got {err:?}");
        };
        assert!(message.contains("row 1"));
        assert!(message.contains("close"));
    }

    #[test]
    fn test_null_required_field_is_malformed() {
        let payload = json!([{"time": "2022-01-03", "close": null}]);
        assert!(matches!(
            price_schema().normalize(&payload, "VNM"),
            Err(FeedError::MalformedPayload(_))
        ));

        let payload = json!([{"time": "", "close": 1.0}]);
        assert!(matches!(
            price_schema().normalize(&payload, "VNM"),
            Err(FeedError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_blank_optional_fields_become_null() {
        let payload = json!([{"time": "2022-01-03", "open": "", "close": 1.0, "volume": null}]);
        let table = price_schema().normalize(&payload, "VNM").unwrap();
        let row = table.row(0).unwrap();
        assert!(row.get("open").unwrap().is_null());
        assert!(row.get("volume").unwrap().is_null());
    }

    #[test]
    fn test_unparseable_values_are_malformed() {
        for payload in [
            json!([{"time": "2022-01-03", "close": "ten"}]),
            json!([{"time": "03/01/2022", "close": 1.0}]),
            json!([{"time": "2022-01-03", "close": 1.0, "volume": 10.5}]),
        ] {
            assert!(
                matches!(
                    price_schema().normalize(&payload, "VNM"),
                    Err(FeedError::MalformedPayload(_))
                ),
                "{payload}"
            );
        }
    }

    #[test]
    fn test_payload_shapes() {
        let schema = price_schema();
        assert!(
            schema
                .normalize(&json!({"data": {"time": "2022-01-03", "close": 1}}), "VNM")
                .is_ok()
        );
        assert!(matches!(
            schema.normalize(&json!({"rows": []}), "VNM"),
            Err(FeedError::MalformedPayload(_))
        ));
        assert!(matches!(
            schema.normalize(&json!({"data": "nope"}), "VNM"),
            Err(FeedError::MalformedPayload(_))
        ));
        assert!(matches!(
            schema.normalize(&json!([1, 2]), "VNM"),
            Err(FeedError::MalformedPayload(_))
        ));
        assert!(matches!(
            schema.normalize(&json!(42), "VNM"),
            Err(FeedError::MalformedPayload(_))
        ));
        assert!(matches!(
            schema.normalize_bytes(b"<html>", "VNM"),
            Err(FeedError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_non_finite_numbers_are_malformed() {
        for close in ["NaN", "inf", "-Infinity"] {
            let payload = json!([{"time": "2022-01-03", "close": close}]);
            assert!(
                matches!(
                    price_schema().normalize(&payload, "VNM"),
                    Err(FeedError::MalformedPayload(_))
                ),
                "{close}"
            );
        }

        let schema = Schema::new(DataKind::MarketData)
            .column(ColumnSpec::required("symbol", ColumnType::Text))
            .keep_extra(true);
        let payload = json!([{"symbol": "VNM", "ratio": "NaN"}]);
        let table = schema.normalize(&payload, "VNM").unwrap();
        assert_eq!(table.columns()[1].dtype, ColumnType::Text);
    }

    #[test]
    fn test_sorted_time_index_keeps_shared_times() {
        let schema = price_schema().time_index(TimeIndex::Sorted);
        let payload = json!([
            {"time": "2022-01-04", "close": 3},
            {"time": "2022-01-03", "close": 1},
            {"time": "2022-01-04", "close": 4},
        ]);
        let table = schema.normalize(&payload, "VNM").unwrap();
        let closes: Vec<_> = table
            .column("close")
            .unwrap()
            .filter_map(Value::as_f64)
            .collect();
        assert_eq!(closes, vec![1.0, 3.0, 4.0]);
    }

    #[test]
    fn test_time_formats() {
        let schema = Schema::new(DataKind::PriceHistory)
            .time(TimeSpec::Field {
                name: "time",
                aliases: &[],
                dtype: ColumnType::DateTime,
            })
            .column(ColumnSpec::required("close", ColumnType::Float));
        let payload = json!([
            {"time": "2022-01-03T09:15:00+07:00", "close": 1},
            {"time": "2022-01-03 03:00:00", "close": 2},
            {"time": 1641178800, "close": 3},
            {"time": "2022-01-02", "close": 4},
        ]);
        let table = schema.normalize(&payload, "VNM").unwrap();
        let times: Vec<String> = table
            .column("time")
            .unwrap()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            times,
            vec![
                "2022-01-02T00:00:00Z",
                "2022-01-03T02:15:00Z",
                "2022-01-03T03:00:00Z",
            ]
        );
        // 1641178800 is 2022-01-03T03:00:00Z and replaces the row above it.
        assert_eq!(table.row(2).unwrap().get("close"), Some(&Value::Float(3.0)));
    }

    #[test]
    fn test_year_quarter_time() {
        let schema = Schema::new(DataKind::FinancialStatement)
            .time(TimeSpec::YearQuarter {
                name: "period",
                year: &["yearReport"],
                quarter: &["lengthReport"],
            })
            .keep_extra(true);
        let payload = json!({"data": [
            {"yearReport": 2023, "lengthReport": 4, "revenue": "1500.5"},
            {"yearReport": 2023, "lengthReport": 1, "revenue": 1200},
            {"yearReport": 2022, "lengthReport": 5, "revenue": 4000},
        ]});
        let table = schema.normalize(&payload, "VNM").unwrap();

        let periods: Vec<_> = table
            .column("period")
            .unwrap()
            .filter_map(Value::as_date)
            .collect();
        assert_eq!(
            periods,
            vec![date(2022, 12, 31), date(2023, 3, 31), date(2023, 12, 31)]
        );
        let names: Vec<_> = table.column_names().collect();
        assert_eq!(names, vec!["period", "revenue"]);
        assert_eq!(table.columns()[1].dtype, ColumnType::Float);
    }

    #[test]
    fn test_extra_field_inference() {
        let schema = Schema::new(DataKind::CompanyProfile)
            .column(ColumnSpec::required("symbol", ColumnType::Text).aliases(&["ticker"]))
            .keep_extra(true);
        let payload = json!({"data": {
            "ticker": "VNM",
            "employees": "9000",
            "marketCap": 1.5e14,
            "listedDate": "2006-01-19",
            "updatedAt": "2024-05-01T10:00:00Z",
            "website": "https://www.vinamilk.com.vn",
            "isBank": false,
            "note": null
        }});
        let table = schema.normalize(&payload, "VNM").unwrap();
        let types: Vec<_> = table.columns().iter().map(|c| (c.name.as_str(), c.dtype)).collect();
        assert_eq!(
            types,
            vec![
                ("symbol", ColumnType::Text),
                ("employees", ColumnType::Integer),
                ("marketCap", ColumnType::Integer),
                ("listedDate", ColumnType::Date),
                ("updatedAt", ColumnType::DateTime),
                ("website", ColumnType::Text),
                ("isBank", ColumnType::Text),
                ("note", ColumnType::Text),
            ]
        );
        let row = table.row(0).unwrap();
        assert_eq!(row.get("symbol").unwrap().as_str(), Some("VNM"));
        assert_eq!(row.get("isBank").unwrap().as_str(), Some("false"));
        assert!(row.get("note").unwrap().is_null());
    }

    #[test]
    fn test_scalar_rows() {
        let schema = Schema::new(DataKind::OptionExpiries)
            .time(TimeSpec::Field {
                name: "expiry",
                aliases: &[],
                dtype: ColumnType::Date,
            })
            .scalar_rows("expiry");
        let payload = json!({"data": ["2024-02-16", "2024-01-19", {"expiry": "2024-03-15"}]});
        let table = schema.normalize(&payload, "AAPL").unwrap();
        let expiries: Vec<_> = table
            .column("expiry")
            .unwrap()
            .filter_map(Value::as_date)
            .collect();
        assert_eq!(
            expiries,
            vec![date(2024, 1, 19), date(2024, 2, 16), date(2024, 3, 15)]
        );

        assert!(matches!(
            price_schema().normalize(&json!(["2024-01-19"]), "AAPL"),
            Err(FeedError::MalformedPayload(_))
        ));
        assert!(matches!(
            schema.normalize(&json!([["2024-01-19"]]), "AAPL"),
            Err(FeedError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_extra_fields_dropped_by_default() {
        let payload = json!([{"time": "2022-01-03", "close": 1, "adjusted": true}]);
        let table = price_schema().normalize(&payload, "VNM").unwrap();
        assert!(table.column_index("adjusted").is_none());
    }

    #[test]
    fn test_mixed_extra_numbers_widen_to_float() {
        let schema = Schema::new(DataKind::MarketData)
            .column(ColumnSpec::required("symbol", ColumnType::Text))
            .keep_extra(true);
        let payload = json!([
            {"symbol": "VNM", "price": 70000, "ratio": "abc"},
            {"symbol": "FPT", "price": "95000.5", "ratio": 1.2},
        ]);
        let table = schema.normalize(&payload, "FPT,VNM").unwrap();
        assert_eq!(table.columns()[1].dtype, ColumnType::Float);
        assert_eq!(table.columns()[2].dtype, ColumnType::Text);
        assert_eq!(table.row(1).unwrap().get("ratio").unwrap().as_str(), Some("1.2"));
        // No time index: upstream order is kept.
        assert_eq!(table.row(0).unwrap().get("symbol").unwrap().as_str(), Some("VNM"));
    }
}
