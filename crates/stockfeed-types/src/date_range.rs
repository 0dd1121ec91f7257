//! Date ranges, date inputs and period shorthands.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ValidationError;

/// Fixed format accepted for dates supplied as strings.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Earliest date `Period::Max` reaches back to (1970-01-01).
fn epoch_start() -> NaiveDate {
    DateTime::UNIX_EPOCH.date_naive()
}

/// A range of dates for data retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// Start date (inclusive).
    pub start: NaiveDate,
    /// End date (inclusive).
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new date range, validating that start <= end.
    ///
    /// # Errors
    ///
    /// Returns an error if start > end.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a date range for a single day.
    #[must_use]
    pub const fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Returns the total number of days in the range.
    #[must_use]
    pub fn total_days(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    /// Returns true if the range contains the given date.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Midnight UTC at the start of the range.
    #[must_use]
    pub fn start_of_range(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Last second (23:59:59 UTC) of the end date.
    #[must_use]
    pub fn end_of_range(&self) -> DateTime<Utc> {
        self.end.and_time(NaiveTime::MIN).and_utc() + TimeDelta::seconds(86_399)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Values that can be interpreted as a calendar date.
///
/// Strings must use [`DATE_FORMAT`]; date values pass through unchanged, so
/// `"2022-01-01"` and `NaiveDate::from_ymd_opt(2022, 1, 1)` are the same input.
pub trait IntoDate {
    /// Converts the value into a date, naming `field` in any error.
    ///
    /// # Errors
    ///
    /// Returns an error if a string does not parse as `YYYY-MM-DD`.
    fn into_date(self, field: &'static str) -> Result<NaiveDate, ValidationError>;
}

impl IntoDate for NaiveDate {
    fn into_date(self, _field: &'static str) -> Result<NaiveDate, ValidationError> {
        Ok(self)
    }
}

impl IntoDate for &NaiveDate {
    fn into_date(self, _field: &'static str) -> Result<NaiveDate, ValidationError> {
        Ok(*self)
    }
}

impl IntoDate for DateTime<Utc> {
    fn into_date(self, _field: &'static str) -> Result<NaiveDate, ValidationError> {
        Ok(self.date_naive())
    }
}

impl IntoDate for &str {
    fn into_date(self, field: &'static str) -> Result<NaiveDate, ValidationError> {
        NaiveDate::parse_from_str(self.trim(), DATE_FORMAT).map_err(|_| {
            ValidationError::InvalidDate {
                field,
                value: self.to_string(),
            }
        })
    }
}

impl IntoDate for &String {
    fn into_date(self, field: &'static str) -> Result<NaiveDate, ValidationError> {
        self.as_str().into_date(field)
    }
}

impl IntoDate for String {
    fn into_date(self, field: &'static str) -> Result<NaiveDate, ValidationError> {
        self.as_str().into_date(field)
    }
}

/// Relative lookback periods, ending on a supplied "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// One day.
    #[serde(rename = "1d")]
    Day1,
    /// Five days.
    #[serde(rename = "5d")]
    Day5,
    /// One month.
    #[serde(rename = "1mo")]
    Month1,
    /// Three months.
    #[serde(rename = "3mo")]
    Month3,
    /// Six months.
    #[serde(rename = "6mo")]
    Month6,
    /// One year.
    #[serde(rename = "1y")]
    Year1,
    /// Two years.
    #[serde(rename = "2y")]
    Year2,
    /// Five years.
    #[serde(rename = "5y")]
    Year5,
    /// Ten years.
    #[serde(rename = "10y")]
    Year10,
    /// Year to date.
    #[serde(rename = "ytd")]
    YearToDate,
    /// All available history.
    #[serde(rename = "max")]
    Max,
}

impl Period {
    /// Returns the period as its shorthand string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day1 => "1d",
            Self::Day5 => "5d",
            Self::Month1 => "1mo",
            Self::Month3 => "3mo",
            Self::Month6 => "6mo",
            Self::Year1 => "1y",
            Self::Year2 => "2y",
            Self::Year5 => "5y",
            Self::Year10 => "10y",
            Self::YearToDate => "ytd",
            Self::Max => "max",
        }
    }

    /// Resolves the period into an inclusive range ending on `today`.
    #[must_use]
    pub fn to_range(self, today: NaiveDate) -> DateRange {
        let months_back = |m: u32| {
            today
                .checked_sub_months(Months::new(m))
                .unwrap_or_else(epoch_start)
        };
        let start = match self {
            Self::Day1 => today,
            Self::Day5 => today - TimeDelta::days(4),
            Self::Month1 => months_back(1),
            Self::Month3 => months_back(3),
            Self::Month6 => months_back(6),
            Self::Year1 => months_back(12),
            Self::Year2 => months_back(24),
            Self::Year5 => months_back(60),
            Self::Year10 => months_back(120),
            Self::YearToDate => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
            Self::Max => epoch_start(),
        };
        DateRange {
            start: start.min(today),
            end: today,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" => Ok(Self::Day1),
            "5d" => Ok(Self::Day5),
            "1mo" => Ok(Self::Month1),
            "3mo" => Ok(Self::Month3),
            "6mo" => Ok(Self::Month6),
            "1y" => Ok(Self::Year1),
            "2y" => Ok(Self::Year2),
            "5y" => Ok(Self::Year5),
            "10y" => Ok(Self::Year10),
            "ytd" => Ok(Self::YearToDate),
            "max" => Ok(Self::Max),
            _ => Err(ValidationError::UnsupportedPeriod(s.to_string())),
        }
    }
}
