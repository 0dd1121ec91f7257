//! Price history sampling resolutions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ValidationError;

/// Sampling granularity of historical price data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Resolution {
    /// 1-minute bars.
    #[serde(rename = "1m")]
    Minute1,
    /// 5-minute bars.
    #[serde(rename = "5m")]
    Minute5,
    /// 15-minute bars.
    #[serde(rename = "15m")]
    Minute15,
    /// 30-minute bars.
    #[serde(rename = "30m")]
    Minute30,
    /// 1-hour bars.
    #[serde(rename = "1H")]
    Hour1,
    /// Daily bars.
    #[default]
    #[serde(rename = "1D")]
    Day1,
    /// Weekly bars.
    #[serde(rename = "1W")]
    Week1,
    /// Monthly bars.
    #[serde(rename = "1M")]
    Month1,
}

impl Resolution {
    /// Returns the bar duration in seconds, or None for calendar-based bars
    /// (weekly and monthly).
    #[must_use]
    pub const fn seconds(&self) -> Option<u64> {
        match self {
            Self::Minute1 => Some(60),
            Self::Minute5 => Some(300),
            Self::Minute15 => Some(900),
            Self::Minute30 => Some(1800),
            Self::Hour1 => Some(3600),
            Self::Day1 => Some(86400),
            Self::Week1 | Self::Month1 => None,
        }
    }

    /// Returns true for sub-daily resolutions.
    #[must_use]
    pub const fn is_intraday(&self) -> bool {
        matches!(
            self,
            Self::Minute1 | Self::Minute5 | Self::Minute15 | Self::Minute30 | Self::Hour1
        )
    }

    /// Returns the canonical resolution code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "1m",
            Self::Minute5 => "5m",
            Self::Minute15 => "15m",
            Self::Minute30 => "30m",
            Self::Hour1 => "1H",
            Self::Day1 => "1D",
            Self::Week1 => "1W",
            Self::Month1 => "1M",
        }
    }

    /// Returns the code the upstream price endpoint expects.
    #[must_use]
    pub const fn query_code(&self) -> &'static str {
        match self {
            Self::Minute1 => "1",
            Self::Minute5 => "5",
            Self::Minute15 => "15",
            Self::Minute30 => "30",
            Self::Hour1 => "60",
            Self::Day1 => "D",
            Self::Week1 => "W",
            Self::Month1 => "M",
        }
    }

    /// Returns all supported resolutions.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Minute1,
            Self::Minute5,
            Self::Minute15,
            Self::Minute30,
            Self::Hour1,
            Self::Day1,
            Self::Week1,
            Self::Month1,
        ]
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // "M" is month and "m" is minute, so these are matched before lowercasing.
        match trimmed {
            "1M" | "M" => return Ok(Self::Month1),
            "1m" | "m" => return Ok(Self::Minute1),
            _ => {}
        }
        match trimmed.to_lowercase().as_str() {
            "1min" | "minute" => Ok(Self::Minute1),
            "5m" | "5min" => Ok(Self::Minute5),
            "15m" | "15min" => Ok(Self::Minute15),
            "30m" | "30min" => Ok(Self::Minute30),
            "1h" | "h" | "60m" | "hour" => Ok(Self::Hour1),
            "1d" | "d" | "day" | "daily" => Ok(Self::Day1),
            "1w" | "w" | "week" | "weekly" => Ok(Self::Week1),
            "1mo" | "month" | "monthly" => Ok(Self::Month1),
            _ => Err(ValidationError::UnsupportedResolution(s.to_string())),
        }
    }
}

/// Values that can be interpreted as a [`Resolution`].
pub trait IntoResolution {
    /// Converts the value into a supported resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a supported resolution code.
    fn into_resolution(self) -> Result<Resolution, ValidationError>;
}

impl IntoResolution for Resolution {
    fn into_resolution(self) -> Result<Resolution, ValidationError> {
        Ok(self)
    }
}

impl IntoResolution for &str {
    fn into_resolution(self) -> Result<Resolution, ValidationError> {
        self.parse()
    }
}

impl IntoResolution for &String {
    fn into_resolution(self) -> Result<Resolution, ValidationError> {
        self.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_seconds() {
        assert_eq!(Resolution::Minute1.seconds(), Some(60));
        assert_eq!(Resolution::Hour1.seconds(), Some(3600));
        assert_eq!(Resolution::Day1.seconds(), Some(86400));
        assert_eq!(Resolution::Month1.seconds(), None);
    }

    #[test]
    fn test_resolution_parse() {
        assert_eq!("1D".parse::<Resolution>().unwrap(), Resolution::Day1);
        assert_eq!("d".parse::<Resolution>().unwrap(), Resolution::Day1);
        assert_eq!("1W".parse::<Resolution>().unwrap(), Resolution::Week1);
        assert_eq!("60m".parse::<Resolution>().unwrap(), Resolution::Hour1);
        assert!("2D".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_month_and_minute_are_distinct() {
        assert_eq!("1M".parse::<Resolution>().unwrap(), Resolution::Month1);
        assert_eq!("1m".parse::<Resolution>().unwrap(), Resolution::Minute1);
        assert_eq!("1mo".parse::<Resolution>().unwrap(), Resolution::Month1);
    }

    #[test]
    fn test_canonical_codes_round_trip() {
        for resolution in Resolution::all() {
            assert_eq!(resolution.as_str().parse::<Resolution>().unwrap(), *resolution);
        }
    }

    #[test]
    fn test_intraday() {
        assert!(Resolution::Minute15.is_intraday());
        assert!(!Resolution::Day1.is_intraday());
        assert!(!Resolution::Week1.is_intraday());
    }
}
