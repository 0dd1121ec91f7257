//! Option chain request parameters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{DataKind, FetchParams, IntoDate, Symbol, ValidationError};

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionSide {
    /// Call options.
    #[serde(rename = "C")]
    Call,
    /// Put options.
    #[serde(rename = "P")]
    Put,
}

impl OptionSide {
    /// Returns the one-letter code used in query strings and tables.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }
}

impl std::fmt::Display for OptionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OptionSide {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c" | "call" | "calls" => Ok(Self::Call),
            "p" | "put" | "puts" => Ok(Self::Put),
            _ => Err(ValidationError::UnknownOption {
                field: "option type",
                value: s.to_string(),
            }),
        }
    }
}

/// Request for the expiration dates listed for an underlying.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExpiriesParams {
    symbol: Symbol,
}

impl ExpiriesParams {
    /// Validates the underlying symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is empty or malformed.
    pub fn validate(symbol: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            symbol: Symbol::new(symbol)?,
        })
    }

    /// Returns the underlying symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}

impl FetchParams for ExpiriesParams {
    const KIND: DataKind = DataKind::OptionExpiries;

    fn subject(&self) -> String {
        self.symbol.to_string()
    }
}

/// Request for one expiration's option chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OptionChainParams {
    symbol: Symbol,
    expiry: NaiveDate,
    side: Option<OptionSide>,
}

impl OptionChainParams {
    /// Validates an option chain request. A missing side asks for both calls
    /// and puts.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is invalid or the expiry does not parse
    /// as `YYYY-MM-DD`.
    pub fn validate(
        symbol: &str,
        expiry: impl IntoDate,
        side: Option<OptionSide>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            symbol: Symbol::new(symbol)?,
            expiry: expiry.into_date("expiry")?,
            side,
        })
    }

    /// Returns the underlying symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Returns the expiration date.
    #[must_use]
    pub const fn expiry(&self) -> NaiveDate {
        self.expiry
    }

    /// Returns the requested side, or None for both.
    #[must_use]
    pub const fn side(&self) -> Option<OptionSide> {
        self.side
    }
}

impl FetchParams for OptionChainParams {
    const KIND: DataKind = DataKind::OptionChain;

    fn subject(&self) -> String {
        match self.side {
            Some(side) => format!("{} {} {side}", self.symbol, self.expiry),
            None => format!("{} {}", self.symbol, self.expiry),
        }
    }
}

/// Criteria for collecting option contracts across expirations.
///
/// Every bound is optional and inclusive.
///
/// ```
/// use stockfeed_types::{OptionFilter, OptionSide};
///
/// let filter = OptionFilter::new("aapl")?
///     .expiring_from("2024-01-01")?
///     .expiring_until("2024-03-31")?
///     .strikes(Some(150.0), Some(200.0))?
///     .side(OptionSide::Call);
/// assert_eq!(filter.symbol().as_str(), "AAPL");
/// # Ok::<(), stockfeed_types::ValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OptionFilter {
    symbol: Symbol,
    expiry_from: Option<NaiveDate>,
    expiry_until: Option<NaiveDate>,
    strike_lower: Option<f64>,
    strike_upper: Option<f64>,
    side: Option<OptionSide>,
}

impl OptionFilter {
    /// Starts a filter for an underlying with no bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is empty or malformed.
    pub fn new(symbol: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            symbol: Symbol::new(symbol)?,
            expiry_from: None,
            expiry_until: None,
            strike_lower: None,
            strike_upper: None,
            side: None,
        })
    }

    /// Keeps expirations on or after `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the date does not parse or falls after the upper
    /// expiry bound.
    pub fn expiring_from(mut self, date: impl IntoDate) -> Result<Self, ValidationError> {
        let start = date.into_date("start")?;
        if let Some(end) = self.expiry_until {
            check_order(start, end)?;
        }
        self.expiry_from = Some(start);
        Ok(self)
    }

    /// Keeps expirations on or before `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the date does not parse or falls before the lower
    /// expiry bound.
    pub fn expiring_until(mut self, date: impl IntoDate) -> Result<Self, ValidationError> {
        let end = date.into_date("end")?;
        if let Some(start) = self.expiry_from {
            check_order(start, end)?;
        }
        self.expiry_until = Some(end);
        Ok(self)
    }

    /// Sets the strike bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if a bound is negative or not finite, or if the lower
    /// bound exceeds the upper one.
    pub fn strikes(
        mut self,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Result<Self, ValidationError> {
        for bound in [lower, upper].into_iter().flatten() {
            if !bound.is_finite() || bound < 0.0 {
                return Err(ValidationError::InvalidStrike(format!(
                    "{bound} is not a non-negative number"
                )));
            }
        }
        if let (Some(lower), Some(upper)) = (lower, upper) {
            if lower > upper {
                return Err(ValidationError::InvalidStrike(format!("{lower} > {upper}")));
            }
        }
        self.strike_lower = lower;
        self.strike_upper = upper;
        Ok(self)
    }

    /// Restricts the filter to calls or puts.
    #[must_use]
    pub const fn side(mut self, side: OptionSide) -> Self {
        self.side = Some(side);
        self
    }

    /// Returns the underlying symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Returns the requested side, or None for both.
    #[must_use]
    pub const fn option_side(&self) -> Option<OptionSide> {
        self.side
    }

    /// Returns true if an expiration falls inside the expiry bounds.
    #[must_use]
    pub fn contains_expiry(&self, expiry: NaiveDate) -> bool {
        self.expiry_from.is_none_or(|start| expiry >= start)
            && self.expiry_until.is_none_or(|end| expiry <= end)
    }

    /// Returns true if a strike falls inside the strike bounds.
    #[must_use]
    pub fn contains_strike(&self, strike: f64) -> bool {
        self.strike_lower.is_none_or(|lower| strike >= lower)
            && self.strike_upper.is_none_or(|upper| strike <= upper)
    }

    /// Returns true if any strike bound is set.
    #[must_use]
    pub const fn has_strike_bounds(&self) -> bool {
        self.strike_lower.is_some() || self.strike_upper.is_some()
    }

    /// Returns the chain request for one expiration under this filter.
    #[must_use]
    pub fn chain_params(&self, expiry: NaiveDate) -> OptionChainParams {
        OptionChainParams {
            symbol: self.symbol.clone(),
            expiry,
            side: self.side,
        }
    }
}

fn check_order(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::InvalidRange { start, end });
    }
    Ok(())
}
