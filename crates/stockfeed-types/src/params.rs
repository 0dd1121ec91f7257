//! Validated request parameters, one type per data kind.
//!
//! Every constructor here is side-effect free: it either returns immutable,
//! normalized parameters or a [`ValidationError`] naming the rejected input.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::{
    DataKind, DateRange, IntoDate, IntoResolution, Period, Resolution, Symbol, ValidationError,
};

/// Bounds accepted for statement years.
const YEAR_BOUNDS: std::ops::RangeInclusive<i32> = 1900..=2100;

/// Largest row limit accepted for corporate events.
pub const MAX_EVENT_LIMIT: usize = 500;

/// Parameters shared by every fetch request.
pub trait FetchParams: Serialize + Send + Sync {
    /// The data kind these parameters request.
    const KIND: DataKind;

    /// Human-readable subject of the request, used in errors and logs.
    fn subject(&self) -> String;
}

/// Price history request: symbol, inclusive date range and resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestParams {
    symbol: Symbol,
    range: DateRange,
    resolution: Resolution,
}

impl RequestParams {
    /// Validates caller input into price history parameters.
    ///
    /// Dates may be given as `YYYY-MM-DD` strings or date values.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is empty or malformed, a date does not
    /// parse, start is after end, or the resolution is unsupported.
    pub fn validate(
        symbol: &str,
        start: impl IntoDate,
        end: impl IntoDate,
        resolution: impl IntoResolution,
    ) -> Result<Self, ValidationError> {
        let symbol = Symbol::new(symbol)?;
        let start = start.into_date("start")?;
        let end = end.into_date("end")?;
        let range = DateRange::new(start, end)?;
        let resolution = resolution.into_resolution()?;
        Ok(Self {
            symbol,
            range,
            resolution,
        })
    }

    /// Validates a request covering a lookback period ending on `today`.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol or resolution is invalid.
    pub fn for_period(
        symbol: &str,
        period: Period,
        today: NaiveDate,
        resolution: impl IntoResolution,
    ) -> Result<Self, ValidationError> {
        let range = period.to_range(today);
        Self::validate(symbol, range.start, range.end, resolution)
    }

    /// Returns the symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Returns the inclusive date range.
    #[must_use]
    pub const fn range(&self) -> DateRange {
        self.range
    }

    /// Returns the resolution.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }
}

impl FetchParams for RequestParams {
    const KIND: DataKind = DataKind::PriceHistory;

    fn subject(&self) -> String {
        format!("{} {} ({})", self.symbol, self.range, self.resolution)
    }
}

/// Financial statement report type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Income statement.
    Income,
    /// Balance sheet.
    Balance,
    /// Cash flow statement.
    CashFlow,
}

impl ReportType {
    /// Returns the report type identifier used in query strings.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Balance => "balance",
            Self::CashFlow => "cashflow",
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "income_statement" | "incomestatement" => Ok(Self::Income),
            "balance" | "balance_sheet" | "balancesheet" => Ok(Self::Balance),
            "cash" | "cashflow" | "cash_flow" => Ok(Self::CashFlow),
            _ => Err(ValidationError::UnknownOption {
                field: "report type",
                value: s.to_string(),
            }),
        }
    }
}

/// Financial statement reporting frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Quarterly reports.
    #[default]
    Quarterly,
    /// Annual reports.
    Annual,
}

impl Frequency {
    /// Returns the frequency identifier used in query strings.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quarterly" | "quarter" | "q" => Ok(Self::Quarterly),
            "annual" | "yearly" | "year" | "y" => Ok(Self::Annual),
            _ => Err(ValidationError::UnknownOption {
                field: "report frequency",
                value: s.to_string(),
            }),
        }
    }
}

/// Financial statement request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StatementParams {
    symbol: Symbol,
    report_type: ReportType,
    frequency: Frequency,
    start_year: i32,
    end_year: i32,
}

impl StatementParams {
    /// Validates caller input into statement parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is invalid or the year range is
    /// reversed or outside 1900..=2100.
    pub fn validate(
        symbol: &str,
        report_type: ReportType,
        frequency: Frequency,
        start_year: i32,
        end_year: i32,
    ) -> Result<Self, ValidationError> {
        let symbol = Symbol::new(symbol)?;
        if start_year > end_year
            || !YEAR_BOUNDS.contains(&start_year)
            || !YEAR_BOUNDS.contains(&end_year)
        {
            return Err(ValidationError::InvalidYearRange {
                start: start_year,
                end: end_year,
            });
        }
        Ok(Self {
            symbol,
            report_type,
            frequency,
            start_year,
            end_year,
        })
    }

    /// Returns the symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Returns the report type.
    #[must_use]
    pub const fn report_type(&self) -> ReportType {
        self.report_type
    }

    /// Returns the reporting frequency.
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Returns the first year (inclusive).
    #[must_use]
    pub const fn start_year(&self) -> i32 {
        self.start_year
    }

    /// Returns the last year (inclusive).
    #[must_use]
    pub const fn end_year(&self) -> i32 {
        self.end_year
    }
}

impl FetchParams for StatementParams {
    const KIND: DataKind = DataKind::FinancialStatement;

    fn subject(&self) -> String {
        format!(
            "{} {} {} {}-{}",
            self.symbol, self.frequency, self.report_type, self.start_year, self.end_year
        )
    }
}

/// Company profile request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProfileParams {
    symbol: Symbol,
}

impl ProfileParams {
    /// Validates caller input into profile parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is empty or malformed.
    pub fn validate(symbol: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            symbol: Symbol::new(symbol)?,
        })
    }

    /// Returns the symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}

impl FetchParams for ProfileParams {
    const KIND: DataKind = DataKind::CompanyProfile;

    fn subject(&self) -> String {
        self.symbol.to_string()
    }
}

/// Price board snapshot request for a set of symbols.
///
/// Symbols are de-duplicated and kept sorted, so the same set in any order
/// yields equal parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MarketParams {
    symbols: Vec<Symbol>,
}

impl MarketParams {
    /// Validates a list of symbols.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty or any symbol is invalid.
    pub fn validate<I, S>(symbols: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = symbols
            .into_iter()
            .map(|s| Symbol::new(s.as_ref()))
            .collect::<Result<BTreeSet<_>, _>>()?;
        if set.is_empty() {
            return Err(ValidationError::NoSymbols);
        }
        Ok(Self {
            symbols: set.into_iter().collect(),
        })
    }

    /// Returns the symbols in sorted order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

impl FetchParams for MarketParams {
    const KIND: DataKind = DataKind::MarketData;

    fn subject(&self) -> String {
        self.symbols
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Corporate event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Analyst recommendations.
    Recommendations,
    /// Analyst upgrades and downgrades.
    UpgradesDowngrades,
    /// Reported earnings against estimates.
    EarningsHistory,
    /// Insider transactions.
    InsiderTrades,
    /// Largest institutional holders.
    InstitutionalHolders,
    /// Largest mutual fund holders.
    MutualFundHolders,
    /// Upcoming earnings and dividend dates.
    Calendar,
}

impl EventKind {
    /// Returns the event identifier used in query strings.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recommendations => "recommendations",
            Self::UpgradesDowngrades => "upgrades_downgrades",
            Self::EarningsHistory => "earnings_history",
            Self::InsiderTrades => "insider_trades",
            Self::InstitutionalHolders => "institutional_holders",
            Self::MutualFundHolders => "mutualfund_holders",
            Self::Calendar => "calendar",
        }
    }

    /// Number of rows returned when the caller does not set a limit.
    #[must_use]
    pub const fn default_limit(&self) -> usize {
        match self {
            Self::Recommendations | Self::UpgradesDowngrades => 5,
            Self::EarningsHistory => 12,
            Self::InsiderTrades => 30,
            Self::InstitutionalHolders | Self::MutualFundHolders => 20,
            Self::Calendar => 10,
        }
    }

    /// Returns true if rows of this kind carry an event date.
    #[must_use]
    pub const fn is_dated(&self) -> bool {
        !matches!(
            self,
            Self::InstitutionalHolders | Self::MutualFundHolders | Self::Calendar
        )
    }

    /// Returns true for holder rankings.
    #[must_use]
    pub const fn is_holders(&self) -> bool {
        matches!(self, Self::InstitutionalHolders | Self::MutualFundHolders)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "recommendations" => Ok(Self::Recommendations),
            "upgrades_downgrades" | "upgrades" => Ok(Self::UpgradesDowngrades),
            "earnings_history" | "earnings" => Ok(Self::EarningsHistory),
            "insider_trades" | "insiders" => Ok(Self::InsiderTrades),
            "institutional_holders" | "holders" => Ok(Self::InstitutionalHolders),
            "mutualfund_holders" | "mutual_fund_holders" | "funds" => Ok(Self::MutualFundHolders),
            "calendar" => Ok(Self::Calendar),
            _ => Err(ValidationError::UnknownOption {
                field: "event kind",
                value: s.to_string(),
            }),
        }
    }
}

/// Corporate events request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EventParams {
    symbol: Symbol,
    event: EventKind,
    limit: usize,
}

impl EventParams {
    /// Validates caller input into event parameters.
    ///
    /// A missing limit falls back to [`EventKind::default_limit`].
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is invalid or the limit is outside
    /// `1..=MAX_EVENT_LIMIT`.
    pub fn validate(
        symbol: &str,
        event: EventKind,
        limit: Option<usize>,
    ) -> Result<Self, ValidationError> {
        let symbol = Symbol::new(symbol)?;
        let limit = limit.unwrap_or_else(|| event.default_limit());
        if limit == 0 || limit > MAX_EVENT_LIMIT {
            return Err(ValidationError::LimitOutOfRange {
                value: limit,
                max: MAX_EVENT_LIMIT,
            });
        }
        Ok(Self {
            symbol,
            event,
            limit,
        })
    }

    /// Returns the symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Returns the event kind.
    #[must_use]
    pub const fn event(&self) -> EventKind {
        self.event
    }

    /// Returns the maximum number of rows to return.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }
}

impl FetchParams for EventParams {
    const KIND: DataKind = DataKind::CorporateEvents;

    fn subject(&self) -> String {
        format!("{} {}", self.symbol, self.event)
    }
}
