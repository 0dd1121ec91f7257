//! Data kinds served by the fetchers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ValidationError;

/// The kind of data a fetcher returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// OHLCV price history.
    PriceHistory,
    /// Income statement, balance sheet or cash flow report.
    FinancialStatement,
    /// Company overview and metadata.
    CompanyProfile,
    /// Price board snapshot for a set of symbols.
    MarketData,
    /// Analyst, insider, holder, earnings and calendar events.
    CorporateEvents,
    /// Listed option expiration dates for an underlying.
    OptionExpiries,
    /// Option contracts for one underlying and expiration date.
    OptionChain,
}

impl DataKind {
    /// Returns the kind as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PriceHistory => "price_history",
            Self::FinancialStatement => "financial_statement",
            Self::CompanyProfile => "company_profile",
            Self::MarketData => "market_data",
            Self::CorporateEvents => "corporate_events",
            Self::OptionExpiries => "option_expiries",
            Self::OptionChain => "option_chain",
        }
    }

    /// Returns all data kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::PriceHistory,
            Self::FinancialStatement,
            Self::CompanyProfile,
            Self::MarketData,
            Self::CorporateEvents,
            Self::OptionExpiries,
            Self::OptionChain,
        ]
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "price_history" | "price" | "history" | "quote" => Ok(Self::PriceHistory),
            "financial_statement" | "financials" | "statement" => Ok(Self::FinancialStatement),
            "company_profile" | "company" | "profile" => Ok(Self::CompanyProfile),
            "market_data" | "market" | "price_board" => Ok(Self::MarketData),
            "corporate_events" | "events" => Ok(Self::CorporateEvents),
            "option_expiries" | "expirations" => Ok(Self::OptionExpiries),
            "option_chain" | "options" => Ok(Self::OptionChain),
            _ => Err(ValidationError::UnknownOption {
                field: "data kind",
                value: s.to_string(),
            }),
        }
    }
}
