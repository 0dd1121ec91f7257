//! Upstream endpoint descriptions, one per data kind.
//!
//! Each parameter type knows its query string, the schema its response is
//! normalized with, and any trimming applied to the normalized table.

use chrono::Datelike;
use stockfeed_types::{
    ColumnType, DataKind, EventKind, EventParams, ExpiriesParams, FeedError, FetchParams,
    MarketParams, OptionChainParams, OptionSide, ProfileParams, RequestParams, Result,
    StatementParams, Symbol, Table, TimeIndex, Value,
};

use crate::client::Query;
use crate::normalize::{ColumnSpec, Schema, TimeSpec};

const TIME_ALIASES: &[&str] = &["tradingDate", "date", "t", "timestamp"];
const SYMBOL_ALIASES: &[&str] = &["ticker", "code"];
const EVENT_DATE_ALIASES: &[&str] = &[
    "eventDate",
    "gradeDate",
    "reportDate",
    "transactionDate",
    "time",
];

/// Request-side description of one upstream endpoint.
pub trait Endpoint: FetchParams {
    /// Query string for the request.
    fn query(&self) -> Query;

    /// Schema used to normalize the response.
    fn schema(&self) -> Schema;

    /// Post-processes the normalized table before it is cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be edited.
    fn finish(&self, table: Table) -> Result<Table> {
        Ok(table)
    }
}

impl Endpoint for RequestParams {
    fn query(&self) -> Query {
        let range = self.range();
        vec![
            ("ticker", self.symbol().to_string()),
            ("type", "stock".to_string()),
            ("resolution", self.resolution().query_code().to_string()),
            ("from", range.start_of_range().timestamp().to_string()),
            ("to", range.end_of_range().timestamp().to_string()),
        ]
    }

    fn schema(&self) -> Schema {
        let dtype = if self.resolution().is_intraday() {
            ColumnType::DateTime
        } else {
            ColumnType::Date
        };
        Schema::new(Self::KIND)
            .time(TimeSpec::Field {
                name: "time",
                aliases: TIME_ALIASES,
                dtype,
            })
            .column(ColumnSpec::optional("open", ColumnType::Float).aliases(&["o"]))
            .column(ColumnSpec::optional("high", ColumnType::Float).aliases(&["h"]))
            .column(ColumnSpec::optional("low", ColumnType::Float).aliases(&["l"]))
            .column(ColumnSpec::required("close", ColumnType::Float).aliases(&["c"]))
            .column(ColumnSpec::optional("volume", ColumnType::Integer).aliases(&["v"]))
    }
}

impl Endpoint for StatementParams {
    fn query(&self) -> Query {
        vec![
            ("ticker", self.symbol().to_string()),
            ("report", self.report_type().as_str().to_string()),
            ("frequency", self.frequency().as_str().to_string()),
            ("fromYear", self.start_year().to_string()),
            ("toYear", self.end_year().to_string()),
        ]
    }

    fn schema(&self) -> Schema {
        Schema::new(Self::KIND)
            .time(TimeSpec::YearQuarter {
                name: "period",
                year: &["yearReport", "year"],
                quarter: &["lengthReport", "quarter"],
            })
            .keep_extra(true)
    }

    /// Drops periods outside the requested years.
    fn finish(&self, mut table: Table) -> Result<Table> {
        let years = self.start_year()..=self.end_year();
        table.retain(|row| {
            row.get("period")
                .and_then(Value::as_date)
                .is_some_and(|date| years.contains(&date.year()))
        });
        Ok(table)
    }
}

impl Endpoint for ProfileParams {
    fn query(&self) -> Query {
        vec![("ticker", self.symbol().to_string())]
    }

    fn schema(&self) -> Schema {
        Schema::new(Self::KIND)
            .column(ColumnSpec::required("symbol", ColumnType::Text).aliases(SYMBOL_ALIASES))
            .keep_extra(true)
    }
}

impl Endpoint for MarketParams {
    fn query(&self) -> Query {
        let tickers = self
            .symbols()
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(",");
        vec![("tickers", tickers)]
    }

    fn schema(&self) -> Schema {
        Schema::new(Self::KIND)
            .column(ColumnSpec::required("symbol", ColumnType::Text).aliases(SYMBOL_ALIASES))
            .column(
                ColumnSpec::optional("price", ColumnType::Float)
                    .aliases(&["matchPrice", "lastPrice"]),
            )
            .column(ColumnSpec::optional("change", ColumnType::Float).aliases(&["priceChange"]))
            .column(
                ColumnSpec::optional("volume", ColumnType::Integer)
                    .aliases(&["totalVolume", "matchVolume"]),
            )
            .keep_extra(true)
    }
}

impl Endpoint for EventParams {
    fn query(&self) -> Query {
        vec![
            ("ticker", self.symbol().to_string()),
            ("event", self.event().as_str().to_string()),
            ("size", self.limit().to_string()),
        ]
    }

    fn schema(&self) -> Schema {
        let schema = Schema::new(DataKind::CorporateEvents).keep_extra(true);
        match self.event() {
            EventKind::InstitutionalHolders | EventKind::MutualFundHolders => schema
                .column(
                    ColumnSpec::required("holder", ColumnType::Text)
                        .aliases(&["name", "organization"]),
                )
                .column(
                    ColumnSpec::optional("shares", ColumnType::Integer).aliases(&["sharesHeld"]),
                ),
            EventKind::Calendar => schema,
            // Several events can share a date; none of them may be dropped.
            EventKind::Recommendations
            | EventKind::UpgradesDowngrades
            | EventKind::EarningsHistory
            | EventKind::InsiderTrades => schema
                .time(TimeSpec::Field {
                    name: "date",
                    aliases: EVENT_DATE_ALIASES,
                    dtype: ColumnType::Date,
                })
                .time_index(TimeIndex::Sorted),
        }
    }

    /// Keeps the most recent dated events, or the first rows as ranked
    /// upstream.
    fn finish(&self, mut table: Table) -> Result<Table> {
        if self.event().is_dated() {
            table.keep_last(self.limit());
        } else {
            table.truncate(self.limit());
        }
        Ok(table)
    }
}

impl Endpoint for ExpiriesParams {
    fn query(&self) -> Query {
        vec![("ticker", self.symbol().to_string())]
    }

    fn schema(&self) -> Schema {
        Schema::new(Self::KIND)
            .time(TimeSpec::Field {
                name: "expiry",
                aliases: &["expirationDate", "expiration", "date"],
                dtype: ColumnType::Date,
            })
            .scalar_rows("expiry")
    }
}

impl Endpoint for OptionChainParams {
    fn query(&self) -> Query {
        let mut query = vec![
            ("ticker", self.symbol().to_string()),
            ("expiry", self.expiry().to_string()),
        ];
        if let Some(side) = self.side() {
            query.push(("type", side.as_str().to_string()));
        }
        query
    }

    fn schema(&self) -> Schema {
        Schema::new(Self::KIND)
            .column(
                ColumnSpec::required("contract", ColumnType::Text)
                    .aliases(&["contractSymbol", "symbol"]),
            )
            .column(ColumnSpec::required("side", ColumnType::Text).aliases(&["optionType", "type"]))
            .column(
                ColumnSpec::optional("expiry", ColumnType::Date)
                    .aliases(&["expiryDate", "expiration"]),
            )
            .column(ColumnSpec::required("strike", ColumnType::Float))
            .column(ColumnSpec::optional("lastPrice", ColumnType::Float).aliases(&["last"]))
            .column(ColumnSpec::optional("bid", ColumnType::Float))
            .column(ColumnSpec::optional("ask", ColumnType::Float))
            .column(ColumnSpec::optional("volume", ColumnType::Integer))
            .column(
                ColumnSpec::optional("openInterest", ColumnType::Integer)
                    .aliases(&["open_interest"]),
            )
            .column(
                ColumnSpec::optional("impliedVolatility", ColumnType::Float).aliases(&["iv"]),
            )
    }

    /// Writes sides as `C`/`P`, fills missing expiries with the requested
    /// one, and drops contracts of the other side when one was asked for.
    fn finish(&self, mut table: Table) -> Result<Table> {
        let mut edits = Vec::with_capacity(table.len());
        for (idx, row) in table.rows().enumerate() {
            let raw = row.get("side").and_then(Value::as_str).unwrap_or_default();
            let side = raw.parse::<OptionSide>().map_err(|_| {
                FeedError::MalformedPayload(format!(
                    "row {idx} field 'side': unknown option type '{raw}'"
                ))
            })?;
            let missing_expiry = row.get("expiry").is_some_and(Value::is_null);
            edits.push((side, missing_expiry));
        }

        for (idx, (side, missing_expiry)) in edits.into_iter().enumerate() {
            table.set(idx, "side", Value::Text(side.as_str().to_string()))?;
            if missing_expiry {
                table.set(idx, "expiry", Value::Date(self.expiry()))?;
            }
        }

        if let Some(wanted) = self.side() {
            table.retain(|row| row.get("side").and_then(Value::as_str) == Some(wanted.as_str()));
        }
        Ok(table)
    }
}
