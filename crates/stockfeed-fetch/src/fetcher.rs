//! Per-kind fetchers over a shared pipeline.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use stockfeed_config::Settings;
use stockfeed_types::{
    DataKind, EventKind, EventParams, ExpiriesParams, FeedError, FetchParams, Frequency,
    IntoDate, IntoResolution, MarketParams, OptionChainParams, OptionFilter, OptionSide, Period,
    ProfileParams, ReportType, RequestParams, Result, Row, StatementParams, Table, Value,
};
use tracing::{debug, warn};

use crate::client::Transport;
use crate::endpoint::Endpoint;
use crate::pipeline::Pipeline;

/// Fetches one data kind from validated parameters.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Validated parameters this fetcher accepts.
    type Params: Endpoint;

    /// The pipeline requests go through.
    fn pipeline(&self) -> &Pipeline;

    /// Fetches the table for already-validated parameters.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run`].
    async fn fetch_params(&self, params: &Self::Params) -> Result<Table> {
        self.pipeline().run(params).await
    }
}

macro_rules! fetcher {
    ($(#[$meta:meta])* $name:ident, $params:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            pipeline: Arc<Pipeline>,
        }

        impl $name {
            /// Creates a fetcher over a shared pipeline.
            #[must_use]
            pub const fn new(pipeline: Arc<Pipeline>) -> Self {
                Self { pipeline }
            }
        }

        impl Fetcher for $name {
            type Params = $params;

            fn pipeline(&self) -> &Pipeline {
                &self.pipeline
            }
        }
    };
}

fetcher!(
    /// Daily, weekly, monthly and intraday price bars.
    PriceHistoryFetcher,
    RequestParams
);
fetcher!(
    /// Income, balance sheet and cash flow statements.
    FinancialStatementFetcher,
    StatementParams
);
fetcher!(
    /// Company overview for one symbol.
    CompanyProfileFetcher,
    ProfileParams
);
fetcher!(
    /// Price board snapshot for a set of symbols.
    MarketDataFetcher,
    MarketParams
);
fetcher!(
    /// Analyst, earnings, insider, holder and calendar events.
    CorporateEventsFetcher,
    EventParams
);
fetcher!(
    /// Option expirations and chains.
    OptionsFetcher,
    OptionChainParams
);

impl PriceHistoryFetcher {
    /// Validates and fetches price bars for an inclusive date range.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidInput`](stockfeed_types::FeedError::InvalidInput)
    /// before any request when the input is invalid; otherwise see
    /// [`Pipeline::run`].
    pub async fn fetch(
        &self,
        symbol: &str,
        start: impl IntoDate,
        end: impl IntoDate,
        resolution: impl IntoResolution,
    ) -> Result<Table> {
        let params = RequestParams::validate(symbol, start, end, resolution)?;
        self.fetch_params(&params).await
    }

    /// Validates and fetches price bars for a lookback period ending today
    /// (UTC).
    ///
    /// # Errors
    ///
    /// See [`PriceHistoryFetcher::fetch`].
    pub async fn fetch_period(
        &self,
        symbol: &str,
        period: Period,
        resolution: impl IntoResolution,
    ) -> Result<Table> {
        let params =
            RequestParams::for_period(symbol, period, Utc::now().date_naive(), resolution)?;
        self.fetch_params(&params).await
    }

    /// Fetches several requests concurrently, bounded by the pipeline's
    /// `max_concurrency`.
    ///
    /// Results come back in request order; one failure does not stop the
    /// others.
    pub async fn fetch_many(&self, requests: &[RequestParams]) -> Vec<Result<Table>> {
        stream::iter(requests)
            .map(|params| self.fetch_params(params))
            .buffered(self.pipeline.max_concurrency())
            .collect()
            .await
    }
}

impl FinancialStatementFetcher {
    /// Validates and fetches statements for an inclusive year range.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidInput`](stockfeed_types::FeedError::InvalidInput)
    /// before any request when the input is invalid; otherwise see
    /// [`Pipeline::run`].
    pub async fn fetch(
        &self,
        symbol: &str,
        report_type: ReportType,
        frequency: Frequency,
        start_year: i32,
        end_year: i32,
    ) -> Result<Table> {
        let params =
            StatementParams::validate(symbol, report_type, frequency, start_year, end_year)?;
        self.fetch_params(&params).await
    }
}

impl CompanyProfileFetcher {
    /// Validates and fetches a company profile.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidInput`](stockfeed_types::FeedError::InvalidInput)
    /// for an invalid symbol; otherwise see [`Pipeline::run`].
    pub async fn fetch(&self, symbol: &str) -> Result<Table> {
        let params = ProfileParams::validate(symbol)?;
        self.fetch_params(&params).await
    }
}

impl MarketDataFetcher {
    /// Validates and fetches a snapshot, one row per symbol.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidInput`](stockfeed_types::FeedError::InvalidInput)
    /// for an empty list or an invalid symbol; otherwise see
    /// [`Pipeline::run`].
    pub async fn fetch<I, S>(&self, symbols: I) -> Result<Table>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let params = MarketParams::validate(symbols)?;
        self.fetch_params(&params).await
    }
}

impl CorporateEventsFetcher {
    /// Validates and fetches corporate events.
    ///
    /// A `None` limit uses the event kind's default.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidInput`](stockfeed_types::FeedError::InvalidInput)
    /// for an invalid symbol or limit; otherwise see [`Pipeline::run`].
    pub async fn fetch(
        &self,
        symbol: &str,
        event: EventKind,
        limit: Option<usize>,
    ) -> Result<Table> {
        let params = EventParams::validate(symbol, event, limit)?;
        self.fetch_params(&params).await
    }
}

impl OptionsFetcher {
    /// Fetches the expiration dates listed for an underlying, earliest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidInput`] for an invalid symbol; otherwise
    /// see [`Pipeline::run`].
    pub async fn expiries(&self, symbol: &str) -> Result<Vec<NaiveDate>> {
        let params = ExpiriesParams::validate(symbol)?;
        let table = self.pipeline.run(&params).await?;
        Ok(table
            .column("expiry")
            .map(|values| values.filter_map(Value::as_date).collect())
            .unwrap_or_default())
    }

    /// Validates and fetches the chain for one expiration. A `None` side
    /// returns calls and puts.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidInput`] for an invalid symbol or expiry;
    /// otherwise see [`Pipeline::run`].
    pub async fn fetch(
        &self,
        symbol: &str,
        expiry: impl IntoDate,
        side: Option<OptionSide>,
    ) -> Result<Table> {
        let params = OptionChainParams::validate(symbol, expiry, side)?;
        self.fetch_params(&params).await
    }

    /// Collects contracts across every listed expiration inside the filter.
    ///
    /// Chains are fetched concurrently, bounded by the pipeline's
    /// `max_concurrency`. An expiration whose chain fails is logged and
    /// skipped. The result is restricted to the strike bounds and ordered
    /// by open interest, then volume, both descending.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::EmptyResult`] when no expiration or no contract
    /// matches, and the last chain error when every chain request failed.
    pub async fn fetch_filtered(&self, filter: &OptionFilter) -> Result<Table> {
        let empty = || FeedError::EmptyResult {
            kind: DataKind::OptionChain,
            subject: filter.symbol().to_string(),
        };

        let expiries: Vec<NaiveDate> = self
            .expiries(filter.symbol().as_str())
            .await?
            .into_iter()
            .filter(|expiry| filter.contains_expiry(*expiry))
            .collect();
        if expiries.is_empty() {
            return Err(empty());
        }

        let requests: Vec<OptionChainParams> =
            expiries.iter().map(|expiry| filter.chain_params(*expiry)).collect();
        let results: Vec<Result<Table>> = stream::iter(&requests)
            .map(|params| self.fetch_params(params))
            .buffered(self.pipeline.max_concurrency())
            .collect()
            .await;

        let mut merged: Option<Table> = None;
        let mut last_err = None;
        for (params, result) in requests.iter().zip(results) {
            match result {
                Ok(table) => match merged.as_mut() {
                    Some(merged) => merged.append(table)?,
                    None => merged = Some(table),
                },
                Err(FeedError::EmptyResult { .. }) => {
                    debug!(subject = %params.subject(), "no contracts for expiry");
                }
                Err(err) => {
                    warn!(subject = %params.subject(), error = %err, "skipping option chain");
                    last_err = Some(err);
                }
            }
        }

        let Some(mut table) = merged else {
            return Err(last_err.unwrap_or_else(empty));
        };
        if filter.has_strike_bounds() {
            table.retain(|row| {
                row.get("strike")
                    .and_then(Value::as_f64)
                    .is_some_and(|strike| filter.contains_strike(strike))
            });
        }
        if table.is_empty() {
            return Err(empty());
        }
        table.sort_by(|a, b| {
            descending(a, b, "openInterest").then_with(|| descending(a, b, "volume"))
        })?;
        Ok(table)
    }
}

/// Orders two rows by an integer column, largest first and nulls last.
fn descending(a: &Row<'_>, b: &Row<'_>, column: &str) -> Ordering {
    let value = |row: &Row<'_>| row.get(column).and_then(Value::as_i64);
    match (value(a), value(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Every fetcher, built once over one shared pipeline.
#[derive(Debug, Clone)]
pub struct Fetchers {
    /// Price history.
    pub price_history: PriceHistoryFetcher,
    /// Financial statements.
    pub financial_statement: FinancialStatementFetcher,
    /// Company profiles.
    pub company_profile: CompanyProfileFetcher,
    /// Market snapshots.
    pub market_data: MarketDataFetcher,
    /// Corporate events.
    pub corporate_events: CorporateEventsFetcher,
    /// Option expirations and chains.
    pub options: OptionsFetcher,
    pipeline: Arc<Pipeline>,
}

impl Fetchers {
    /// Builds all fetchers over an HTTP pipeline.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::new`].
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::from_pipeline(Arc::new(Pipeline::new(settings)?)))
    }

    /// Builds all fetchers over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::with_transport`].
    pub fn with_transport(settings: &Settings, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self::from_pipeline(Arc::new(Pipeline::with_transport(
            settings, transport,
        )?)))
    }

    /// Builds all fetchers over an existing pipeline.
    #[must_use]
    pub fn from_pipeline(pipeline: Arc<Pipeline>) -> Self {
        Self {
            price_history: PriceHistoryFetcher::new(Arc::clone(&pipeline)),
            financial_statement: FinancialStatementFetcher::new(Arc::clone(&pipeline)),
            company_profile: CompanyProfileFetcher::new(Arc::clone(&pipeline)),
            market_data: MarketDataFetcher::new(Arc::clone(&pipeline)),
            corporate_events: CorporateEventsFetcher::new(Arc::clone(&pipeline)),
            options: OptionsFetcher::new(Arc::clone(&pipeline)),
            pipeline,
        }
    }

    /// Returns the shared pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::{PRICES, ScriptedTransport, settings};
    use chrono::NaiveDate;
    use stockfeed_types::{TransportError, ValidationError};

    fn fetchers(transport: &Arc<ScriptedTransport>) -> Fetchers {
        let transport: Arc<dyn Transport> = transport.clone();
        Fetchers::with_transport(&settings(), transport).unwrap()
    }

    /// One request in flight at a time, so scripted responses line up with
    /// expirations.
    fn sequential_fetchers(transport: &Arc<ScriptedTransport>) -> Fetchers {
        let mut settings = settings();
        settings.http.max_concurrency = 1;
        let transport: Arc<dyn Transport> = transport.clone();
        Fetchers::with_transport(&settings, transport).unwrap()
    }

    const EXPIRIES: &str = r#"{"data": ["2024-01-19", "2024-02-16", "2024-03-15"]}"#;

    const JAN_CHAIN: &str = r#"{"data": [
        {"contractSymbol": "AAPL240119C00150000", "optionType": "call", "strike": 150,
         "openInterest": 100, "volume": 5},
        {"contractSymbol": "AAPL240119C00190000", "optionType": "call", "strike": 190,
         "openInterest": 900, "volume": 1},
        {"contractSymbol": "AAPL240119C00250000", "optionType": "call", "strike": 250,
         "openInterest": 5000, "volume": 50}
    ]}"#;

    const FEB_CHAIN: &str = r#"{"data": [
        {"contractSymbol": "AAPL240216C00160000", "optionType": "C", "strike": 160,
         "openInterest": 100, "volume": 40},
        {"contractSymbol": "AAPL240216C00170000", "optionType": "C", "strike": 170,
         "openInterest": null, "volume": 70}
    ]}"#;

    fn contracts(table: &Table) -> Vec<&str> {
        table
            .column("contract")
            .unwrap()
            .filter_map(Value::as_str)
            .collect()
    }

    #[tokio::test]
    async fn test_invalid_range_never_reaches_transport() {
        let transport = Arc::new(ScriptedTransport::always(PRICES));
        let fetchers = fetchers(&transport);

        let err = fetchers
            .price_history
            .fetch("VNM", "2022-02-01", "2022-01-01", "1D")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FeedError::InvalidInput(ValidationError::InvalidRange { .. })
        ));
        assert!(err.is_invalid_input());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_inputs_per_kind() {
        let transport = Arc::new(ScriptedTransport::always(PRICES));
        let fetchers = fetchers(&transport);

        assert!(
            fetchers
                .price_history
                .fetch("", "2022-01-01", "2022-01-02", "1D")
                .await
                .unwrap_err()
                .is_invalid_input()
        );
        assert!(
            fetchers
                .price_history
                .fetch("VNM", "01/01/2022", "2022-01-02", "1D")
                .await
                .unwrap_err()
                .is_invalid_input()
        );
        assert!(
            fetchers
                .price_history
                .fetch("VNM", "2022-01-01", "2022-01-02", "2D")
                .await
                .unwrap_err()
                .is_invalid_input()
        );
        assert!(
            fetchers
                .financial_statement
                .fetch("VNM", ReportType::Income, Frequency::Annual, 2023, 2020)
                .await
                .unwrap_err()
                .is_invalid_input()
        );
        assert!(
            fetchers
                .market_data
                .fetch(Vec::<String>::new())
                .await
                .unwrap_err()
                .is_invalid_input()
        );
        assert!(
            fetchers
                .corporate_events
                .fetch("VNM", EventKind::InsiderTrades, Some(0))
                .await
                .unwrap_err()
                .is_invalid_input()
        );
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_equivalent_dates_share_cache_entry() {
        let transport = Arc::new(ScriptedTransport::always(PRICES));
        let fetchers = fetchers(&transport);

        let from_strings = fetchers
            .price_history
            .fetch("vnm", "2022-01-01", "2022-01-31", "1D")
            .await
            .unwrap();
        let from_dates = fetchers
            .price_history
            .fetch(
                "VNM",
                NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2022, 1, 31).unwrap(),
                "D",
            )
            .await
            .unwrap();

        assert_eq!(from_strings, from_dates);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_kinds_do_not_share_entries() {
        let transport = Arc::new(ScriptedTransport::always(
            r#"{"data": [{"ticker": "VNM", "eventDate": "2024-01-02", "firm": "X"}]}"#,
        ));
        let fetchers = fetchers(&transport);

        fetchers.company_profile.fetch("VNM").await.unwrap();
        fetchers
            .corporate_events
            .fetch("VNM", EventKind::Recommendations, None)
            .await
            .unwrap();
        assert_eq!(transport.calls(), 2);
        assert_eq!(fetchers.pipeline().cache().len(), 2);
    }

    #[tokio::test]
    async fn test_statement_fetch() {
        let transport = Arc::new(ScriptedTransport::always(
            r#"{"data": [
                {"yearReport": 2023, "lengthReport": 2, "revenue": "200", "netIncome": null},
                {"yearReport": 2023, "lengthReport": 1, "revenue": "100", "netIncome": 12.5}
            ]}"#,
        ));
        let table = fetchers(&transport)
            .financial_statement
            .fetch("FPT", ReportType::Income, Frequency::Quarterly, 2023, 2023)
            .await
            .unwrap();

        assert_eq!(table.len(), 2);
        let first = table.row(0).unwrap();
        assert_eq!(first.get("period").unwrap().to_string(), "2023-03-31");
        assert_eq!(first.get("revenue").unwrap().as_i64(), Some(100));
        assert_eq!(first.get("netIncome"), Some(&Value::Float(12.5)));
        assert!(table.row(1).unwrap().get("netIncome").unwrap().is_null());

        let query = transport.last_query();
        assert!(query.contains(&("frequency", "quarterly".to_string())));
    }

    #[tokio::test]
    async fn test_market_fetch_order_insensitive() {
        let transport = Arc::new(ScriptedTransport::always(
            r#"{"data": [
                {"symbol": "FPT", "matchPrice": "95000", "totalVolume": 12000},
                {"symbol": "VNM", "matchPrice": "70100", "totalVolume": 8000}
            ]}"#,
        ));
        let fetchers = fetchers(&transport);

        let table = fetchers.market_data.fetch(["VNM", "fpt"]).await.unwrap();
        fetchers.market_data.fetch(["FPT", "VNM"]).await.unwrap();

        assert_eq!(transport.calls(), 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.row(1).unwrap().get("price"), Some(&Value::Float(70100.0)));
    }

    #[tokio::test]
    async fn test_fetch_many_preserves_order() {
        let transport = Arc::new(ScriptedTransport::sequence([
            Ok(PRICES),
            Err(500),
            Ok(PRICES),
        ]));
        let fetchers = fetchers(&transport);
        let requests = ["AAA", "BBB", "CCC"]
            .iter()
            .map(|s| RequestParams::validate(s, "2022-01-01", "2022-01-31", "1D").unwrap())
            .collect::<Vec<_>>();

        let results = fetchers.price_history.fetch_many(&requests).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(
            &results[1],
            Err(FeedError::Transport(TransportError::Status { status: 500, .. }))
        ));
        assert!(results[2].is_ok());
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_expiries_sorted() {
        let transport = Arc::new(ScriptedTransport::always(
            r#"{"data": ["2024-03-15", "2024-01-19"]}"#,
        ));
        let expiries = fetchers(&transport).options.expiries("aapl").await.unwrap();
        assert_eq!(
            expiries,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 19).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_filtered_options_across_expiries() {
        let transport = Arc::new(ScriptedTransport::sequence([
            Ok(EXPIRIES),
            Ok(JAN_CHAIN),
            Ok(FEB_CHAIN),
        ]));
        let filter = OptionFilter::new("AAPL")
            .unwrap()
            .expiring_until("2024-02-29")
            .unwrap()
            .strikes(Some(150.0), Some(200.0))
            .unwrap()
            .side(OptionSide::Call);

        let table = sequential_fetchers(&transport)
            .options
            .fetch_filtered(&filter)
            .await
            .unwrap();

        // March is outside the expiry bounds and never requested.
        assert_eq!(transport.calls(), 3);
        assert_eq!(
            contracts(&table),
            vec![
                "AAPL240119C00190000",
                "AAPL240216C00160000",
                "AAPL240119C00150000",
                "AAPL240216C00170000",
            ]
        );
        assert!(table.rows().all(|row| row.get("side").unwrap().as_str() == Some("C")));
        assert_eq!(
            table.row(1).unwrap().get("expiry").unwrap().as_date(),
            NaiveDate::from_ymd_opt(2024, 2, 16)
        );
    }

    #[tokio::test]
    async fn test_failed_expiry_is_skipped() {
        let transport = Arc::new(ScriptedTransport::sequence([
            Ok(EXPIRIES),
            Err(500),
            Ok(FEB_CHAIN),
            Ok(r#"{"data": []}"#),
        ]));
        let filter = OptionFilter::new("AAPL").unwrap();

        let table = sequential_fetchers(&transport)
            .options
            .fetch_filtered(&filter)
            .await
            .unwrap();
        assert_eq!(contracts(&table), vec!["AAPL240216C00160000", "AAPL240216C00170000"]);
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn test_filtered_options_empty_results() {
        let transport = Arc::new(ScriptedTransport::always(EXPIRIES));
        let filter = OptionFilter::new("AAPL")
            .unwrap()
            .expiring_from("2025-01-01")
            .unwrap();
        let err = fetchers(&transport)
            .options
            .fetch_filtered(&filter)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FeedError::EmptyResult { kind: DataKind::OptionChain, .. }
        ));
        assert_eq!(transport.calls(), 1);

        let transport = Arc::new(ScriptedTransport::sequence([Ok(EXPIRIES), Ok(JAN_CHAIN)]));
        let filter = OptionFilter::new("AAPL")
            .unwrap()
            .expiring_until("2024-01-31")
            .unwrap()
            .strikes(Some(400.0), None)
            .unwrap();
        let err = sequential_fetchers(&transport)
            .options
            .fetch_filtered(&filter)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::EmptyResult { .. }));
    }

    #[tokio::test]
    async fn test_every_chain_failing_returns_last_error() {
        let transport = Arc::new(ScriptedTransport::sequence([
            Ok(r#"{"data": ["2024-01-19"]}"#),
            Err(503),
        ]));
        let err = sequential_fetchers(&transport)
            .options
            .fetch_filtered(&OptionFilter::new("AAPL").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FeedError::Transport(TransportError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_period_covers_lookback() {
        let transport = Arc::new(ScriptedTransport::always(PRICES));
        fetchers(&transport)
            .price_history
            .fetch_period("VNM", Period::Day5, "1D")
            .await
            .unwrap();

        let query = transport.last_query();
        let bound = |key: &str| -> i64 {
            query
                .iter()
                .find(|(k, _)| *k == key)
                .unwrap()
                .1
                .parse()
                .unwrap()
        };
        assert_eq!(bound("to") - bound("from") + 1, 5 * 86_400);
    }
}
