//! Cached, validated fetching of financial market data as typed tables.
//!
//! This is a facade crate that re-exports functionality from the stockfeed
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use stockfeed_lib::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load("stockfeed.toml")?;
//!     let fetchers = Fetchers::new(&settings)?;
//!
//!     let prices = fetchers
//!         .price_history
//!         .fetch("VNM", "2024-01-01", "2024-03-31", "1D")
//!         .await?;
//!     print!("{}", CsvFormatter::new().render(&prices)?);
//!
//!     Ok(())
//! }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/stockfeed/stockfeed/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use stockfeed_types::*;

// Re-export configuration
pub use stockfeed_config::{
    CacheSettings, DEFAULT_SETTINGS_TOML, Endpoints, HttpSettings, RetrySettings, Settings,
};

// Re-export caching
pub use stockfeed_cache::{Cache, DiskStore, Fingerprint};

// Re-export fetch functionality
#[cfg(feature = "fetch")]
pub use stockfeed_fetch::{
    CompanyProfileFetcher, CorporateEventsFetcher, Endpoint, Fetcher, Fetchers,
    FinancialStatementFetcher, HttpTransport, MarketDataFetcher, OptionsFetcher, Pipeline,
    PriceHistoryFetcher, RateLimiter, RawPayload, RetryPolicy, Transport, normalize,
};

// Re-export formatters
#[cfg(feature = "format")]
pub use stockfeed_format::{
    CsvFormatter, FormatError, Formatter, JsonFormatter, JsonStyle, OutputFormat,
};

/// Prelude module for convenient imports.
///
/// ```
/// use stockfeed_lib::prelude::*;
/// ```
pub mod prelude {
    pub use stockfeed_types::{
        DataKind, DateRange, EventKind, FeedError, Frequency, OptionFilter, OptionSide, Period,
        ReportType, Resolution, Result, Symbol, Table, TimeIndex, Value,
    };

    pub use stockfeed_config::Settings;

    #[cfg(feature = "fetch")]
    pub use stockfeed_fetch::{Fetcher, Fetchers, Transport};

    #[cfg(feature = "format")]
    pub use stockfeed_format::{CsvFormatter, Formatter, JsonFormatter, OutputFormat};
}
