//! Fetch pipeline for stockfeed.
//!
//! This crate turns validated parameters into normalized tables:
//!
//! - [`Transport`] / [`HttpTransport`] - one GET per call, no internal retries
//! - [`RateLimiter`] - token bucket shared by every fetcher of a pipeline
//! - [`RetryPolicy`] - opt-in retries with capped exponential backoff
//! - [`normalize::Schema`] - JSON payloads into typed, time-indexed tables
//! - [`Pipeline`] - cache lookup, single-flight, fetch, normalize, cache store
//! - [`Fetchers`] - one [`Fetcher`] per data kind over a shared pipeline

#![doc(issue_tracker_base_url = "https://github.com/stockfeed/stockfeed/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod endpoint;
mod fetcher;
pub mod normalize;
mod pipeline;
mod rate_limit;
mod retry;

pub use client::{HttpTransport, Query, RawPayload, Transport};
pub use endpoint::Endpoint;
pub use fetcher::{
    CompanyProfileFetcher, CorporateEventsFetcher, Fetcher, Fetchers, FinancialStatementFetcher,
    MarketDataFetcher, OptionsFetcher, PriceHistoryFetcher,
};
pub use pipeline::Pipeline;
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
