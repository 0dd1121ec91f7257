//! Core types for the stockfeed market data pipeline.
//!
//! This crate provides the data structures shared by every other stockfeed
//! crate:
//!
//! - [`Symbol`], [`DateRange`], [`Resolution`] and [`Period`] - validated inputs
//! - [`RequestParams`] and the other `*Params` types - normalized request parameters
//! - [`OptionFilter`] - bounds for collecting option contracts across expirations
//! - [`Table`] - the normalized, time-indexed result of a fetch
//! - [`FeedError`] - the error taxonomy surfaced to callers

#![doc(issue_tracker_base_url = "https://github.com/stockfeed/stockfeed/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod date_range;
mod error;
mod kind;
mod options;
mod params;
mod resolution;
mod symbol;
mod table;

pub use date_range::{DATE_FORMAT, DateRange, IntoDate, Period};
pub use error::{FeedError, Result, TransportError, ValidationError};
pub use kind::DataKind;
pub use options::{ExpiriesParams, OptionChainParams, OptionFilter, OptionSide};
pub use params::{
    EventKind, EventParams, FetchParams, Frequency, MAX_EVENT_LIMIT, MarketParams, ProfileParams,
    ReportType, RequestParams, StatementParams,
};
pub use resolution::{IntoResolution, Resolution};
pub use symbol::Symbol;
pub use table::{Column, ColumnType, Row, Table, TableError, TimeIndex, Value};
