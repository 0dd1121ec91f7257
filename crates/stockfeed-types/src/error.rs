//! Error types for stockfeed.

use chrono::NaiveDate;
use thiserror::Error;

use crate::{DataKind, TableError};

/// Result type alias for stockfeed operations.
pub type Result<T> = std::result::Result<T, FeedError>;

/// Errors that can occur while fetching and normalizing market data.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Caller-supplied parameters were rejected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// The upstream service could not be reached or answered with a failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The upstream answered successfully but returned no rows.
    #[error("No data available for {kind} {subject}")]
    EmptyResult {
        /// The data kind that was requested.
        kind: DataKind,
        /// The symbol (or symbol list) the request was about.
        subject: String,
    },

    /// The upstream payload did not have the expected shape.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A table could not be assembled or edited.
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Settings could not be loaded or are inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The on-disk cache could not be read or written.
    #[error("Cache error: {0}")]
    Cache(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FeedError {
    /// Returns true if the failure is transient and the request may succeed
    /// if issued again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if the error was caused by the caller's input.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Errors for rejected request parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Symbol was empty or whitespace.
    #[error("symbol must not be empty")]
    EmptySymbol,

    /// Symbol contained characters outside the accepted set or was too long.
    #[error("malformed symbol '{0}'")]
    MalformedSymbol(String),

    /// A symbol list contained no symbols.
    #[error("at least one symbol is required")]
    NoSymbols,

    /// Date string did not parse as `YYYY-MM-DD`.
    #[error("invalid {field} date '{value}', expected YYYY-MM-DD")]
    InvalidDate {
        /// Which parameter held the date.
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Start date is after end date.
    #[error("invalid date range: {start} > {end}")]
    InvalidRange {
        /// The start date.
        start: NaiveDate,
        /// The end date.
        end: NaiveDate,
    },

    /// Resolution is not in the supported set.
    #[error("unsupported resolution '{0}', expected one of: 1m, 5m, 15m, 30m, 1H, 1D, 1W, 1M")]
    UnsupportedResolution(String),

    /// Period shorthand is not recognised.
    #[error("unsupported period '{0}', expected one of: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max")]
    UnsupportedPeriod(String),

    /// Year range was reversed or out of bounds.
    #[error("invalid year range: {start}..={end}")]
    InvalidYearRange {
        /// The first year.
        start: i32,
        /// The last year.
        end: i32,
    },

    /// A selector such as report type or event kind was not recognised.
    #[error("unknown {field} '{value}'")]
    UnknownOption {
        /// Which parameter held the value.
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Row limit was zero or too large.
    #[error("limit {value} out of range 1..={max}")]
    LimitOutOfRange {
        /// The rejected limit.
        value: usize,
        /// The largest accepted limit.
        max: usize,
    },

    /// Strike bounds were negative, not finite, or reversed.
    #[error("invalid strike bounds: {0}")]
    InvalidStrike(String),
}

/// Transport-level failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within the configured timeout.
    #[error("Request to {url} timed out")]
    Timeout {
        /// The requested URL.
        url: String,
    },

    /// The server answered with a non-success status.
    #[error("Server returned {status} for {url}")]
    Status {
        /// The requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Connection or protocol failure.
    #[error("Network error for {url}: {message}")]
    Network {
        /// The requested URL.
        url: String,
        /// Description of the failure.
        message: String,
        /// Whether the failure happened while connecting.
        connect: bool,
    },
}

impl TransportError {
    /// Returns the URL the failed request targeted.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url } | Self::Status { url, .. } | Self::Network { url, .. } => url,
        }
    }

    /// Returns the HTTP status, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for timeouts, connection failures, rate limiting (429)
    /// and server errors (5xx).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Network { connect, .. } => *connect,
        }
    }
}
