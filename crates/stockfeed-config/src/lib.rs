//! Settings for the stockfeed pipeline.
//!
//! Settings are loaded once, usually from a TOML file, and handed to
//! `Fetchers::new`. The embedded [`DEFAULT_SETTINGS_TOML`] document is the
//! single source of default values: a user document is merged over it key by
//! key, so anything it leaves out keeps the embedded value.
//!
//! # Example
//!
//! ```
//! use stockfeed_config::Settings;
//!
//! let settings = Settings::from_toml_str(
//!     r#"
//!     [cache]
//!     ttl_secs = 600
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(settings.cache.ttl_secs, 600);
//! assert_eq!(settings.http.requests_per_second, 5);
//! ```

#![doc(issue_tracker_base_url = "https://github.com/stockfeed/stockfeed/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stockfeed_types::{DataKind, FeedError, Result};

/// The default settings document embedded at compile time.
pub const DEFAULT_SETTINGS_TOML: &str = include_str!("../data/defaults.toml");

/// Parsed embedded defaults.
static DEFAULTS: OnceLock<Settings> = OnceLock::new();

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP transport settings.
    pub http: HttpSettings,
    /// Cache settings.
    pub cache: CacheSettings,
    /// Retry settings.
    pub retry: RetrySettings,
    /// Upstream endpoint locations.
    pub endpoints: Endpoints,
}

impl Default for Settings {
    fn default() -> Self {
        Self::defaults().clone()
    }
}

impl Settings {
    /// Returns the settings held by the embedded defaults document.
    ///
    /// # Panics
    ///
    /// Panics if the embedded document is invalid, which is a build defect.
    pub fn defaults() -> &'static Self {
        DEFAULTS.get_or_init(|| {
            Self::from_toml_str("").expect("embedded defaults.toml holds valid settings")
        })
    }

    /// Parses settings from a TOML document merged over the embedded
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Config`] if the document does not parse or the
    /// resulting settings are inconsistent.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut merged = parse_table(DEFAULT_SETTINGS_TOML, "embedded defaults")?;
        merge_tables(&mut merged, parse_table(content, "settings")?);
        let settings: Self = toml::Value::Table(merged)
            .try_into()
            .map_err(|e| FeedError::Config(format!("invalid settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not hold valid
    /// settings.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Serializes the settings as pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Config`] if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| FeedError::Config(format!("serialize settings: {e}")))
    }

    /// Checks that the settings are internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Config`] naming the first inconsistent value.
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(FeedError::Config("http.timeout_secs must be positive".into()));
        }
        if self.http.connect_timeout_secs == 0 {
            return Err(FeedError::Config(
                "http.connect_timeout_secs must be positive".into(),
            ));
        }
        if self.http.max_concurrency == 0 {
            return Err(FeedError::Config("http.max_concurrency must be positive".into()));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(FeedError::Config("http.user_agent must not be empty".into()));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(FeedError::Config(format!(
                "retry.max_delay_ms ({}) is below retry.base_delay_ms ({})",
                self.retry.max_delay_ms, self.retry.base_delay_ms
            )));
        }
        if self.endpoints.base_url.trim().is_empty() {
            return Err(FeedError::Config("endpoints.base_url must not be empty".into()));
        }
        for kind in DataKind::all() {
            if self.endpoints.path(*kind).trim().is_empty() {
                return Err(FeedError::Config(format!("endpoints.{kind} must not be empty")));
            }
        }
        Ok(())
    }
}

fn parse_table(content: &str, what: &str) -> Result<toml::Table> {
    content
        .parse::<toml::Table>()
        .map_err(|e| FeedError::Config(format!("parse {what} TOML: {e}")))
}

/// Overlays `overlay` onto `base`, recursing into tables present in both.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(inner)), toml::Value::Table(value)) => {
                merge_tables(inner, value);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn default_user_agent() -> String {
    format!("stockfeed/{}", env!("CARGO_PKG_VERSION"))
}

/// HTTP transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Idle pooled connections are closed after this many seconds.
    pub pool_idle_timeout_secs: u64,
    /// Maximum idle pooled connections per host.
    pub pool_max_idle_per_host: usize,
    /// Upstream request budget; 0 disables rate limiting.
    pub requests_per_second: u32,
    /// Requests kept in flight by batch fetches.
    pub max_concurrency: usize,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Settings::defaults().http.clone()
    }
}

impl HttpSettings {
    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the connection timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the pooled connection idle timeout.
    #[must_use]
    pub const fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }
}

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Time-to-live of cached tables in seconds.
    pub ttl_secs: u64,
    /// When false, every fetch goes upstream.
    pub enabled: bool,
    /// Mirror cached tables to disk.
    pub persist: bool,
    /// Directory for persisted tables; the platform cache directory is used
    /// when unset.
    pub dir: Option<PathBuf>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Settings::defaults().cache.clone()
    }
}

impl CacheSettings {
    /// Returns the cache time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Retry settings for transient upstream failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Retries after the first attempt; 0 disables retrying.
    pub max_retries: u32,
    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Settings::defaults().retry.clone()
    }
}

/// Upstream endpoint locations.
///
/// Each per-kind entry is either a path joined onto `base_url` or a full
/// URL used as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Base URL shared by relative endpoint paths.
    pub base_url: String,
    /// Price history endpoint.
    pub price_history: String,
    /// Financial statement endpoint.
    pub financial_statement: String,
    /// Company profile endpoint.
    pub company_profile: String,
    /// Market data (price board) endpoint.
    pub market_data: String,
    /// Corporate events endpoint.
    pub corporate_events: String,
    /// Option expiration dates endpoint.
    pub option_expiries: String,
    /// Option chain endpoint.
    pub option_chain: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Settings::defaults().endpoints.clone()
    }
}

impl Endpoints {
    /// Returns the configured entry for a data kind.
    #[must_use]
    pub fn path(&self, kind: DataKind) -> &str {
        match kind {
            DataKind::PriceHistory => &self.price_history,
            DataKind::FinancialStatement => &self.financial_statement,
            DataKind::CompanyProfile => &self.company_profile,
            DataKind::MarketData => &self.market_data,
            DataKind::CorporateEvents => &self.corporate_events,
            DataKind::OptionExpiries => &self.option_expiries,
            DataKind::OptionChain => &self.option_chain,
        }
    }

    /// Resolves the full URL for a data kind.
    #[must_use]
    pub fn url(&self, kind: DataKind) -> String {
        let path = self.path(kind);
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
