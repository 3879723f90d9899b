//! Environment-driven settings.

use std::env;

use tracing::info;

use search_dsl_repository::config::{DEFAULT_BULK_LIMIT, DEFAULT_BULK_MAX_BYTES};
use search_dsl_repository::ConnectionConfig;
use search_dsl_shared::{Dialect, IndexTarget};

use crate::SearchDslError;

/// Default engine URL.
const DEFAULT_BASE_URL: &str = "http://localhost:9200";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    /// Prefix joined in front of every index name, e.g. `test`.
    pub index_prefix: Option<String>,
    pub bulk_limit: usize,
    pub bulk_max_bytes: Option<usize>,
    /// Fixed dialect. `None` detects it from the engine version.
    pub dialect: Option<Dialect>,
    pub refresh_after_bulk: bool,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            index_prefix: None,
            bulk_limit: DEFAULT_BULK_LIMIT,
            bulk_max_bytes: Some(DEFAULT_BULK_MAX_BYTES),
            dialect: None,
            refresh_after_bulk: false,
            log_format: LogFormat::Pretty,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `SEARCH_BASE_URL`: engine URL (default: http://localhost:9200)
    /// - `SEARCH_INDEX_PREFIX`: index name prefix (default: none)
    /// - `SEARCH_BULK_LIMIT`: operations per bulk request (default: 1000)
    /// - `SEARCH_BULK_MAX_BYTES`: bulk body size limit, `0` disables it (default: 10 MiB)
    /// - `SEARCH_DIALECT`: `modern` or `legacy` (default: detected)
    /// - `SEARCH_REFRESH_AFTER_BULK`: `true` to refresh after bulk runs (default: false)
    /// - `SEARCH_LOG_FORMAT`: `json` or `pretty` (default: pretty)
    pub fn from_env() -> Result<Self, SearchDslError> {
        let settings = Self::from_lookup(|key| env::var(key).ok())?;

        info!(
            base_url = %settings.base_url,
            index_prefix = ?settings.index_prefix,
            bulk_limit = settings.bulk_limit,
            dialect = ?settings.dialect,
            "Loaded settings"
        );

        Ok(settings)
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SearchDslError> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bulk_limit = match var("SEARCH_BULK_LIMIT") {
            Some(value) => parse_number("SEARCH_BULK_LIMIT", &value)?,
            None => defaults.bulk_limit,
        };
        if bulk_limit == 0 {
            return Err(SearchDslError::config("SEARCH_BULK_LIMIT must be positive"));
        }

        let bulk_max_bytes = match var("SEARCH_BULK_MAX_BYTES") {
            Some(value) => Some(parse_number("SEARCH_BULK_MAX_BYTES", &value)?).filter(|v| *v > 0),
            None => defaults.bulk_max_bytes,
        };

        let dialect = match var("SEARCH_DIALECT") {
            Some(value) => Some(Dialect::parse(&value).ok_or_else(|| {
                SearchDslError::config(format!("Unknown SEARCH_DIALECT: {}", value))
            })?),
            None => None,
        };

        let refresh_after_bulk = match var("SEARCH_REFRESH_AFTER_BULK") {
            Some(value) => parse_bool("SEARCH_REFRESH_AFTER_BULK", &value)?,
            None => defaults.refresh_after_bulk,
        };

        let log_format = match var("SEARCH_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                return Err(SearchDslError::config(format!(
                    "Unknown SEARCH_LOG_FORMAT: {}",
                    other
                )))
            }
        };

        Ok(Self {
            base_url: var("SEARCH_BASE_URL").unwrap_or(defaults.base_url),
            index_prefix: var("SEARCH_INDEX_PREFIX"),
            bulk_limit,
            bulk_max_bytes,
            dialect,
            refresh_after_bulk,
            log_format,
        })
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            dialect: self.dialect,
            bulk_limit: self.bulk_limit,
            bulk_max_bytes: self.bulk_max_bytes,
            refresh_after_bulk: self.refresh_after_bulk,
        }
    }

    /// An index target carrying the configured prefix.
    pub fn target(&self, name: &str) -> IndexTarget {
        let target = IndexTarget::new(name);
        match &self.index_prefix {
            Some(prefix) => target.with_prefix(prefix.clone()),
            None => target,
        }
    }
}

fn parse_number(key: &str, value: &str) -> Result<usize, SearchDslError> {
    value
        .parse()
        .map_err(|_| SearchDslError::config(format!("{} must be a number, got {}", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SearchDslError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(SearchDslError::config(format!(
            "{} must be a boolean, got {}",
            key, value
        ))),
    }
}
