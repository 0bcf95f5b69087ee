//! Search and database configuration
//!
//! Both are read from `PINAKES_*` environment variables; unset variables
//! fall back to the defaults, malformed ones are errors.

use crate::token::{TokenOperator, DEFAULT_OPERATOR};
use pinakes_core::{ConfigError, PagingOptions};
use std::str::FromStr;
use std::time::Duration;

/// Page size used when a caller builds paging without choosing one.
pub const DEFAULT_PAGE_SIZE: i32 = 20;

/// Largest page a search may request.
pub const MAX_PAGE_SIZE: i32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub default_page_size: i32,
    /// Positive page sizes above this are clamped to it.
    pub max_page_size: i32,
    /// Operator applied to tokens written without a symbol.
    pub default_operator: TokenOperator,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            default_operator: DEFAULT_OPERATOR,
        }
    }
}

impl SearchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env_var)
    }

    /// Build from a variable lookup, e.g. the process environment.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            default_page_size: parse_var(&var, "PINAKES_DEFAULT_PAGE_SIZE")?
                .unwrap_or(defaults.default_page_size),
            max_page_size: parse_var(&var, "PINAKES_MAX_PAGE_SIZE")?
                .unwrap_or(defaults.max_page_size),
            default_operator: match var("PINAKES_DEFAULT_OPERATOR") {
                Some(symbol) => TokenOperator::from_symbol(symbol.trim()).ok_or_else(|| {
                    ConfigError::InvalidValue {
                        field: "PINAKES_DEFAULT_OPERATOR".to_string(),
                        value: symbol.clone(),
                        reason: "not a token operator symbol".to_string(),
                    }
                })?,
                None => defaults.default_operator,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_page_size".to_string(),
                value: self.max_page_size.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.default_page_size <= 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::InvalidValue {
                field: "default_page_size".to_string(),
                value: self.default_page_size.to_string(),
                reason: format!("must be between 1 and {}", self.max_page_size),
            });
        }
        Ok(())
    }

    /// Paging for `page_number` with the default page size.
    pub fn default_paging(&self, page_number: i32) -> PagingOptions {
        PagingOptions::new(page_number, self.default_page_size)
    }

    /// Clamp a positive page size to the maximum. Unpaged requests stay
    /// unpaged.
    pub fn clamp(&self, paging: PagingOptions) -> PagingOptions {
        if paging.page_size > self.max_page_size {
            PagingOptions::new(paging.page_number, self.max_page_size)
        } else {
            paging
        }
    }
}

// ============================================================================
// DATABASE
// ============================================================================

/// Connection settings for the catalog database.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Connections kept by the pool.
    pub pool_size: usize,
    /// How long a search waits for a free connection.
    pub wait_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "pinakes".to_string(),
            user: "pinakes".to_string(),
            password: String::new(),
            pool_size: 8,
            wait_timeout: Duration::from_secs(10),
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env_var)
    }

    /// Build from `PINAKES_DB_*` variables.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            host: var("PINAKES_DB_HOST").unwrap_or(defaults.host),
            port: parse_var(&var, "PINAKES_DB_PORT")?.unwrap_or(defaults.port),
            dbname: var("PINAKES_DB_NAME").unwrap_or(defaults.dbname),
            user: var("PINAKES_DB_USER").unwrap_or(defaults.user),
            password: var("PINAKES_DB_PASSWORD").unwrap_or(defaults.password),
            pool_size: parse_var(&var, "PINAKES_DB_POOL_SIZE")?.unwrap_or(defaults.pool_size),
            wait_timeout: parse_var(&var, "PINAKES_DB_WAIT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.wait_timeout),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "host".to_string(),
            });
        }
        if self.dbname.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "dbname".to_string(),
            });
        }
        if self.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool_size".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_var<T>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                field: name.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}
