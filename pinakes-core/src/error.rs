//! Error types for Pinakes operations

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Pinakes errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PinakesError {
    /// The request was missing or structurally invalid.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A text scope named a field code that is unknown for the entity kind.
    #[error("Unknown field code '{code}' for {entity}")]
    UnknownFieldCode { code: String, entity: String },

    /// The database round-trip failed.
    #[error("Database error: {reason}")]
    Database { reason: String },

    /// A result row did not have the column shape the reader expected.
    #[error("Unexpected row shape: column '{column}' {reason}")]
    RowShape { column: String, reason: String },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl PinakesError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn database(reason: impl Into<String>) -> Self {
        Self::Database {
            reason: reason.into(),
        }
    }

    pub fn row_shape(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RowShape {
            column: column.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// CONVERSIONS FROM DRIVER ERRORS
// ============================================================================

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for PinakesError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        PinakesError::database("Database operation failed")
    }
}

#[cfg(feature = "postgres")]
impl From<deadpool_postgres::PoolError> for PinakesError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);
        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                PinakesError::database("Timed out waiting for a database connection")
            }
            deadpool_postgres::PoolError::Closed => {
                PinakesError::database("Database connection pool is closed")
            }
            _ => PinakesError::database("Failed to acquire database connection"),
        }
    }
}

/// Result type alias for Pinakes operations.
pub type PinakesResult<T> = Result<T, PinakesError>;
