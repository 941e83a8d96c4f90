//! Error types for the catalog MCP server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Every error falls into one of three categories (validation, not-found,
//! infrastructure) which decide how it is logged at the operation boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u32,
    },

    #[error("Connection not found: {connection_id}")]
    ConnectionNotFound { connection_id: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("{kind} '{name}' not found")]
    ObjectNotFound { kind: ObjectKind, name: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Kind of catalog object an identity lookup searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    Procedure,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "Table"),
            Self::Procedure => write!(f, "Stored procedure"),
        }
    }
}

/// How an error is treated at the operation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or missing input, detected before any query.
    Validation,
    /// An identity lookup returned no row.
    NotFound,
    /// Connection acquisition or query execution failed.
    Infrastructure,
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u32) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create a connection not found error.
    pub fn connection_not_found(connection_id: impl Into<String>) -> Self {
        Self::ConnectionNotFound {
            connection_id: connection_id.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a not-found error for a table.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            kind: ObjectKind::Table,
            name: name.into(),
        }
    }

    /// Create a not-found error for a stored procedure.
    pub fn procedure_not_found(name: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            kind: ObjectKind::Procedure,
            name: name.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Classify the error for boundary handling.
    ///
    /// An unknown connection id is a caller mistake, so it counts as validation.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } | Self::ConnectionNotFound { .. } => {
                ErrorCategory::Validation
            }
            Self::ObjectNotFound { .. } => ErrorCategory::NotFound,
            Self::Connection { .. }
            | Self::Database { .. }
            | Self::Timeout { .. }
            | Self::Internal { .. } => ErrorCategory::Infrastructure,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(
                    db_err.message(),
                    code,
                    "Check that the catalog views are readable by this user",
                )
            }
            sqlx::Error::RowNotFound => DbError::database(
                "No rows returned",
                None,
                "Verify the object name and schema",
            ),
            sqlx::Error::PoolTimedOut => DbError::timeout("connection pool acquire", 30),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Reconnect to the database")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::internal(format!("Catalog column not found: {}", col))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_error_suggestion() {
        let err = DbError::database(
            "permission denied for relation pg_class",
            Some("42501".to_string()),
            "Grant catalog access",
        );
        assert_eq!(err.suggestion(), Some("Grant catalog access"));
        assert_eq!(DbError::invalid_input("x").suggestion(), None);
    }

    #[test]
    fn test_error_retryable() {
        assert!(DbError::timeout("query", 30).is_retryable());
        assert!(DbError::connection("err", "sugg").is_retryable());
        assert!(!DbError::invalid_input("bad").is_retryable());
    }

    #[test]
    fn test_not_found_message_names_object() {
        let err = DbError::table_not_found("dbo.Orders");
        assert_eq!(err.to_string(), "Table 'dbo.Orders' not found");

        let err = DbError::procedure_not_found("usp_Missing");
        assert_eq!(err.to_string(), "Stored procedure 'usp_Missing' not found");
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            DbError::invalid_input("batch_size").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            DbError::connection_not_found("nope").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            DbError::table_not_found("t").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            DbError::database("boom", None, "retry").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            DbError::timeout("acquire", 30).category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            DbError::internal("decode").category(),
            ErrorCategory::Infrastructure
        );
    }

    #[test]
    fn test_sqlx_pool_timeout_maps_to_timeout() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::Timeout { .. }));
        assert_eq!(err.category(), ErrorCategory::Infrastructure);
    }

    #[test]
    fn test_sqlx_row_not_found_maps_to_database() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::Database { .. }));
    }
}
