//! Uniform success/failure wrapper returned by every tool.
//!
//! Handlers return `DbResult<T>`; the MCP layer converts that into an
//! [`Envelope`] at the operation boundary. Failures carry only the error's
//! display message while the full error goes to the log.

use crate::error::{DbResult, ErrorCategory};
use schemars::JsonSchema;
use serde::Serialize;
use tracing::{debug, error, info};

/// Exactly one of `data` and `error` is present.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Envelope<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Wrap a handler result, logging failures by category.
    ///
    /// Validation failures log at debug and not-found at info. Infrastructure
    /// failures log the full error at error level.
    pub fn from_result(operation: &str, result: DbResult<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => {
                match err.category() {
                    ErrorCategory::Validation => {
                        debug!(operation = %operation, error = %err, "Rejected invalid input");
                    }
                    ErrorCategory::NotFound => {
                        info!(operation = %operation, error = %err, "Object not found");
                    }
                    ErrorCategory::Infrastructure => {
                        error!(
                            operation = %operation,
                            error = ?err,
                            suggestion = ?err.suggestion(),
                            retryable = err.is_retryable(),
                            "Operation failed"
                        );
                    }
                }
                Self::failure(err.to_string())
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;

    #[test]
    fn test_success_serializes_without_error() {
        let envelope = Envelope::success(vec![1, 2, 3]);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failure_serializes_without_data() {
        let envelope: Envelope<Vec<i32>> = Envelope::failure("boom");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_from_result_keeps_display_message_only() {
        let err = DbError::database(
            "relation does not exist",
            Some("42P01".to_string()),
            "Check the table name",
        );
        let envelope: Envelope<()> = Envelope::from_result("describe_table", Err(err));
        assert!(!envelope.is_success());
        let message = envelope.error().unwrap();
        assert_eq!(message, "Database error: relation does not exist");
        assert!(!message.contains("42P01"));
        assert!(!message.contains("Check the table name"));
    }

    #[test]
    fn test_from_result_not_found_names_object() {
        let envelope: Envelope<()> =
            Envelope::from_result("describe_table", Err(DbError::table_not_found("dbo.Missing")));
        assert!(envelope.data().is_none());
        assert!(envelope.error().unwrap().contains("dbo.Missing"));
    }

    #[test]
    fn test_from_result_success() {
        let envelope = Envelope::from_result("list_tables", Ok("ok"));
        assert!(envelope.is_success());
        assert_eq!(envelope.data(), Some(&"ok"));
    }
}
