//! MCP tool implementations.
//!
//! - `schema`: `describe_table`, `list_tables`, `find_tables_by_column`
//! - `procedure`: `describe_procedure`, `list_procedures`,
//!   `get_procedures_batch`, `search_procedures`
//! - `usage`: column usage resolution for table descriptions
//! - `pipeline`: batch pagination and definition search
//! - `envelope`: success/failure wrapper returned by every tool

pub mod envelope;
pub mod pipeline;
pub mod procedure;
pub mod schema;
pub mod usage;

use crate::error::{DbError, DbResult};

pub use envelope::Envelope;
pub use procedure::{
    DescribeProcedureInput, DescribeProcedureOutput, ListProceduresInput, ListProceduresOutput,
    ProcedureToolHandler, ProceduresBatchInput, SearchProceduresInput,
};
pub use schema::{
    DescribeTableInput, DescribeTableOutput, FindTablesByColumnInput, FindTablesByColumnOutput,
    ListTablesInput, ListTablesOutput, SchemaToolHandler,
};

/// Trim a required string parameter, rejecting blank values.
pub(crate) fn require_non_blank<'a>(field: &str, value: &'a str) -> DbResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DbError::invalid_input(format!("{} is required", field)));
    }
    Ok(trimmed)
}
