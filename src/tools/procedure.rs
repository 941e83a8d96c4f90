//! Stored procedure tools.
//!
//! This module implements `describe_procedure`, `list_procedures`,
//! `get_procedures_batch` and `search_procedures`. Inputs are validated and
//! procedure support is checked before a connection is acquired.

use crate::db::{CatalogConnection, CatalogSource, ConnectionManager};
use crate::error::{DbError, DbResult};
use crate::models::{ObjectName, ParameterDescriptor, ProcedureDescriptor, ProcedureFilter};
use crate::tools::pipeline::{
    BatchSize, DEFAULT_BATCH_SIZE, ProcedureBatchesOutput, ProcedureSearchOutput,
    collect_batches, search_batches,
};
use crate::tools::require_non_blank;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Input for the describe_procedure tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeProcedureInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// Procedure name, optionally schema-qualified (e.g., `public.refresh_totals`)
    pub procedure_name: String,
    /// Include the procedure source text. Default: true
    #[serde(default = "default_true")]
    pub include_definition: bool,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DescribeProcedureOutput {
    pub procedure: ProcedureDescriptor,
    /// Parameters in ordinal order
    pub parameters: Vec<ParameterDescriptor>,
}

/// Input for the list_procedures tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListProceduresInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// Only list procedures in this schema
    #[serde(default)]
    pub schema: Option<String>,
    /// SQL LIKE pattern on the procedure name (e.g., `usp_%`)
    #[serde(default)]
    pub name_pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListProceduresOutput {
    pub procedures: Vec<ProcedureDescriptor>,
    pub count: usize,
}

/// Input for the get_procedures_batch tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ProceduresBatchInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// Procedures per batch, must be positive. Default: 100
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Only include procedures in this schema
    #[serde(default)]
    pub schema: Option<String>,
    /// SQL LIKE pattern on the procedure name
    #[serde(default)]
    pub name_pattern: Option<String>,
    /// Fetch each procedure's source text. Default: false
    #[serde(default)]
    pub include_definitions: bool,
}

/// Input for the search_procedures tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchProceduresInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// Text to find in procedure definitions (case-insensitive)
    pub search_text: String,
    /// SQL LIKE pattern restricting which procedures are scanned
    #[serde(default)]
    pub name_pattern: Option<String>,
    /// Candidates per batch, must be positive. Default: 100
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Return the full source text of each match. Default: false
    #[serde(default)]
    pub include_definitions: bool,
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> i64 {
    DEFAULT_BATCH_SIZE
}

/// Describe one procedure over an open catalog source.
///
/// When the identity lookup finds nothing, fails with a not-found error that
/// names `requested` and issues no further lookups.
pub async fn describe_procedure<S: CatalogSource>(
    source: &mut S,
    name: &ObjectName,
    requested: &str,
    include_definition: bool,
) -> DbResult<DescribeProcedureOutput> {
    let Some(procedure) = source.find_procedure(name).await? else {
        return Err(DbError::procedure_not_found(requested));
    };

    let identity = procedure.identity();
    let parameters = source.procedure_parameters(&identity).await?;
    let procedure = if include_definition {
        let definition = source.procedure_definition(&identity).await?;
        procedure.with_definition(definition)
    } else {
        procedure
    };

    Ok(DescribeProcedureOutput {
        procedure,
        parameters,
    })
}

pub struct ProcedureToolHandler {
    connection_manager: Arc<ConnectionManager>,
}

impl ProcedureToolHandler {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    /// Acquire a connection after checking the backend has stored procedures.
    async fn procedure_connection(&self, connection_id: &str) -> DbResult<CatalogConnection> {
        let config = self.connection_manager.get_config(connection_id).await?;
        if !config.db_type.supports_procedures() {
            return Err(DbError::invalid_input(format!(
                "{} does not support stored procedures. Connection '{}' cannot use procedure tools.",
                config.db_type, connection_id
            )));
        }
        self.connection_manager.acquire(connection_id).await
    }

    pub async fn describe_procedure(
        &self,
        input: DescribeProcedureInput,
    ) -> DbResult<DescribeProcedureOutput> {
        let connection_id = require_non_blank("connection_id", &input.connection_id)?;
        let name = ObjectName::parse(&input.procedure_name)?;

        let mut conn = self.procedure_connection(connection_id).await?;
        let output = describe_procedure(
            &mut conn,
            &name,
            input.procedure_name.trim(),
            input.include_definition,
        )
        .await?;

        info!(
            connection_id = %connection_id,
            procedure = %output.procedure.qualified_name,
            parameters = output.parameters.len(),
            "Described procedure"
        );

        Ok(output)
    }

    pub async fn list_procedures(
        &self,
        input: ListProceduresInput,
    ) -> DbResult<ListProceduresOutput> {
        let connection_id = require_non_blank("connection_id", &input.connection_id)?;
        let filter = ProcedureFilter::new(input.schema, input.name_pattern);

        let mut conn = self.procedure_connection(connection_id).await?;
        let procedures = conn.list_procedures(&filter).await?;
        let count = procedures.len();

        info!(
            connection_id = %connection_id,
            count = count,
            "Listed procedures"
        );

        Ok(ListProceduresOutput { procedures, count })
    }

    pub async fn get_procedures_batch(
        &self,
        input: ProceduresBatchInput,
    ) -> DbResult<ProcedureBatchesOutput> {
        let connection_id = require_non_blank("connection_id", &input.connection_id)?;
        let batch_size = BatchSize::new(input.batch_size)?;
        let filter = ProcedureFilter::new(input.schema, input.name_pattern);

        let mut conn = self.procedure_connection(connection_id).await?;
        let candidates = conn.list_procedures(&filter).await?;
        debug!(
            connection_id = %connection_id,
            candidates = candidates.len(),
            "Batching procedures"
        );

        let output =
            collect_batches(&mut conn, candidates, batch_size, input.include_definitions).await?;

        info!(
            connection_id = %connection_id,
            total = output.total_procedures,
            batches = output.batch_count,
            "Collected procedure batches"
        );

        Ok(output)
    }

    pub async fn search_procedures(
        &self,
        input: SearchProceduresInput,
    ) -> DbResult<ProcedureSearchOutput> {
        let connection_id = require_non_blank("connection_id", &input.connection_id)?;
        let search_text = require_non_blank("search_text", &input.search_text)?;
        let batch_size = BatchSize::new(input.batch_size)?;
        let filter = ProcedureFilter::new(None, input.name_pattern);

        let mut conn = self.procedure_connection(connection_id).await?;
        let candidates = conn.list_procedures(&filter).await?;

        let output = search_batches(
            &mut conn,
            candidates,
            batch_size,
            search_text,
            input.include_definitions,
        )
        .await?;

        info!(
            connection_id = %connection_id,
            scanned = output.total_procedures,
            matches = output.total_matches,
            "Searched procedure definitions"
        );

        Ok(output)
    }
}
