//! MCP service implementation using rmcp.
//!
//! This module defines the CatalogService struct with all catalog tools
//! exposed via the MCP protocol using the rmcp framework's macros. Every tool
//! is read-only and returns an [`Envelope`] instead of a protocol error, so
//! callers see failures as data.

use crate::db::{ConnectionManager, ConnectionSummary};
use crate::tools::envelope::Envelope;
use crate::tools::pipeline::{ProcedureBatchesOutput, ProcedureSearchOutput};
use crate::tools::procedure::{
    DescribeProcedureInput, DescribeProcedureOutput, ListProceduresInput, ListProceduresOutput,
    ProcedureToolHandler, ProceduresBatchInput, SearchProceduresInput,
};
use crate::tools::schema::{
    DescribeTableInput, DescribeTableOutput, FindTablesByColumnInput, FindTablesByColumnOutput,
    ListTablesInput, ListTablesOutput, SchemaToolHandler,
};
use rmcp::Json;
use rmcp::{
    ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    schemars::JsonSchema,
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use std::sync::Arc;

/// Output for the list_connections tool.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ListConnectionsOutput {
    /// List of available database connections
    pub connections: Vec<ConnectionSummary>,
    /// Number of connections
    pub count: usize,
}

#[derive(Clone)]
pub struct CatalogService {
    /// Shared connection manager for all catalog operations
    connection_manager: Arc<ConnectionManager>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl CatalogService {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self {
            connection_manager,
            tool_router: Self::tool_router(),
        }
    }

    fn schema_handler(&self) -> SchemaToolHandler {
        SchemaToolHandler::new(self.connection_manager.clone())
    }

    fn procedure_handler(&self) -> ProcedureToolHandler {
        ProcedureToolHandler::new(self.connection_manager.clone())
    }
}

#[tool_router]
impl CatalogService {
    #[tool(
        description = "List all available database connections.\nReturns connection IDs, database types (MySQL/PostgreSQL/SQLite), and whether stored procedures are supported.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn list_connections(&self) -> Json<Envelope<ListConnectionsOutput>> {
        let connections = self.connection_manager.list_connections_detail().await;
        let count = connections.len();
        Json(Envelope::success(ListConnectionsOutput { connections, count }))
    }

    #[tool(
        description = "Describe a table: identity, columns, indexes, primary/unique constraints, and foreign keys.\nEach column carries a `usage` list of `index:<name>`, `constraint:<name>` and `foreignKey:<name>` tags.\n`table_name` may be schema-qualified (`schema.table`); without a schema every user schema is searched.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Json<Envelope<DescribeTableOutput>> {
        let result = self.schema_handler().describe_table(input).await;
        Json(Envelope::from_result("describe_table", result))
    }

    #[tool(
        description = "List base tables, ordered by schema and name.\nOptionally restrict to one schema.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn list_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Json<Envelope<ListTablesOutput>> {
        let result = self.schema_handler().list_tables(input).await;
        Json(Envelope::from_result("list_tables", result))
    }

    #[tool(
        description = "Find tables that have a given column.\nWith exact_match=false, column_name is a SQL LIKE pattern (e.g., `%customer%`).",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn find_tables_by_column(
        &self,
        Parameters(input): Parameters<FindTablesByColumnInput>,
    ) -> Json<Envelope<FindTablesByColumnOutput>> {
        let result = self.schema_handler().find_tables_by_column(input).await;
        Json(Envelope::from_result("find_tables_by_column", result))
    }

    #[tool(
        description = "Describe a stored procedure: identity, parameters, and (by default) its source text.\nPostgreSQL and MySQL only.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn describe_procedure(
        &self,
        Parameters(input): Parameters<DescribeProcedureInput>,
    ) -> Json<Envelope<DescribeProcedureOutput>> {
        let result = self.procedure_handler().describe_procedure(input).await;
        Json(Envelope::from_result("describe_procedure", result))
    }

    #[tool(
        description = "List stored procedures, optionally filtered by schema and a SQL LIKE name pattern.\nDefinitions are not included. PostgreSQL and MySQL only.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn list_procedures(
        &self,
        Parameters(input): Parameters<ListProceduresInput>,
    ) -> Json<Envelope<ListProceduresOutput>> {
        let result = self.procedure_handler().list_procedures(input).await;
        Json(Envelope::from_result("list_procedures", result))
    }

    #[tool(
        description = "Return stored procedures split into fixed-size batches, optionally with their source text.\nbatch_size must be positive (default 100). PostgreSQL and MySQL only.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn get_procedures_batch(
        &self,
        Parameters(input): Parameters<ProceduresBatchInput>,
    ) -> Json<Envelope<ProcedureBatchesOutput>> {
        let result = self.procedure_handler().get_procedures_batch(input).await;
        Json(Envelope::from_result("get_procedures_batch", result))
    }

    #[tool(
        description = "Search stored procedure source text (case-insensitive).\nCandidates are scanned in batches; each match carries the first matching line as `reference_summary`.\nPostgreSQL and MySQL only.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn search_procedures(
        &self,
        Parameters(input): Parameters<SearchProceduresInput>,
    ) -> Json<Envelope<ProcedureSearchOutput>> {
        let result = self.procedure_handler().search_procedures(input).await;
        Json(Envelope::from_result("search_procedures", result))
    }
}

#[tool_handler]
impl ServerHandler for CatalogService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "catalog-mcp-server".to_owned(),
                title: Some("Catalog MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only catalog introspection for SQL databases.\n\
                \n\
                ## Workflow\n\
                1. Call `list_connections` to get available database IDs\n\
                2. Use the `connection_id` from step 1 in all other tool calls\n\
                \n\
                ## Results\n\
                Every tool returns `{ success, data?, error? }`. Check `success` before reading `data`.\n\
                \n\
                ## Tables\n\
                - `list_tables` / `find_tables_by_column` to locate tables\n\
                - `describe_table` for columns annotated with the indexes, constraints and foreign keys that use them\n\
                \n\
                ## Stored Procedures (PostgreSQL and MySQL)\n\
                - `list_procedures` for names, `describe_procedure` for parameters and source\n\
                - `get_procedures_batch` to page through many procedures\n\
                - `search_procedures` to find procedures whose source mentions some text"
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> CatalogService {
        CatalogService::new(Arc::new(ConnectionManager::new()))
    }

    #[test]
    fn test_server_info() {
        let service = create_test_service();
        let info = service.get_info();
        assert_eq!(info.server_info.name, "catalog-mcp-server");
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn test_all_tools_registered_read_only() {
        let service = create_test_service();
        let tools = service.tool_router.list_all();
        let mut names: Vec<String> = tools.iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "describe_procedure",
                "describe_table",
                "find_tables_by_column",
                "get_procedures_batch",
                "list_connections",
                "list_procedures",
                "list_tables",
                "search_procedures",
            ]
        );
        for tool in &tools {
            let annotations = tool.annotations.as_ref().unwrap();
            assert_eq!(annotations.read_only_hint, Some(true));
            assert_eq!(annotations.destructive_hint, Some(false));
            assert_eq!(annotations.idempotent_hint, Some(true));
        }
    }

    #[tokio::test]
    async fn test_list_connections_empty() {
        let service = create_test_service();
        let Json(envelope) = service.list_connections().await;
        assert!(envelope.is_success());
        assert_eq!(envelope.data().unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_unknown_connection_is_failure_envelope() {
        let service = create_test_service();
        let Json(envelope) = service
            .describe_table(Parameters(DescribeTableInput {
                connection_id: "missing".to_string(),
                table_name: "orders".to_string(),
            }))
            .await;
        assert!(!envelope.is_success());
        assert!(envelope.error().unwrap().contains("missing"));
    }
}
