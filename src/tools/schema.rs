//! Table introspection tools.
//!
//! This module implements the `describe_table`, `list_tables` and
//! `find_tables_by_column` MCP tools.

use crate::db::{CatalogSource, ConnectionManager};
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnFilter, ConstraintDescriptor, ForeignKeyDescriptor, IndexDescriptor, ObjectName,
    TableColumnMatch, TableDescriptor,
};
use crate::tools::require_non_blank;
use crate::tools::usage::{AnnotatedColumn, resolve_usage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// Table name, optionally schema-qualified (e.g., `dbo.Orders`, `[sales].[Orders]`)
    pub table_name: String,
}

/// Output from the describe_table tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DescribeTableOutput {
    pub table: TableDescriptor,
    /// Columns in ordinal order, each with the structures that reference it
    pub columns: Vec<AnnotatedColumn>,
    /// Indexes not backing a primary key or unique constraint
    pub indexes: Vec<IndexDescriptor>,
    /// Primary key and unique constraints
    pub constraints: Vec<ConstraintDescriptor>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

/// Input for the list_tables tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// Only list tables in this schema. Default: all user schemas
    #[serde(default)]
    pub schema: Option<String>,
}

/// Output from the list_tables tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    pub tables: Vec<TableDescriptor>,
    pub count: usize,
}

/// Input for the find_tables_by_column tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FindTablesByColumnInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// Column name, or a LIKE pattern when exact_match is false (e.g., `%customer%`)
    pub column_name: String,
    /// Only search this schema. Default: all user schemas
    #[serde(default)]
    pub schema: Option<String>,
    /// Match the column name exactly. Default: true
    #[serde(default = "default_true")]
    pub exact_match: bool,
}

/// Output from the find_tables_by_column tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct FindTablesByColumnOutput {
    pub matches: Vec<TableColumnMatch>,
    pub match_count: usize,
    /// Distinct tables among the matches
    pub table_count: usize,
}

fn default_true() -> bool {
    true
}

/// Describe one table over an open catalog source.
///
/// When the identity lookup finds nothing, fails with a not-found error that
/// names `requested` and issues no further lookups.
pub async fn describe_table<S: CatalogSource>(
    source: &mut S,
    name: &ObjectName,
    requested: &str,
) -> DbResult<DescribeTableOutput> {
    let Some(table) = source.find_table(name).await? else {
        return Err(DbError::table_not_found(requested));
    };

    let qualified = table.qualified_name();
    let columns = source.table_columns(&qualified).await?;
    let indexes = source.table_indexes(&qualified).await?;
    let constraints = source.table_constraints(&qualified).await?;
    let foreign_keys = source.table_foreign_keys(&qualified).await?;

    if let Some(fk) = foreign_keys.iter().find(|fk| !fk.is_aligned()) {
        return Err(DbError::internal(format!(
            "Foreign key {} on {} maps {} columns to {} referenced columns",
            fk.name,
            qualified,
            fk.columns.len(),
            fk.referenced_columns.len()
        )));
    }

    let columns = resolve_usage(columns, &indexes, &constraints, &foreign_keys);

    Ok(DescribeTableOutput {
        table,
        columns,
        indexes,
        constraints,
        foreign_keys,
    })
}

pub struct SchemaToolHandler {
    connection_manager: Arc<ConnectionManager>,
}

impl SchemaToolHandler {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    pub async fn describe_table(&self, input: DescribeTableInput) -> DbResult<DescribeTableOutput> {
        let connection_id = require_non_blank("connection_id", &input.connection_id)?;
        let name = ObjectName::parse(&input.table_name)?;

        let mut conn = self.connection_manager.acquire(connection_id).await?;
        let output = describe_table(&mut conn, &name, input.table_name.trim()).await?;

        info!(
            connection_id = %connection_id,
            table = %output.table.qualified_name(),
            columns = output.columns.len(),
            indexes = output.indexes.len(),
            constraints = output.constraints.len(),
            foreign_keys = output.foreign_keys.len(),
            "Described table"
        );

        Ok(output)
    }

    pub async fn list_tables(&self, input: ListTablesInput) -> DbResult<ListTablesOutput> {
        let connection_id = require_non_blank("connection_id", &input.connection_id)?;
        let schema = input.schema.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let mut conn = self.connection_manager.acquire(connection_id).await?;
        let tables = conn.list_tables(schema).await?;
        let count = tables.len();

        info!(
            connection_id = %connection_id,
            count = count,
            "Listed tables"
        );

        Ok(ListTablesOutput { tables, count })
    }

    pub async fn find_tables_by_column(
        &self,
        input: FindTablesByColumnInput,
    ) -> DbResult<FindTablesByColumnOutput> {
        let connection_id = require_non_blank("connection_id", &input.connection_id)?;
        let column_name = require_non_blank("column_name", &input.column_name)?;
        let filter = ColumnFilter {
            column_name: column_name.to_string(),
            schema: input
                .schema
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            exact_match: input.exact_match,
        };

        let mut conn = self.connection_manager.acquire(connection_id).await?;
        let matches = conn.find_tables_by_column(&filter).await?;

        let table_count = matches
            .iter()
            .map(|m| (m.schema.as_str(), m.table.as_str()))
            .collect::<HashSet<_>>()
            .len();
        let match_count = matches.len();

        info!(
            connection_id = %connection_id,
            column = %filter.column_name,
            matches = match_count,
            tables = table_count,
            "Found tables by column"
        );

        Ok(FindTablesByColumnOutput {
            matches,
            match_count,
            table_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnDescriptor, KeyColumnList};
    use crate::tools::test_support::{RecordingSource, TableFixture};

    fn keys(raw: &str) -> KeyColumnList {
        KeyColumnList::parse(Some(raw))
    }

    fn orders_fixture() -> TableFixture {
        TableFixture {
            table: TableDescriptor::new("Orders", "dbo", "BASE TABLE").with_object_id(42),
            columns: vec![
                ColumnDescriptor::new("Id", "int", false),
                ColumnDescriptor::new("CustomerId", "int", false),
                ColumnDescriptor::new("Notes", "varchar(200)", true).with_max_length(Some(200)),
            ],
            indexes: vec![IndexDescriptor::new(
                "IX_Orders_CustomerId",
                "btree",
                keys("CustomerId"),
            )],
            constraints: vec![ConstraintDescriptor::new(
                "PK_Orders",
                "PRIMARY KEY",
                keys("Id"),
            )],
            foreign_keys: vec![ForeignKeyDescriptor {
                name: "FK_Orders_Customers".to_string(),
                schema: "dbo".to_string(),
                table: "Orders".to_string(),
                columns: keys("CustomerId"),
                referenced_schema: "dbo".to_string(),
                referenced_table: "Customers".to_string(),
                referenced_columns: keys("Id"),
            }],
        }
    }

    #[tokio::test]
    async fn test_describe_table_annotates_columns() {
        let mut source = RecordingSource::default().with_table(orders_fixture());
        let name = ObjectName::parse("dbo.Orders").unwrap();

        let output = describe_table(&mut source, &name, "dbo.Orders")
            .await
            .unwrap();

        assert_eq!(output.table.name, "Orders");
        let customer = &output.columns[1];
        assert_eq!(customer.column.name, "CustomerId");
        let usage: Vec<String> = customer.usage.iter().map(ToString::to_string).collect();
        assert_eq!(
            usage,
            vec!["index:IX_Orders_CustomerId", "foreignKey:FK_Orders_Customers"]
        );
        assert!(output.columns[2].usage.is_empty());
        assert_eq!(output.indexes.len(), 1);
        assert_eq!(output.constraints.len(), 1);
        assert_eq!(output.foreign_keys.len(), 1);
        assert_eq!(
            source.calls(),
            &[
                "find_table",
                "table_columns",
                "table_indexes",
                "table_constraints",
                "table_foreign_keys"
            ]
        );
    }

    #[tokio::test]
    async fn test_describe_table_rejects_misaligned_foreign_key() {
        let mut fixture = orders_fixture();
        fixture.foreign_keys[0].referenced_columns = keys("");
        let mut source = RecordingSource::default().with_table(fixture);
        let name = ObjectName::parse("dbo.Orders").unwrap();

        let err = describe_table(&mut source, &name, "dbo.Orders")
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Internal { .. }));
        assert!(err.to_string().contains("FK_Orders_Customers"));
    }

    #[tokio::test]
    async fn test_describe_table_without_schema_matches_any() {
        let mut source = RecordingSource::default().with_table(orders_fixture());
        let name = ObjectName::parse("[Orders]").unwrap();
        let output = describe_table(&mut source, &name, "[Orders]").await.unwrap();
        assert_eq!(output.table.schema, "dbo");
    }

    #[tokio::test]
    async fn test_describe_missing_table_short_circuits() {
        let mut source = RecordingSource::default().with_table(orders_fixture());
        let name = ObjectName::parse("dbo.Missing").unwrap();

        let err = describe_table(&mut source, &name, "dbo.Missing")
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::ObjectNotFound { .. }));
        assert!(err.to_string().contains("dbo.Missing"));
        assert_eq!(source.calls(), &["find_table"]);
    }

    #[tokio::test]
    async fn test_describe_table_wrong_schema_not_found() {
        let mut source = RecordingSource::default().with_table(orders_fixture());
        let name = ObjectName::parse("sales.Orders").unwrap();
        let err = describe_table(&mut source, &name, "sales.Orders")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("sales.Orders"));
    }

    #[tokio::test]
    async fn test_describe_table_is_repeatable() {
        let mut source = RecordingSource::default().with_table(orders_fixture());
        let name = ObjectName::parse("dbo.Orders").unwrap();

        let first = describe_table(&mut source, &name, "dbo.Orders").await.unwrap();
        let second = describe_table(&mut source, &name, "dbo.Orders").await.unwrap();

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn test_describe_output_serializes_usage_as_strings() {
        let fixture = orders_fixture();
        let columns = resolve_usage(
            fixture.columns,
            &fixture.indexes,
            &fixture.constraints,
            &fixture.foreign_keys,
        );
        let json = serde_json::to_value(&columns[0]).unwrap();
        assert_eq!(json["name"], "Id");
        assert_eq!(json["usage"], serde_json::json!(["constraint:PK_Orders"]));
    }

    #[tokio::test]
    async fn test_handler_rejects_blank_table_name() {
        let handler = SchemaToolHandler::new(Arc::new(ConnectionManager::new()));
        let err = handler
            .describe_table(DescribeTableInput {
                connection_id: "main".to_string(),
                table_name: "   ".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_handler_rejects_blank_connection_id() {
        let handler = SchemaToolHandler::new(Arc::new(ConnectionManager::new()));
        let err = handler
            .list_tables(ListTablesInput {
                connection_id: " ".to_string(),
                schema: None,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection_id"));
    }

    #[tokio::test]
    async fn test_handler_unknown_connection() {
        let handler = SchemaToolHandler::new(Arc::new(ConnectionManager::new()));
        let err = handler
            .find_tables_by_column(FindTablesByColumnInput {
                connection_id: "nope".to_string(),
                column_name: "id".to_string(),
                schema: None,
                exact_match: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ConnectionNotFound { .. }));
    }
}
