//! Integration tests for catalog tools against a real SQLite file.
//!
//! The database is built with a writable pool, then registered with the
//! connection manager, which opens it read-only.

use catalog_mcp_server::config::PoolOptions;
use catalog_mcp_server::db::ConnectionManager;
use catalog_mcp_server::error::DbError;
use catalog_mcp_server::models::ConnectionConfig;
use catalog_mcp_server::tools::Envelope;
use catalog_mcp_server::tools::procedure::{
    DescribeProcedureInput, ListProceduresInput, ProcedureToolHandler, ProceduresBatchInput,
    SearchProceduresInput,
};
use catalog_mcp_server::tools::schema::{
    DescribeTableInput, FindTablesByColumnInput, ListTablesInput, SchemaToolHandler,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;

const SCHEMA: &[&str] = &[
    "CREATE TABLE Customers (
        Id INTEGER PRIMARY KEY,
        Email VARCHAR(120) NOT NULL UNIQUE,
        Name TEXT
    )",
    "CREATE TABLE Orders (
        Id INTEGER PRIMARY KEY,
        CustomerId INTEGER NOT NULL REFERENCES Customers(Id),
        Total DECIMAL(10,2),
        Notes TEXT
    )",
    "CREATE INDEX IX_Orders_CustomerId ON Orders(CustomerId)",
    "CREATE TABLE OrderLines (
        OrderId INTEGER NOT NULL,
        LineNo INTEGER NOT NULL,
        Sku VARCHAR(40),
        PRIMARY KEY (OrderId, LineNo),
        FOREIGN KEY (OrderId) REFERENCES Orders
    )",
];

/// Build the fixture database and register it as connection "catalog".
///
/// The returned directory must outlive the manager.
async fn setup_catalog() -> (TempDir, Arc<ConnectionManager>) {
    setup_database(SCHEMA).await
}

async fn setup_database(statements: &[&str]) -> (TempDir, Arc<ConnectionManager>) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("catalog.db").display());

    {
        let options = SqliteConnectOptions::from_str(&url)
            .unwrap()
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        for statement in statements {
            sqlx::query(statement).execute(&pool).await.unwrap();
        }
        pool.close().await;
    }

    let pool_options = PoolOptions {
        acquire_timeout_secs: Some(2),
        ..PoolOptions::default()
    };
    let config =
        ConnectionConfig::new("catalog", url, Some("catalog".to_string()), pool_options).unwrap();

    let manager = Arc::new(ConnectionManager::new());
    manager.connect(config).await.unwrap();
    (dir, manager)
}

fn describe(table_name: &str) -> DescribeTableInput {
    DescribeTableInput {
        connection_id: "catalog".to_string(),
        table_name: table_name.to_string(),
    }
}

fn usage_of(output: &serde_json::Value, column: &str) -> Vec<String> {
    output["columns"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == column)
        .unwrap()["usage"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_connection_summary() {
    let (_dir, manager) = setup_catalog().await;
    let connections = manager.list_connections_detail().await;
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].id, "catalog");
    assert!(!connections[0].supports_procedures);
    assert!(connections[0].server_version.is_some());
}

#[tokio::test]
async fn test_describe_table_annotates_usage() {
    let (_dir, manager) = setup_catalog().await;
    let handler = SchemaToolHandler::new(manager);

    let output = handler.describe_table(describe("main.Orders")).await.unwrap();
    assert_eq!(output.table.name, "Orders");
    assert_eq!(output.table.schema, "main");
    assert!(output.table.object_id.is_some());

    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(usage_of(&json, "Id"), vec!["constraint:PK_Orders"]);
    assert_eq!(
        usage_of(&json, "CustomerId"),
        vec!["index:IX_Orders_CustomerId", "foreignKey:FK_Orders_Customers"]
    );
    assert!(usage_of(&json, "Notes").is_empty());

    let total = output
        .columns
        .iter()
        .find(|c| c.column.name == "Total")
        .unwrap();
    assert_eq!(total.column.precision, Some(10));
    assert_eq!(total.column.scale, Some(2));
    assert!(total.column.nullable);

    assert_eq!(output.indexes.len(), 1);
    assert_eq!(output.foreign_keys.len(), 1);
    let fk = &output.foreign_keys[0];
    assert_eq!(fk.referenced_table, "Customers");
    assert_eq!(fk.referenced_columns.as_slice(), ["Id"]);
}

#[tokio::test]
async fn test_unique_constraint_not_reported_as_index() {
    let (_dir, manager) = setup_catalog().await;
    let handler = SchemaToolHandler::new(manager);

    let output = handler.describe_table(describe("Customers")).await.unwrap();

    assert!(output.indexes.is_empty());
    let types: Vec<&str> = output
        .constraints
        .iter()
        .map(|c| c.constraint_type.as_str())
        .collect();
    assert_eq!(types, vec!["PRIMARY KEY", "UNIQUE"]);

    let email = output
        .columns
        .iter()
        .find(|c| c.column.name == "Email")
        .unwrap();
    assert_eq!(email.column.max_length, Some(120));
    assert!(!email.column.nullable);
    assert_eq!(email.usage.len(), 1);
    assert!(email.usage[0].to_string().starts_with("constraint:"));
}

#[tokio::test]
async fn test_composite_key_and_implicit_reference() {
    let (_dir, manager) = setup_catalog().await;
    let handler = SchemaToolHandler::new(manager);

    let output = handler.describe_table(describe("OrderLines")).await.unwrap();

    assert!(output.indexes.is_empty());
    assert_eq!(output.constraints.len(), 1);
    assert_eq!(
        output.constraints[0].key_columns.as_slice(),
        ["OrderId", "LineNo"]
    );

    let fk = &output.foreign_keys[0];
    assert_eq!(fk.name, "FK_OrderLines_Orders");
    assert_eq!(fk.columns.as_slice(), ["OrderId"]);
    assert_eq!(fk.referenced_columns.as_slice(), ["Id"]);
    assert!(fk.is_aligned());

    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(
        usage_of(&json, "OrderId"),
        vec!["constraint:PK_OrderLines", "foreignKey:FK_OrderLines_Orders"]
    );
    assert_eq!(usage_of(&json, "LineNo"), vec!["constraint:PK_OrderLines"]);
}

#[tokio::test]
async fn test_unresolvable_reference_is_skipped() {
    // Parent has no primary key, so the bare REFERENCES has no target columns
    let (_dir, manager) = setup_database(&[
        "CREATE TABLE Parent (Code TEXT)",
        "CREATE TABLE Child (
            ParentCode TEXT REFERENCES Parent,
            OwnerId INTEGER REFERENCES Customers(Id)
        )",
        "CREATE TABLE Customers (Id INTEGER PRIMARY KEY)",
    ])
    .await;
    let handler = SchemaToolHandler::new(manager);

    let output = handler.describe_table(describe("Child")).await.unwrap();

    assert_eq!(output.foreign_keys.len(), 1);
    let fk = &output.foreign_keys[0];
    assert_eq!(fk.name, "FK_Child_Customers");
    assert!(fk.is_aligned());

    let json = serde_json::to_value(&output).unwrap();
    assert!(usage_of(&json, "ParentCode").is_empty());
    assert_eq!(usage_of(&json, "OwnerId"), vec!["foreignKey:FK_Child_Customers"]);
}

#[tokio::test]
async fn test_describe_missing_table_names_request() {
    let (_dir, manager) = setup_catalog().await;
    let handler = SchemaToolHandler::new(manager);

    let result = handler.describe_table(describe("dbo.Invoices")).await;
    let envelope = Envelope::from_result("describe_table", result);

    assert!(!envelope.is_success());
    assert!(envelope.data().is_none());
    assert!(envelope.error().unwrap().contains("dbo.Invoices"));
}

#[tokio::test]
async fn test_connection_released_after_not_found() {
    // SQLite pools hold a single connection, so a leaked checkout would time out
    let (_dir, manager) = setup_catalog().await;
    let handler = SchemaToolHandler::new(manager);

    for _ in 0..3 {
        let err = handler.describe_table(describe("Missing")).await.unwrap_err();
        assert!(matches!(err, DbError::ObjectNotFound { .. }));
    }
    assert!(handler.describe_table(describe("Orders")).await.is_ok());
}

#[tokio::test]
async fn test_describe_table_other_schema_not_found() {
    let (_dir, manager) = setup_catalog().await;
    let handler = SchemaToolHandler::new(manager);
    let err = handler
        .describe_table(describe("sales.Orders"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("sales.Orders"));
}

#[tokio::test]
async fn test_list_tables() {
    let (_dir, manager) = setup_catalog().await;
    let handler = SchemaToolHandler::new(manager);

    let output = handler
        .list_tables(ListTablesInput {
            connection_id: "catalog".to_string(),
            schema: None,
        })
        .await
        .unwrap();

    let names: Vec<&str> = output.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Customers", "OrderLines", "Orders"]);
    assert_eq!(output.count, 3);

    let other = handler
        .list_tables(ListTablesInput {
            connection_id: "catalog".to_string(),
            schema: Some("archive".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(other.count, 0);
}

#[tokio::test]
async fn test_find_tables_by_column() {
    let (_dir, manager) = setup_catalog().await;
    let handler = SchemaToolHandler::new(manager);

    let exact = handler
        .find_tables_by_column(FindTablesByColumnInput {
            connection_id: "catalog".to_string(),
            column_name: "OrderId".to_string(),
            schema: None,
            exact_match: true,
        })
        .await
        .unwrap();
    assert_eq!(exact.match_count, 1);
    assert_eq!(exact.matches[0].table, "OrderLines");
    assert_eq!(exact.matches[0].schema, "main");

    let pattern = handler
        .find_tables_by_column(FindTablesByColumnInput {
            connection_id: "catalog".to_string(),
            column_name: "%Id".to_string(),
            schema: None,
            exact_match: false,
        })
        .await
        .unwrap();
    assert_eq!(pattern.match_count, 4);
    assert_eq!(pattern.table_count, 3);
}

#[tokio::test]
async fn test_procedure_tools_rejected_on_sqlite() {
    let (_dir, manager) = setup_catalog().await;
    let handler = ProcedureToolHandler::new(manager);

    let err = handler
        .describe_procedure(DescribeProcedureInput {
            connection_id: "catalog".to_string(),
            procedure_name: "usp_refresh".to_string(),
            include_definition: true,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidInput { .. }));

    let err = handler
        .list_procedures(ListProceduresInput {
            connection_id: "catalog".to_string(),
            schema: None,
            name_pattern: None,
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("does not support stored procedures"));

    let err = handler
        .search_procedures(SearchProceduresInput {
            connection_id: "catalog".to_string(),
            search_text: "Orders".to_string(),
            name_pattern: None,
            batch_size: 10,
            include_definitions: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_batch_size_validation_wins() {
    let (_dir, manager) = setup_catalog().await;
    let handler = ProcedureToolHandler::new(manager);

    let result = handler
        .get_procedures_batch(ProceduresBatchInput {
            connection_id: "catalog".to_string(),
            batch_size: -1,
            schema: None,
            name_pattern: None,
            include_definitions: true,
        })
        .await;
    let envelope = Envelope::from_result("get_procedures_batch", result);

    assert!(!envelope.is_success());
    assert!(envelope.error().unwrap().contains("batch_size"));
}

#[tokio::test]
async fn test_repeated_describe_is_identical() {
    let (_dir, manager) = setup_catalog().await;
    let handler = SchemaToolHandler::new(manager);

    let first = handler.describe_table(describe("Orders")).await.unwrap();
    let second = handler.describe_table(describe("orders")).await.unwrap();

    assert_eq!(
        serde_json::to_value(Envelope::success(first)).unwrap(),
        serde_json::to_value(Envelope::success(second)).unwrap()
    );
}
