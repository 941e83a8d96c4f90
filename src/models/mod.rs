//! Data models for the catalog MCP server.
//!
//! This module re-exports all model types used throughout the application.

pub mod catalog;
pub mod connection;

pub use catalog::{
    ColumnDescriptor, ColumnFilter, ConstraintDescriptor, ForeignKeyDescriptor, IndexDescriptor,
    KeyColumnList, ObjectName, ParameterDescriptor, ProcedureDescriptor, ProcedureFilter,
    QualifiedName, TableColumnMatch, TableDescriptor, UsageKind, UsageTag,
};
pub use connection::{ConnectionConfig, ConnectionConfigError, DatabaseType};
