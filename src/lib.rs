//! Catalog MCP Server Library
//!
//! MCP (Model Context Protocol) tools for read-only catalog introspection of
//! SQL databases (PostgreSQL, MySQL, SQLite): table descriptions with column
//! usage, column search, and stored procedure listing, batching and search.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::CatalogService;
