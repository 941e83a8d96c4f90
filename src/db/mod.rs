//! Database access layer.
//!
//! - Connection pool management and per-operation connection checkout
//! - Catalog lookups for tables, columns, keys and stored procedures
//! - Backend dispatch macro shared by the lookups

#[macro_use]
pub mod macros;
pub mod catalog;
pub mod pool;

pub use catalog::CatalogSource;
pub use pool::{CatalogConnection, ConnectionManager, ConnectionSummary, DbPool};
