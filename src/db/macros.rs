//! Backend dispatch macro.
//!
//! Catalog lookups are written once per backend; this macro routes a
//! [`CatalogConnection`](crate::db::pool::CatalogConnection) to the matching
//! implementation without hand-writing the same match in every method.

/// Generate match arms over `CatalogConnection` variants.
///
/// # Example
///
/// ```ignore
/// impl_db_dispatch!(conn, {
///     MySql(c) => mysql::find_table(c, name).await,
///     Postgres(c) => postgres::find_table(c, name).await,
///     SQLite(c) => sqlite::find_table(c, name).await,
/// });
/// ```
#[macro_export]
macro_rules! impl_db_dispatch {
    ($conn:expr, { $($variant:ident($c:ident) => $body:expr),+ $(,)? }) => {
        match $conn {
            $(
                $crate::db::pool::CatalogConnection::$variant($c) => $body,
            )+
        }
    };
}

pub use impl_db_dispatch;
