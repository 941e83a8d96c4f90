//! Catalog lookups.
//!
//! [`CatalogSource`] is the read-only metadata contract the tool handlers are
//! written against. Every method is one parameterized lookup against the
//! backend's catalog views and returns typed rows; no method combines rows
//! from different lookups.
//!
//! # Architecture
//!
//! SQL text lives in the `queries` submodule with constants for each backend.
//! Backend implementations are in their respective submodules (postgres,
//! mysql, sqlite), each providing the same set of functions, and
//! [`CatalogConnection`] routes to them with `impl_db_dispatch!`.

use crate::db::pool::CatalogConnection;
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnDescriptor, ColumnFilter, ConstraintDescriptor, ForeignKeyDescriptor, IndexDescriptor,
    KeyColumnList, ObjectName, ParameterDescriptor, ProcedureDescriptor, ProcedureFilter,
    QualifiedName, TableColumnMatch, TableDescriptor,
};
use std::future::Future;
use tracing::{debug, warn};

/// Read-only catalog lookups over one open connection.
///
/// Lookups taking a [`QualifiedName`] expect the schema resolved by the
/// matching identity lookup (`find_table` / `find_procedure`) and re-resolve
/// the object by name and schema inside their own query.
pub trait CatalogSource: Send {
    /// Resolve a table identity. `None` when no table matches.
    fn find_table(
        &mut self,
        name: &ObjectName,
    ) -> impl Future<Output = DbResult<Option<TableDescriptor>>> + Send;

    /// Columns in ordinal order.
    fn table_columns(
        &mut self,
        table: &QualifiedName,
    ) -> impl Future<Output = DbResult<Vec<ColumnDescriptor>>> + Send;

    /// Indexes that do not back a primary key or unique constraint.
    fn table_indexes(
        &mut self,
        table: &QualifiedName,
    ) -> impl Future<Output = DbResult<Vec<IndexDescriptor>>> + Send;

    /// Primary key and unique constraints.
    fn table_constraints(
        &mut self,
        table: &QualifiedName,
    ) -> impl Future<Output = DbResult<Vec<ConstraintDescriptor>>> + Send;

    fn table_foreign_keys(
        &mut self,
        table: &QualifiedName,
    ) -> impl Future<Output = DbResult<Vec<ForeignKeyDescriptor>>> + Send;

    /// Base tables ordered by schema and name. `None` means every user schema.
    fn list_tables(
        &mut self,
        schema: Option<&str>,
    ) -> impl Future<Output = DbResult<Vec<TableDescriptor>>> + Send;

    fn find_tables_by_column(
        &mut self,
        filter: &ColumnFilter,
    ) -> impl Future<Output = DbResult<Vec<TableColumnMatch>>> + Send;

    /// Resolve a stored procedure identity. `None` when no procedure matches.
    fn find_procedure(
        &mut self,
        name: &ObjectName,
    ) -> impl Future<Output = DbResult<Option<ProcedureDescriptor>>> + Send;

    /// Parameters in ordinal order.
    fn procedure_parameters(
        &mut self,
        procedure: &QualifiedName,
    ) -> impl Future<Output = DbResult<Vec<ParameterDescriptor>>> + Send;

    /// Candidate procedures ordered by schema and name, without definitions.
    fn list_procedures(
        &mut self,
        filter: &ProcedureFilter,
    ) -> impl Future<Output = DbResult<Vec<ProcedureDescriptor>>> + Send;

    /// Source text, `None` when the catalog has no row for the procedure.
    fn procedure_definition(
        &mut self,
        procedure: &QualifiedName,
    ) -> impl Future<Output = DbResult<Option<String>>> + Send;
}

impl CatalogSource for CatalogConnection {
    async fn find_table(&mut self, name: &ObjectName) -> DbResult<Option<TableDescriptor>> {
        impl_db_dispatch!(self, {
            Postgres(c) => postgres::find_table(c, name).await,
            MySql(c) => mysql::find_table(c, name).await,
            SQLite(c) => sqlite::find_table(c, name).await,
        })
    }

    async fn table_columns(&mut self, table: &QualifiedName) -> DbResult<Vec<ColumnDescriptor>> {
        impl_db_dispatch!(self, {
            Postgres(c) => postgres::table_columns(c, table).await,
            MySql(c) => mysql::table_columns(c, table).await,
            SQLite(c) => sqlite::table_columns(c, table).await,
        })
    }

    async fn table_indexes(&mut self, table: &QualifiedName) -> DbResult<Vec<IndexDescriptor>> {
        impl_db_dispatch!(self, {
            Postgres(c) => postgres::table_indexes(c, table).await,
            MySql(c) => mysql::table_indexes(c, table).await,
            SQLite(c) => sqlite::table_indexes(c, table).await,
        })
    }

    async fn table_constraints(
        &mut self,
        table: &QualifiedName,
    ) -> DbResult<Vec<ConstraintDescriptor>> {
        impl_db_dispatch!(self, {
            Postgres(c) => postgres::table_constraints(c, table).await,
            MySql(c) => mysql::table_constraints(c, table).await,
            SQLite(c) => sqlite::table_constraints(c, table).await,
        })
    }

    async fn table_foreign_keys(
        &mut self,
        table: &QualifiedName,
    ) -> DbResult<Vec<ForeignKeyDescriptor>> {
        impl_db_dispatch!(self, {
            Postgres(c) => postgres::table_foreign_keys(c, table).await,
            MySql(c) => mysql::table_foreign_keys(c, table).await,
            SQLite(c) => sqlite::table_foreign_keys(c, table).await,
        })
    }

    async fn list_tables(&mut self, schema: Option<&str>) -> DbResult<Vec<TableDescriptor>> {
        impl_db_dispatch!(self, {
            Postgres(c) => postgres::list_tables(c, schema).await,
            MySql(c) => mysql::list_tables(c, schema).await,
            SQLite(c) => sqlite::list_tables(c, schema).await,
        })
    }

    async fn find_tables_by_column(
        &mut self,
        filter: &ColumnFilter,
    ) -> DbResult<Vec<TableColumnMatch>> {
        impl_db_dispatch!(self, {
            Postgres(c) => postgres::find_tables_by_column(c, filter).await,
            MySql(c) => mysql::find_tables_by_column(c, filter).await,
            SQLite(c) => sqlite::find_tables_by_column(c, filter).await,
        })
    }

    async fn find_procedure(&mut self, name: &ObjectName) -> DbResult<Option<ProcedureDescriptor>> {
        impl_db_dispatch!(self, {
            Postgres(c) => postgres::find_procedure(c, name).await,
            MySql(c) => mysql::find_procedure(c, name).await,
            SQLite(_c) => Err(sqlite::no_procedures()),
        })
    }

    async fn procedure_parameters(
        &mut self,
        procedure: &QualifiedName,
    ) -> DbResult<Vec<ParameterDescriptor>> {
        impl_db_dispatch!(self, {
            Postgres(c) => postgres::procedure_parameters(c, procedure).await,
            MySql(c) => mysql::procedure_parameters(c, procedure).await,
            SQLite(_c) => Err(sqlite::no_procedures()),
        })
    }

    async fn list_procedures(
        &mut self,
        filter: &ProcedureFilter,
    ) -> DbResult<Vec<ProcedureDescriptor>> {
        impl_db_dispatch!(self, {
            Postgres(c) => postgres::list_procedures(c, filter).await,
            MySql(c) => mysql::list_procedures(c, filter).await,
            SQLite(_c) => Err(sqlite::no_procedures()),
        })
    }

    async fn procedure_definition(&mut self, procedure: &QualifiedName) -> DbResult<Option<String>> {
        impl_db_dispatch!(self, {
            Postgres(c) => postgres::procedure_definition(c, procedure).await,
            MySql(c) => mysql::procedure_definition(c, procedure).await,
            SQLite(_c) => Err(sqlite::no_procedures()),
        })
    }
}

// =============================================================================
// SQL Query Templates
// =============================================================================
//
// Key-column lists are aggregated server-side into one comma-joined string per
// structure, ordered by key position. A NULL schema parameter means "any user
// schema".

mod queries {
    pub mod postgres {
        pub const FIND_TABLE: &str = r#"
            SELECT
                c.oid::bigint AS object_id,
                c.relname::text AS table_name,
                n.nspname::text AS schema_name,
                pg_get_userbyid(c.relowner)::text AS owner,
                CASE c.relkind WHEN 'p' THEN 'PARTITIONED TABLE' ELSE 'BASE TABLE' END AS object_kind,
                obj_description(c.oid, 'pg_class') AS description
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE c.relkind IN ('r', 'p')
            AND c.relname = $1
            AND (($2::text IS NULL AND n.nspname NOT IN ('pg_catalog', 'information_schema'))
                 OR n.nspname = $2::text)
            ORDER BY n.nspname <> current_schema(), n.nspname
            LIMIT 1
            "#;

        pub const LIST_TABLES: &str = r#"
            SELECT
                c.oid::bigint AS object_id,
                c.relname::text AS table_name,
                n.nspname::text AS schema_name,
                pg_get_userbyid(c.relowner)::text AS owner,
                CASE c.relkind WHEN 'p' THEN 'PARTITIONED TABLE' ELSE 'BASE TABLE' END AS object_kind,
                obj_description(c.oid, 'pg_class') AS description
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE c.relkind IN ('r', 'p')
            AND NOT c.relispartition
            AND (($1::text IS NULL
                  AND n.nspname NOT IN ('pg_catalog', 'information_schema')
                  AND n.nspname NOT LIKE 'pg\_toast%')
                 OR n.nspname = $1::text)
            ORDER BY n.nspname, c.relname
            "#;

        pub const TABLE_COLUMNS: &str = r#"
            SELECT
                col.column_name::text AS column_name,
                format_type(a.atttypid, a.atttypmod) AS type_name,
                col.character_maximum_length::bigint AS max_length,
                col.numeric_precision::bigint AS numeric_precision,
                col.numeric_scale::bigint AS numeric_scale,
                (col.is_nullable = 'YES') AS is_nullable,
                col_description(c.oid, a.attnum) AS description
            FROM information_schema.columns col
            JOIN pg_namespace n ON n.nspname = col.table_schema
            JOIN pg_class c ON c.relname = col.table_name AND c.relnamespace = n.oid
            JOIN pg_attribute a ON a.attrelid = c.oid AND a.attname = col.column_name
            WHERE col.table_name = $1 AND col.table_schema = $2
            ORDER BY col.ordinal_position
            "#;

        pub const TABLE_INDEXES: &str = r#"
            SELECT
                i.relname::text AS index_name,
                am.amname::text AS index_type,
                ix.indisunique AS is_unique,
                (SELECT string_agg(a.attname::text, ',' ORDER BY k.ord)
                   FROM unnest(ix.indkey::smallint[]) WITH ORDINALITY AS k(attnum, ord)
                   JOIN pg_attribute a ON a.attrelid = ix.indrelid AND a.attnum = k.attnum
                   WHERE k.ord <= ix.indnkeyatts
                ) AS key_columns
            FROM pg_index ix
            JOIN pg_class i ON i.oid = ix.indexrelid
            JOIN pg_class t ON t.oid = ix.indrelid
            JOIN pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_am am ON am.oid = i.relam
            WHERE t.relname = $1 AND n.nspname = $2
            AND NOT EXISTS (
                SELECT 1 FROM pg_constraint con
                WHERE con.conindid = ix.indexrelid
                AND con.conrelid = ix.indrelid
                AND con.contype IN ('p', 'u')
            )
            ORDER BY i.relname
            "#;

        pub const TABLE_CONSTRAINTS: &str = r#"
            SELECT
                con.conname::text AS constraint_name,
                CASE con.contype WHEN 'p' THEN 'PRIMARY KEY' ELSE 'UNIQUE' END AS constraint_type,
                (SELECT string_agg(a.attname::text, ',' ORDER BY k.ord)
                   FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
                   JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
                ) AS key_columns
            FROM pg_constraint con
            JOIN pg_class t ON t.oid = con.conrelid
            JOIN pg_namespace n ON n.oid = t.relnamespace
            WHERE t.relname = $1 AND n.nspname = $2
            AND con.contype IN ('p', 'u')
            ORDER BY con.contype, con.conname
            "#;

        pub const TABLE_FOREIGN_KEYS: &str = r#"
            SELECT
                con.conname::text AS constraint_name,
                n.nspname::text AS schema_name,
                t.relname::text AS table_name,
                rn.nspname::text AS referenced_schema,
                rt.relname::text AS referenced_table,
                (SELECT string_agg(a.attname::text, ',' ORDER BY k.ord)
                   FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
                   JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
                ) AS key_columns,
                (SELECT string_agg(a.attname::text, ',' ORDER BY k.ord)
                   FROM unnest(con.confkey) WITH ORDINALITY AS k(attnum, ord)
                   JOIN pg_attribute a ON a.attrelid = con.confrelid AND a.attnum = k.attnum
                ) AS referenced_columns
            FROM pg_constraint con
            JOIN pg_class t ON t.oid = con.conrelid
            JOIN pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_class rt ON rt.oid = con.confrelid
            JOIN pg_namespace rn ON rn.oid = rt.relnamespace
            WHERE t.relname = $1 AND n.nspname = $2
            AND con.contype = 'f'
            ORDER BY con.conname
            "#;

        pub const FIND_TABLES_BY_COLUMN: &str = r#"
            SELECT
                col.table_schema::text AS schema_name,
                col.table_name::text AS table_name,
                col.column_name::text AS column_name,
                col.data_type::text AS type_name
            FROM information_schema.columns col
            JOIN information_schema.tables t
                ON t.table_schema = col.table_schema
                AND t.table_name = col.table_name
                AND t.table_type = 'BASE TABLE'
            WHERE (CASE WHEN $2::boolean
                        THEN col.column_name::text = $1::text
                        ELSE col.column_name::text LIKE $1::text END)
            AND (($3::text IS NULL AND col.table_schema NOT IN ('pg_catalog', 'information_schema'))
                 OR col.table_schema = $3::text)
            ORDER BY col.table_schema, col.table_name, col.ordinal_position
            "#;

        pub const FIND_PROCEDURE: &str = r#"
            SELECT
                n.nspname::text AS schema_name,
                p.proname::text AS procedure_name,
                obj_description(p.oid, 'pg_proc') AS description
            FROM pg_proc p
            JOIN pg_namespace n ON n.oid = p.pronamespace
            WHERE p.prokind = 'p'
            AND p.proname = $1
            AND (($2::text IS NULL AND n.nspname NOT IN ('pg_catalog', 'information_schema'))
                 OR n.nspname = $2::text)
            ORDER BY n.nspname <> current_schema(), n.nspname, p.oid
            LIMIT 1
            "#;

        /// Overloads share a name; the lowest oid is the one described.
        pub const PROCEDURE_PARAMETERS: &str = r#"
            SELECT
                COALESCE(p.proargnames[k.ord::int], '') AS parameter_name,
                format_type(k.type_oid, NULL) AS type_name,
                CASE COALESCE(p.proargmodes[k.ord::int], 'i')
                    WHEN 'o' THEN 'OUT'
                    WHEN 'b' THEN 'INOUT'
                    WHEN 'v' THEN 'VARIADIC'
                    ELSE 'IN'
                END AS parameter_mode,
                k.ord::bigint AS ordinal
            FROM pg_proc p
            CROSS JOIN LATERAL unnest(COALESCE(p.proallargtypes, p.proargtypes::oid[]))
                WITH ORDINALITY AS k(type_oid, ord)
            WHERE p.oid = (
                SELECT p2.oid FROM pg_proc p2
                JOIN pg_namespace n2 ON n2.oid = p2.pronamespace
                WHERE p2.prokind = 'p' AND p2.proname = $1 AND n2.nspname = $2
                ORDER BY p2.oid
                LIMIT 1
            )
            ORDER BY k.ord
            "#;

        pub const LIST_PROCEDURES: &str = r#"
            SELECT
                n.nspname::text AS schema_name,
                p.proname::text AS procedure_name,
                obj_description(p.oid, 'pg_proc') AS description
            FROM pg_proc p
            JOIN pg_namespace n ON n.oid = p.pronamespace
            WHERE p.prokind = 'p'
            AND (($1::text IS NULL AND n.nspname NOT IN ('pg_catalog', 'information_schema'))
                 OR n.nspname = $1::text)
            AND ($2::text IS NULL OR p.proname::text LIKE $2::text)
            ORDER BY n.nspname, p.proname, p.oid
            "#;

        pub const PROCEDURE_DEFINITION: &str = r#"
            SELECT pg_get_functiondef(p.oid) AS definition
            FROM pg_proc p
            JOIN pg_namespace n ON n.oid = p.pronamespace
            WHERE p.prokind = 'p' AND p.proname = $1 AND n.nspname = $2
            ORDER BY p.oid
            LIMIT 1
            "#;
    }

    pub mod mysql {
        pub const FIND_TABLE: &str = r#"
            SELECT TABLE_NAME, TABLE_SCHEMA, TABLE_TYPE, TABLE_COMMENT
            FROM information_schema.TABLES
            WHERE TABLE_TYPE = 'BASE TABLE'
            AND TABLE_NAME = ?
            AND ((? IS NULL AND TABLE_SCHEMA NOT IN ('mysql', 'sys', 'performance_schema', 'information_schema'))
                 OR TABLE_SCHEMA = ?)
            ORDER BY TABLE_SCHEMA <> DATABASE(), TABLE_SCHEMA
            LIMIT 1
            "#;

        pub const LIST_TABLES: &str = r#"
            SELECT TABLE_NAME, TABLE_SCHEMA, TABLE_TYPE, TABLE_COMMENT
            FROM information_schema.TABLES
            WHERE TABLE_TYPE = 'BASE TABLE'
            AND ((? IS NULL AND TABLE_SCHEMA NOT IN ('mysql', 'sys', 'performance_schema', 'information_schema'))
                 OR TABLE_SCHEMA = ?)
            ORDER BY TABLE_SCHEMA, TABLE_NAME
            "#;

        pub const TABLE_COLUMNS: &str = r#"
            SELECT
                c.COLUMN_NAME,
                c.COLUMN_TYPE,
                CAST(c.CHARACTER_MAXIMUM_LENGTH AS SIGNED) AS MAX_LENGTH,
                CAST(c.NUMERIC_PRECISION AS SIGNED) AS NUMERIC_PRECISION,
                CAST(c.NUMERIC_SCALE AS SIGNED) AS NUMERIC_SCALE,
                c.IS_NULLABLE,
                c.COLUMN_COMMENT
            FROM information_schema.COLUMNS c
            JOIN information_schema.TABLES t
                ON t.TABLE_SCHEMA = c.TABLE_SCHEMA AND t.TABLE_NAME = c.TABLE_NAME
            WHERE t.TABLE_NAME = ? AND t.TABLE_SCHEMA = ?
            ORDER BY c.ORDINAL_POSITION
            "#;

        pub const TABLE_INDEXES: &str = r#"
            SELECT
                s.INDEX_NAME,
                s.INDEX_TYPE,
                CAST(MIN(s.NON_UNIQUE) AS SIGNED) AS NON_UNIQUE,
                GROUP_CONCAT(s.COLUMN_NAME ORDER BY s.SEQ_IN_INDEX SEPARATOR ',') AS KEY_COLUMNS
            FROM information_schema.STATISTICS s
            JOIN information_schema.TABLES t
                ON t.TABLE_SCHEMA = s.TABLE_SCHEMA AND t.TABLE_NAME = s.TABLE_NAME
            WHERE t.TABLE_NAME = ? AND t.TABLE_SCHEMA = ?
            AND NOT EXISTS (
                SELECT 1 FROM information_schema.TABLE_CONSTRAINTS tc
                WHERE tc.TABLE_SCHEMA = s.TABLE_SCHEMA
                AND tc.TABLE_NAME = s.TABLE_NAME
                AND tc.CONSTRAINT_NAME = s.INDEX_NAME
                AND tc.CONSTRAINT_TYPE IN ('PRIMARY KEY', 'UNIQUE')
            )
            GROUP BY s.INDEX_NAME, s.INDEX_TYPE
            ORDER BY s.INDEX_NAME
            "#;

        pub const TABLE_CONSTRAINTS: &str = r#"
            SELECT
                tc.CONSTRAINT_NAME,
                tc.CONSTRAINT_TYPE,
                GROUP_CONCAT(k.COLUMN_NAME ORDER BY k.ORDINAL_POSITION SEPARATOR ',') AS KEY_COLUMNS
            FROM information_schema.TABLE_CONSTRAINTS tc
            LEFT JOIN information_schema.KEY_COLUMN_USAGE k
                ON k.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA
                AND k.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
                AND k.TABLE_SCHEMA = tc.TABLE_SCHEMA
                AND k.TABLE_NAME = tc.TABLE_NAME
            WHERE tc.TABLE_NAME = ? AND tc.TABLE_SCHEMA = ?
            AND tc.CONSTRAINT_TYPE IN ('PRIMARY KEY', 'UNIQUE')
            GROUP BY tc.CONSTRAINT_NAME, tc.CONSTRAINT_TYPE
            ORDER BY tc.CONSTRAINT_TYPE, tc.CONSTRAINT_NAME
            "#;

        pub const TABLE_FOREIGN_KEYS: &str = r#"
            SELECT
                k.CONSTRAINT_NAME,
                k.TABLE_SCHEMA,
                k.TABLE_NAME,
                k.REFERENCED_TABLE_SCHEMA,
                k.REFERENCED_TABLE_NAME,
                GROUP_CONCAT(k.COLUMN_NAME ORDER BY k.ORDINAL_POSITION SEPARATOR ',') AS KEY_COLUMNS,
                GROUP_CONCAT(k.REFERENCED_COLUMN_NAME ORDER BY k.ORDINAL_POSITION SEPARATOR ',') AS REFERENCED_COLUMNS
            FROM information_schema.KEY_COLUMN_USAGE k
            WHERE k.TABLE_NAME = ? AND k.TABLE_SCHEMA = ?
            AND k.REFERENCED_TABLE_NAME IS NOT NULL
            GROUP BY k.CONSTRAINT_NAME, k.TABLE_SCHEMA, k.TABLE_NAME,
                     k.REFERENCED_TABLE_SCHEMA, k.REFERENCED_TABLE_NAME
            ORDER BY k.CONSTRAINT_NAME
            "#;

        pub const FIND_TABLES_BY_COLUMN: &str = r#"
            SELECT c.TABLE_SCHEMA, c.TABLE_NAME, c.COLUMN_NAME, c.COLUMN_TYPE
            FROM information_schema.COLUMNS c
            JOIN information_schema.TABLES t
                ON t.TABLE_SCHEMA = c.TABLE_SCHEMA
                AND t.TABLE_NAME = c.TABLE_NAME
                AND t.TABLE_TYPE = 'BASE TABLE'
            WHERE (CASE WHEN ? THEN c.COLUMN_NAME = ? ELSE c.COLUMN_NAME LIKE ? END)
            AND ((? IS NULL AND c.TABLE_SCHEMA NOT IN ('mysql', 'sys', 'performance_schema', 'information_schema'))
                 OR c.TABLE_SCHEMA = ?)
            ORDER BY c.TABLE_SCHEMA, c.TABLE_NAME, c.ORDINAL_POSITION
            "#;

        pub const FIND_PROCEDURE: &str = r#"
            SELECT ROUTINE_SCHEMA, ROUTINE_NAME, ROUTINE_COMMENT
            FROM information_schema.ROUTINES
            WHERE ROUTINE_TYPE = 'PROCEDURE'
            AND ROUTINE_NAME = ?
            AND ((? IS NULL AND ROUTINE_SCHEMA NOT IN ('mysql', 'sys', 'performance_schema', 'information_schema'))
                 OR ROUTINE_SCHEMA = ?)
            ORDER BY ROUTINE_SCHEMA <> DATABASE(), ROUTINE_SCHEMA
            LIMIT 1
            "#;

        pub const PROCEDURE_PARAMETERS: &str = r#"
            SELECT
                p.PARAMETER_NAME,
                p.DTD_IDENTIFIER,
                p.PARAMETER_MODE,
                CAST(p.ORDINAL_POSITION AS SIGNED) AS ORDINAL_POSITION,
                CAST(p.CHARACTER_MAXIMUM_LENGTH AS SIGNED) AS MAX_LENGTH,
                CAST(p.NUMERIC_PRECISION AS SIGNED) AS NUMERIC_PRECISION,
                CAST(p.NUMERIC_SCALE AS SIGNED) AS NUMERIC_SCALE
            FROM information_schema.PARAMETERS p
            JOIN information_schema.ROUTINES r
                ON r.ROUTINE_SCHEMA = p.SPECIFIC_SCHEMA
                AND r.SPECIFIC_NAME = p.SPECIFIC_NAME
            WHERE r.ROUTINE_TYPE = 'PROCEDURE'
            AND r.ROUTINE_NAME = ? AND r.ROUTINE_SCHEMA = ?
            AND p.ORDINAL_POSITION > 0
            ORDER BY p.ORDINAL_POSITION
            "#;

        pub const LIST_PROCEDURES: &str = r#"
            SELECT ROUTINE_SCHEMA, ROUTINE_NAME, ROUTINE_COMMENT
            FROM information_schema.ROUTINES
            WHERE ROUTINE_TYPE = 'PROCEDURE'
            AND ((? IS NULL AND ROUTINE_SCHEMA NOT IN ('mysql', 'sys', 'performance_schema', 'information_schema'))
                 OR ROUTINE_SCHEMA = ?)
            AND (? IS NULL OR ROUTINE_NAME LIKE ?)
            ORDER BY ROUTINE_SCHEMA, ROUTINE_NAME
            "#;

        pub const PROCEDURE_DEFINITION: &str = r#"
            SELECT ROUTINE_DEFINITION
            FROM information_schema.ROUTINES
            WHERE ROUTINE_TYPE = 'PROCEDURE'
            AND ROUTINE_NAME = ? AND ROUTINE_SCHEMA = ?
            LIMIT 1
            "#;
    }

    pub mod sqlite {
        pub const FIND_TABLE: &str = r#"
            SELECT name, rootpage
            FROM sqlite_master
            WHERE type = 'table'
            AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
            AND name = ? COLLATE NOCASE
            "#;

        pub const LIST_TABLES: &str = r#"
            SELECT name, rootpage
            FROM sqlite_master
            WHERE type = 'table'
            AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
            ORDER BY name
            "#;

        pub const TABLE_COLUMNS: &str = r#"
            SELECT p.name AS column_name, p.type AS type_name, p."notnull" AS not_null
            FROM sqlite_master m, pragma_table_info(m.name) p
            WHERE m.type = 'table' AND m.name = ? COLLATE NOCASE
            ORDER BY p.cid
            "#;

        /// Origin 'c' keeps only CREATE INDEX indexes; 'u' and 'pk' back constraints.
        pub const TABLE_INDEXES: &str = r#"
            SELECT
                il.name AS index_name,
                il."unique" AS is_unique,
                (SELECT group_concat(ii.name, ',' ORDER BY ii.seqno)
                   FROM pragma_index_info(il.name) ii) AS key_columns
            FROM sqlite_master m, pragma_index_list(m.name) il
            WHERE m.type = 'table' AND m.name = ? COLLATE NOCASE
            AND il.origin = 'c'
            ORDER BY il.name
            "#;

        pub const PRIMARY_KEY: &str = r#"
            SELECT group_concat(p.name, ',' ORDER BY p.pk) AS key_columns
            FROM sqlite_master m, pragma_table_info(m.name) p
            WHERE m.type = 'table' AND m.name = ? COLLATE NOCASE
            AND p.pk > 0
            "#;

        pub const UNIQUE_CONSTRAINTS: &str = r#"
            SELECT
                il.name AS constraint_name,
                (SELECT group_concat(ii.name, ',' ORDER BY ii.seqno)
                   FROM pragma_index_info(il.name) ii) AS key_columns
            FROM sqlite_master m, pragma_index_list(m.name) il
            WHERE m.type = 'table' AND m.name = ? COLLATE NOCASE
            AND il.origin = 'u'
            ORDER BY il.name
            "#;

        pub const TABLE_FOREIGN_KEYS: &str = r#"
            SELECT
                fk.id AS fk_id,
                fk."table" AS referenced_table,
                group_concat(fk."from", ',' ORDER BY fk.seq) AS key_columns,
                group_concat(fk."to", ',' ORDER BY fk.seq) AS referenced_columns
            FROM sqlite_master m, pragma_foreign_key_list(m.name) fk
            WHERE m.type = 'table' AND m.name = ? COLLATE NOCASE
            GROUP BY fk.id, fk."table"
            ORDER BY fk.id
            "#;

        pub const FIND_TABLES_BY_COLUMN: &str = r#"
            SELECT m.name AS table_name, p.name AS column_name, p.type AS type_name
            FROM sqlite_master m, pragma_table_info(m.name) p
            WHERE m.type = 'table'
            AND m.name NOT LIKE 'sqlite\_%' ESCAPE '\'
            AND (CASE WHEN ? THEN p.name = ? ELSE p.name LIKE ? END)
            ORDER BY m.name, p.cid
            "#;
    }
}

// =============================================================================
// Backend Implementations
// =============================================================================

mod postgres {
    use super::*;
    use sqlx::postgres::PgRow;
    use sqlx::{PgConnection, Row};

    fn table_from_row(row: &PgRow) -> DbResult<TableDescriptor> {
        let mut table = TableDescriptor::new(
            row.try_get::<String, _>("table_name")?,
            row.try_get::<String, _>("schema_name")?,
            row.try_get::<String, _>("object_kind")?,
        )
        .with_object_id(row.try_get("object_id")?)
        .with_description(row.try_get("description")?);

        if let Some(owner) = row.try_get::<Option<String>, _>("owner")? {
            table = table.with_owner(owner);
        }
        Ok(table)
    }

    fn procedure_from_row(row: &PgRow) -> DbResult<ProcedureDescriptor> {
        Ok(ProcedureDescriptor::new(
            row.try_get::<String, _>("schema_name")?,
            row.try_get::<String, _>("procedure_name")?,
        )
        .with_description(row.try_get("description")?))
    }

    fn key_columns(row: &PgRow, column: &str) -> DbResult<KeyColumnList> {
        let raw: Option<String> = row.try_get(column)?;
        Ok(KeyColumnList::parse(raw.as_deref()))
    }

    pub async fn find_table(
        conn: &mut PgConnection,
        name: &ObjectName,
    ) -> DbResult<Option<TableDescriptor>> {
        let row = sqlx::query(queries::postgres::FIND_TABLE)
            .bind(name.name.as_str())
            .bind(name.schema.as_deref())
            .fetch_optional(&mut *conn)
            .await?;
        row.as_ref().map(table_from_row).transpose()
    }

    pub async fn list_tables(
        conn: &mut PgConnection,
        schema: Option<&str>,
    ) -> DbResult<Vec<TableDescriptor>> {
        let rows = sqlx::query(queries::postgres::LIST_TABLES)
            .bind(schema)
            .fetch_all(&mut *conn)
            .await?;
        let tables = rows.iter().map(table_from_row).collect::<DbResult<Vec<_>>>()?;
        debug!(count = tables.len(), schema = ?schema, "Listed PostgreSQL tables");
        Ok(tables)
    }

    pub async fn table_columns(
        conn: &mut PgConnection,
        table: &QualifiedName,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let rows = sqlx::query(queries::postgres::TABLE_COLUMNS)
            .bind(table.name.as_str())
            .bind(table.schema.as_str())
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(ColumnDescriptor::new(
                    row.try_get::<String, _>("column_name")?,
                    row.try_get::<String, _>("type_name")?,
                    row.try_get::<bool, _>("is_nullable")?,
                )
                .with_max_length(row.try_get("max_length")?)
                .with_numeric(
                    row.try_get("numeric_precision")?,
                    row.try_get("numeric_scale")?,
                )
                .with_description(row.try_get("description")?))
            })
            .collect()
    }

    pub async fn table_indexes(
        conn: &mut PgConnection,
        table: &QualifiedName,
    ) -> DbResult<Vec<IndexDescriptor>> {
        let rows = sqlx::query(queries::postgres::TABLE_INDEXES)
            .bind(table.name.as_str())
            .bind(table.schema.as_str())
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(IndexDescriptor::new(
                    row.try_get::<String, _>("index_name")?,
                    row.try_get::<String, _>("index_type")?,
                    key_columns(row, "key_columns")?,
                )
                .with_unique(row.try_get("is_unique")?))
            })
            .collect()
    }

    pub async fn table_constraints(
        conn: &mut PgConnection,
        table: &QualifiedName,
    ) -> DbResult<Vec<ConstraintDescriptor>> {
        let rows = sqlx::query(queries::postgres::TABLE_CONSTRAINTS)
            .bind(table.name.as_str())
            .bind(table.schema.as_str())
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(ConstraintDescriptor::new(
                    row.try_get::<String, _>("constraint_name")?,
                    row.try_get::<String, _>("constraint_type")?,
                    key_columns(row, "key_columns")?,
                ))
            })
            .collect()
    }

    pub async fn table_foreign_keys(
        conn: &mut PgConnection,
        table: &QualifiedName,
    ) -> DbResult<Vec<ForeignKeyDescriptor>> {
        let rows = sqlx::query(queries::postgres::TABLE_FOREIGN_KEYS)
            .bind(table.name.as_str())
            .bind(table.schema.as_str())
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(ForeignKeyDescriptor {
                    name: row.try_get("constraint_name")?,
                    schema: row.try_get("schema_name")?,
                    table: row.try_get("table_name")?,
                    columns: key_columns(row, "key_columns")?,
                    referenced_schema: row.try_get("referenced_schema")?,
                    referenced_table: row.try_get("referenced_table")?,
                    referenced_columns: key_columns(row, "referenced_columns")?,
                })
            })
            .collect()
    }

    pub async fn find_tables_by_column(
        conn: &mut PgConnection,
        filter: &ColumnFilter,
    ) -> DbResult<Vec<TableColumnMatch>> {
        let rows = sqlx::query(queries::postgres::FIND_TABLES_BY_COLUMN)
            .bind(filter.column_name.as_str())
            .bind(filter.exact_match)
            .bind(filter.schema.as_deref())
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(TableColumnMatch {
                    schema: row.try_get("schema_name")?,
                    table: row.try_get("table_name")?,
                    column: row.try_get("column_name")?,
                    type_name: row.try_get("type_name")?,
                })
            })
            .collect()
    }

    pub async fn find_procedure(
        conn: &mut PgConnection,
        name: &ObjectName,
    ) -> DbResult<Option<ProcedureDescriptor>> {
        let row = sqlx::query(queries::postgres::FIND_PROCEDURE)
            .bind(name.name.as_str())
            .bind(name.schema.as_deref())
            .fetch_optional(&mut *conn)
            .await?;
        row.as_ref().map(procedure_from_row).transpose()
    }

    pub async fn procedure_parameters(
        conn: &mut PgConnection,
        procedure: &QualifiedName,
    ) -> DbResult<Vec<ParameterDescriptor>> {
        let rows = sqlx::query(queries::postgres::PROCEDURE_PARAMETERS)
            .bind(procedure.name.as_str())
            .bind(procedure.schema.as_str())
            .fetch_all(&mut *conn)
            .await?;

        // PostgreSQL drops type modifiers from routine signatures
        rows.iter()
            .map(|row| {
                Ok(ParameterDescriptor {
                    name: row.try_get("parameter_name")?,
                    type_name: row.try_get("type_name")?,
                    mode: row.try_get("parameter_mode")?,
                    ordinal: row.try_get("ordinal")?,
                    max_length: None,
                    precision: None,
                    scale: None,
                })
            })
            .collect()
    }

    pub async fn list_procedures(
        conn: &mut PgConnection,
        filter: &ProcedureFilter,
    ) -> DbResult<Vec<ProcedureDescriptor>> {
        let rows = sqlx::query(queries::postgres::LIST_PROCEDURES)
            .bind(filter.schema.as_deref())
            .bind(filter.name_pattern.as_deref())
            .fetch_all(&mut *conn)
            .await?;
        let procedures = rows
            .iter()
            .map(procedure_from_row)
            .collect::<DbResult<Vec<_>>>()?;
        debug!(count = procedures.len(), "Listed PostgreSQL procedures");
        Ok(procedures)
    }

    pub async fn procedure_definition(
        conn: &mut PgConnection,
        procedure: &QualifiedName,
    ) -> DbResult<Option<String>> {
        let row = sqlx::query(queries::postgres::PROCEDURE_DEFINITION)
            .bind(procedure.name.as_str())
            .bind(procedure.schema.as_str())
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => Ok(row.try_get("definition")?),
            None => Ok(None),
        }
    }
}

mod mysql {
    use super::*;
    use sqlx::mysql::MySqlRow;
    use sqlx::{MySqlConnection, Row};

    /// Safely get a string from a MySQL row.
    /// MySQL may return VARBINARY instead of VARCHAR depending on charset configuration.
    fn get_string(row: &MySqlRow, column: &str) -> String {
        row.try_get::<String, _>(column)
            .ok()
            .or_else(|| {
                row.try_get::<Vec<u8>, _>(column)
                    .ok()
                    .and_then(|bytes| String::from_utf8(bytes).ok())
            })
            .unwrap_or_default()
    }

    fn get_optional_string(row: &MySqlRow, column: &str) -> Option<String> {
        row.try_get::<Option<String>, _>(column)
            .ok()
            .flatten()
            .or_else(|| {
                row.try_get::<Option<Vec<u8>>, _>(column)
                    .ok()
                    .flatten()
                    .and_then(|bytes| String::from_utf8(bytes).ok())
            })
    }

    fn key_columns(row: &MySqlRow, column: &str) -> KeyColumnList {
        KeyColumnList::parse(get_optional_string(row, column).as_deref())
    }

    fn table_from_row(row: &MySqlRow) -> TableDescriptor {
        TableDescriptor::new(
            get_string(row, "TABLE_NAME"),
            get_string(row, "TABLE_SCHEMA"),
            get_string(row, "TABLE_TYPE"),
        )
        .with_description(get_optional_string(row, "TABLE_COMMENT"))
    }

    fn procedure_from_row(row: &MySqlRow) -> ProcedureDescriptor {
        ProcedureDescriptor::new(
            get_string(row, "ROUTINE_SCHEMA"),
            get_string(row, "ROUTINE_NAME"),
        )
        .with_description(get_optional_string(row, "ROUTINE_COMMENT"))
    }

    pub async fn find_table(
        conn: &mut MySqlConnection,
        name: &ObjectName,
    ) -> DbResult<Option<TableDescriptor>> {
        let row = sqlx::query(queries::mysql::FIND_TABLE)
            .bind(name.name.as_str())
            .bind(name.schema.as_deref())
            .bind(name.schema.as_deref())
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.as_ref().map(table_from_row))
    }

    pub async fn list_tables(
        conn: &mut MySqlConnection,
        schema: Option<&str>,
    ) -> DbResult<Vec<TableDescriptor>> {
        let rows = sqlx::query(queries::mysql::LIST_TABLES)
            .bind(schema)
            .bind(schema)
            .fetch_all(&mut *conn)
            .await?;
        let tables: Vec<_> = rows.iter().map(table_from_row).collect();
        debug!(count = tables.len(), schema = ?schema, "Listed MySQL tables");
        Ok(tables)
    }

    pub async fn table_columns(
        conn: &mut MySqlConnection,
        table: &QualifiedName,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let rows = sqlx::query(queries::mysql::TABLE_COLUMNS)
            .bind(table.name.as_str())
            .bind(table.schema.as_str())
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| {
                let nullable = get_string(row, "IS_NULLABLE") == "YES";
                Ok(ColumnDescriptor::new(
                    get_string(row, "COLUMN_NAME"),
                    get_string(row, "COLUMN_TYPE"),
                    nullable,
                )
                .with_max_length(row.try_get("MAX_LENGTH")?)
                .with_numeric(
                    row.try_get("NUMERIC_PRECISION")?,
                    row.try_get("NUMERIC_SCALE")?,
                )
                .with_description(get_optional_string(row, "COLUMN_COMMENT")))
            })
            .collect()
    }

    pub async fn table_indexes(
        conn: &mut MySqlConnection,
        table: &QualifiedName,
    ) -> DbResult<Vec<IndexDescriptor>> {
        let rows = sqlx::query(queries::mysql::TABLE_INDEXES)
            .bind(table.name.as_str())
            .bind(table.schema.as_str())
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| {
                let non_unique: i64 = row.try_get("NON_UNIQUE")?;
                Ok(IndexDescriptor::new(
                    get_string(row, "INDEX_NAME"),
                    get_string(row, "INDEX_TYPE"),
                    key_columns(row, "KEY_COLUMNS"),
                )
                .with_unique(non_unique == 0))
            })
            .collect()
    }

    pub async fn table_constraints(
        conn: &mut MySqlConnection,
        table: &QualifiedName,
    ) -> DbResult<Vec<ConstraintDescriptor>> {
        let rows = sqlx::query(queries::mysql::TABLE_CONSTRAINTS)
            .bind(table.name.as_str())
            .bind(table.schema.as_str())
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                ConstraintDescriptor::new(
                    get_string(row, "CONSTRAINT_NAME"),
                    get_string(row, "CONSTRAINT_TYPE"),
                    key_columns(row, "KEY_COLUMNS"),
                )
            })
            .collect())
    }

    pub async fn table_foreign_keys(
        conn: &mut MySqlConnection,
        table: &QualifiedName,
    ) -> DbResult<Vec<ForeignKeyDescriptor>> {
        let rows = sqlx::query(queries::mysql::TABLE_FOREIGN_KEYS)
            .bind(table.name.as_str())
            .bind(table.schema.as_str())
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows
            .iter()
            .map(|row| ForeignKeyDescriptor {
                name: get_string(row, "CONSTRAINT_NAME"),
                schema: get_string(row, "TABLE_SCHEMA"),
                table: get_string(row, "TABLE_NAME"),
                columns: key_columns(row, "KEY_COLUMNS"),
                referenced_schema: get_string(row, "REFERENCED_TABLE_SCHEMA"),
                referenced_table: get_string(row, "REFERENCED_TABLE_NAME"),
                referenced_columns: key_columns(row, "REFERENCED_COLUMNS"),
            })
            .collect())
    }

    pub async fn find_tables_by_column(
        conn: &mut MySqlConnection,
        filter: &ColumnFilter,
    ) -> DbResult<Vec<TableColumnMatch>> {
        let rows = sqlx::query(queries::mysql::FIND_TABLES_BY_COLUMN)
            .bind(filter.exact_match)
            .bind(filter.column_name.as_str())
            .bind(filter.column_name.as_str())
            .bind(filter.schema.as_deref())
            .bind(filter.schema.as_deref())
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows
            .iter()
            .map(|row| TableColumnMatch {
                schema: get_string(row, "TABLE_SCHEMA"),
                table: get_string(row, "TABLE_NAME"),
                column: get_string(row, "COLUMN_NAME"),
                type_name: get_string(row, "COLUMN_TYPE"),
            })
            .collect())
    }

    pub async fn find_procedure(
        conn: &mut MySqlConnection,
        name: &ObjectName,
    ) -> DbResult<Option<ProcedureDescriptor>> {
        let row = sqlx::query(queries::mysql::FIND_PROCEDURE)
            .bind(name.name.as_str())
            .bind(name.schema.as_deref())
            .bind(name.schema.as_deref())
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.as_ref().map(procedure_from_row))
    }

    pub async fn procedure_parameters(
        conn: &mut MySqlConnection,
        procedure: &QualifiedName,
    ) -> DbResult<Vec<ParameterDescriptor>> {
        let rows = sqlx::query(queries::mysql::PROCEDURE_PARAMETERS)
            .bind(procedure.name.as_str())
            .bind(procedure.schema.as_str())
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(ParameterDescriptor {
                    name: get_string(row, "PARAMETER_NAME"),
                    type_name: get_string(row, "DTD_IDENTIFIER"),
                    mode: get_optional_string(row, "PARAMETER_MODE")
                        .unwrap_or_else(|| "IN".to_string()),
                    ordinal: row.try_get("ORDINAL_POSITION")?,
                    max_length: row.try_get("MAX_LENGTH")?,
                    precision: row.try_get("NUMERIC_PRECISION")?,
                    scale: row.try_get("NUMERIC_SCALE")?,
                })
            })
            .collect()
    }

    pub async fn list_procedures(
        conn: &mut MySqlConnection,
        filter: &ProcedureFilter,
    ) -> DbResult<Vec<ProcedureDescriptor>> {
        let rows = sqlx::query(queries::mysql::LIST_PROCEDURES)
            .bind(filter.schema.as_deref())
            .bind(filter.schema.as_deref())
            .bind(filter.name_pattern.as_deref())
            .bind(filter.name_pattern.as_deref())
            .fetch_all(&mut *conn)
            .await?;
        let procedures: Vec<_> = rows.iter().map(procedure_from_row).collect();
        debug!(count = procedures.len(), "Listed MySQL procedures");
        Ok(procedures)
    }

    pub async fn procedure_definition(
        conn: &mut MySqlConnection,
        procedure: &QualifiedName,
    ) -> DbResult<Option<String>> {
        let row = sqlx::query(queries::mysql::PROCEDURE_DEFINITION)
            .bind(procedure.name.as_str())
            .bind(procedure.schema.as_str())
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row
            .as_ref()
            .and_then(|row| get_optional_string(row, "ROUTINE_DEFINITION")))
    }
}

mod sqlite {
    use super::*;
    use sqlx::sqlite::SqliteRow;
    use sqlx::{Row, SqliteConnection};
    use std::collections::HashMap;

    /// The only schema a SQLite connection reports.
    const MAIN_SCHEMA: &str = "main";

    pub(super) fn no_procedures() -> DbError {
        DbError::invalid_input(
            "SQLite does not support stored procedures. Procedure tools require PostgreSQL or MySQL.",
        )
    }

    fn in_main_schema(schema: Option<&str>) -> bool {
        schema.is_none_or(|s| s.eq_ignore_ascii_case(MAIN_SCHEMA))
    }

    fn table_from_row(row: &SqliteRow) -> DbResult<TableDescriptor> {
        Ok(
            TableDescriptor::new(row.try_get::<String, _>("name")?, MAIN_SCHEMA, "table")
                .with_object_id(row.try_get("rootpage")?),
        )
    }

    fn key_columns(row: &SqliteRow, column: &str) -> DbResult<KeyColumnList> {
        let raw: Option<String> = row.try_get(column)?;
        Ok(KeyColumnList::parse(raw.as_deref()))
    }

    /// Size arguments of a declared type such as `VARCHAR(50)` or `DECIMAL(10,2)`.
    #[derive(Debug, Default, PartialEq, Eq)]
    pub(super) struct DeclaredSize {
        pub max_length: Option<i64>,
        pub precision: Option<i64>,
        pub scale: Option<i64>,
    }

    pub(super) fn parse_declared_size(declared: &str) -> DeclaredSize {
        let Some((base, rest)) = declared.split_once('(') else {
            return DeclaredSize::default();
        };
        let Some(args) = rest.trim_end().strip_suffix(')') else {
            return DeclaredSize::default();
        };

        let args: Vec<Option<i64>> = args.split(',').map(|a| a.trim().parse().ok()).collect();
        let base = base.trim().to_ascii_uppercase();
        let numeric = ["DEC", "NUM", "REAL", "FLOA", "DOUB"]
            .iter()
            .any(|k| base.contains(k));

        match (numeric, args.as_slice()) {
            (true, [precision]) => DeclaredSize {
                precision: *precision,
                ..DeclaredSize::default()
            },
            (false, [length]) => DeclaredSize {
                max_length: *length,
                ..DeclaredSize::default()
            },
            (_, [precision, scale]) => DeclaredSize {
                precision: *precision,
                scale: *scale,
                ..DeclaredSize::default()
            },
            _ => DeclaredSize::default(),
        }
    }

    async fn primary_key_columns(
        conn: &mut SqliteConnection,
        table: &str,
    ) -> DbResult<KeyColumnList> {
        let raw: Option<String> = sqlx::query_scalar(queries::sqlite::PRIMARY_KEY)
            .bind(table)
            .fetch_one(&mut *conn)
            .await?;
        Ok(KeyColumnList::parse(raw.as_deref()))
    }

    pub async fn find_table(
        conn: &mut SqliteConnection,
        name: &ObjectName,
    ) -> DbResult<Option<TableDescriptor>> {
        if !in_main_schema(name.schema.as_deref()) {
            return Ok(None);
        }
        let row = sqlx::query(queries::sqlite::FIND_TABLE)
            .bind(name.name.as_str())
            .fetch_optional(&mut *conn)
            .await?;
        row.as_ref().map(table_from_row).transpose()
    }

    pub async fn list_tables(
        conn: &mut SqliteConnection,
        schema: Option<&str>,
    ) -> DbResult<Vec<TableDescriptor>> {
        if !in_main_schema(schema) {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(queries::sqlite::LIST_TABLES)
            .fetch_all(&mut *conn)
            .await?;
        let tables = rows.iter().map(table_from_row).collect::<DbResult<Vec<_>>>()?;
        debug!(count = tables.len(), "Listed SQLite tables");
        Ok(tables)
    }

    pub async fn table_columns(
        conn: &mut SqliteConnection,
        table: &QualifiedName,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let rows = sqlx::query(queries::sqlite::TABLE_COLUMNS)
            .bind(table.name.as_str())
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| {
                let type_name: String = row
                    .try_get::<Option<String>, _>("type_name")?
                    .unwrap_or_default();
                let not_null: i64 = row.try_get("not_null")?;
                let size = parse_declared_size(&type_name);

                Ok(
                    ColumnDescriptor::new(row.try_get::<String, _>("column_name")?, type_name, not_null == 0)
                        .with_max_length(size.max_length)
                        .with_numeric(size.precision, size.scale),
                )
            })
            .collect()
    }

    pub async fn table_indexes(
        conn: &mut SqliteConnection,
        table: &QualifiedName,
    ) -> DbResult<Vec<IndexDescriptor>> {
        let rows = sqlx::query(queries::sqlite::TABLE_INDEXES)
            .bind(table.name.as_str())
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| {
                let is_unique: i64 = row.try_get("is_unique")?;
                Ok(IndexDescriptor::new(
                    row.try_get::<String, _>("index_name")?,
                    "btree",
                    key_columns(row, "key_columns")?,
                )
                .with_unique(is_unique != 0))
            })
            .collect()
    }

    /// The primary key is synthesized as `PK_<table>`; unique constraints keep
    /// the name of their backing autoindex.
    pub async fn table_constraints(
        conn: &mut SqliteConnection,
        table: &QualifiedName,
    ) -> DbResult<Vec<ConstraintDescriptor>> {
        let mut constraints = Vec::new();

        let primary_key = primary_key_columns(conn, &table.name).await?;
        if !primary_key.is_empty() {
            constraints.push(ConstraintDescriptor::new(
                format!("PK_{}", table.name),
                "PRIMARY KEY",
                primary_key,
            ));
        }

        let rows = sqlx::query(queries::sqlite::UNIQUE_CONSTRAINTS)
            .bind(table.name.as_str())
            .fetch_all(&mut *conn)
            .await?;
        for row in &rows {
            constraints.push(ConstraintDescriptor::new(
                row.try_get::<String, _>("constraint_name")?,
                "UNIQUE",
                key_columns(row, "key_columns")?,
            ));
        }

        Ok(constraints)
    }

    /// Foreign keys are unnamed in SQLite and reported as
    /// `FK_<table>_<referenced>`, suffixed with a counter when one table
    /// references another more than once. References whose target columns
    /// cannot be resolved against the parent's primary key are skipped.
    pub async fn table_foreign_keys(
        conn: &mut SqliteConnection,
        table: &QualifiedName,
    ) -> DbResult<Vec<ForeignKeyDescriptor>> {
        let rows = sqlx::query(queries::sqlite::TABLE_FOREIGN_KEYS)
            .bind(table.name.as_str())
            .fetch_all(&mut *conn)
            .await?;

        let decoded = rows
            .iter()
            .map(|row| {
                Ok((
                    row.try_get::<String, _>("referenced_table")?,
                    key_columns(row, "key_columns")?,
                    key_columns(row, "referenced_columns")?,
                ))
            })
            .collect::<DbResult<Vec<_>>>()?;

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut foreign_keys = Vec::with_capacity(decoded.len());
        for (referenced_table, columns, mut referenced_columns) in decoded {
            // REFERENCES without a column list targets the parent's primary key
            if referenced_columns.is_empty() {
                referenced_columns = primary_key_columns(conn, &referenced_table).await?;
            }
            // SQLite itself rejects such a reference as a foreign key mismatch
            if columns.len() != referenced_columns.len() {
                warn!(
                    table = %table.name,
                    referenced_table = %referenced_table,
                    "Skipping foreign key whose referenced columns cannot be resolved"
                );
                continue;
            }

            let base = format!("FK_{}_{}", table.name, referenced_table);
            let occurrence = seen.entry(base.clone()).or_insert(0);
            *occurrence += 1;
            let name = if *occurrence == 1 {
                base
            } else {
                format!("{}_{}", base, occurrence)
            };

            foreign_keys.push(ForeignKeyDescriptor {
                name,
                schema: MAIN_SCHEMA.to_string(),
                table: table.name.clone(),
                columns,
                referenced_schema: MAIN_SCHEMA.to_string(),
                referenced_table,
                referenced_columns,
            });
        }
        Ok(foreign_keys)
    }

    pub async fn find_tables_by_column(
        conn: &mut SqliteConnection,
        filter: &ColumnFilter,
    ) -> DbResult<Vec<TableColumnMatch>> {
        if !in_main_schema(filter.schema.as_deref()) {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(queries::sqlite::FIND_TABLES_BY_COLUMN)
            .bind(filter.exact_match)
            .bind(filter.column_name.as_str())
            .bind(filter.column_name.as_str())
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(TableColumnMatch {
                    schema: MAIN_SCHEMA.to_string(),
                    table: row.try_get("table_name")?,
                    column: row.try_get("column_name")?,
                    type_name: row
                        .try_get::<Option<String>, _>("type_name")?
                        .unwrap_or_default(),
                })
            })
            .collect()
    }
}
