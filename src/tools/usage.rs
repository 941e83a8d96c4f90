//! Column usage resolution.
//!
//! Cross-references a table's columns with its indexes, constraints and
//! foreign keys. Each structure arrives with its own key-column list, so the
//! join happens here in memory: one scan per column over every structure.

use crate::models::{
    ColumnDescriptor, ConstraintDescriptor, ForeignKeyDescriptor, IndexDescriptor, UsageKind,
    UsageTag,
};
use schemars::JsonSchema;
use serde::Serialize;

/// A column plus every structure that lists it.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AnnotatedColumn {
    #[serde(flatten)]
    pub column: ColumnDescriptor,
    /// `kind:structureName` tags; index first, then constraint, then foreignKey
    #[schemars(with = "Vec<String>")]
    pub usage: Vec<UsageTag>,
}

/// Annotate each column with its usage tags.
///
/// Tags follow the order index, constraint, foreignKey and keep fetch order
/// within each kind. A structure with an empty key list matches no column.
pub fn resolve_usage(
    columns: Vec<ColumnDescriptor>,
    indexes: &[IndexDescriptor],
    constraints: &[ConstraintDescriptor],
    foreign_keys: &[ForeignKeyDescriptor],
) -> Vec<AnnotatedColumn> {
    columns
        .into_iter()
        .map(|column| {
            let name = column.name.as_str();

            let index_tags = indexes
                .iter()
                .filter(|index| index.key_columns.contains(name))
                .map(|index| UsageTag::new(UsageKind::Index, &index.name));
            let constraint_tags = constraints
                .iter()
                .filter(|constraint| constraint.key_columns.contains(name))
                .map(|constraint| UsageTag::new(UsageKind::Constraint, &constraint.name));
            let foreign_key_tags = foreign_keys
                .iter()
                .filter(|fk| fk.columns.contains(name))
                .map(|fk| UsageTag::new(UsageKind::ForeignKey, &fk.name));

            let usage = index_tags
                .chain(constraint_tags)
                .chain(foreign_key_tags)
                .collect();

            AnnotatedColumn { column, usage }
        })
        .collect()
}
