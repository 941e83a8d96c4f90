//! Catalog descriptor models.
//!
//! Typed records built from catalog lookups. Each record is constructed right
//! after its row is fetched and lives only for the duration of one operation.

use crate::error::{DbError, DbResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Object identity as requested by a caller: `name` or `schema.name`.
///
/// A missing schema means "any schema".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectName {
    pub schema: Option<String>,
    pub name: String,
}

impl ObjectName {
    /// Parse `name` or `schema.name`, splitting on the first `.`.
    ///
    /// Surrounding `[]`, `""` or backtick delimiters are removed from each part.
    pub fn parse(raw: &str) -> DbResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DbError::invalid_input("Object name cannot be empty"));
        }

        let (schema, name) = match raw.split_once('.') {
            Some((schema, name)) => (Some(unquote_identifier(schema)), unquote_identifier(name)),
            None => (None, unquote_identifier(raw)),
        };

        if name.is_empty() {
            return Err(DbError::invalid_input(format!(
                "Object name '{}' has an empty name part",
                raw
            )));
        }

        Ok(Self {
            schema: schema.filter(|s| !s.is_empty()),
            name,
        })
    }
}

impl std::fmt::Display for ObjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

fn unquote_identifier(part: &str) -> String {
    let part = part.trim();
    let stripped = part
        .strip_prefix('[')
        .and_then(|p| p.strip_suffix(']'))
        .or_else(|| part.strip_prefix('"').and_then(|p| p.strip_suffix('"')))
        .or_else(|| part.strip_prefix('`').and_then(|p| p.strip_suffix('`')))
        .unwrap_or(part);
    stripped.trim().to_string()
}

/// Object identity with a concrete schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub schema: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Ordered column names of an index, constraint or foreign key.
///
/// Parsed once from the server-side comma-joined string; tokens are trimmed
/// and empty tokens dropped, so a NULL or empty string yields an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct KeyColumnList(Vec<String>);

impl KeyColumnList {
    pub fn parse(raw: Option<&str>) -> Self {
        let columns = raw
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(String::from)
            .collect();
        Self(columns)
    }

    /// Case-sensitive membership test against a trimmed column name.
    pub fn contains(&self, column: &str) -> bool {
        let column = column.trim();
        self.0.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for KeyColumnList {
    fn from(columns: Vec<String>) -> Self {
        Self(columns)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableDescriptor {
    /// Catalog object id (oid on PostgreSQL, root page on SQLite)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<i64>,
    pub name: String,
    pub schema: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// e.g., "BASE TABLE", "PARTITIONED TABLE", "table"
    pub object_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TableDescriptor {
    pub fn new(
        name: impl Into<String>,
        schema: impl Into<String>,
        object_kind: impl Into<String>,
    ) -> Self {
        Self {
            object_id: None,
            name: name.into(),
            schema: schema.into(),
            owner: None,
            object_kind: object_kind.into(),
            description: None,
        }
    }

    pub fn with_object_id(mut self, object_id: i64) -> Self {
        self.object_id = Some(object_id);
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Set the description, ignoring empty strings.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.is_empty());
        self
    }

    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(self.schema.clone(), self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Declared type (e.g., `varchar(30)`, `numeric(10,2)`)
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<i64>,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            max_length: None,
            precision: None,
            scale: None,
            nullable,
            description: None,
        }
    }

    pub fn with_max_length(mut self, max_length: Option<i64>) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_numeric(mut self, precision: Option<i64>, scale: Option<i64>) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    /// Set the description, ignoring empty strings.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.is_empty());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IndexDescriptor {
    pub name: String,
    /// Access method: btree, hash, gin, BTREE, FULLTEXT, ...
    pub index_type: String,
    pub is_unique: bool,
    pub key_columns: KeyColumnList,
}

impl IndexDescriptor {
    pub fn new(
        name: impl Into<String>,
        index_type: impl Into<String>,
        key_columns: KeyColumnList,
    ) -> Self {
        Self {
            name: name.into(),
            index_type: index_type.into(),
            is_unique: false,
            key_columns,
        }
    }

    pub fn with_unique(mut self, is_unique: bool) -> Self {
        self.is_unique = is_unique;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConstraintDescriptor {
    pub name: String,
    /// "PRIMARY KEY" or "UNIQUE"
    pub constraint_type: String,
    pub key_columns: KeyColumnList,
}

impl ConstraintDescriptor {
    pub fn new(
        name: impl Into<String>,
        constraint_type: impl Into<String>,
        key_columns: KeyColumnList,
    ) -> Self {
        Self {
            name: name.into(),
            constraint_type: constraint_type.into(),
            key_columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyDescriptor {
    pub name: String,
    pub schema: String,
    pub table: String,
    /// Local columns, positionally aligned with `referenced_columns`
    pub columns: KeyColumnList,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_columns: KeyColumnList,
}

impl ForeignKeyDescriptor {
    /// Whether both column lists have the same length.
    pub fn is_aligned(&self) -> bool {
        self.columns.len() == self.referenced_columns.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcedureDescriptor {
    pub schema: String,
    pub name: String,
    /// `schema.name`
    pub qualified_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Full source text, only present when requested and found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl ProcedureDescriptor {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        let schema = schema.into();
        let name = name.into();
        Self {
            qualified_name: format!("{}.{}", schema, name),
            schema,
            name,
            description: None,
            definition: None,
        }
    }

    /// Set the description, ignoring empty strings.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.is_empty());
        self
    }

    pub fn with_definition(mut self, definition: Option<String>) -> Self {
        self.definition = definition;
        self
    }

    pub fn identity(&self) -> QualifiedName {
        QualifiedName::new(self.schema.clone(), self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParameterDescriptor {
    /// Empty for unnamed parameters
    pub name: String,
    pub type_name: String,
    /// IN, OUT or INOUT
    pub mode: String,
    /// 1-based position
    pub ordinal: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<i64>,
}

/// A column found by a column-presence search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableColumnMatch {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub type_name: String,
}

/// Server-side filter for procedure candidate lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureFilter {
    /// Exact schema match; `None` means any schema
    pub schema: Option<String>,
    /// SQL LIKE pattern on the procedure name
    pub name_pattern: Option<String>,
}

impl ProcedureFilter {
    pub fn new(schema: Option<String>, name_pattern: Option<String>) -> Self {
        Self {
            schema: schema.filter(|s| !s.trim().is_empty()),
            name_pattern: name_pattern.filter(|p| !p.trim().is_empty()),
        }
    }
}

/// Server-side filter for column-presence searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column_name: String,
    pub schema: Option<String>,
    /// `false` treats `column_name` as a LIKE pattern
    pub exact_match: bool,
}

/// Kind of structure a column can participate in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageKind {
    Index,
    Constraint,
    ForeignKey,
}

impl std::fmt::Display for UsageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index => write!(f, "index"),
            Self::Constraint => write!(f, "constraint"),
            Self::ForeignKey => write!(f, "foreignKey"),
        }
    }
}

/// `kind:structureName`, serialized as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct UsageTag {
    pub kind: UsageKind,
    pub structure: String,
}

impl UsageTag {
    pub fn new(kind: UsageKind, structure: impl Into<String>) -> Self {
        Self {
            kind,
            structure: structure.into(),
        }
    }
}

impl std::fmt::Display for UsageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.structure)
    }
}

impl From<UsageTag> for String {
    fn from(tag: UsageTag) -> Self {
        tag.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_name_with_schema() {
        let name = ObjectName::parse("dbo.Orders").unwrap();
        assert_eq!(name.schema.as_deref(), Some("dbo"));
        assert_eq!(name.name, "Orders");
        assert_eq!(name.to_string(), "dbo.Orders");
    }

    #[test]
    fn test_object_name_without_schema() {
        let name = ObjectName::parse("  Orders ").unwrap();
        assert!(name.schema.is_none());
        assert_eq!(name.name, "Orders");
    }

    #[test]
    fn test_object_name_splits_on_first_dot() {
        let name = ObjectName::parse("sales.Order.Lines").unwrap();
        assert_eq!(name.schema.as_deref(), Some("sales"));
        assert_eq!(name.name, "Order.Lines");
    }

    #[test]
    fn test_object_name_strips_delimiters() {
        let name = ObjectName::parse("[dbo].[Order Details]").unwrap();
        assert_eq!(name.schema.as_deref(), Some("dbo"));
        assert_eq!(name.name, "Order Details");

        let name = ObjectName::parse("\"public\".\"users\"").unwrap();
        assert_eq!(name.schema.as_deref(), Some("public"));
        assert_eq!(name.name, "users");
    }

    #[test]
    fn test_object_name_rejects_blank() {
        assert!(ObjectName::parse("").is_err());
        assert!(ObjectName::parse("   ").is_err());
        assert!(ObjectName::parse("dbo.").is_err());
    }

    #[test]
    fn test_object_name_empty_schema_is_wildcard() {
        let name = ObjectName::parse(".Orders").unwrap();
        assert!(name.schema.is_none());
        assert_eq!(name.name, "Orders");
    }

    #[test]
    fn test_key_column_list_parse() {
        let list = KeyColumnList::parse(Some("OrderId, LineNo ,ProductId"));
        assert_eq!(list.as_slice(), ["OrderId", "LineNo", "ProductId"]);
        assert!(list.contains("LineNo"));
        assert!(list.contains(" LineNo "));
        assert!(!list.contains("lineno"));
    }

    #[test]
    fn test_key_column_list_empty_inputs() {
        assert!(KeyColumnList::parse(None).is_empty());
        assert!(KeyColumnList::parse(Some("")).is_empty());
        assert!(KeyColumnList::parse(Some(" , ")).is_empty());
    }

    #[test]
    fn test_key_column_list_serializes_as_array() {
        let list = KeyColumnList::parse(Some("a,b"));
        assert_eq!(serde_json::to_string(&list).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_usage_tag_format() {
        let tag = UsageTag::new(UsageKind::ForeignKey, "FK_Orders_Customers");
        assert_eq!(tag.to_string(), "foreignKey:FK_Orders_Customers");
        assert_eq!(
            serde_json::to_string(&tag).unwrap(),
            r#""foreignKey:FK_Orders_Customers""#
        );
        assert_eq!(
            UsageTag::new(UsageKind::Index, "IX_A").to_string(),
            "index:IX_A"
        );
        assert_eq!(
            UsageTag::new(UsageKind::Constraint, "PK_A").to_string(),
            "constraint:PK_A"
        );
    }

    #[test]
    fn test_procedure_descriptor_qualified_name() {
        let proc = ProcedureDescriptor::new("dbo", "usp_GetOrders");
        assert_eq!(proc.qualified_name, "dbo.usp_GetOrders");
        assert_eq!(proc.identity(), QualifiedName::new("dbo", "usp_GetOrders"));

        let json = serde_json::to_string(&proc).unwrap();
        assert!(!json.contains("definition"));
    }

    #[test]
    fn test_procedure_filter_drops_blank_values() {
        let filter = ProcedureFilter::new(Some(" ".to_string()), Some("usp_%".to_string()));
        assert!(filter.schema.is_none());
        assert_eq!(filter.name_pattern.as_deref(), Some("usp_%"));
    }

    #[test]
    fn test_foreign_key_alignment() {
        let fk = ForeignKeyDescriptor {
            name: "FK_Lines_Orders".to_string(),
            schema: "dbo".to_string(),
            table: "Lines".to_string(),
            columns: KeyColumnList::parse(Some("OrderId,Region")),
            referenced_schema: "dbo".to_string(),
            referenced_table: "Orders".to_string(),
            referenced_columns: KeyColumnList::parse(Some("Id,Region")),
        };
        assert!(fk.is_aligned());
    }

    #[test]
    fn test_descriptions_ignore_empty() {
        let table = TableDescriptor::new("t", "main", "table").with_description(Some(String::new()));
        assert!(table.description.is_none());

        let column = ColumnDescriptor::new("c", "int", true)
            .with_description(Some("Customer key".to_string()));
        assert_eq!(column.description.as_deref(), Some("Customer key"));
    }
}
