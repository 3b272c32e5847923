//! Declared table shapes: column and table definitions.
//!
//! A [`ColumnDefinition`] is canonicalized at construction (quoting,
//! type aliasing), and its rendered text form `name TYPE(len)
//! NULL|NOT NULL` is the stated contract for both equality and
//! ordering. Equality is structural over the fields that form renders;
//! the primary-key and unique flags are constraint-level and excluded,
//! since introspected columns never carry them.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{CommandError, Result};

/// Column names that collide with reserved words and must be quoted.
const RESERVED: &[&str] = &["user", "object"];

/// Fixed alias table collapsing engine type spellings to one canonical
/// form. Keyed on the uppercased input spelling.
const TYPE_ALIASES: &[(&str, &str)] = &[
    ("INT4", "INT"),
    ("INTEGER", "INT"),
    ("INT8", "BIGINT"),
    ("INT2", "SMALLINT"),
    ("BOOLEAN", "BOOL"),
    ("FLOAT4", "REAL"),
    ("FLOAT8", "DOUBLE PRECISION"),
    ("BPCHAR", "CHAR"),
];

/// Canonicalizes a column name: reserved words are double-quoted,
/// everything else passes through. Already-quoted names are left alone,
/// so the quoted form is the single internal representation.
fn canonical_name(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("\"{name}\"")
    } else {
        name.to_string()
    }
}

/// Canonicalizes a data type spelling through the alias table.
fn canonical_type(data_type: &str) -> String {
    let upper = data_type.to_uppercase();
    TYPE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == upper)
        .map_or(upper, |(_, canonical)| (*canonical).to_string())
}

/// The desired shape of one table column.
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    name: String,
    data_type: String,
    nullable: bool,
    primary_key: bool,
    unique: bool,
    length: u32,
}

impl ColumnDefinition {
    /// Creates a column definition. The name is quoted if it collides
    /// with a reserved word; the type is normalized to its canonical
    /// spelling. Columns default to NOT NULL with no length.
    #[must_use]
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: canonical_name(name),
            data_type: canonical_type(data_type),
            nullable: false,
            primary_key: false,
            unique: false,
            length: 0,
        }
    }

    /// Sets whether the column accepts NULL.
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Marks the column as part of the table's primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column as part of the table's unique constraint.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets an explicit length; 0 means "no explicit length".
    #[must_use]
    pub fn length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    /// The canonical (possibly quoted) column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column name with any quoting stripped, for use in contexts
    /// that need a word-shaped token (parameter keys, constraint names).
    #[must_use]
    pub fn bare_name(&self) -> &str {
        self.name.trim_matches('"')
    }

    /// The canonical data type spelling, without length.
    #[must_use]
    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    /// Whether the column accepts NULL.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether the column is primary-key-flagged.
    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Whether the column is unique-flagged.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// The declared length; 0 means unspecified.
    #[must_use]
    pub fn declared_length(&self) -> u32 {
        self.length
    }

    /// The type as rendered in SQL: `TYPE(length)` or bare `TYPE`.
    #[must_use]
    pub fn sql_type(&self) -> String {
        if self.length > 0 {
            format!("{}({})", self.data_type, self.length)
        } else {
            self.data_type.clone()
        }
    }

    /// The canonical rendered form: `name TYPE(length) NULL|NOT NULL`.
    #[must_use]
    pub fn render(&self) -> String {
        let null = if self.nullable { "NULL" } else { "NOT NULL" };
        format!("{} {} {}", self.name, self.sql_type(), null)
    }
}

impl fmt::Display for ColumnDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl PartialEq for ColumnDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.data_type == other.data_type
            && self.nullable == other.nullable
            && self.length == other.length
    }
}

impl Eq for ColumnDefinition {}

impl PartialOrd for ColumnDefinition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ColumnDefinition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.render().cmp(&other.render())
    }
}

/// A foreign-key triple: local column, referenced table, referenced
/// column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// The local column the constraint applies to.
    pub column: String,
    /// The referenced table name.
    pub referenced_table: String,
    /// The referenced column name.
    pub referenced_column: String,
}

impl ForeignKey {
    /// Creates a foreign-key reference.
    #[must_use]
    pub fn new(column: &str, referenced_table: &str, referenced_column: &str) -> Self {
        Self {
            column: column.to_string(),
            referenced_table: referenced_table.to_string(),
            referenced_column: referenced_column.to_string(),
        }
    }
}

/// The desired shape of one table.
///
/// Columns are canonically sorted at construction so generated DDL has
/// a deterministic column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    name: String,
    schema: Option<String>,
    columns: Vec<ColumnDefinition>,
    foreign_keys: Vec<ForeignKey>,
    post_create: Vec<String>,
}

impl TableDefinition {
    /// Creates a table definition, sorting columns into canonical
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::DuplicateColumn`] if two columns share
    /// a name.
    pub fn new(name: &str, mut columns: Vec<ColumnDefinition>) -> Result<Self> {
        columns.sort();
        for pair in columns.windows(2) {
            if pair[0].name() == pair[1].name() {
                return Err(CommandError::DuplicateColumn {
                    table: name.to_string(),
                    column: pair[0].name().to_string(),
                });
            }
        }
        Ok(Self {
            name: name.to_string(),
            schema: None,
            columns,
            foreign_keys: Vec::new(),
            post_create: Vec::new(),
        })
    }

    /// Qualifies the table with a schema.
    #[must_use]
    pub fn in_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    /// Adds a foreign-key constraint.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Adds a raw SQL script to run once after creation.
    #[must_use]
    pub fn post_create(mut self, sql: &str) -> Self {
        self.post_create.push(sql.to_string());
        self
    }

    /// The unqualified table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema the table lives in, if declared.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// The rendered table reference: `schema.name` or bare `name`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// The columns in canonical order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// The declared foreign keys.
    #[must_use]
    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// The post-creation scripts.
    #[must_use]
    pub fn post_create_scripts(&self) -> &[String] {
        &self.post_create
    }

    /// Looks up a column by name. The probe is canonicalized the same
    /// way column names are at construction, so reserved-word columns
    /// resolve whether probed raw or pre-quoted.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        let probe = canonical_name(name);
        self.columns.iter().find(|c| c.name() == probe)
    }

    /// The primary-key-flagged columns, in canonical order.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.is_primary_key())
    }

    /// The unique-flagged columns, in canonical order.
    pub fn unique_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.is_unique())
    }
}

impl fmt::Display for TableDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names_are_quoted_once() {
        let col = ColumnDefinition::new("user", "TEXT");
        assert_eq!(col.name(), "\"user\"");
        assert_eq!(col.bare_name(), "user");

        let plain = ColumnDefinition::new("email", "TEXT");
        assert_eq!(plain.name(), "email");
    }

    #[test]
    fn types_collapse_to_canonical_spellings() {
        assert_eq!(ColumnDefinition::new("a", "int4").data_type(), "INT");
        assert_eq!(ColumnDefinition::new("a", "Integer").data_type(), "INT");
        assert_eq!(ColumnDefinition::new("a", "int8").data_type(), "BIGINT");
        assert_eq!(ColumnDefinition::new("a", "boolean").data_type(), "BOOL");
        assert_eq!(ColumnDefinition::new("a", "varchar").data_type(), "VARCHAR");
    }

    #[test]
    fn render_matches_contract() {
        let col = ColumnDefinition::new("status", "varchar").length(10);
        assert_eq!(col.render(), "status VARCHAR(10) NOT NULL");
        assert_eq!(
            col.nullable(true).render(),
            "status VARCHAR(10) NULL"
        );
        assert_eq!(
            ColumnDefinition::new("id", "INT").render(),
            "id INT NOT NULL"
        );
    }

    #[test]
    fn equality_ignores_constraint_flags() {
        let declared = ColumnDefinition::new("id", "INT").primary_key().unique();
        let introspected = ColumnDefinition::new("id", "int4");
        assert_eq!(declared, introspected);
    }

    #[test]
    fn equality_sees_nullability_and_length() {
        let a = ColumnDefinition::new("status", "VARCHAR").length(10);
        assert_ne!(a.clone(), a.clone().nullable(true));
        assert_ne!(a.clone(), a.clone().length(20));
    }

    #[test]
    fn ordering_follows_rendered_text() {
        let mut cols = vec![
            ColumnDefinition::new("week", "INT"),
            ColumnDefinition::new("day", "INT"),
        ];
        cols.sort();
        assert_eq!(cols[0].name(), "day");
    }

    #[test]
    fn table_sorts_columns_at_construction() {
        let table = TableDefinition::new(
            "t",
            vec![
                ColumnDefinition::new("zeta", "INT"),
                ColumnDefinition::new("alpha", "INT"),
            ],
        )
        .unwrap();
        assert_eq!(table.columns()[0].name(), "alpha");
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let err = TableDefinition::new(
            "t",
            vec![
                ColumnDefinition::new("id", "INT"),
                ColumnDefinition::new("id", "int4"),
            ],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CommandError::DuplicateColumn { table, column } if table == "t" && column == "id"
        ));
    }

    #[test]
    fn lookup_resolves_reserved_columns_consistently() {
        let table = TableDefinition::new("t", vec![ColumnDefinition::new("user", "TEXT")]).unwrap();
        assert!(table.column("user").is_some());
        assert!(table.column("\"user\"").is_some());
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn qualified_name_includes_schema() {
        let table = TableDefinition::new("events", vec![]).unwrap().in_schema("app");
        assert_eq!(table.qualified_name(), "app.events");
        assert_eq!(table.to_string(), "app.events");
    }
}
