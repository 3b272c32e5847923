//! Pure translation of structured intent into parameterized commands.
//!
//! Every operation returns a [`Command`]; none performs I/O. The trust
//! boundary is explicit: identifiers (table, column, and schema names)
//! are developer-controlled and interpolated into the SQL text, while
//! values are data-controlled and always bound as parameters.

use serde_json::Value;

use crate::command::{Command, Params};
use crate::error::{CommandError, Result};
use crate::filter::{Filter, TypeHint};
use crate::schema::{ColumnDefinition, TableDefinition};

/// An ORDER BY column list, convertible from a single column
/// expression or a sequence of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderColumns(Vec<String>);

impl OrderColumns {
    fn render(&self) -> String {
        self.0.join(",")
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for OrderColumns {
    fn from(column: &str) -> Self {
        Self(vec![column.to_string()])
    }
}

impl From<String> for OrderColumns {
    fn from(column: String) -> Self {
        Self(vec![column])
    }
}

impl From<Vec<String>> for OrderColumns {
    fn from(columns: Vec<String>) -> Self {
        Self(columns)
    }
}

impl From<Vec<&str>> for OrderColumns {
    fn from(columns: Vec<&str>) -> Self {
        Self(columns.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for OrderColumns {
    fn from(columns: &[&str]) -> Self {
        Self(columns.iter().map(|c| (*c).to_string()).collect())
    }
}

/// Options for a SELECT built by [`CommandTranslator::read`].
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    equals: Filter,
    greater_than: Filter,
    less_than: Filter,
    take: Option<u64>,
    skip: u64,
    order_by: OrderColumns,
    descending: bool,
    columns: Option<String>,
}

impl ReadOptions {
    /// Creates options for an unfiltered `SELECT *`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Equality predicates (`column = value`).
    #[must_use]
    pub fn equals(mut self, filter: Filter) -> Self {
        self.equals = filter;
        self
    }

    /// Greater-than predicates (`column > value`).
    #[must_use]
    pub fn greater_than(mut self, filter: Filter) -> Self {
        self.greater_than = filter;
        self
    }

    /// Less-than predicates (`column < value`).
    #[must_use]
    pub fn less_than(mut self, filter: Filter) -> Self {
        self.less_than = filter;
        self
    }

    /// Caps the number of returned rows (LIMIT).
    #[must_use]
    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    /// Skips rows before returning (OFFSET); 0 emits nothing.
    #[must_use]
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Orders by one column expression or a sequence of them.
    #[must_use]
    pub fn order_by(mut self, columns: impl Into<OrderColumns>) -> Self {
        self.order_by = columns.into();
        self
    }

    /// Sorts descending. Only takes effect when an order is set;
    /// without one, no direction clause is emitted at all.
    #[must_use]
    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    /// Overrides the projected column expression (default `*`).
    #[must_use]
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }
}

/// Translates definitions and predicate dictionaries into commands.
///
/// Stateless; one instance can serve any number of operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandTranslator;

impl CommandTranslator {
    /// Creates a translator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Builds a command from raw SQL with `@name` placeholders and a
    /// value map. See [`Command::parameterized`].
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder has no matching value.
    pub fn raw(&self, sql: &str, values: &Params) -> Result<Command> {
        Command::parameterized(sql, values)
    }

    /// Builds `CREATE TABLE` DDL for a declared table.
    ///
    /// Columns render in canonical order. Constraint groups are
    /// appended only when non-empty: one named constraint per foreign
    /// key, one aggregated primary-key constraint, and one aggregated
    /// unique constraint, never one unique constraint per column.
    #[must_use]
    pub fn create_table(&self, table: &TableDefinition) -> Command {
        let columns = table
            .columns()
            .iter()
            .map(ColumnDefinition::render)
            .collect::<Vec<_>>()
            .join(", ");

        let mut constraints: Vec<String> = table
            .foreign_keys()
            .iter()
            .map(|fk| {
                let referenced_name = fk
                    .referenced_table
                    .rsplit('.')
                    .next()
                    .unwrap_or(&fk.referenced_table);
                format!(
                    "CONSTRAINT fk_{}_{}_{} FOREIGN KEY({}) REFERENCES {}({})",
                    fk.column,
                    referenced_name,
                    fk.referenced_column,
                    fk.column,
                    fk.referenced_table,
                    fk.referenced_column
                )
            })
            .collect();

        let primary_key: Vec<&str> = table.primary_key_columns().map(ColumnDefinition::name).collect();
        if !primary_key.is_empty() {
            constraints.push(format!(
                "CONSTRAINT {}_pk PRIMARY KEY ({})",
                table.name(),
                primary_key.join(", ")
            ));
        }

        let unique: Vec<&str> = table.unique_columns().map(ColumnDefinition::name).collect();
        if !unique.is_empty() {
            constraints.push(format!(
                "CONSTRAINT {}_unique UNIQUE({})",
                table.name(),
                unique.join(",")
            ));
        }

        let constraints = if constraints.is_empty() {
            String::new()
        } else {
            format!(", {}", constraints.join(", "))
        };

        Command::plain(format!(
            "CREATE TABLE {} ({columns}{constraints});",
            table.qualified_name()
        ))
    }

    /// Builds `INSERT INTO table (keys) VALUES (binds)`.
    ///
    /// Keys render in sorted order. A key prefixed `searchable` has
    /// its bind wrapped in a text-search-vector conversion, a type
    /// hint encoded in the key name rather than a separate parameter.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EmptySet`] when `data` has no values.
    pub fn insert(&self, table: &str, data: &Params) -> Result<Command> {
        if data.is_empty() {
            return Err(CommandError::EmptySet(table.to_string()));
        }
        let mut values = Params::new();
        let mut keys = Vec::with_capacity(data.len());
        let mut binds = Vec::with_capacity(data.len());

        for (key, value) in data {
            let bind_key = key.trim_matches('"').to_string();
            if bind_key.starts_with("searchable") {
                binds.push(format!("to_tsvector(@{bind_key})"));
            } else {
                binds.push(format!("@{bind_key}"));
            }
            keys.push(key.as_str());
            values.insert(bind_key, value.clone());
        }

        self.raw(
            &format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                keys.join(", "),
                binds.join(", ")
            ),
            &values,
        )
    }

    /// Builds `DELETE FROM table WHERE ...` with the `where_`
    /// parameter namespace.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EmptyWhere`] for an empty predicate
    /// set; an unconditioned DELETE must be written as raw SQL.
    pub fn delete(&self, table: &str, where_equals: &Filter) -> Result<Command> {
        if where_equals.is_empty() {
            return Err(CommandError::EmptyWhere(table.to_string()));
        }
        let mut values = Params::new();
        let mut conditions = Vec::new();
        append_predicates(where_equals, "where", "=", &mut conditions, &mut values);
        self.raw(
            &format!("DELETE FROM {table} WHERE {}", conditions.join(" AND ")),
            &values,
        )
    }

    /// Builds `UPDATE table SET ... WHERE ...`.
    ///
    /// SET assignments use the `set_` namespace and conditions the
    /// `where_` namespace, so the same column appearing in both
    /// clauses never collides.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EmptySet`] or
    /// [`CommandError::EmptyWhere`] when either side is empty.
    pub fn update(&self, table: &str, updates: &Filter, where_equals: &Filter) -> Result<Command> {
        if updates.is_empty() {
            return Err(CommandError::EmptySet(table.to_string()));
        }
        if where_equals.is_empty() {
            return Err(CommandError::EmptyWhere(table.to_string()));
        }
        let mut values = Params::new();
        let mut assignments = Vec::new();
        let mut conditions = Vec::new();
        append_predicates(updates, "set", "=", &mut assignments, &mut values);
        append_predicates(where_equals, "where", "=", &mut conditions, &mut values);
        self.raw(
            &format!(
                "UPDATE {table} SET {} WHERE {}",
                assignments.join(", "),
                conditions.join(" AND ")
            ),
            &values,
        )
    }

    /// Builds a SELECT from [`ReadOptions`].
    ///
    /// Predicate groups use their own namespace and operator
    /// (`where_`/`=`, `gt_`/`>`, `lt_`/`<`) and are conjoined with
    /// `AND`. A direction clause is emitted only when an order is
    /// present; OFFSET only when the skip is non-zero; LIMIT only
    /// when a take is set.
    ///
    /// # Errors
    ///
    /// Propagates placeholder/value mismatches from command
    /// construction.
    pub fn read(&self, table: &str, options: &ReadOptions) -> Result<Command> {
        let mut values = Params::new();
        let mut conditions = Vec::new();
        append_predicates(&options.equals, "where", "=", &mut conditions, &mut values);
        append_predicates(&options.greater_than, "gt", ">", &mut conditions, &mut values);
        append_predicates(&options.less_than, "lt", "<", &mut conditions, &mut values);

        let columns = options.columns.as_deref().unwrap_or("*");
        let mut sql = format!("SELECT {columns} FROM {table}");

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        if !options.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&options.order_by.render());
            sql.push_str(if options.descending { " DESC" } else { " ASC" });
        }
        if options.skip > 0 {
            sql.push_str(&format!(" OFFSET {}", options.skip));
        }
        if let Some(take) = options.take {
            sql.push_str(&format!(" LIMIT {take}"));
        }
        sql.push(';');

        self.raw(&sql, &values)
    }

    /// Builds the information-schema introspection query for one
    /// table's columns, ordered by table then column name for
    /// determinism.
    ///
    /// # Errors
    ///
    /// Propagates placeholder/value mismatches from command
    /// construction.
    pub fn table_schema(&self, catalog: &str, schema: &str, table: &str) -> Result<Command> {
        let mut values = Params::new();
        values.insert("schema_name".to_string(), Value::String(schema.to_string()));
        values.insert(
            "table_catalog".to_string(),
            Value::String(catalog.to_string()),
        );
        values.insert("table_name".to_string(), Value::String(table.to_string()));
        self.raw(
            "SELECT column_name, udt_name, is_nullable, character_octet_length \
             FROM information_schema.columns \
             WHERE table_schema = @schema_name \
             AND table_catalog = @table_catalog \
             AND table_name = @table_name \
             ORDER BY table_name, column_name;",
            &values,
        )
    }

    /// Builds `ALTER TABLE ... ADD COLUMN` for one declared column.
    #[must_use]
    pub fn add_column(&self, table: &str, column: &ColumnDefinition) -> Command {
        Command::plain(format!("ALTER TABLE {table} ADD COLUMN {}", column.render()))
    }

    /// Builds `ALTER TABLE ... DROP COLUMN`.
    #[must_use]
    pub fn drop_column(&self, table: &str, column: &ColumnDefinition) -> Command {
        Command::plain(format!("ALTER TABLE {table} DROP COLUMN {}", column.name()))
    }

    /// Builds a column type change with an explicit cast of the
    /// existing data.
    #[must_use]
    pub fn alter_column_type(&self, table: &str, column: &ColumnDefinition) -> Command {
        let new_type = column.sql_type();
        Command::plain(format!(
            "ALTER TABLE {table} ALTER COLUMN {} TYPE {new_type} USING {}::{new_type}",
            column.name(),
            column.name()
        ))
    }

    /// Builds a nullability change matching the declared column.
    #[must_use]
    pub fn alter_column_nullable(&self, table: &str, column: &ColumnDefinition) -> Command {
        let action = if column.is_nullable() {
            "DROP NOT NULL"
        } else {
            "SET NOT NULL"
        };
        Command::plain(format!(
            "ALTER TABLE {table} ALTER COLUMN {} {action}",
            column.name()
        ))
    }

    /// Builds `DROP TABLE`, optionally tolerant of a missing table.
    #[must_use]
    pub fn drop_table(&self, table: &str, if_exists: bool) -> Command {
        if if_exists {
            Command::plain(format!("DROP TABLE IF EXISTS {table};"))
        } else {
            Command::plain(format!("DROP TABLE {table};"))
        }
    }

    /// Builds `CREATE SCHEMA`.
    #[must_use]
    pub fn create_schema(&self, schema: &str) -> Command {
        Command::plain(format!("CREATE SCHEMA {schema};"))
    }

    /// Builds `DROP SCHEMA ... CASCADE`, tolerant of a missing schema.
    #[must_use]
    pub fn drop_schema(&self, schema: &str) -> Command {
        Command::plain(format!("DROP SCHEMA IF EXISTS {schema} CASCADE;"))
    }
}

/// Renders one predicate group into fragments and namespaced
/// parameters. The parameter key is `prefix_column` with any quoting
/// stripped from the column so the key stays word-shaped.
fn append_predicates(
    filter: &Filter,
    prefix: &str,
    operator: &str,
    fragments: &mut Vec<String>,
    values: &mut Params,
) {
    for (column, hint, value) in filter.iter() {
        let key = format!("{prefix}_{}", column.trim_matches('"'));
        match hint {
            TypeHint::Plain => {
                fragments.push(format!("{column} {operator} @{key}"));
            }
            TypeHint::TsVector => {
                fragments.push(format!(
                    "{column} {operator} to_tsvector('english', @{key})"
                ));
            }
        }
        values.insert(key, value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn predicate_keys_are_namespaced_and_unquoted() {
        let filter = Filter::new().value("\"user\"", "bob");
        let mut fragments = Vec::new();
        let mut values = Params::new();
        append_predicates(&filter, "where", "=", &mut fragments, &mut values);
        assert_eq!(fragments, ["\"user\" = @where_user"]);
        assert_eq!(values.get("where_user"), Some(&json!("bob")));
    }

    #[test]
    fn tsvector_predicate_wraps_the_bind() {
        let filter = Filter::new().ts_vector("body", "hello");
        let mut fragments = Vec::new();
        let mut values = Params::new();
        append_predicates(&filter, "set", "=", &mut fragments, &mut values);
        assert_eq!(fragments, ["body = to_tsvector('english', @set_body)"]);
    }
}
