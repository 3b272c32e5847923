//! The database facade: translator and executor composed into the
//! CRUD/DDL surface applications call.

use pgmend_core::{
    ColumnDefinition, Command, CommandTranslator, Filter, Params, ReadOptions, TableDefinition,
    to_params,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::confirm::Confirm;
use crate::error::Result;
use crate::executor::{CommandExecutor, ConnectConfig};
use crate::reconciler::{PlannedAction, SchemaReconciler};
use crate::record::Record;

/// The length value `information_schema` reports for unbounded
/// character columns; normalized to "no explicit length".
const UNBOUNDED_LENGTH: i64 = 1_073_741_824;

/// A Postgres database handle combining command translation and
/// execution.
///
/// Each operation runs on an ephemeral connection unless the caller
/// brackets a batch between [`connect`](Self::connect) and
/// [`dispose`](Self::dispose).
pub struct Database {
    executor: CommandExecutor,
    translator: CommandTranslator,
}

impl Database {
    /// Creates a handle for the configured database. Nothing is
    /// opened until the first call.
    #[must_use]
    pub fn new(config: ConnectConfig) -> Self {
        Self {
            executor: CommandExecutor::new(config),
            translator: CommandTranslator::new(),
        }
    }

    /// The configured database (catalog) name.
    #[must_use]
    pub fn database(&self) -> &str {
        self.executor.database()
    }

    /// Opens a caller-managed connection for a batch of calls.
    ///
    /// # Errors
    ///
    /// Returns a driver error if the connection cannot be opened.
    pub async fn connect(&mut self) -> Result<()> {
        self.executor.connect().await
    }

    /// Closes the caller-managed connection. Idempotent.
    pub async fn dispose(&mut self) {
        self.executor.dispose().await;
    }

    /// Creates a schema.
    ///
    /// # Errors
    ///
    /// Propagates execution errors.
    pub async fn create_schema(&mut self, schema: &str) -> Result<Command> {
        let cmd = self.translator.create_schema(schema);
        self.executor.execute_void(cmd).await
    }

    /// Creates a schema and re-installs the `pg_trgm` extension into
    /// it.
    ///
    /// # Errors
    ///
    /// Propagates execution errors.
    pub async fn recreate_schema(&mut self, schema: &str) -> Result<Command> {
        let created = self.create_schema(schema).await?;
        self.void("drop extension if exists pg_trgm;", &Params::new())
            .await?;
        self.void(
            &format!("create extension pg_trgm with schema {schema};"),
            &Params::new(),
        )
        .await?;
        Ok(created)
    }

    /// Drops a schema and everything in it, if it exists.
    ///
    /// # Errors
    ///
    /// Propagates execution errors.
    pub async fn drop_schema(&mut self, schema: &str) -> Result<Command> {
        let cmd = self.translator.drop_schema(schema);
        self.executor.execute_void(cmd).await
    }

    /// Creates a declared table, then runs its post-creation scripts.
    ///
    /// # Errors
    ///
    /// Propagates execution errors, including duplicate-table errors;
    /// callers doing batch provisioning handle those via
    /// [`provision`](Self::provision).
    pub async fn create_table(&mut self, table: &TableDefinition) -> Result<Command> {
        let cmd = self.translator.create_table(table);
        let executed = self.executor.execute_void(cmd).await?;
        for script in table.post_create_scripts() {
            self.void(script, &Params::new()).await?;
        }
        Ok(executed)
    }

    /// Drops a table.
    ///
    /// # Errors
    ///
    /// Propagates execution errors.
    pub async fn drop_table(&mut self, table: &str, if_exists: bool) -> Result<Command> {
        let cmd = self.translator.drop_table(table, if_exists);
        self.executor.execute_void(cmd).await
    }

    /// Inserts one row; `data` is normalized through a serialize
    /// round trip before binding.
    ///
    /// # Errors
    ///
    /// Returns a command error for unusable data, or propagates
    /// execution errors.
    pub async fn insert<T: Serialize>(&mut self, table: &str, data: &T) -> Result<Command> {
        let params = to_params(data)?;
        let cmd = self.translator.insert(table, &params)?;
        self.executor.execute_void(cmd).await
    }

    /// Updates rows matching `where_equals`.
    ///
    /// # Errors
    ///
    /// Returns a command error for empty clauses, or propagates
    /// execution errors.
    pub async fn update(
        &mut self,
        table: &str,
        updates: &Filter,
        where_equals: &Filter,
    ) -> Result<Command> {
        let cmd = self.translator.update(table, updates, where_equals)?;
        self.executor.execute_void(cmd).await
    }

    /// Deletes rows matching `where_equals`.
    ///
    /// # Errors
    ///
    /// Returns a command error for an empty WHERE, or propagates
    /// execution errors.
    pub async fn delete(&mut self, table: &str, where_equals: &Filter) -> Result<Command> {
        let cmd = self.translator.delete(table, where_equals)?;
        self.executor.execute_void(cmd).await
    }

    /// Selects rows per the given options.
    ///
    /// # Errors
    ///
    /// Propagates translation and execution errors.
    pub async fn select(&mut self, table: &str, options: &ReadOptions) -> Result<Vec<Record>> {
        let cmd = self.translator.read(table, options)?;
        self.executor.execute_reader(&cmd).await
    }

    /// Returns the first row matching the equality filter, if any.
    ///
    /// # Errors
    ///
    /// Propagates translation and execution errors.
    pub async fn first(&mut self, table: &str, where_equals: Filter) -> Result<Option<Record>> {
        let rows = self
            .select(table, &ReadOptions::new().equals(where_equals).take(1))
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Counts rows matching the equality filter.
    ///
    /// # Errors
    ///
    /// Propagates translation and execution errors.
    pub async fn count(&mut self, table: &str, where_equals: Filter) -> Result<i64> {
        let rows = self
            .select(
                table,
                &ReadOptions::new()
                    .equals(where_equals)
                    .columns("count(*) as count"),
            )
            .await?;
        Ok(rows.first().and_then(|r| r.as_i64("count")).unwrap_or(0))
    }

    /// Runs raw SQL with `@name` placeholders and returns all rows.
    ///
    /// # Errors
    ///
    /// Propagates translation and execution errors.
    pub async fn read(&mut self, sql: &str, params: &Params) -> Result<Vec<Record>> {
        let cmd = self.translator.raw(sql, params)?;
        self.executor.execute_reader(&cmd).await
    }

    /// Runs raw SQL and returns the first row, if any.
    ///
    /// # Errors
    ///
    /// Propagates translation and execution errors.
    pub async fn read_first(&mut self, sql: &str, params: &Params) -> Result<Option<Record>> {
        let rows = self.read(sql, params).await?;
        Ok(rows.into_iter().next())
    }

    /// Runs raw SQL with no result rows.
    ///
    /// # Errors
    ///
    /// Propagates translation and execution errors.
    pub async fn void(&mut self, sql: &str, params: &Params) -> Result<Command> {
        let cmd = self.translator.raw(sql, params)?;
        self.executor.execute_void(cmd).await
    }

    /// Adds a declared column to a live table.
    ///
    /// # Errors
    ///
    /// Propagates execution errors.
    pub async fn add_column(&mut self, table: &str, column: &ColumnDefinition) -> Result<Command> {
        let cmd = self.translator.add_column(table, column);
        self.executor.execute_void(cmd).await
    }

    /// Drops a column from a live table.
    ///
    /// # Errors
    ///
    /// Propagates execution errors.
    pub async fn drop_column(&mut self, table: &str, column: &ColumnDefinition) -> Result<Command> {
        let cmd = self.translator.drop_column(table, column);
        self.executor.execute_void(cmd).await
    }

    /// Changes a live column's type to the declared one, casting the
    /// existing data.
    ///
    /// # Errors
    ///
    /// Propagates execution errors.
    pub async fn alter_column_type(
        &mut self,
        table: &str,
        column: &ColumnDefinition,
    ) -> Result<Command> {
        let cmd = self.translator.alter_column_type(table, column);
        self.executor.execute_void(cmd).await
    }

    /// Changes a live column's nullability to the declared one.
    ///
    /// # Errors
    ///
    /// Propagates execution errors.
    pub async fn alter_column_nullable(
        &mut self,
        table: &str,
        column: &ColumnDefinition,
    ) -> Result<Command> {
        let cmd = self.translator.alter_column_nullable(table, column);
        self.executor.execute_void(cmd).await
    }

    /// Introspects the live column schema for a declared table. A
    /// table with no schema qualifier introspects `public`. Yields an
    /// empty list when the table does not exist.
    ///
    /// # Errors
    ///
    /// Propagates translation and execution errors.
    pub async fn table_columns(&mut self, table: &TableDefinition) -> Result<Vec<ColumnDefinition>> {
        let cmd = self.translator.table_schema(
            self.executor.database(),
            table.schema().unwrap_or("public"),
            table.name(),
        )?;
        let rows = self.executor.execute_reader(&cmd).await?;
        Ok(rows.iter().map(column_from_row).collect())
    }

    /// Creates every table and runs every script from caller-owned
    /// collections. A table that already exists is reported (or muted)
    /// and skipped; any other failure stops the batch.
    ///
    /// # Errors
    ///
    /// Propagates any failure other than duplicate tables.
    pub async fn provision(
        &mut self,
        tables: &[TableDefinition],
        scripts: &[String],
        mute: bool,
    ) -> Result<()> {
        for table in tables {
            match self.create_table(table).await {
                Ok(cmd) => info!(table = %table, sql = cmd.sql(), "created table"),
                Err(err) if err.is_duplicate_table() => {
                    if !mute {
                        warn!(table = %table, "table already exists");
                    }
                }
                Err(err) => return Err(err),
            }
        }
        for script in scripts {
            self.void(script, &Params::new()).await?;
        }
        Ok(())
    }

    /// Reconciles one table's live schema against its declaration,
    /// gating every corrective action through `confirm`. Returns the
    /// applied actions.
    ///
    /// # Errors
    ///
    /// Propagates introspection and DDL errors.
    pub async fn reconcile_table(
        &mut self,
        table: &TableDefinition,
        confirm: &dyn Confirm,
    ) -> Result<Vec<PlannedAction>> {
        SchemaReconciler::new(self, confirm).reconcile(table).await
    }
}

/// Maps one `information_schema.columns` row into a declared column
/// form: `is_nullable` of `YES` becomes nullable, and the unbounded
/// length sentinel (or a missing length) becomes "no explicit length".
fn column_from_row(row: &Record) -> ColumnDefinition {
    let name = row.as_str("column_name").unwrap_or_default();
    let data_type = row.as_str("udt_name").unwrap_or_default();
    let nullable = row.as_str("is_nullable") == Some("YES");
    let length = match row.as_i64("character_octet_length") {
        Some(UNBOUNDED_LENGTH) | None => 0,
        Some(length) => u32::try_from(length).unwrap_or(0),
    };
    ColumnDefinition::new(name, data_type)
        .nullable(nullable)
        .length(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn introspected(udt: &str, is_nullable: &str, length: Option<i64>) -> Record {
        let mut row = Record::default();
        row.push("column_name", json!("notes"));
        row.push("udt_name", json!(udt));
        row.push("is_nullable", json!(is_nullable));
        match length {
            Some(length) => row.push("character_octet_length", json!(length)),
            None => row.push("character_octet_length", serde_json::Value::Null),
        }
        row
    }

    #[test]
    fn unbounded_length_sentinel_normalizes_to_zero() {
        let column = column_from_row(&introspected("text", "YES", Some(UNBOUNDED_LENGTH)));
        assert_eq!(column.declared_length(), 0);
        assert_eq!(column.data_type(), "TEXT");
    }

    #[test]
    fn missing_length_normalizes_to_zero() {
        let column = column_from_row(&introspected("int4", "NO", None));
        assert_eq!(column.declared_length(), 0);
        assert_eq!(column.data_type(), "INT");
    }

    #[test]
    fn explicit_length_is_carried() {
        let column = column_from_row(&introspected("varchar", "NO", Some(32)));
        assert_eq!(column.declared_length(), 32);
    }

    #[test]
    fn nullability_maps_from_yes_no() {
        assert!(column_from_row(&introspected("text", "YES", None)).is_nullable());
        assert!(!column_from_row(&introspected("text", "NO", None)).is_nullable());
    }
}
