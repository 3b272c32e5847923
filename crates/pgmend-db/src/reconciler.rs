//! Schema reconciliation: diff a declared table against its live
//! column schema and apply the minimal corrective DDL.
//!
//! Planning is pure: [`plan`] turns a declared table and the
//! introspected live columns into a list of [`PlannedAction`]s.
//! Application is gated: every structural action passes through
//! the [`Confirm`] gate before it runs. There is no persisted
//! migration history; a reconciliation is a single diff-and-fix pass.

use std::collections::BTreeSet;

use pgmend_core::{ColumnDefinition, TableDefinition};
use tracing::{debug, info};

use crate::confirm::Confirm;
use crate::database::Database;
use crate::error::Result;

/// One corrective action the reconciler wants to take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    /// The table does not exist; create it from the declaration.
    CreateTable,
    /// The declared column is missing from the live table.
    AddColumn(ColumnDefinition),
    /// The live table has a column the declaration does not.
    DropColumn(ColumnDefinition),
    /// The live column's type or length differs from the declared
    /// one.
    AlterType(ColumnDefinition),
    /// The live column's nullability differs from the declared one.
    AlterNullability(ColumnDefinition),
}

impl PlannedAction {
    fn prompt(&self, table: &TableDefinition) -> String {
        match self {
            Self::CreateTable => {
                format!("Table {table} not found in database, create it?")
            }
            Self::AddColumn(column) => {
                format!("{table} is missing column {column}, add it?")
            }
            Self::DropColumn(column) => {
                format!("{table} has extra column {column}, drop it?")
            }
            Self::AlterType(column) => {
                format!(
                    "Alter {table} column {} to type {}?",
                    column.name(),
                    column.sql_type()
                )
            }
            Self::AlterNullability(column) => {
                let target = if column.is_nullable() {
                    "NULL"
                } else {
                    "NOT NULL"
                };
                format!("Alter {table} column {} to {target}?", column.name())
            }
        }
    }
}

/// Diffs a declared table against its introspected live columns.
///
/// Zero live columns means the table does not exist, which plans
/// exactly one [`PlannedAction::CreateTable`] and nothing per column.
/// Otherwise every column name across both sides is classified:
/// declared-only plans an add, live-only plans a drop, and a column
/// present on both sides with differing canonical forms plans a type
/// alteration and/or a nullability alteration; both can fire for one
/// column in the same pass. Columns in sync plan nothing.
#[must_use]
pub fn plan(declared: &TableDefinition, live: &[ColumnDefinition]) -> Vec<PlannedAction> {
    if live.is_empty() {
        return vec![PlannedAction::CreateTable];
    }

    let mut names: BTreeSet<&str> = declared.columns().iter().map(ColumnDefinition::name).collect();
    names.extend(live.iter().map(ColumnDefinition::name));

    let mut actions = Vec::new();
    for name in names {
        let live_column = live.iter().find(|c| c.name() == name);
        match (declared.column(name), live_column) {
            (Some(declared_column), None) => {
                actions.push(PlannedAction::AddColumn(declared_column.clone()));
            }
            (None, Some(live_column)) => {
                actions.push(PlannedAction::DropColumn(live_column.clone()));
            }
            (Some(declared_column), Some(live_column)) => {
                if declared_column == live_column {
                    continue;
                }
                if declared_column.sql_type() != live_column.sql_type() {
                    actions.push(PlannedAction::AlterType(declared_column.clone()));
                }
                if declared_column.is_nullable() != live_column.is_nullable() {
                    actions.push(PlannedAction::AlterNullability(declared_column.clone()));
                }
            }
            (None, None) => {}
        }
    }
    actions
}

/// Applies a reconciliation pass over one table, gating every action
/// through the injected confirmation strategy.
pub struct SchemaReconciler<'d, 'c> {
    db: &'d mut Database,
    confirm: &'c dyn Confirm,
}

impl<'d, 'c> SchemaReconciler<'d, 'c> {
    /// Creates a reconciler over the given database handle and gate.
    pub fn new(db: &'d mut Database, confirm: &'c dyn Confirm) -> Self {
        Self { db, confirm }
    }

    /// Introspects, plans, and applies approved actions. Returns the
    /// actions that were applied; declined actions are skipped.
    ///
    /// # Errors
    ///
    /// Propagates introspection failures and any DDL failure; a
    /// failed fix is surfaced with its statement, never swallowed.
    pub async fn reconcile(&mut self, table: &TableDefinition) -> Result<Vec<PlannedAction>> {
        let live = self.db.table_columns(table).await?;
        let actions = plan(table, &live);

        let mut applied = Vec::new();
        for action in actions {
            if !self.confirm.confirm(&action.prompt(table)) {
                debug!(table = %table, action = ?action, "declined by confirmation gate");
                continue;
            }
            self.apply(table, &action).await?;
            applied.push(action);
        }
        Ok(applied)
    }

    async fn apply(&mut self, table: &TableDefinition, action: &PlannedAction) -> Result<()> {
        let table_ref = table.qualified_name();
        match action {
            PlannedAction::CreateTable => {
                self.db.create_table(table).await?;
                info!(table = %table, "created table");
            }
            PlannedAction::AddColumn(column) => {
                self.db.add_column(&table_ref, column).await?;
                info!(table = %table, column = %column, "added column");
            }
            PlannedAction::DropColumn(column) => {
                self.db.drop_column(&table_ref, column).await?;
                info!(table = %table, column = %column, "dropped column");
            }
            PlannedAction::AlterType(column) => {
                self.db.alter_column_type(&table_ref, column).await?;
                info!(table = %table, column = %column, "altered column type");
            }
            PlannedAction::AlterNullability(column) => {
                self.db.alter_column_nullable(&table_ref, column).await?;
                info!(table = %table, column = %column, "altered column nullability");
            }
        }
        Ok(())
    }
}
