//! # pgmend-db
//!
//! Command execution and schema reconciliation for PostgreSQL.
//!
//! The runtime half of pgmend: takes the [`Command`]s built by
//! `pgmend-core` and runs them over a single `sqlx` connection, maps
//! result rows into ordered [`Record`]s, and reconciles declared
//! table shapes against the live schema with confirmation-gated
//! corrective DDL.
//!
//! ```rust,no_run
//! use pgmend_core::{ColumnDefinition, TableDefinition};
//! use pgmend_db::{AutoApprove, ConnectConfig, Database};
//!
//! # async fn demo() -> pgmend_db::Result<()> {
//! let mut db = Database::new(ConnectConfig::default());
//!
//! let users = TableDefinition::new(
//!     "users",
//!     vec![
//!         ColumnDefinition::new("id", "INT").primary_key(),
//!         ColumnDefinition::new("email", "VARCHAR").length(255).unique(),
//!     ],
//! )?;
//!
//! // One connection for the whole batch; every call outside such a
//! // bracket opens and closes its own.
//! db.connect().await?;
//! let applied = db.reconcile_table(&users, &AutoApprove).await?;
//! db.dispose().await;
//! # let _ = applied;
//! # Ok(())
//! # }
//! ```
//!
//! [`Command`]: pgmend_core::Command

pub mod confirm;
pub mod database;
pub mod error;
pub mod executor;
pub mod reconciler;
pub mod record;

pub use confirm::{AutoApprove, Confirm, ConsoleConfirm};
pub use database::Database;
pub use error::{DbError, Result};
pub use executor::{CommandExecutor, ConnectConfig};
pub use reconciler::{PlannedAction, SchemaReconciler, plan};
pub use record::Record;
