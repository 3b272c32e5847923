//! # pgmend-core
//!
//! Schema-aware SQL command generation for PostgreSQL.
//!
//! This crate is the pure half of pgmend: it turns structured intent
//! (table and column definitions, filter dictionaries, sort and paging
//! options) into [`Command`]s: parameterized SQL text plus a bound
//! parameter set. It performs no I/O; executing commands against a
//! live database is the `pgmend-db` crate's job.
//!
//! ## Injection safety
//!
//! Values are never concatenated into SQL text. Source placeholders of
//! the form `@name` are rewritten to positional `$n` binds; only
//! identifiers supplied by the developer (table, column, and schema
//! names) are interpolated directly.
//!
//! ```rust
//! use pgmend_core::{CommandTranslator, Filter, ReadOptions};
//!
//! let translator = CommandTranslator::new();
//! let cmd = translator
//!     .read(
//!         "invoices",
//!         &ReadOptions::new()
//!             .equals(Filter::new().value("customer_id", 42))
//!             .order_by("created_at")
//!             .descending(true)
//!             .take(20),
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     cmd.sql(),
//!     "SELECT * FROM invoices WHERE customer_id = $1 ORDER BY created_at DESC LIMIT 20;"
//! );
//! ```

pub mod command;
pub mod error;
pub mod filter;
pub mod schema;
pub mod translator;

pub use command::{Command, Params, to_params};
pub use error::{CommandError, Result};
pub use filter::{Filter, TypeHint};
pub use schema::{ColumnDefinition, ForeignKey, TableDefinition};
pub use translator::{CommandTranslator, OrderColumns, ReadOptions};
