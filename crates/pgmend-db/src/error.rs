//! Error types for command execution and reconciliation.

use pgmend_core::CommandError;

/// Errors that can occur while executing commands or reconciling
/// schemas.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Command translation or schema construction failed.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Driver error outside of statement execution (connecting,
    /// closing).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A statement failed; carries the statement and its serialized
    /// parameters so the failure is diagnosable without replaying it.
    #[error("statement failed: {sql} {params}: {source}")]
    Execution {
        /// The SQL text that failed.
        sql: String,
        /// The serialized parameter map.
        params: String,
        /// The underlying driver error.
        source: sqlx::Error,
    },

    /// An execute call found no connection after acquisition.
    #[error("no open connection")]
    NotConnected,
}

impl DbError {
    /// Whether this is Postgres reporting a duplicate table
    /// (SQLSTATE 42P07), the one expected and recoverable failure
    /// during batch provisioning.
    #[must_use]
    pub fn is_duplicate_table(&self) -> bool {
        let source = match self {
            Self::Database(source) | Self::Execution { source, .. } => source,
            _ => return false,
        };
        match source {
            sqlx::Error::Database(db) => db.code().as_deref() == Some("42P07"),
            _ => false,
        }
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DbError>;
