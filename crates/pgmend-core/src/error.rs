//! Error types for command translation and the schema data model.

/// Errors that can occur while building commands or schema definitions.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// A predicate carried a type hint the translator does not know.
    ///
    /// This is a configuration error and is never silently downgraded
    /// to plain equality.
    #[error("unhandled type hint '{0}'")]
    UnknownTypeHint(String),

    /// A `@name` placeholder in the SQL text had no value to bind.
    #[error("no value supplied for placeholder '@{0}'")]
    MissingPlaceholderValue(String),

    /// A table declared the same column name twice.
    #[error("duplicate column '{column}' in table '{table}'")]
    DuplicateColumn {
        /// The table being defined.
        table: String,
        /// The offending column name.
        column: String,
    },

    /// An INSERT or UPDATE was requested with no values to set.
    #[error("mutation on '{0}' has no values to set")]
    EmptySet(String),

    /// A DELETE or UPDATE was requested with no WHERE conditions.
    #[error("mutation on '{0}' has no WHERE conditions")]
    EmptyWhere(String),

    /// Parameter values could not be normalized to a key/value map.
    #[error("parameters must serialize to a map of column name to value")]
    InvalidParams,

    /// Serialization of parameter values failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for command translation.
pub type Result<T> = std::result::Result<T, CommandError>;
