//! Command execution over a single driver connection.
//!
//! One connection, one statement at a time. The executor has no pool:
//! if a call begins with no connection open, one is opened for that
//! call and torn down before returning; if the caller has opened one
//! with [`CommandExecutor::connect`], it is reused and left open, and
//! the caller owns its lifetime.

use pgmend_core::Command;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{ConnectOptions, Connection, Postgres};
use tracing::{debug, error, warn};

use crate::error::{DbError, Result};
use crate::record::{Record, decode_row};

/// Connection parameters for one Postgres database.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct ConnectConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Login role.
    pub user: String,
    /// Login password, if the role has one.
    pub password: Option<String>,
    /// Database (catalog) name.
    pub database: String,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: None,
            database: "postgres".to_string(),
        }
    }
}

impl ConnectConfig {
    fn options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database);
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        options
    }
}

/// Executes commands against a live connection.
pub struct CommandExecutor {
    config: ConnectConfig,
    conn: Option<PgConnection>,
}

impl CommandExecutor {
    /// Creates an executor; no connection is opened until the first
    /// call or an explicit [`connect`](Self::connect).
    #[must_use]
    pub fn new(config: ConnectConfig) -> Self {
        Self { config, conn: None }
    }

    /// The configured database (catalog) name.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.config.database
    }

    /// Whether a caller-managed connection is currently open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Opens a caller-managed connection, replacing any open one.
    /// Subsequent calls reuse it until [`dispose`](Self::dispose).
    ///
    /// # Errors
    ///
    /// Returns a driver error if the connection cannot be opened.
    pub async fn connect(&mut self) -> Result<()> {
        self.dispose().await;
        let conn = self.config.options().connect().await?;
        self.conn = Some(conn);
        Ok(())
    }

    /// Closes the connection if one is open. Idempotent; close
    /// failures are logged, not raised.
    pub async fn dispose(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(error) = conn.close().await {
                warn!(%error, "closing connection failed");
            }
        }
    }

    /// Executes a row-producing command and maps every result row
    /// into an ordered [`Record`]. Returns an empty list for an empty
    /// result.
    ///
    /// # Errors
    ///
    /// Surfaces the failing SQL and parameters, then propagates the
    /// driver error. No retry.
    pub async fn execute_reader(&mut self, cmd: &Command) -> Result<Vec<Record>> {
        let caller_managed = self.conn.is_some();
        if !caller_managed {
            self.connect().await?;
        }
        let result = self.fetch(cmd).await;
        if !caller_managed {
            self.dispose().await;
        }
        result
    }

    /// Executes a void command and returns it for inspection or
    /// chaining.
    ///
    /// # Errors
    ///
    /// Surfaces the failing SQL and parameters, then propagates the
    /// driver error. No retry.
    pub async fn execute_void(&mut self, cmd: Command) -> Result<Command> {
        let caller_managed = self.conn.is_some();
        if !caller_managed {
            self.connect().await?;
        }
        let result = self.run(&cmd).await;
        if !caller_managed {
            self.dispose().await;
        }
        result.map(|()| cmd)
    }

    async fn fetch(&mut self, cmd: &Command) -> Result<Vec<Record>> {
        let conn = self.conn.as_mut().ok_or(DbError::NotConnected)?;
        debug!(sql = cmd.sql(), "executing reader");
        match bind_values(sqlx::query(cmd.sql()), cmd.params())
            .fetch_all(&mut *conn)
            .await
        {
            Ok(rows) => Ok(rows.iter().map(decode_row).collect()),
            Err(source) => Err(execution_error(cmd, source)),
        }
    }

    async fn run(&mut self, cmd: &Command) -> Result<()> {
        let conn = self.conn.as_mut().ok_or(DbError::NotConnected)?;
        debug!(sql = cmd.sql(), "executing void");
        match bind_values(sqlx::query(cmd.sql()), cmd.params())
            .execute(&mut *conn)
            .await
        {
            Ok(_) => Ok(()),
            Err(source) => Err(execution_error(cmd, source)),
        }
    }
}

/// Wraps a driver failure with the statement and parameter context it
/// failed under, logging both before the error propagates.
fn execution_error(cmd: &Command, source: sqlx::Error) -> DbError {
    let params = cmd.params_json();
    error!(sql = cmd.sql(), params = %params, error = %source, "statement failed");
    DbError::Execution {
        sql: cmd.sql().to_string(),
        params,
        source,
    }
}

/// Binds the command's parameters in positional order. JSON scalars
/// bind as their native driver types; arrays and objects bind as
/// jsonb.
fn bind_values<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [(String, Value)],
) -> Query<'q, Postgres, PgArguments> {
    for (_, value) in params {
        match value {
            Value::Null => {
                query = query.bind(Option::<String>::None);
            }
            Value::Bool(b) => query = query.bind(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    query = query.bind(i);
                } else if let Some(f) = n.as_f64() {
                    query = query.bind(f);
                } else {
                    query = query.bind(n.to_string());
                }
            }
            Value::String(s) => query = query.bind(s.as_str()),
            Value::Array(_) | Value::Object(_) => {
                query = query.bind(Json(value.clone()));
            }
        }
    }
    query
}
