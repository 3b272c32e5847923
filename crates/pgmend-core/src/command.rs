//! The translator's output unit: SQL text plus its bound parameters.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CommandError, Result};

/// A normalized parameter map: column-shaped keys to JSON values.
///
/// `BTreeMap` keeps key order deterministic, which in turn keeps every
/// generated statement byte-for-byte reproducible.
pub type Params = BTreeMap<String, Value>;

/// Normalizes arbitrary serializable values into a [`Params`] map.
///
/// The serialize round trip collapses non-primitive values (dates,
/// decimals, ...) into driver-acceptable primitive forms before they
/// are ever bound.
///
/// # Errors
///
/// Returns [`CommandError::InvalidParams`] if the value does not
/// serialize to a map, or a serialization error from serde.
pub fn to_params<T: Serialize>(values: &T) -> Result<Params> {
    match serde_json::to_value(values)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(CommandError::InvalidParams),
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"@[A-Za-z_][A-Za-z0-9_]*").expect("placeholder pattern is valid")
    })
}

/// An immutable unit of SQL text plus its bound parameter list.
///
/// Produced by the translator, consumed exactly once by the executor.
/// Placeholders have been rewritten from the `@name` source form to the
/// positional `$n` form Postgres binds natively; `params` holds the
/// `(name, value)` pairs in `$1..$n` order, so names stay stable across
/// rewrite and bind.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    sql: String,
    params: Vec<(String, Value)>,
}

impl Command {
    /// Builds a command from SQL text with `@name` placeholders and a
    /// value map.
    ///
    /// Each distinct placeholder is assigned a position in order of
    /// first appearance; repeated occurrences of the same name share
    /// one position. Values never referenced by a placeholder are not
    /// bound. Values are data-controlled and always bound; only
    /// identifiers supplied by the caller are ever part of the SQL
    /// text itself.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::MissingPlaceholderValue`] if the text
    /// references a name absent from `values`.
    pub fn parameterized(sql: &str, values: &Params) -> Result<Self> {
        let mut params: Vec<(String, Value)> = Vec::new();
        let mut rewritten = String::with_capacity(sql.len());
        let mut last = 0;

        for token in placeholder_pattern().find_iter(sql) {
            rewritten.push_str(&sql[last..token.start()]);
            let name = &token.as_str()[1..];
            let position = match params.iter().position(|(n, _)| n == name) {
                Some(i) => i,
                None => {
                    let value = values
                        .get(name)
                        .ok_or_else(|| CommandError::MissingPlaceholderValue(name.to_string()))?;
                    params.push((name.to_string(), value.clone()));
                    params.len() - 1
                }
            };
            rewritten.push_str(&format!("${}", position + 1));
            last = token.end();
        }
        rewritten.push_str(&sql[last..]);

        Ok(Self {
            sql: rewritten,
            params,
        })
    }

    /// Builds a command with no bound parameters (DDL, fixed text).
    #[must_use]
    pub fn plain(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// The SQL text with `$n` placeholders.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The bound parameters in `$1..$n` order.
    #[must_use]
    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }

    /// Looks up a bound parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Whether any parameters are bound.
    #[must_use]
    pub fn is_parameterized(&self) -> bool {
        !self.params.is_empty()
    }

    /// The serialized parameter map, for logging and round-tripping.
    #[must_use]
    pub fn params_json(&self) -> String {
        let map: serde_json::Map<String, Value> = self
            .params
            .iter()
            .map(|(n, v)| (n.clone(), v.clone()))
            .collect();
        Value::Object(map).to_string()
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.sql)
        } else {
            write!(f, "{} {}", self.sql, self.params_json())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholders_become_positions_in_first_appearance_order() {
        let values = to_params(&json!({"a": 1, "b": "two"})).unwrap();
        let cmd = Command::parameterized("SELECT * FROM t WHERE b = @b AND a = @a", &values).unwrap();
        assert_eq!(cmd.sql(), "SELECT * FROM t WHERE b = $1 AND a = $2");
        assert_eq!(cmd.params()[0], ("b".to_string(), json!("two")));
        assert_eq!(cmd.params()[1], ("a".to_string(), json!(1)));
    }

    #[test]
    fn repeated_placeholder_shares_one_position() {
        let values = to_params(&json!({"id": 7})).unwrap();
        let cmd = Command::parameterized("SELECT @id, @id", &values).unwrap();
        assert_eq!(cmd.sql(), "SELECT $1, $1");
        assert_eq!(cmd.params().len(), 1);
    }

    #[test]
    fn missing_placeholder_value_is_an_error() {
        let err = Command::parameterized("SELECT @missing", &Params::new()).unwrap_err();
        assert!(matches!(err, CommandError::MissingPlaceholderValue(name) if name == "missing"));
    }

    #[test]
    fn unreferenced_values_are_not_bound() {
        let values = to_params(&json!({"used": 1, "unused": 2})).unwrap();
        let cmd = Command::parameterized("SELECT @used", &values).unwrap();
        assert_eq!(cmd.params().len(), 1);
        assert!(cmd.param("unused").is_none());
    }

    #[test]
    fn non_map_params_are_rejected() {
        assert!(matches!(
            to_params(&json!([1, 2, 3])).unwrap_err(),
            CommandError::InvalidParams
        ));
    }

    #[test]
    fn params_json_round_trips() {
        let values = to_params(&json!({"a": 1})).unwrap();
        let cmd = Command::parameterized("SELECT @a", &values).unwrap();
        let parsed: Value = serde_json::from_str(&cmd.params_json()).unwrap();
        assert_eq!(parsed, json!({"a": 1}));
    }
}
