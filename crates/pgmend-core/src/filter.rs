//! Predicate dictionaries for WHERE/SET fragments.
//!
//! Each entry carries an explicit [`TypeHint`] tag instead of a
//! modifier keyword embedded in the key string; [`Filter::from_map`]
//! still accepts the legacy `"column modifier"` key form and rejects
//! anything it does not recognize.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::Value;

use crate::command::Params;
use crate::error::{CommandError, Result};

/// How a bound value is rendered on the server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeHint {
    /// A plain bind parameter.
    #[default]
    Plain,
    /// The bind is wrapped in a text-search-vector conversion:
    /// `to_tsvector('english', $n)`.
    TsVector,
}

impl FromStr for TypeHint {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tsvector" => Ok(Self::TsVector),
            other => Err(CommandError::UnknownTypeHint(other.to_string())),
        }
    }
}

/// A set of column/value predicates, kept in sorted column order.
///
/// The comparison operator is not part of the filter; it is chosen by
/// the clause the filter is rendered into (equality, greater-than,
/// less-than, SET assignment).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    entries: BTreeMap<String, (TypeHint, Value)>,
}

impl Filter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plain-bound predicate on `column`.
    #[must_use]
    pub fn value(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.entries
            .insert(column.to_string(), (TypeHint::Plain, value.into()));
        self
    }

    /// Adds a text-search-vector predicate on `column`.
    #[must_use]
    pub fn ts_vector(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.entries
            .insert(column.to_string(), (TypeHint::TsVector, value.into()));
        self
    }

    /// Builds a filter from a parameter map whose keys are either a
    /// bare column name or the legacy `"column modifier"` form.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnknownTypeHint`] for any modifier that
    /// is not recognized. An unknown hint never degrades to equality.
    pub fn from_map(values: &Params) -> Result<Self> {
        let mut filter = Self::new();
        for (key, value) in values {
            let mut parts = key.split_whitespace();
            let column = parts.next().unwrap_or_default();
            let hint = match parts.next() {
                Some(modifier) => modifier.parse::<TypeHint>()?,
                None => TypeHint::Plain,
            };
            if parts.next().is_some() {
                return Err(CommandError::UnknownTypeHint(key.clone()));
            }
            filter
                .entries
                .insert(column.to_string(), (hint, value.clone()));
        }
        Ok(filter)
    }

    /// Whether the filter has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates entries in sorted column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TypeHint, &Value)> {
        self.entries
            .iter()
            .map(|(column, (hint, value))| (column.as_str(), *hint, value))
    }
}
