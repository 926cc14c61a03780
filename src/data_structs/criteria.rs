use std::str::FromStr;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::{
    Deserialize,
    Serialize,
};

use super::ScalarValue;
use crate::error::AnalysisError;

/// Conjunctive equality filters, `column == value` for every entry.
///
/// Insertion order is kept for the dataset label only; it never changes
/// which rows match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    criteria: IndexMap<String, ScalarValue>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the required value for `column`.
    pub fn with<S: Into<String>>(
        mut self,
        column: S,
        value: ScalarValue,
    ) -> Self {
        self.criteria.insert(column.into(), value);
        self
    }

    pub fn get(
        &self,
        column: &str,
    ) -> Option<&ScalarValue> {
        self.criteria.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ScalarValue)> {
        self.criteria.iter()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Filter values joined by a space, in insertion order.
    pub fn label(&self) -> String {
        self.criteria.values().map(|v| v.to_string()).join(" ")
    }

    /// Parses `column=value` pairs, as given on the command line.
    pub fn try_from_pairs<I, S>(pairs: I) -> Result<Self, AnalysisError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>, {
        pairs
            .into_iter()
            .map(|pair| {
                let pair = pair.as_ref();
                let (column, value) = pair.split_once('=').ok_or_else(|| {
                    AnalysisError::InvalidRequest(format!(
                        "filter '{}' is not of the form column=value",
                        pair
                    ))
                })?;
                let column = column.trim();
                if column.is_empty() {
                    return Err(AnalysisError::InvalidRequest(format!(
                        "filter '{}' has an empty column name",
                        pair
                    )));
                }
                Ok((column.to_owned(), ScalarValue::parse(value)))
            })
            .collect()
    }
}

impl FromIterator<(String, ScalarValue)> for FilterCriteria {
    fn from_iter<T: IntoIterator<Item = (String, ScalarValue)>>(iter: T) -> Self {
        Self {
            criteria: iter.into_iter().collect(),
        }
    }
}

impl FromStr for FilterCriteria {
    type Err = AnalysisError;

    /// Comma separated `column=value` pairs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from_pairs(s.split(',').filter(|p| !p.trim().is_empty()))
    }
}
