use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

/// A single spreadsheet cell.
///
/// Missing cells are represented as `Option::<ScalarValue>::None` by the
/// callers, never as a variant of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Number(f64),
    Text(String),
}

impl ScalarValue {
    /// Interprets a raw cell. Text that parses as a finite float becomes a
    /// number, everything else stays text (trimmed).
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => ScalarValue::Number(value),
            _ => ScalarValue::Text(trimmed.to_owned()),
        }
    }

    /// Parses a cell, returning `None` for empty cells.
    pub fn parse_cell(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            None
        }
        else {
            Some(Self::parse(raw))
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Number(value) => Some(*value),
            ScalarValue::Text(text) => {
                text.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
            },
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, ScalarValue::Number(_))
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ScalarValue::Number(value)
                if value.fract() == 0.0 && value.abs() < 1e15 =>
            {
                write!(f, "{}", *value as i64)
            },
            ScalarValue::Number(value) => write!(f, "{}", value),
            ScalarValue::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Number(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Number(value as f64)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_owned())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}
