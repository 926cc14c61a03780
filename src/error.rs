use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised by the analysis pipeline.
///
/// Every value that cannot be computed surfaces as one of these variants;
/// nothing is silently replaced by a placeholder.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A column or bin group is missing or malformed.
    #[error("schema error: {0}")]
    Schema(String),

    #[error("cannot convert value '{value}' in column '{column}' to a number")]
    DataConversion { column: String, value: String },

    /// Grubbs' critical value could not be evaluated.
    #[error("Grubbs' test failed for {n} samples: {reason}")]
    OutlierTest { n: usize, reason: String },

    #[error("insufficient data: {count} valid samples, at least {required} required")]
    InsufficientData { count: usize, required: usize },

    /// A statistic is undefined for the given data (e.g. zero variance).
    #[error("statistic could not be computed: {0}")]
    Computation(String),

    #[error("invalid analysis request: {0}")]
    InvalidRequest(String),

    #[error("interaction plot rendering failed: {0}")]
    Plot(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl AnalysisError {
    pub(crate) fn schema<S: Into<String>>(msg: S) -> Self {
        AnalysisError::Schema(msg.into())
    }

    pub(crate) fn computation<S: Into<String>>(msg: S) -> Self {
        AnalysisError::Computation(msg.into())
    }

    pub(crate) fn insufficient(
        count: usize,
        required: usize,
    ) -> Self {
        AnalysisError::InsufficientData { count, required }
    }
}

pub type StatResult<T> = Result<T, AnalysisError>;
