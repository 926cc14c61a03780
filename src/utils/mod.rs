//! This module contains utility functions and helper macros used throughout
//! the binstat crate.
//!
//! Key functionalities include:
//!
//! - Statistical primitives: Shapiro-Wilk, Levene, Student's t, Wilcoxon
//!   rank-sum and the one-way F-test.
//! - Order statistics helpers, such as linearly interpolated quantiles.
//! - The `with_field_fn!` macro for builder-style `with_*` setters.

mod stats;
pub use stats::*;

use crate::error::{
    AnalysisError,
    StatResult,
};

#[macro_export]
macro_rules! with_field_fn {
    ($field_name: ident, $field_type: ty) => {
        paste::paste! {
            pub fn [<with_$field_name>](mut self, value: $field_type) -> Self {
            self.$field_name = value;
            self
            }
        }
    };
}
pub use with_field_fn;

/// `q`-th quantile of `values`, interpolating linearly between the two
/// nearest order statistics (position `q * (n - 1)`).
pub fn quantile_linear(
    values: &[f64],
    q: f64,
) -> StatResult<f64> {
    if values.is_empty() {
        return Err(AnalysisError::insufficient(0, 1));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(AnalysisError::computation(format!(
            "quantile {} is outside [0, 1]",
            q
        )));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Evaluates `coefs[0] + coefs[1] * x + coefs[2] * x^2 + ...`.
pub(crate) fn poly(
    coefs: &[f64],
    x: f64,
) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}
