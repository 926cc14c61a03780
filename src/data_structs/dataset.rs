use log::{
    debug,
    info,
};
use polars::prelude::*;
use statrs::statistics::{
    Data,
    Median,
    Statistics,
};

use super::{
    FilterCriteria,
    RawTable,
};
use crate::error::{
    AnalysisError,
    StatResult,
};
use crate::tools::outliers::filter_numeric_series;
use crate::utils::quantile_linear;

/// A filtered subset of a [`RawTable`] with an outlier-cleaned numeric view
/// of one target column.
///
/// The normality flag starts `true` and can only be lowered, by
/// [`normality_tests`](crate::tools::stats::normality_tests).
#[derive(Debug, Clone)]
pub struct FilteredDataset {
    subset: DataFrame,
    target: String,
    label:  String,
    series: Vec<f64>,
    normal: bool,
}

impl FilteredDataset {
    /// Applies `criteria` to `table` and runs Grubbs' test (at `alpha`) on
    /// the `target` column of the resulting subset.
    pub fn try_new(
        table: &RawTable,
        target: &str,
        criteria: &FilterCriteria,
        alpha: f64,
    ) -> StatResult<Self> {
        if !table.has_column(target) {
            return Err(AnalysisError::schema(format!(
                "target column '{}' not found",
                target
            )));
        }
        let subset = table.subset(criteria)?;
        let target_column = subset
            .column(target)
            .map_err(|_| AnalysisError::schema(format!("target column '{}' not found", target)))?
            .as_materialized_series();
        let series = filter_numeric_series(target_column, alpha)?;

        info!(
            "Dataset '{} : {}': {} rows, {} samples after outlier removal",
            criteria.label(),
            target,
            subset.height(),
            series.len()
        );

        Ok(Self {
            target: target.to_owned(),
            label: criteria.label(),
            subset,
            series,
            normal: true,
        })
    }

    /// Rows of the table matching the criteria.
    #[inline(always)]
    pub fn subset(&self) -> &DataFrame {
        &self.subset
    }

    /// Cleaned values of the target column.
    #[inline(always)]
    pub fn series(&self) -> &[f64] {
        &self.series
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Filter values joined in criteria order.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// `"<label> : <target>"`, or just the target without filters.
    pub fn name(&self) -> String {
        if self.label.is_empty() {
            self.target.clone()
        }
        else {
            format!("{} : {}", self.label, self.target)
        }
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.series.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    #[inline]
    pub fn is_normal(&self) -> bool {
        self.normal
    }

    /// Lowers the normality flag. There is no way back to `true`.
    pub(crate) fn mark_non_normal(mut self) -> Self {
        if self.normal {
            debug!("Dataset '{}' marked as non-normal", self.name());
        }
        self.normal = false;
        self
    }

    /// Fails with [`AnalysisError::InsufficientData`] when fewer than
    /// `required` samples survived filtering.
    pub fn ensure_min_samples(
        &self,
        required: usize,
    ) -> StatResult<&Self> {
        if self.sample_count() < required {
            Err(AnalysisError::insufficient(self.sample_count(), required))
        }
        else {
            Ok(self)
        }
    }

    pub fn mean(&self) -> StatResult<f64> {
        self.ensure_min_samples(1)?;
        Ok(self.series.iter().mean())
    }

    pub fn median(&self) -> StatResult<f64> {
        self.ensure_min_samples(1)?;
        Ok(Data::new(self.series.clone()).median())
    }

    /// Sample standard deviation (n - 1 denominator).
    pub fn std(&self) -> StatResult<f64> {
        self.ensure_min_samples(2)?;
        Ok(self.series.iter().std_dev())
    }

    /// Standard error of the mean.
    pub fn sem(&self) -> StatResult<f64> {
        Ok(self.std()? / (self.sample_count() as f64).sqrt())
    }

    /// Quantile with linear interpolation between order statistics.
    pub fn quantile(
        &self,
        q: f64,
    ) -> StatResult<f64> {
        self.ensure_min_samples(1)?;
        quantile_linear(&self.series, q)
    }
}
