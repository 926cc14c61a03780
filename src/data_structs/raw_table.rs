use itertools::Itertools;
use log::{
    debug,
    trace,
};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex_lite::Regex;

use super::{
    FilterCriteria,
    ScalarValue,
};
use crate::error::{
    AnalysisError,
    StatResult,
};

static BIN_COLUMN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+) bin (\d+)$").expect("bin column pattern is valid"));

/// Name of the `index`-th bin column of `group`.
pub fn bin_column_name(
    group: &str,
    index: usize,
) -> String {
    format!("{} bin {}", group, index)
}

/// Splits `"<group> bin <i>"` into `(group, i)`.
pub fn parse_bin_column(name: &str) -> Option<(&str, usize)> {
    let captures = BIN_COLUMN_RE.captures(name)?;
    let group = captures.get(1)?.as_str();
    let index = captures.get(2)?.as_str().parse::<usize>().ok()?;
    Some((group, index))
}

/// Bin indices of `group` among `names`, in header order.
pub(crate) fn group_bin_indices<'a, I>(
    names: I,
    group: &str,
) -> Vec<usize>
where
    I: IntoIterator<Item = &'a str>, {
    names
        .into_iter()
        .filter_map(parse_bin_column)
        .filter(|(g, _)| *g == group)
        .map(|(_, i)| i)
        .collect()
}

/// Number of bins of `group` in `df`, checking that `bin 1..=N` are all
/// present.
pub(crate) fn checked_bin_count(
    df: &DataFrame,
    group: &str,
) -> StatResult<usize> {
    let names = df.get_column_names();
    let indices = group_bin_indices(names.iter().map(|n| n.as_str()), group);
    let n_bins = indices.len();
    if n_bins == 0 {
        return Err(AnalysisError::schema(format!(
            "no bin columns found for group '{}'",
            group
        )));
    }
    for index in 1..=n_bins {
        if !indices.contains(&index) {
            return Err(AnalysisError::schema(format!(
                "group '{}' has {} bin columns but '{}' is missing",
                group,
                n_bins,
                bin_column_name(group, index)
            )));
        }
    }
    Ok(n_bins)
}

/// Ingested sheet with normalised headers.
///
/// Columns are either `Float64` (every non-missing cell numeric) or
/// `String`. The table is never mutated after construction, so it can be
/// shared between concurrent analyses.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    data: DataFrame,
}

impl RawTable {
    /// Wraps a DataFrame, validating the bin naming convention.
    pub fn try_new(data: DataFrame) -> StatResult<Self> {
        let table = RawTable { data };
        for group in table.bin_groups() {
            checked_bin_count(&table.data, &group)?;
        }
        Ok(table)
    }

    /// Builds a table from normalised headers and rows of cells.
    pub fn try_from_rows(
        headers: Vec<String>,
        rows: Vec<Vec<Option<ScalarValue>>>,
    ) -> StatResult<Self> {
        if let Some(duplicate) = headers.iter().duplicates().next() {
            return Err(AnalysisError::schema(format!(
                "duplicate column name '{}'",
                duplicate
            )));
        }
        if let Some((row_idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headers.len())
        {
            return Err(AnalysisError::schema(format!(
                "row {} has {} cells, expected {}",
                row_idx,
                row.len(),
                headers.len()
            )));
        }

        let columns = headers
            .iter()
            .enumerate()
            .map(|(col_idx, name)| {
                let cells = rows.iter().map(|row| &row[col_idx]).collect_vec();
                build_column(name, &cells)
            })
            .collect_vec();
        debug!(
            "Built table with {} columns and {} rows",
            columns.len(),
            rows.len()
        );
        Self::try_new(DataFrame::new(columns)?)
    }

    #[inline(always)]
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.data.height()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.data.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(
        &self,
        name: &str,
    ) -> bool {
        self.data.column(name).is_ok()
    }

    pub fn column(
        &self,
        name: &str,
    ) -> StatResult<&Series> {
        self.data
            .column(name)
            .map(|column| column.as_materialized_series())
            .map_err(|_| AnalysisError::schema(format!("column '{}' not found", name)))
    }

    /// Columns that are not part of a bin group.
    pub fn parameters(&self) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|name| parse_bin_column(name).is_none())
            .collect()
    }

    /// Bin group names, in header order.
    pub fn bin_groups(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .into_iter()
            .filter_map(|name| parse_bin_column(name.as_str()).map(|(g, _)| g.to_owned()))
            .unique()
            .collect()
    }

    pub fn bin_count(
        &self,
        group: &str,
    ) -> usize {
        let names = self.data.get_column_names();
        group_bin_indices(names.iter().map(|n| n.as_str()), group).len()
    }

    /// Resolves the aggregate column of a bin group: `"Total <group>"` first,
    /// then `"Average <group>"`.
    pub fn aggregate_column(
        &self,
        group: &str,
    ) -> StatResult<String> {
        ["Total", "Average"]
            .iter()
            .map(|prefix| format!("{} {}", prefix, group))
            .find(|name| self.has_column(name))
            .ok_or_else(|| {
                AnalysisError::schema(format!(
                    "no 'Total {0}' or 'Average {0}' column found for bin group '{0}'",
                    group
                ))
            })
    }

    /// Distinct non-missing values of a column, in first-seen order.
    pub fn distinct_values(
        &self,
        column: &str,
    ) -> StatResult<Vec<ScalarValue>> {
        let series = self.column(column)?;
        let values = match series.dtype() {
            DataType::String => {
                series
                    .str()?
                    .into_iter()
                    .flatten()
                    .unique()
                    .map(ScalarValue::from)
                    .collect()
            },
            _ => {
                series
                    .cast(&DataType::Float64)?
                    .f64()?
                    .into_iter()
                    .flatten()
                    .filter(|v| !v.is_nan())
                    .unique_by(|v| v.to_bits())
                    .map(ScalarValue::Number)
                    .collect()
            },
        };
        Ok(values)
    }

    /// Rows where every criterion holds. Empty criteria return the whole
    /// table.
    pub fn subset(
        &self,
        criteria: &FilterCriteria,
    ) -> StatResult<DataFrame> {
        if criteria.is_empty() {
            return Ok(self.data.clone());
        }
        let mut mask = BooleanChunked::full(PlSmallStr::from("mask"), true, self.height());
        for (column, value) in criteria.iter() {
            let series = self.column(column)?;
            mask = &mask & &equality_mask(series, value)?;
        }
        let subset = self.data.filter(&mask)?;
        trace!(
            "Criteria '{}' kept {} of {} rows",
            criteria.label(),
            subset.height(),
            self.height()
        );
        Ok(subset)
    }

    /// Cell at `row` of `column`, `None` when missing.
    pub fn cell(
        &self,
        column: &str,
        row: usize,
    ) -> StatResult<Option<ScalarValue>> {
        let series = self.column(column)?;
        if row >= series.len() {
            return Err(AnalysisError::schema(format!(
                "row {} out of bounds for column '{}' of length {}",
                row,
                column,
                series.len()
            )));
        }
        let value = match series.dtype() {
            DataType::String => series.str()?.get(row).map(ScalarValue::from),
            _ => {
                series
                    .cast(&DataType::Float64)?
                    .f64()?
                    .get(row)
                    .filter(|v| !v.is_nan())
                    .map(ScalarValue::Number)
            },
        };
        Ok(value)
    }
}

fn build_column(
    name: &str,
    cells: &[&Option<ScalarValue>],
) -> Column {
    let all_numeric = cells.iter().all(|cell| {
        cell.as_ref()
            .map(ScalarValue::is_number)
            .unwrap_or(true)
    });
    let series = if all_numeric {
        let values = cells
            .iter()
            .map(|cell| cell.as_ref().and_then(ScalarValue::as_f64))
            .collect_vec();
        Series::new(PlSmallStr::from(name), values)
    }
    else {
        let values = cells
            .iter()
            .map(|cell| cell.as_ref().map(|v| v.to_string()))
            .collect_vec();
        Series::new(PlSmallStr::from(name), values)
    };
    series.into()
}

fn equality_mask(
    series: &Series,
    value: &ScalarValue,
) -> StatResult<BooleanChunked> {
    let mask: BooleanChunked = match series.dtype() {
        DataType::String => {
            let expected = value.to_string();
            series
                .str()?
                .into_iter()
                .map(|cell| cell.map(str::trim) == Some(expected.as_str()))
                .collect()
        },
        _ => {
            match value.as_f64() {
                Some(expected) => {
                    series
                        .cast(&DataType::Float64)?
                        .f64()?
                        .into_iter()
                        .map(|cell| cell == Some(expected))
                        .collect()
                },
                None => BooleanChunked::full(series.name().clone(), false, series.len()),
            }
        },
    };
    Ok(mask)
}
