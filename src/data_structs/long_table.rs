use std::collections::BTreeMap;

use itertools::Itertools;
use log::debug;
use polars::prelude::*;

use crate::error::{
    AnalysisError,
    StatResult,
};

/// Name of the bin index column of a [`BinLongTable`].
pub const BIN_COLUMN: &str = "bin";

/// Long form of a bin group: one row per surviving observation.
///
/// Columns are [`BIN_COLUMN`] (`UInt32`, 1-based), the group's values
/// (`Float64`, named after the group) and, once tagged with
/// [`BinLongTable::with_factor`], a `String` column named after the second
/// factor. Rows are ordered by bin.
#[derive(Debug, Clone, PartialEq)]
pub struct BinLongTable {
    data:   DataFrame,
    group:  String,
    factor: Option<String>,
}

impl BinLongTable {
    /// Builds the table from per-bin samples; `bins[i]` holds the values of
    /// bin `i + 1`.
    pub fn from_bins(
        group: &str,
        bins: Vec<Vec<f64>>,
    ) -> StatResult<Self> {
        if group == BIN_COLUMN {
            return Err(AnalysisError::schema(format!(
                "group name '{}' clashes with the bin index column",
                group
            )));
        }
        let (indices, values): (Vec<u32>, Vec<f64>) = bins
            .into_iter()
            .enumerate()
            .flat_map(|(i, samples)| {
                samples
                    .into_iter()
                    .map(move |v| (i as u32 + 1, v))
            })
            .unzip();
        let data = DataFrame::new(vec![
            Series::new(PlSmallStr::from(BIN_COLUMN), indices).into(),
            Series::new(PlSmallStr::from(group), values).into(),
        ])?;
        debug!("Reshaped group '{}' into {} rows", group, data.height());
        Ok(Self {
            data,
            group: group.to_owned(),
            factor: None,
        })
    }

    /// Tags every row with `label` in a new column `name`.
    pub fn with_factor(
        mut self,
        name: &str,
        label: &str,
    ) -> StatResult<Self> {
        if name == BIN_COLUMN || name == self.group {
            return Err(AnalysisError::InvalidRequest(format!(
                "factor column '{}' clashes with an existing column",
                name
            )));
        }
        let labels = Series::new(
            PlSmallStr::from(name),
            vec![label.to_owned(); self.data.height()],
        );
        if self.factor.is_some() {
            self.data.replace_column(2, labels.into_column())?;
        }
        else {
            self.data.with_column(labels.into_column())?;
        }
        self.data = self.data.select([BIN_COLUMN, self.group.as_str(), name])?;
        self.factor = Some(name.to_owned());
        Ok(self)
    }

    /// Stacks `other` below `self`. Both must describe the same group and
    /// factor column.
    pub fn concat(
        &self,
        other: &BinLongTable,
    ) -> StatResult<Self> {
        if self.group != other.group || self.factor != other.factor {
            return Err(AnalysisError::InvalidRequest(format!(
                "cannot concatenate long tables of '{}' ({:?}) and '{}' ({:?})",
                self.group, self.factor, other.group, other.factor
            )));
        }
        let mut data = self.data.vstack(&other.data)?;
        data.rechunk_mut();
        Ok(Self {
            data,
            group: self.group.clone(),
            factor: self.factor.clone(),
        })
    }

    #[inline(always)]
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Name of the value column.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Name of the second-factor column, if tagged.
    pub fn factor(&self) -> Option<&str> {
        self.factor.as_deref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.height()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    pub fn bins(&self) -> StatResult<Vec<u32>> {
        Ok(self
            .data
            .column(BIN_COLUMN)?
            .as_materialized_series()
            .u32()?
            .into_no_null_iter()
            .collect())
    }

    pub fn values(&self) -> StatResult<Vec<f64>> {
        Ok(self
            .data
            .column(&self.group)?
            .as_materialized_series()
            .f64()?
            .into_no_null_iter()
            .collect())
    }

    /// Factor label of every row.
    pub fn factor_labels(&self) -> StatResult<Vec<String>> {
        let name = self.factor.as_deref().ok_or_else(|| {
            AnalysisError::InvalidRequest(format!(
                "long table of '{}' has no factor column",
                self.group
            ))
        })?;
        Ok(self
            .data
            .column(name)?
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|label| label.unwrap_or_default().to_owned())
            .collect())
    }

    /// Values grouped by bin, in ascending bin order.
    pub fn samples_by_bin(&self) -> StatResult<Vec<(u32, Vec<f64>)>> {
        let grouped: BTreeMap<u32, Vec<f64>> = self
            .bins()?
            .into_iter()
            .zip(self.values()?)
            .fold(BTreeMap::new(), |mut acc, (bin, value)| {
                acc.entry(bin).or_insert_with(Vec::new).push(value);
                acc
            });
        Ok(grouped.into_iter().collect_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight_table() -> BinLongTable {
        BinLongTable::from_bins("Weight", vec![vec![10.0, 11.0], vec![12.0], vec![
            13.0, 14.0, 15.0,
        ]])
        .unwrap()
    }

    #[test]
    fn test_from_bins() {
        let table = weight_table();
        assert_eq!(table.len(), 6);
        assert_eq!(table.bins().unwrap(), vec![1, 1, 2, 3, 3, 3]);
        assert_eq!(table.values().unwrap(), vec![
            10.0, 11.0, 12.0, 13.0, 14.0, 15.0
        ]);
        assert_eq!(table.factor(), None);
    }

    #[test]
    fn test_samples_by_bin() {
        let table = weight_table();
        assert_eq!(table.samples_by_bin().unwrap(), vec![
            (1, vec![10.0, 11.0]),
            (2, vec![12.0]),
            (3, vec![13.0, 14.0, 15.0]),
        ]);
    }

    #[test]
    fn test_with_factor_and_concat() {
        let a = weight_table().with_factor("Genotype", "WT").unwrap();
        let b = BinLongTable::from_bins("Weight", vec![vec![1.0], vec![2.0]])
            .unwrap()
            .with_factor("Genotype", "KO")
            .unwrap();
        let combined = a.concat(&b).unwrap();
        assert_eq!(combined.len(), 8);
        assert_eq!(combined.factor(), Some("Genotype"));
        assert_eq!(combined.data().width(), 3);
        let labels = combined.factor_labels().unwrap();
        assert_eq!(labels.iter().filter(|l| *l == "WT").count(), 6);
        assert_eq!(labels.last().map(String::as_str), Some("KO"));

        let retagged = b.with_factor("Genotype", "HET").unwrap();
        assert_eq!(retagged.data().width(), 3);
        assert_eq!(retagged.factor_labels().unwrap(), vec!["HET", "HET"]);
    }

    #[test]
    fn test_concat_mismatch() {
        let a = weight_table().with_factor("Genotype", "WT").unwrap();
        let b = weight_table();
        assert!(matches!(
            a.concat(&b),
            Err(AnalysisError::InvalidRequest(_))
        ));
        assert!(weight_table().factor_labels().is_err());
    }
}
