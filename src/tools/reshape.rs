use log::{
    debug,
    info,
};
use polars::prelude::*;

use crate::data_structs::{
    bin_column_name,
    BinLongTable,
};
use crate::error::{
    AnalysisError,
    StatResult,
};
use crate::tools::outliers::filter_numeric_series;

/// Reshapes the `"<group> bin i"` columns of `df` into a [`BinLongTable`].
///
/// Each bin is cleaned on its own: missing cells are dropped and Grubbs'
/// test (at `alpha`) runs per bin, never across bins.
pub fn reshape_bins(
    df: &DataFrame,
    group: &str,
    alpha: f64,
) -> StatResult<BinLongTable> {
    let n_bins = crate::data_structs::checked_bin_count(df, group)?;
    info!("Reshaping group '{}' with {} bins", group, n_bins);

    let bins = (1..=n_bins)
        .map(|index| {
            let name = bin_column_name(group, index);
            let column = df
                .column(&name)
                .map_err(|_| AnalysisError::schema(format!("column '{}' not found", name)))?
                .as_materialized_series();
            let samples = filter_numeric_series(column, alpha)?;
            debug!(
                "Bin {} of '{}': {} of {} cells kept",
                index,
                group,
                samples.len(),
                column.len()
            );
            Ok(samples)
        })
        .collect::<StatResult<Vec<_>>>()?;

    BinLongTable::from_bins(group, bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structs::demo_table;
    use crate::data_structs::{
        FilterCriteria,
        ScalarValue,
    };
    use crate::tools::outliers::GRUBBS_ALPHA;

    #[test]
    fn test_reshape_row_count() {
        let table = demo_table();
        let long = reshape_bins(table.data(), "Weight", GRUBBS_ALPHA).unwrap();
        let expected: usize = (1..=3)
            .map(|i| {
                let column = table.column(&bin_column_name("Weight", i)).unwrap();
                column.len() - column.null_count()
            })
            .sum();
        assert_eq!(long.len(), expected);
        assert_eq!(long.bins().unwrap(), vec![1, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3]);
        assert_eq!(long.group(), "Weight");
    }

    #[test]
    fn test_reshape_filtered_subset() {
        let table = demo_table();
        let criteria = FilterCriteria::new().with("Genotype", ScalarValue::from("WT"));
        let subset = table.subset(&criteria).unwrap();
        let long = reshape_bins(&subset, "Weight", GRUBBS_ALPHA).unwrap();
        assert_eq!(long.samples_by_bin().unwrap(), vec![
            (1, vec![10.0, 11.0, 12.0]),
            (2, vec![11.0, 12.0]),
            (3, vec![12.0, 13.0, 14.0]),
        ]);
    }

    #[test]
    fn test_per_bin_outlier_removal() {
        let bin1 = Series::new("Speed bin 1".into(), vec![5.0, 5.1, 4.9, 5.0, 5.2, 4.8, 50.0]);
        let bin2 = Series::new("Speed bin 2".into(), vec![50.0, 51.0, 49.0, 50.5, 49.5, 50.2, 49.8]);
        let df = DataFrame::new(vec![bin1.into(), bin2.into()]).unwrap();
        let long = reshape_bins(&df, "Speed", GRUBBS_ALPHA).unwrap();
        let by_bin = long.samples_by_bin().unwrap();
        assert_eq!(by_bin[0].1.len(), 6);
        assert!(!by_bin[0].1.contains(&50.0));
        assert_eq!(by_bin[1].1.len(), 7);
    }

    #[test]
    fn test_missing_bins() {
        let table = demo_table();
        assert!(matches!(
            reshape_bins(table.data(), "Height", GRUBBS_ALPHA),
            Err(AnalysisError::Schema(_))
        ));
    }
}
