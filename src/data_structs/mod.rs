//! This module contains the core data structures passed through the
//! analysis pipeline.
//!
//! - [`ScalarValue`]: a single spreadsheet cell, numeric or text.
//! - [`RawTable`]: the ingested sheet, a `polars::DataFrame` with normalised
//!   headers, plus the bin-group naming convention (`"<Group> bin <i>"`).
//! - [`FilterCriteria`]: ordered equality filters used to carve out subsets.
//! - [`FilteredDataset`]: a filtered subset with an outlier-cleaned numeric
//!   series for one target column and its normality flag.
//! - [`BinLongTable`]: the long (one row per observation) form of a bin
//!   group, input of the ANOVA engines.
//! - [`AnovaResult`]: row-labelled ANOVA tables.

mod anova;
mod criteria;
mod dataset;
mod long_table;
mod raw_table;
mod scalar;

pub use anova::{
    AnovaResult,
    AnovaRow,
};
pub use criteria::FilterCriteria;
pub use dataset::FilteredDataset;
pub use long_table::{
    BinLongTable,
    BIN_COLUMN,
};
#[cfg(test)]
pub(crate) use raw_table::tests::demo_table;
pub(crate) use raw_table::checked_bin_count;
pub use raw_table::{
    bin_column_name,
    parse_bin_column,
    RawTable,
};
pub use scalar::ScalarValue;
