//! # binstat
//!
//! `binstat` is a Rust library for the statistics pipeline behind binned
//! spreadsheet measurements: a sheet holds one row per subject/condition and
//! a repeated measurement spread over merged-header "bins" (`Weight bin 1`,
//! `Weight bin 2`, ...) next to a `Total Weight` or `Average Weight` column.
//!
//! The crate turns such a sheet into a [`RawTable`], carves filtered subsets
//! out of it, removes outliers with Grubbs' test and runs descriptive
//! statistics, normality and null-hypothesis tests, and one- and two-way
//! ANOVA.
//!
//! If you do not want to use binstat as a crate, check out the `binstat` CLI
//! in the `binstat-ci` package.
//!
//! ## Structure
//!
//! * [`data_structs`]: tables and values the pipeline passes around
//!   ([`RawTable`], [`FilterCriteria`], [`FilteredDataset`],
//!   [`BinLongTable`], [`AnovaResult`]).
//! * [`io`]: header normalisation for merged cells and a delimited-text sheet
//!   reader.
//! * [`tools`]: the analyses themselves: outlier filtering, bin reshaping,
//!   statistics, ANOVA engines, the plotting capability and the request
//!   driver.
//! * [`utils`]: statistical primitives (Shapiro-Wilk, Levene, t-test,
//!   rank-sum, one-way F-test) and small helper macros.
//!
//! ## Usage
//!
//! ```no_run
//! use binstat::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let table = read_sheet_path("path/to/sheet.csv")?;
//!     let criteria = FilterCriteria::new()
//!         .with("Genotype", ScalarValue::from("WT"))
//!         .with("Week", ScalarValue::from(4.0));
//!
//!     let dataset =
//!         FilteredDataset::try_new(&table, "Total Weight", &criteria, GRUBBS_ALPHA)?;
//!     println!("{:?}", display_stat_info(&dataset)?);
//!
//!     let long = reshape_bins(dataset.subset(), "Weight", GRUBBS_ALPHA)?;
//!     println!("{}", one_way_anova(&long)?);
//!     Ok(())
//! }
//! ```
//!
//! Number of threads used by polars can be configured with the
//! `BINSTAT_NUM_THREADS` environment variable.
//!
//! [`RawTable`]: data_structs::RawTable
//! [`FilterCriteria`]: data_structs::FilterCriteria
//! [`FilteredDataset`]: data_structs::FilteredDataset
//! [`BinLongTable`]: data_structs::BinLongTable
//! [`AnovaResult`]: data_structs::AnovaResult

#[ctor::ctor]
fn init() {
    if let Ok(n) = std::env::var("BINSTAT_NUM_THREADS") {
        std::env::set_var("POLARS_MAX_THREADS", n)
    }
}

pub mod data_structs;
pub mod error;
pub mod exports;
pub mod io;
pub mod prelude;
pub mod tools;
pub mod utils;
