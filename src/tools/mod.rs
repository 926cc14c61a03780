//! This module provides the analyses run on an ingested [`RawTable`].
//!
//! Key submodules:
//!
//! - [`outliers`]: Grubbs' test based cleaning of a single numeric column.
//! - [`reshape`]: conversion of wide `"<group> bin i"` columns into a
//!   [`BinLongTable`].
//! - [`stats`]: descriptive statistics, normality and null-hypothesis tests
//!   on [`FilteredDataset`]s.
//! - [`anova`]: one-way ANOVA over the bins of a group and two-way ANOVA
//!   (parameter × bin, with interaction).
//! - [`plot`]: the interaction-plot capability the two-way engine calls out
//!   to. Rendering itself lives outside this crate.
//! - [`request`]: the explicit request context and the driver threading it
//!   through the pipeline.
//!
//! [`RawTable`]: crate::data_structs::RawTable
//! [`BinLongTable`]: crate::data_structs::BinLongTable
//! [`FilteredDataset`]: crate::data_structs::FilteredDataset
pub mod anova;
pub mod outliers;
pub mod plot;
pub mod request;
pub mod reshape;
pub mod stats;
