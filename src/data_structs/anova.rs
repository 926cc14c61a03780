use std::fmt;

use itertools::Itertools;
use polars::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};

use crate::error::StatResult;

/// One source of variation in an ANOVA table. `None` marks a blank cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaRow {
    pub source: String,
    pub ss:     f64,
    pub df:     Option<usize>,
    pub f:      Option<f64>,
    pub p:      Option<f64>,
}

impl AnovaRow {
    /// Row with only a sum of squares.
    pub fn new<S: Into<String>>(
        source: S,
        ss: f64,
    ) -> Self {
        Self {
            source: source.into(),
            ss,
            df: None,
            f: None,
            p: None,
        }
    }

    crate::with_field_fn!(df, Option<usize>);

    crate::with_field_fn!(f, Option<f64>);

    crate::with_field_fn!(p, Option<f64>);

    /// Mean square, when degrees of freedom are known and positive.
    pub fn ms(&self) -> Option<f64> {
        self.df
            .filter(|df| *df > 0)
            .map(|df| self.ss / df as f64)
    }
}

/// Row-labelled ANOVA table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaResult {
    p_label: String,
    rows:    Vec<AnovaRow>,
}

impl AnovaResult {
    pub fn new<S: Into<String>>(
        p_label: S,
        rows: Vec<AnovaRow>,
    ) -> Self {
        Self {
            p_label: p_label.into(),
            rows,
        }
    }

    /// Title of the p-value column (`P` or `PR(>F)`).
    pub fn p_label(&self) -> &str {
        &self.p_label
    }

    pub fn rows(&self) -> &[AnovaRow] {
        &self.rows
    }

    pub fn row(
        &self,
        source: &str,
    ) -> Option<&AnovaRow> {
        self.rows.iter().find(|row| row.source == source)
    }

    /// Columns `source`, `SS`, `DF`, `F` and the p-value column.
    pub fn to_df(&self) -> StatResult<DataFrame> {
        let sources = self.rows.iter().map(|r| r.source.clone()).collect_vec();
        let ss = self.rows.iter().map(|r| r.ss).collect_vec();
        let df = self
            .rows
            .iter()
            .map(|r| r.df.map(|v| v as u64))
            .collect_vec();
        let f = self.rows.iter().map(|r| r.f).collect_vec();
        let p = self.rows.iter().map(|r| r.p).collect_vec();
        Ok(DataFrame::new(vec![
            Series::new("source".into(), sources).into(),
            Series::new("SS".into(), ss).into(),
            Series::new("DF".into(), df).into(),
            Series::new("F".into(), f).into(),
            Series::new(self.p_label.as_str().into(), p).into(),
        ])?)
    }
}

fn fmt_cell<T: fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl fmt::Display for AnovaResult {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let header = ["", "SS", "DF", "F", self.p_label.as_str()].map(String::from);
        let body = self
            .rows
            .iter()
            .map(|row| {
                [
                    row.source.clone(),
                    format!("{:.6}", row.ss),
                    fmt_cell(row.df),
                    fmt_cell(row.f.map(|v| format!("{:.6}", v))),
                    fmt_cell(row.p.map(|v| format!("{:.6e}", v))),
                ]
            })
            .collect_vec();
        let widths = (0..header.len())
            .map(|col| {
                body.iter()
                    .map(|cells| cells[col].len())
                    .chain(std::iter::once(header[col].len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect_vec();

        for cells in std::iter::once(&header).chain(body.iter()) {
            let line = cells
                .iter()
                .zip(widths.iter())
                .enumerate()
                .map(|(col, (cell, width))| {
                    if col == 0 {
                        format!("{:<width$}", cell, width = width)
                    }
                    else {
                        format!("{:>width$}", cell, width = width)
                    }
                })
                .join("  ");
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_way() -> AnovaResult {
        AnovaResult::new("P", vec![
            AnovaRow::new("Between", 12.0)
                .with_df(Some(2))
                .with_f(Some(4.0))
                .with_p(Some(0.03)),
            AnovaRow::new("Within", 18.0).with_df(Some(12)),
            AnovaRow::new("Total", 30.0),
        ])
    }

    #[test]
    fn test_rows() {
        let result = one_way();
        assert_eq!(result.rows().len(), 3);
        assert_eq!(result.row("Within").and_then(AnovaRow::ms), Some(1.5));
        assert_eq!(result.row("Total").and_then(|r| r.df), None);
        assert!(result.row("Residual").is_none());
    }

    #[test]
    fn test_to_df() {
        let df = one_way().to_df().unwrap();
        assert_eq!(df.shape(), (3, 5));
        assert_eq!(
            df.get_column_names()
                .iter()
                .map(|n| n.as_str())
                .collect_vec(),
            vec!["source", "SS", "DF", "F", "P"]
        );
        assert_eq!(df.column("DF").unwrap().null_count(), 1);
        assert_eq!(df.column("F").unwrap().null_count(), 2);
    }

    #[test]
    fn test_display() {
        let text = one_way().to_string();
        let lines = text.lines().collect_vec();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with('P'));
        assert!(lines[1].starts_with("Between"));
        assert!(lines[3].starts_with("Total"));
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_value(one_way()).unwrap();
        assert_eq!(json["p_label"], "P");
        assert_eq!(json["rows"][2]["df"], serde_json::Value::Null);
    }
}
