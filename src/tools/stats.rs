use std::fmt;

use log::{
    debug,
    info,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::data_structs::FilteredDataset;
use crate::error::StatResult;
use crate::utils::{
    levene,
    rank_sum,
    shapiro_wilk,
    ttest_ind,
};

/// Significance level below which a normality test downgrades a dataset.
pub const NORMALITY_ALPHA: f64 = 0.05;

/// Descriptive statistics of a [`FilteredDataset`], chosen by its normality
/// flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatInfo {
    NoData {
        name: String,
    },
    Parametric {
        name: String,
        n:    usize,
        mean: f64,
        std:  f64,
        sem:  f64,
    },
    NonParametric {
        name:   String,
        n:      usize,
        median: f64,
        q25:    f64,
        q75:    f64,
    },
}

impl StatInfo {
    pub fn name(&self) -> &str {
        match self {
            StatInfo::NoData { name }
            | StatInfo::Parametric { name, .. }
            | StatInfo::NonParametric { name, .. } => name,
        }
    }
}

impl fmt::Display for StatInfo {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            StatInfo::NoData { name } => write!(f, "{}: no data", name),
            StatInfo::Parametric {
                name,
                n,
                mean,
                std,
                sem,
            } => {
                write!(
                    f,
                    "{} (n={}): mean={:.4}, std={:.4}, sem={:.4}",
                    name, n, mean, std, sem
                )
            },
            StatInfo::NonParametric {
                name,
                n,
                median,
                q25,
                q75,
            } => {
                write!(
                    f,
                    "{} (n={}): median={:.4}, q25={:.4}, q75={:.4}",
                    name, n, median, q25, q75
                )
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestKind {
    #[serde(rename = "Shapiro-Wilk")]
    ShapiroWilk,
    Levene,
    #[serde(rename = "Student's t")]
    StudentT,
    #[serde(rename = "Wilcoxon rank-sum")]
    RankSum,
}

impl fmt::Display for TestKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            TestKind::ShapiroWilk => "Shapiro-Wilk",
            TestKind::Levene => "Levene",
            TestKind::StudentT => "Student's t",
            TestKind::RankSum => "Wilcoxon rank-sum",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of one statistical test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test:      TestKind,
    /// Dataset name, or `"<a> vs <b>"` for two-sample tests.
    pub subject:   String,
    pub statistic: f64,
    pub p_value:   f64,
}

impl TestResult {
    pub fn is_significant(
        &self,
        alpha: f64,
    ) -> bool {
        self.p_value < alpha
    }
}

impl fmt::Display for TestResult {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{} [{}]: statistic={:.4}, p={:.4e}",
            self.test, self.subject, self.statistic, self.p_value
        )
    }
}

/// Normality test results in the order they were computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityReport {
    pub results: Vec<TestResult>,
}

/// Null-hypothesis test results. `parametric` is set when both datasets were
/// normal and only the t-test ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisReport {
    pub parametric: bool,
    pub results:    Vec<TestResult>,
}

fn pair_name(
    a: &FilteredDataset,
    b: &FilteredDataset,
) -> String {
    format!("{} vs {}", a.name(), b.name())
}

/// Summary of `dataset`: mean/std/SEM when normal, median and quartiles
/// otherwise.
pub fn display_stat_info(dataset: &FilteredDataset) -> StatResult<StatInfo> {
    let name = dataset.name();
    if dataset.is_empty() {
        info!("{}: no data", name);
        return Ok(StatInfo::NoData { name });
    }
    let n = dataset.sample_count();
    let info = if dataset.is_normal() {
        StatInfo::Parametric {
            mean: dataset.mean()?,
            std: dataset.std()?,
            sem: dataset.sem()?,
            name,
            n,
        }
    }
    else {
        StatInfo::NonParametric {
            median: dataset.median()?,
            q25: dataset.quantile(0.25)?,
            q75: dataset.quantile(0.75)?,
            name,
            n,
        }
    };
    info!("{}", info);
    Ok(info)
}

/// Shapiro-Wilk on each dataset, then Levene's test across both.
///
/// A significant Shapiro-Wilk result marks its dataset non-normal; a
/// significant Levene result marks both. Flags are never raised back.
pub fn normality_tests(
    a: FilteredDataset,
    b: FilteredDataset,
) -> StatResult<(FilteredDataset, FilteredDataset, NormalityReport)> {
    let mut results = Vec::with_capacity(3);

    let mut check = |dataset: FilteredDataset| -> StatResult<FilteredDataset> {
        let (statistic, p_value) = shapiro_wilk(dataset.series())?;
        let result = TestResult {
            test: TestKind::ShapiroWilk,
            subject: dataset.name(),
            statistic,
            p_value,
        };
        info!("{}", result);
        let significant = result.is_significant(NORMALITY_ALPHA);
        results.push(result);
        Ok(if significant {
            dataset.mark_non_normal()
        }
        else {
            dataset
        })
    };
    let a = check(a)?;
    let b = check(b)?;

    let (statistic, p_value) = levene(&[a.series(), b.series()])?;
    let result = TestResult {
        test: TestKind::Levene,
        subject: pair_name(&a, &b),
        statistic,
        p_value,
    };
    info!("{}", result);
    let (a, b) = if result.is_significant(NORMALITY_ALPHA) {
        debug!("Unequal variances, both datasets marked non-normal");
        (a.mark_non_normal(), b.mark_non_normal())
    }
    else {
        (a, b)
    };
    results.push(result);

    Ok((a, b, NormalityReport { results }))
}

/// Student's t-test, plus the Wilcoxon rank-sum test unless both datasets
/// are normal.
pub fn null_hypothesis_tests(
    a: &FilteredDataset,
    b: &FilteredDataset,
) -> StatResult<HypothesisReport> {
    let subject = pair_name(a, b);
    let parametric = a.is_normal() && b.is_normal();

    let (statistic, p_value) = ttest_ind(a.series(), b.series())?;
    let mut results = vec![TestResult {
        test: TestKind::StudentT,
        subject: subject.clone(),
        statistic,
        p_value,
    }];
    if !parametric {
        let (statistic, p_value) = rank_sum(a.series(), b.series())?;
        results.push(TestResult {
            test: TestKind::RankSum,
            subject,
            statistic,
            p_value,
        });
    }
    for result in &results {
        info!("{}", result);
    }
    Ok(HypothesisReport {
        parametric,
        results,
    })
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use itertools::Itertools;

    use super::*;
    use crate::data_structs::{
        FilterCriteria,
        RawTable,
        ScalarValue,
    };
    use crate::tools::outliers::GRUBBS_ALPHA;

    /// Table with a `Value` column and a `Set` column selecting samples.
    fn table(sets: &[(&str, &[f64])]) -> RawTable {
        let headers = vec!["Set".to_string(), "Value".to_string()];
        let rows = sets
            .iter()
            .flat_map(|(set, values)| {
                values.iter().map(move |v| {
                    vec![Some(ScalarValue::from(*set)), Some(ScalarValue::Number(*v))]
                })
            })
            .collect_vec();
        RawTable::try_from_rows(headers, rows).unwrap()
    }

    fn dataset(
        table: &RawTable,
        set: &str,
    ) -> FilteredDataset {
        let criteria = FilterCriteria::new().with("Set", ScalarValue::from(set));
        FilteredDataset::try_new(table, "Value", &criteria, GRUBBS_ALPHA).unwrap()
    }

    const EVEN_A: [f64; 8] = [4.8, 5.1, 5.0, 4.9, 5.3, 4.7, 5.2, 5.0];
    const EVEN_B: [f64; 8] = [5.9, 6.1, 6.0, 5.8, 6.3, 5.7, 6.2, 6.0];
    // skewed, but not skewed enough for Grubbs' test to trim it
    const SKEWED: [f64; 8] = [5.0, 5.0, 5.0, 5.0, 5.0, 5.1, 6.0, 6.4];

    #[test]
    fn test_stat_info_parametric() {
        let table = table(&[("a", &[1.0, 2.0, 3.0, 4.0])]);
        let info = display_stat_info(&dataset(&table, "a")).unwrap();
        match info {
            StatInfo::Parametric {
                name,
                n,
                mean,
                std,
                sem,
            } => {
                assert_eq!(name, "a : Value");
                assert_eq!(n, 4);
                assert_approx_eq!(mean, 2.5);
                assert_approx_eq!(std, 1.290994, 1e-6);
                assert_approx_eq!(sem, 0.645497, 1e-6);
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_stat_info_no_data() {
        let table = table(&[("a", &[1.0, 2.0])]);
        let info = display_stat_info(&dataset(&table, "missing")).unwrap();
        assert_eq!(info, StatInfo::NoData {
            name: "missing : Value".into(),
        });
    }

    #[test]
    fn test_normality_downgrade_is_sticky() {
        let table = table(&[("a", &SKEWED), ("b", &EVEN_A)]);
        let (a, b, report) =
            normality_tests(dataset(&table, "a"), dataset(&table, "b")).unwrap();
        assert_eq!(
            report.results.iter().map(|r| r.test).collect_vec(),
            vec![TestKind::ShapiroWilk, TestKind::ShapiroWilk, TestKind::Levene]
        );
        assert!(report.results[0].p_value < NORMALITY_ALPHA);
        // equal spread: Levene alone would lower no flag
        assert!(report.results[2].p_value >= NORMALITY_ALPHA);
        assert!(!a.is_normal());
        assert!(b.is_normal());

        // a second round cannot restore the flag
        let (a, b, again) = normality_tests(a, b).unwrap();
        assert!(again.results[2].p_value >= NORMALITY_ALPHA);
        assert!(!a.is_normal());
        assert!(b.is_normal());
        assert!(matches!(
            display_stat_info(&a).unwrap(),
            StatInfo::NonParametric { .. }
        ));
    }

    #[test]
    fn test_null_hypothesis_parametric() {
        let table = table(&[("a", &EVEN_A), ("b", &EVEN_B)]);
        let (a, b, _) = normality_tests(dataset(&table, "a"), dataset(&table, "b")).unwrap();
        assert!(a.is_normal() && b.is_normal());
        let report = null_hypothesis_tests(&a, &b).unwrap();
        assert!(report.parametric);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].test, TestKind::StudentT);
        assert!(report.results[0].is_significant(0.05));
    }

    #[test]
    fn test_null_hypothesis_non_parametric() {
        let table = table(&[("a", &SKEWED), ("b", &EVEN_B)]);
        let a = dataset(&table, "a").mark_non_normal();
        let b = dataset(&table, "b");
        let report = null_hypothesis_tests(&a, &b).unwrap();
        assert!(!report.parametric);
        assert_eq!(
            report.results.iter().map(|r| r.test).collect_vec(),
            vec![TestKind::StudentT, TestKind::RankSum]
        );
        assert_eq!(report.results[1].subject, "a : Value vs b : Value");
    }

    #[test]
    fn test_serialisation() {
        let info = StatInfo::NoData { name: "x".into() };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["kind"], "no_data");
        let result = TestResult {
            test:      TestKind::RankSum,
            subject:   "x vs y".into(),
            statistic: 1.0,
            p_value:   0.5,
        };
        assert_eq!(serde_json::to_value(&result).unwrap()["test"], "Wilcoxon rank-sum");
    }
}
