use std::fmt;

use log::{
    debug,
    info,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::data_structs::{
    AnovaResult,
    FilterCriteria,
    FilteredDataset,
    RawTable,
    ScalarValue,
};
use crate::error::{
    AnalysisError,
    StatResult,
};
use crate::tools::anova::{
    one_way_anova,
    two_way_anova,
};
use crate::tools::outliers::GRUBBS_ALPHA;
use crate::tools::plot::{
    EncodedImage,
    InteractionPlotter,
};
use crate::tools::reshape::reshape_bins;
use crate::tools::stats::{
    display_stat_info,
    normality_tests,
    null_hypothesis_tests,
    HypothesisReport,
    NormalityReport,
    StatInfo,
};
use crate::with_field_fn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisKind {
    StatisticalInfo,
    OneWayAnova,
    NormalityTests,
    NullHypothesisTests,
    TwoWayAnova,
}

impl AnalysisKind {
    /// Number of criteria sets (datasets) the analysis works on.
    pub fn dataset_count(&self) -> usize {
        match self {
            AnalysisKind::StatisticalInfo | AnalysisKind::OneWayAnova => 1,
            AnalysisKind::NormalityTests
            | AnalysisKind::NullHypothesisTests
            | AnalysisKind::TwoWayAnova => 2,
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            AnalysisKind::StatisticalInfo => "Statistical Info",
            AnalysisKind::OneWayAnova => "One-way ANOVA",
            AnalysisKind::NormalityTests => "Normality Tests",
            AnalysisKind::NullHypothesisTests => "Null Hypothesis Tests",
            AnalysisKind::TwoWayAnova => "Two-way ANOVA",
        };
        write!(f, "{}", name)
    }
}

/// Tunables shared by every analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Significance level of Grubbs' outlier test.
    pub outlier_alpha: f64,
    /// Minimum number of cleaned samples per dataset.
    pub min_samples:   usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            outlier_alpha: GRUBBS_ALPHA,
            min_samples:   2,
        }
    }
}

impl AnalysisConfig {
    with_field_fn!(outlier_alpha, f64);

    with_field_fn!(min_samples, usize);
}

/// What to analyse: the kind, the property (a column or a bin group) and one
/// criteria set per dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub kind:     AnalysisKind,
    pub property: String,
    pub criteria: Vec<FilterCriteria>,
}

impl AnalysisRequest {
    pub fn new<S: Into<String>>(
        kind: AnalysisKind,
        property: S,
    ) -> Self {
        Self {
            kind,
            property: property.into(),
            criteria: Vec::new(),
        }
    }

    /// Appends a criteria set.
    pub fn with_criteria(
        mut self,
        criteria: FilterCriteria,
    ) -> Self {
        self.criteria.push(criteria);
        self
    }

    fn validate(&self) -> StatResult<()> {
        let expected = self.kind.dataset_count();
        if self.criteria.len() != expected {
            return Err(AnalysisError::InvalidRequest(format!(
                "{} expects {} criteria set(s), got {}",
                self.kind,
                expected,
                self.criteria.len()
            )));
        }
        if self.property.trim().is_empty() {
            return Err(AnalysisError::InvalidRequest(
                "no property selected".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "analysis", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    StatisticalInfo {
        info: StatInfo,
    },
    OneWayAnova {
        table: AnovaResult,
    },
    NormalityTests {
        info:      [StatInfo; 2],
        normality: NormalityReport,
    },
    NullHypothesisTests {
        info:       [StatInfo; 2],
        normality:  NormalityReport,
        hypothesis: HypothesisReport,
    },
    TwoWayAnova {
        factor: String,
        table:  AnovaResult,
        #[serde(skip)]
        plot:   EncodedImage,
    },
}

impl AnalysisOutcome {
    pub fn anova_table(&self) -> Option<&AnovaResult> {
        match self {
            AnalysisOutcome::OneWayAnova { table } | AnalysisOutcome::TwoWayAnova { table, .. } => {
                Some(table)
            },
            _ => None,
        }
    }

    pub fn plot(&self) -> Option<&EncodedImage> {
        match self {
            AnalysisOutcome::TwoWayAnova { plot, .. } => Some(plot),
            _ => None,
        }
    }
}

/// First column constrained by both criteria sets with different values.
pub fn detect_factor(
    a: &FilterCriteria,
    b: &FilterCriteria,
) -> StatResult<(String, ScalarValue, ScalarValue)> {
    a.iter()
        .find_map(|(column, value_a)| {
            b.get(column)
                .filter(|value_b| *value_b != value_a)
                .map(|value_b| (column.clone(), value_a.clone(), value_b.clone()))
        })
        .ok_or_else(|| {
            AnalysisError::InvalidRequest(
                "Cannot perform two-way ANOVA: the datasets do not differ in any shared parameter"
                    .into(),
            )
        })
}

fn dataset(
    table: &RawTable,
    target: &str,
    criteria: &FilterCriteria,
    config: &AnalysisConfig,
) -> StatResult<FilteredDataset> {
    let dataset = FilteredDataset::try_new(table, target, criteria, config.outlier_alpha)?;
    dataset.ensure_min_samples(config.min_samples)?;
    Ok(dataset)
}

/// Runs `request` against `table`.
///
/// `plotter` is only called by the two-way ANOVA.
pub fn run_analysis<P>(
    table: &RawTable,
    request: &AnalysisRequest,
    config: &AnalysisConfig,
    plotter: &P,
) -> StatResult<AnalysisOutcome>
where
    P: InteractionPlotter + ?Sized, {
    request.validate()?;
    info!("Running {} on '{}'", request.kind, request.property);
    let property = request.property.as_str();

    let outcome = match request.kind {
        AnalysisKind::StatisticalInfo => {
            let ds = dataset(table, property, &request.criteria[0], config)?;
            AnalysisOutcome::StatisticalInfo {
                info: display_stat_info(&ds)?,
            }
        },
        AnalysisKind::OneWayAnova => {
            let aggregate = table.aggregate_column(property)?;
            let ds = dataset(table, &aggregate, &request.criteria[0], config)?;
            let long = reshape_bins(ds.subset(), property, config.outlier_alpha)?;
            AnalysisOutcome::OneWayAnova {
                table: one_way_anova(&long)?,
            }
        },
        AnalysisKind::NormalityTests | AnalysisKind::NullHypothesisTests => {
            let a = dataset(table, property, &request.criteria[0], config)?;
            let b = dataset(table, property, &request.criteria[1], config)?;
            let (a, b, normality) = normality_tests(a, b)?;
            let info = [display_stat_info(&a)?, display_stat_info(&b)?];
            if request.kind == AnalysisKind::NormalityTests {
                AnalysisOutcome::NormalityTests { info, normality }
            }
            else {
                AnalysisOutcome::NullHypothesisTests {
                    hypothesis: null_hypothesis_tests(&a, &b)?,
                    info,
                    normality,
                }
            }
        },
        AnalysisKind::TwoWayAnova => {
            let (criteria_a, criteria_b) = (&request.criteria[0], &request.criteria[1]);
            let aggregate = table.aggregate_column(property)?;
            let a = dataset(table, &aggregate, criteria_a, config)?;
            let b = dataset(table, &aggregate, criteria_b, config)?;
            let (factor, level_a, level_b) = detect_factor(criteria_a, criteria_b)?;
            debug!("Two-way factor '{}': {} vs {}", factor, level_a, level_b);

            let long_a = reshape_bins(a.subset(), property, config.outlier_alpha)?
                .with_factor(&factor, &level_a.to_string())?;
            let long_b = reshape_bins(b.subset(), property, config.outlier_alpha)?
                .with_factor(&factor, &level_b.to_string())?;
            let result = two_way_anova(&long_a, &long_b, plotter)?;
            AnalysisOutcome::TwoWayAnova {
                factor,
                table: result.table,
                plot: result.plot,
            }
        },
    };
    Ok(outcome)
}
