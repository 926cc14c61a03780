use log::{
    debug,
    trace,
};
use polars::prelude::*;
use statrs::distribution::{
    ContinuousCDF,
    StudentsT,
};
use statrs::statistics::Statistics;

use crate::error::{
    AnalysisError,
    StatResult,
};

/// Significance level used for outlier removal throughout the pipeline.
pub const GRUBBS_ALPHA: f64 = 0.05;

/// Drops missing cells and converts the rest to `f64`.
///
/// Text cells are parsed; the first one that is not a finite number fails
/// with [`AnalysisError::DataConversion`]. `NaN` in numeric columns counts as
/// missing.
pub fn coerce_numeric(series: &Series) -> StatResult<Vec<f64>> {
    let column = series.name().to_string();
    match series.dtype() {
        DataType::String => {
            series
                .str()?
                .into_iter()
                .flatten()
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .map(|cell| {
                    cell.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| {
                            AnalysisError::DataConversion {
                                column: column.clone(),
                                value:  cell.to_owned(),
                            }
                        })
                })
                .collect()
        },
        _ => {
            let casted = series.cast(&DataType::Float64)?;
            let values = casted.f64()?;
            values
                .into_iter()
                .flatten()
                .filter(|v| !v.is_nan())
                .map(|v| {
                    if v.is_finite() {
                        Ok(v)
                    }
                    else {
                        Err(AnalysisError::DataConversion {
                            column: column.clone(),
                            value:  v.to_string(),
                        })
                    }
                })
                .collect()
        },
    }
}

/// Two-sided Grubbs' critical value for `n` samples.
///
/// `G_crit = (n - 1) / sqrt(n) * sqrt(t^2 / (n - 2 + t^2))`, with `t` the
/// upper `alpha / (2n)` quantile of Student's t with `n - 2` degrees of
/// freedom.
pub fn grubbs_critical_value(
    n: usize,
    alpha: f64,
) -> StatResult<f64> {
    let fail = |reason: String| AnalysisError::OutlierTest { n, reason };
    if n < 3 {
        return Err(fail("at least 3 samples are needed".into()));
    }
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(fail(format!("significance level {} is not in (0, 1)", alpha)));
    }
    let nf = n as f64;
    let dist = StudentsT::new(0.0, 1.0, nf - 2.0).map_err(|e| fail(e.to_string()))?;
    let t = dist.inverse_cdf(1.0 - alpha / (2.0 * nf));
    if !t.is_finite() {
        return Err(fail(format!("t quantile evaluated to {}", t)));
    }
    let t2 = t * t;
    let critical = (nf - 1.0) / nf.sqrt() * (t2 / (nf - 2.0 + t2)).sqrt();
    if critical.is_finite() {
        Ok(critical)
    }
    else {
        Err(fail(format!("critical value evaluated to {}", critical)))
    }
}

/// Index of the point farthest from the mean and its Grubbs' statistic.
///
/// Returns `None` for fewer than two points or zero spread.
pub fn grubbs_statistic(values: &[f64]) -> Option<(usize, f64)> {
    if values.len() < 2 {
        return None;
    }
    let mean = values.iter().mean();
    let std = values.iter().std_dev();
    if std == 0.0 || !std.is_finite() {
        return None;
    }
    values
        .iter()
        .map(|v| (v - mean).abs())
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (idx, dev)| {
            match best {
                Some((_, best_dev)) if best_dev >= dev => best,
                _ => Some((idx, dev)),
            }
        })
        .map(|(idx, dev)| (idx, dev / std))
}

/// Iterative two-sided Grubbs' test. Removes the most extreme point while
/// its statistic exceeds the critical value; order of the survivors is
/// kept.
pub fn grubbs_filter(
    values: &[f64],
    alpha: f64,
) -> StatResult<Vec<f64>> {
    let mut data = values.to_vec();
    while data.len() >= 3 {
        let Some((idx, statistic)) = grubbs_statistic(&data)
        else {
            break;
        };
        let critical = grubbs_critical_value(data.len(), alpha)?;
        trace!(
            "Grubbs' test: n={}, G={:.4}, G_crit={:.4}",
            data.len(),
            statistic,
            critical
        );
        if statistic > critical {
            let removed = data.remove(idx);
            debug!("Removed outlier {} (G={:.4})", removed, statistic);
        }
        else {
            break;
        }
    }
    Ok(data)
}

/// [`coerce_numeric`] followed by [`grubbs_filter`].
pub fn filter_numeric_series(
    series: &Series,
    alpha: f64,
) -> StatResult<Vec<f64>> {
    grubbs_filter(&coerce_numeric(series)?, alpha)
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{
        Distribution,
        Normal as NormalDist,
    };
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_removes_single_outlier() {
        let cleaned = grubbs_filter(&[10.0, 12.0, 11.0, 13.0, 100.0], GRUBBS_ALPHA).unwrap();
        assert_eq!(cleaned, vec![10.0, 12.0, 11.0, 13.0]);
        assert_approx_eq!(cleaned.iter().mean(), 11.5);
    }

    #[rstest]
    #[case(3, 1.1543)]
    #[case(5, 1.7150)]
    #[case(10, 2.2900)]
    #[case(20, 2.7082)]
    fn test_critical_values(
        #[case] n: usize,
        #[case] expected: f64,
    ) {
        assert_approx_eq!(grubbs_critical_value(n, 0.05).unwrap(), expected, 1e-3);
    }

    #[test]
    fn test_invalid_critical_value_inputs() {
        assert!(matches!(
            grubbs_critical_value(2, 0.05),
            Err(AnalysisError::OutlierTest { n: 2, .. })
        ));
        assert!(matches!(
            grubbs_critical_value(10, 1.5),
            Err(AnalysisError::OutlierTest { .. })
        ));
    }

    #[test]
    fn test_small_and_constant_samples_untouched() {
        assert_eq!(grubbs_filter(&[1.0, 1000.0], 0.05).unwrap(), vec![1.0, 1000.0]);
        assert_eq!(grubbs_filter(&[5.0; 6], 0.05).unwrap(), vec![5.0; 6]);
        assert!(grubbs_filter(&[], 0.05).unwrap().is_empty());
    }

    #[test]
    fn test_repeated_removal() {
        // 14.0 only stands out once 100.0 is gone
        let data = [10.0, 10.5, 9.5, 10.2, 9.8, 10.1, 9.9, 10.3, 14.0, 100.0];
        let cleaned = grubbs_filter(&data, 0.05).unwrap();
        assert_eq!(cleaned, vec![10.0, 10.5, 9.5, 10.2, 9.8, 10.1, 9.9, 10.3]);
    }

    #[test]
    fn test_filter_is_fixed_point() {
        let mut rng = StdRng::seed_from_u64(42);
        let normal = NormalDist::new(20.0, 3.0).unwrap();
        for size in [3usize, 5, 8, 15, 40] {
            for _ in 0..20 {
                let mut sample: Vec<f64> = (0..size).map(|_| normal.sample(&mut rng)).collect();
                sample.push(normal.sample(&mut rng) * 4.0);
                let once = grubbs_filter(&sample, GRUBBS_ALPHA).unwrap();
                let twice = grubbs_filter(&once, GRUBBS_ALPHA).unwrap();
                assert_eq!(once, twice);
            }
        }
    }

    #[test]
    fn test_coerce_numeric() {
        let text = Series::new(
            "Weight".into(),
            vec![Some("1.5"), None, Some(" 2 "), Some("")],
        );
        assert_eq!(coerce_numeric(&text).unwrap(), vec![1.5, 2.0]);

        let bad = Series::new("Weight".into(), vec![Some("1"), Some("heavy"), Some("x")]);
        match coerce_numeric(&bad) {
            Err(AnalysisError::DataConversion { column, value }) => {
                assert_eq!(column, "Weight");
                assert_eq!(value, "heavy");
            },
            other => panic!("unexpected result {:?}", other),
        }

        let numeric = Series::new("Weight".into(), vec![Some(1.0), None, Some(f64::NAN), Some(3.0)]);
        assert_eq!(coerce_numeric(&numeric).unwrap(), vec![1.0, 3.0]);
    }
}
