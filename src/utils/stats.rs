use std::f64::consts::PI;

use itertools::Itertools;
use log::*;
use num::Float;
use statrs::distribution::{
    ContinuousCDF,
    FisherSnedecor,
    Normal,
    StudentsT,
};
use statrs::statistics::{
    Data,
    Median,
    Statistics,
};

use super::poly;
use crate::error::{
    AnalysisError,
    StatResult,
};

const SW_C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const SW_C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const SW_C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const SW_C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const SW_C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const SW_C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const SW_G: [f64; 2] = [-2.273, 0.459];

fn standard_normal() -> StatResult<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| AnalysisError::computation(e.to_string()))
}

fn sum_sq_dev(values: &[f64]) -> f64 {
    let mean = values.iter().mean();
    values.iter().map(|v| (v - mean).powi(2)).sum()
}

/// Shapiro-Wilk coefficients for the lower half of a sample of size `n`.
fn shapiro_wilk_coefficients(n: usize) -> StatResult<Vec<f64>> {
    let half = n / 2;
    if n == 3 {
        return Ok(vec![0.5f64.sqrt()]);
    }
    let normal = standard_normal()?;
    let an = n as f64;
    let m = (1..=half)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (an + 0.25)))
        .collect_vec();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();

    let mut a = vec![0.0; half];
    a[0] = poly(&SW_C1, rsn) - m[0] / ssumm2;
    let (first, fac) = if n > 5 {
        a[1] = -m[1] / ssumm2 + poly(&SW_C2, rsn);
        let fac = ((summ2 - 2.0 * m[0].powi(2) - 2.0 * m[1].powi(2))
            / (1.0 - 2.0 * a[0].powi(2) - 2.0 * a[1].powi(2)))
        .sqrt();
        (2, fac)
    }
    else {
        let fac = ((summ2 - 2.0 * m[0].powi(2)) / (1.0 - 2.0 * a[0].powi(2))).sqrt();
        (1, fac)
    };
    for i in first..half {
        a[i] = -m[i] / fac;
    }
    Ok(a)
}

/// Shapiro-Wilk test for normality (Royston's AS R94 approximation).
///
/// Returns `(W, p)`. Requires at least 3 values with a non-zero range.
pub fn shapiro_wilk(values: &[f64]) -> StatResult<(f64, f64)> {
    let n = values.len();
    debug!("Performing Shapiro-Wilk test: n={}", n);
    if n < 3 {
        return Err(AnalysisError::insufficient(n, 3));
    }
    let mut x = values.to_vec();
    x.sort_by(|a, b| a.total_cmp(b));
    if x[n - 1] - x[0] <= f64::EPSILON * x[0].abs().max(1.0) {
        return Err(AnalysisError::computation(
            "Shapiro-Wilk test is undefined for a sample with zero range",
        ));
    }

    let a = shapiro_wilk_coefficients(n)?;
    let numerator = a
        .iter()
        .enumerate()
        .map(|(i, coef)| coef * (x[n - 1 - i] - x[i]))
        .sum::<f64>();
    let w = (numerator.powi(2) / sum_sq_dev(&x)).min(1.0);

    let p = if n == 3 {
        (6.0 / PI * (w.sqrt().asin() - PI / 3.0)).max(0.0)
    }
    else {
        let an = n as f64;
        let y = (1.0 - w).ln();
        let (y, m, s) = if n <= 11 {
            let gamma = poly(&SW_G, an);
            if y >= gamma {
                return Ok((w, 1e-99));
            }
            (
                -(gamma - y).ln(),
                poly(&SW_C3, an),
                poly(&SW_C4, an).exp(),
            )
        }
        else {
            let xx = an.ln();
            (y, poly(&SW_C5, xx), poly(&SW_C6, xx).exp())
        };
        standard_normal()?.sf((y - m) / s)
    };

    debug!("Shapiro-Wilk results: W={:.4}, p={:.6}", w, p);
    Ok((w, p))
}

/// Levene's test for equal variances, centred on group medians
/// (Brown-Forsythe variant).
///
/// Returns `(W, p)`.
pub fn levene(groups: &[&[f64]]) -> StatResult<(f64, f64)> {
    let k = groups.len();
    if k < 2 {
        return Err(AnalysisError::computation(
            "Levene's test needs at least two groups",
        ));
    }
    if let Some(empty) = groups.iter().find(|g| g.is_empty()) {
        return Err(AnalysisError::insufficient(empty.len(), 1));
    }
    let total: usize = groups.iter().map(|g| g.len()).sum();
    if total <= k {
        return Err(AnalysisError::insufficient(total, k + 1));
    }
    debug!("Performing Levene's test: k={}, N={}", k, total);

    let deviations = groups
        .iter()
        .map(|g| {
            let median = Data::new(g.to_vec()).median();
            g.iter().map(|v| (v - median).abs()).collect_vec()
        })
        .collect_vec();
    let group_means = deviations.iter().map(|z| z.iter().mean()).collect_vec();
    let grand_mean = deviations.iter().flatten().sum::<f64>() / total as f64;

    let between = deviations
        .iter()
        .zip(group_means.iter())
        .map(|(z, mean)| z.len() as f64 * (mean - grand_mean).powi(2))
        .sum::<f64>();
    let within = deviations
        .iter()
        .zip(group_means.iter())
        .map(|(z, mean)| z.iter().map(|v| (v - mean).powi(2)).sum::<f64>())
        .sum::<f64>();
    if within == 0.0 {
        return Err(AnalysisError::computation(
            "Levene's test is undefined when every group has zero spread",
        ));
    }

    let (df1, df2) = ((k - 1) as f64, (total - k) as f64);
    let statistic = df2 / df1 * between / within;
    let p = FisherSnedecor::new(df1, df2)
        .map_err(|e| AnalysisError::computation(e.to_string()))?
        .sf(statistic);
    debug!("Levene results: W={:.4}, p={:.6}", statistic, p);
    Ok((statistic, p))
}

/// Student's two-sample t-test with pooled variance.
///
/// Returns `(t, p)` with a two-sided p-value.
pub fn ttest_ind(
    a: &[f64],
    b: &[f64],
) -> StatResult<(f64, f64)> {
    let (n1, n2) = (a.len(), b.len());
    if n1 < 2 || n2 < 2 {
        return Err(AnalysisError::insufficient(n1.min(n2), 2));
    }
    debug!("Performing Student's t-test: n1={}, n2={}", n1, n2);
    let df = (n1 + n2 - 2) as f64;
    let pooled = (sum_sq_dev(a) + sum_sq_dev(b)) / df;
    let se = (pooled * (1.0 / n1 as f64 + 1.0 / n2 as f64)).sqrt();
    if se == 0.0 {
        return Err(AnalysisError::computation(
            "t-test is undefined when both samples have zero variance",
        ));
    }
    let t = (a.iter().mean() - b.iter().mean()) / se;
    let p = 2.0
        * StudentsT::new(0.0, 1.0, df)
            .map_err(|e| AnalysisError::computation(e.to_string()))?
            .sf(t.abs());
    debug!("t-test results: t={:.4}, p={:.6}", t, p);
    Ok((t, p.min(1.0)))
}

/// An observation in the rank-sum test
#[derive(Debug)]
struct Observation<F: Float> {
    value: F,
    /// 0 for the first sample, 1 for the second
    group: usize,
    rank:  f64,
}

/// Wilcoxon rank-sum test (normal approximation, no continuity or tie
/// correction). Tied values share their average rank.
///
/// Returns `(z, p)` with a two-sided p-value.
pub fn rank_sum<F: Float>(
    x: &[F],
    y: &[F],
) -> StatResult<(f64, f64)> {
    let (n1, n2) = (x.len(), y.len());
    debug!("Performing Wilcoxon rank-sum test: n1={}, n2={}", n1, n2);
    if n1 == 0 || n2 == 0 {
        return Err(AnalysisError::insufficient(n1.min(n2), 1));
    }

    let mut observations: Vec<Observation<F>> = x
        .iter()
        .map(|&value| {
            Observation {
                value,
                group: 0,
                rank: 0.0,
            }
        })
        .chain(y.iter().map(|&value| {
            Observation {
                value,
                group: 1,
                rank: 0.0,
            }
        }))
        .collect();
    observations.sort_by(|a, b| {
        a.value
            .partial_cmp(&b.value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut start = 0;
    while start < observations.len() {
        let mut end = start + 1;
        while end < observations.len() && observations[end].value == observations[start].value
        {
            end += 1;
        }
        // ranks are 1-indexed
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for obs in &mut observations[start..end] {
            obs.rank = avg_rank;
        }
        start = end;
    }

    let s = observations
        .iter()
        .filter(|obs| obs.group == 0)
        .map(|obs| obs.rank)
        .sum::<f64>();
    let (n1, n2) = (n1 as f64, n2 as f64);
    let expected = n1 * (n1 + n2 + 1.0) / 2.0;
    let z = (s - expected) / (n1 * n2 * (n1 + n2 + 1.0) / 12.0).sqrt();
    let p = 2.0 * standard_normal()?.sf(z.abs());
    debug!("Rank-sum results: z={:.4}, p={:.6}", z, p);
    Ok((z, p.min(1.0)))
}

/// Canonical one-way ANOVA F-test over `groups`.
///
/// Returns `(F, p)`.
pub fn f_oneway(groups: &[&[f64]]) -> StatResult<(f64, f64)> {
    let k = groups.len();
    if k < 2 {
        return Err(AnalysisError::computation(
            "one-way F-test needs at least two groups",
        ));
    }
    if let Some(empty) = groups.iter().find(|g| g.is_empty()) {
        return Err(AnalysisError::insufficient(empty.len(), 1));
    }
    let total: usize = groups.iter().map(|g| g.len()).sum();
    if total <= k {
        return Err(AnalysisError::insufficient(total, k + 1));
    }

    let grand_mean = groups.iter().copied().flatten().sum::<f64>() / total as f64;
    let ss_between = groups
        .iter()
        .map(|g| g.len() as f64 * (g.iter().mean() - grand_mean).powi(2))
        .sum::<f64>();
    let ss_within = groups.iter().map(|g| sum_sq_dev(g)).sum::<f64>();
    if ss_within == 0.0 {
        return Err(AnalysisError::computation(
            "F-test is undefined with zero within-group variance",
        ));
    }

    let (df1, df2) = ((k - 1) as f64, (total - k) as f64);
    let f = (ss_between / df1) / (ss_within / df2);
    let p = FisherSnedecor::new(df1, df2)
        .map_err(|e| AnalysisError::computation(e.to_string()))?
        .sf(f);
    trace!("f_oneway: F={:.4}, p={:.6}", f, p);
    Ok((f, p))
}
