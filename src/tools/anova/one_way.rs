use itertools::Itertools;
use log::{
    debug,
    info,
};
use statrs::statistics::Statistics;

use crate::data_structs::{
    AnovaResult,
    AnovaRow,
    BinLongTable,
};
use crate::error::{
    AnalysisError,
    StatResult,
};
use crate::utils::f_oneway;

pub const ONE_WAY_P_LABEL: &str = "P";

/// One-way ANOVA across the bins of a single group.
///
/// The Within row uses the unweighted average of per-bin sample variances
/// as its mean square. F and P come from the canonical F-test on the bin
/// samples and are reported next to these sums of squares.
///
/// `K` counts the bins that still hold samples after outlier removal, not
/// the bin columns of the sheet; an emptied bin is left out of the
/// degrees of freedom and the variance average.
pub fn one_way_anova(long: &BinLongTable) -> StatResult<AnovaResult> {
    let samples = long.samples_by_bin()?;
    let k = samples.len();
    info!(
        "One-way ANOVA on '{}': {} bins, {} observations",
        long.group(),
        k,
        long.len()
    );
    if k < 2 {
        return Err(AnalysisError::computation(format!(
            "one-way ANOVA needs at least two bins, '{}' has {}",
            long.group(),
            k
        )));
    }
    if let Some((bin, values)) = samples.iter().find(|(_, values)| values.len() < 2) {
        debug!("Bin {} of '{}' has {} samples", bin, long.group(), values.len());
        return Err(AnalysisError::insufficient(values.len(), 2));
    }

    let groups = samples.iter().map(|(_, v)| v.as_slice()).collect_vec();
    let n = long.len();
    let values = long.values()?;
    let grand_mean = values.iter().mean();

    let df_between = k - 1;
    let df_within = n - k;
    let ms_within = groups
        .iter()
        .map(|g| g.iter().variance())
        .sum::<f64>()
        / k as f64;
    let ss_within = ms_within * df_within as f64;
    let ss_total = values.iter().map(|v| v * v).sum::<f64>() - n as f64 * grand_mean.powi(2);
    let ss_between = ss_total - ss_within;

    let (f, p) = f_oneway(&groups)?;
    debug!(
        "One-way ANOVA: SS_between={:.4}, SS_within={:.4}, F={:.4}, P={:.6}",
        ss_between, ss_within, f, p
    );

    Ok(AnovaResult::new(ONE_WAY_P_LABEL, vec![
        AnovaRow::new("Between", ss_between)
            .with_df(Some(df_between))
            .with_f(Some(f))
            .with_p(Some(p)),
        AnovaRow::new("Within", ss_within).with_df(Some(df_within)),
        AnovaRow::new("Total", ss_total),
    ]))
}
