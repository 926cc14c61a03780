use hashbrown::HashMap;
use itertools::Itertools;
use log::{
    debug,
    info,
};
use statrs::distribution::{
    ContinuousCDF,
    FisherSnedecor,
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
use crate::tools::plot::{
    EncodedImage,
    InteractionPlotRequest,
    InteractionPlotter,
};

pub const TWO_WAY_P_LABEL: &str = "PR(>F)";

/// Two-way ANOVA table with the interaction plot produced alongside it.
#[derive(Debug, Clone)]
pub struct TwoWayAnova {
    pub table: AnovaResult,
    pub plot:  EncodedImage,
}

/// Label shared by every row of a factor-tagged table.
fn single_label(long: &BinLongTable) -> StatResult<String> {
    let labels = long.factor_labels()?;
    let mut distinct = labels.into_iter().unique();
    match (distinct.next(), distinct.next()) {
        (Some(label), None) => Ok(label),
        (None, _) => Err(AnalysisError::insufficient(0, 1)),
        (Some(_), Some(_)) => {
            Err(AnalysisError::InvalidRequest(format!(
                "long table of '{}' mixes several factor levels",
                long.group()
            )))
        },
    }
}

/// Sum over rows of `(mean of the row's key - grand_mean)^2`.
fn per_row_effect<K>(
    keys: &[K],
    values: &[f64],
    grand_mean: f64,
) -> f64
where
    K: std::hash::Hash + Eq, {
    let mut sums: HashMap<&K, (f64, usize)> = HashMap::new();
    for (key, value) in keys.iter().zip(values) {
        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    keys.iter()
        .map(|key| {
            let (sum, count) = sums[key];
            (sum / count as f64 - grand_mean).powi(2)
        })
        .sum()
}

/// Squared deviations of each row from its own bin mean.
fn within_bins(long: &BinLongTable) -> StatResult<f64> {
    Ok(long
        .samples_by_bin()?
        .iter()
        .map(|(_, values)| {
            let mean = values.iter().mean();
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        })
        .sum())
}

fn bin_means(
    long: &BinLongTable,
    bins: &[u32],
) -> StatResult<Vec<Option<f64>>> {
    let samples: HashMap<u32, Vec<f64>> = long.samples_by_bin()?.into_iter().collect();
    Ok(bins
        .iter()
        .map(|bin| samples.get(bin).map(|values| values.iter().mean()))
        .collect())
}

fn f_test(
    ss: f64,
    df: usize,
    ms_within: f64,
    df_within: usize,
) -> StatResult<(f64, f64)> {
    let f = (ss / df as f64) / ms_within;
    let p = FisherSnedecor::new(df as f64, df_within as f64)
        .map_err(|e| AnalysisError::computation(e.to_string()))?
        .sf(f);
    Ok((f, p))
}

/// Two-way ANOVA with interaction: second factor × bin.
///
/// `a` and `b` must be tagged (see [`BinLongTable::with_factor`]) under the
/// same factor column with two different labels. The effect sums of squares
/// add the squared level (or bin) mean deviation once per row. The residual
/// is computed within each table separately. Rows are `<factor>`, `bin`,
/// `<factor>:bin` and `Residual`.
pub fn two_way_anova<P>(
    a: &BinLongTable,
    b: &BinLongTable,
    plotter: &P,
) -> StatResult<TwoWayAnova>
where
    P: InteractionPlotter + ?Sized, {
    let factor = match (a.factor(), b.factor()) {
        (Some(fa), Some(fb)) if fa == fb => fa.to_owned(),
        _ => {
            return Err(AnalysisError::InvalidRequest(
                "both long tables must be tagged with the same factor column".into(),
            ))
        },
    };
    let levels = [single_label(a)?, single_label(b)?];
    if levels[0] == levels[1] {
        return Err(AnalysisError::InvalidRequest(format!(
            "both tables carry the same '{}' level '{}'",
            factor, levels[0]
        )));
    }

    let combined = a.concat(b)?;
    let values = combined.values()?;
    let bins = combined.bins()?;
    let labels = combined.factor_labels()?;
    let n = values.len();
    let bin_levels = bins.iter().copied().sorted().dedup().collect_vec();
    let k = bin_levels.len();
    info!(
        "Two-way ANOVA on '{}' by '{}' ({} vs {}): {} bins, {} observations",
        combined.group(),
        factor,
        levels[0],
        levels[1],
        k,
        n
    );
    if k < 2 {
        return Err(AnalysisError::computation(format!(
            "two-way ANOVA needs at least two bins, '{}' has {}",
            combined.group(),
            k
        )));
    }
    if n <= 2 * k {
        return Err(AnalysisError::insufficient(n, 2 * k + 1));
    }

    let grand_mean = values.iter().mean();
    let ss_a = per_row_effect(&labels, &values, grand_mean);
    let ss_b = per_row_effect(&bins, &values, grand_mean);
    let ss_total = values.iter().map(|v| (v - grand_mean).powi(2)).sum::<f64>();
    let ss_within = within_bins(a)? + within_bins(b)?;
    let ss_ab = ss_total - ss_a - ss_b - ss_within;

    let df_a = levels.len() - 1;
    let df_b = k - 1;
    let df_ab = df_a * df_b;
    let df_within = n - 2 * k;
    let ms_within = ss_within / df_within as f64;
    if ms_within == 0.0 {
        return Err(AnalysisError::computation(
            "two-way ANOVA is undefined with zero residual variance",
        ));
    }

    let (f_a, p_a) = f_test(ss_a, df_a, ms_within, df_within)?;
    let (f_b, p_b) = f_test(ss_b, df_b, ms_within, df_within)?;
    let (f_ab, p_ab) = f_test(ss_ab, df_ab, ms_within, df_within)?;
    debug!(
        "Two-way ANOVA: SS_A={:.4}, SS_B={:.4}, SS_AxB={:.4}, SS_within={:.4}",
        ss_a, ss_b, ss_ab, ss_within
    );

    let table = AnovaResult::new(TWO_WAY_P_LABEL, vec![
        AnovaRow::new(factor.as_str(), ss_a)
            .with_df(Some(df_a))
            .with_f(Some(f_a))
            .with_p(Some(p_a)),
        AnovaRow::new("bin", ss_b)
            .with_df(Some(df_b))
            .with_f(Some(f_b))
            .with_p(Some(p_b)),
        AnovaRow::new(format!("{}:bin", factor), ss_ab)
            .with_df(Some(df_ab))
            .with_f(Some(f_ab))
            .with_p(Some(p_ab)),
        AnovaRow::new("Residual", ss_within).with_df(Some(df_within)),
    ]);

    let request = InteractionPlotRequest {
        means: [bin_means(a, &bin_levels)?, bin_means(b, &bin_levels)?],
        bins: bin_levels,
        levels,
        response: combined.group().to_owned(),
        factor,
    };
    let plot = plotter
        .render(&request)
        .map_err(|e| AnalysisError::Plot(e.to_string()))?;

    Ok(TwoWayAnova { table, plot })
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{
        Distribution,
        Normal,
    };

    use super::*;
    use crate::tools::plot::{
        JsonPlotter,
        NoopPlotter,
    };

    fn tagged(
        bins: Vec<Vec<f64>>,
        label: &str,
    ) -> BinLongTable {
        BinLongTable::from_bins("Weight", bins)
            .unwrap()
            .with_factor("Genotype", label)
            .unwrap()
    }

    fn random_pair(seed: u64) -> (BinLongTable, BinLongTable) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sample = |shift: f64| {
            let dist = Normal::new(10.0 + shift, 1.0).unwrap();
            (0..5).map(|_| dist.sample(&mut rng)).collect::<Vec<f64>>()
        };
        let a = vec![sample(0.0), sample(1.0), sample(2.0)];
        let b = vec![sample(0.5), sample(0.5), sample(3.0)];
        (tagged(a, "A"), tagged(b, "B"))
    }

    #[test]
    fn test_four_rows_with_expected_df() {
        let (a, b) = random_pair(1);
        let result = two_way_anova(&a, &b, &NoopPlotter).unwrap();
        let rows = result.table.rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows.iter().map(|r| r.source.as_str()).collect_vec(),
            vec!["Genotype", "bin", "Genotype:bin", "Residual"]
        );
        assert_eq!(
            rows.iter().map(|r| r.df).collect_vec(),
            vec![Some(1), Some(2), Some(2), Some(24)]
        );
        assert_eq!(result.table.p_label(), "PR(>F)");
        assert!(rows[3].f.is_none() && rows[3].p.is_none());
    }

    #[test]
    fn test_sum_of_squares_decomposition() {
        for seed in 0..5 {
            let (a, b) = random_pair(seed);
            let result = two_way_anova(&a, &b, &NoopPlotter).unwrap();
            let total = a.concat(&b).unwrap().values().unwrap();
            let mean = total.iter().mean();
            let ss_total = total.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            let ss_sum = result.table.rows().iter().map(|r| r.ss).sum::<f64>();
            assert_approx_eq!(ss_sum, ss_total, 1e-9);
        }
    }

    #[test]
    fn test_per_row_effect() {
        let values = [1.0, 3.0, 5.0, 7.0];
        let keys = ["x", "x", "y", "y"];
        // level means 2 and 6, grand mean 4: four rows of 2^2
        assert_approx_eq!(per_row_effect(&keys, &values, 4.0), 16.0);
    }

    #[test]
    fn test_plot_request() {
        let a = tagged(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]], "WT");
        let b = tagged(vec![vec![2.0, 3.0, 4.0], vec![7.0, 9.0, 8.0]], "KO");
        let result = two_way_anova(&a, &b, &JsonPlotter).unwrap();
        let request: InteractionPlotRequest =
            serde_json::from_slice(result.plot.as_bytes()).unwrap();
        assert_eq!(request.bins, vec![1, 2]);
        assert_eq!(request.levels, ["WT".to_string(), "KO".to_string()]);
        assert_eq!(request.means[0], vec![Some(2.0), Some(5.0)]);
        assert_eq!(request.means[1], vec![Some(3.0), Some(8.0)]);
        assert_eq!(request.response, "Weight");
        assert_eq!(request.factor, "Genotype");
    }

    #[derive(Debug)]
    struct FailingPlotter;

    impl InteractionPlotter for FailingPlotter {
        fn render(
            &self,
            _request: &InteractionPlotRequest,
        ) -> anyhow::Result<EncodedImage> {
            anyhow::bail!("no backend")
        }
    }

    #[test]
    fn test_plotter_failure() {
        let (a, b) = random_pair(3);
        match two_way_anova(&a, &b, &FailingPlotter) {
            Err(AnalysisError::Plot(msg)) => assert!(msg.contains("no backend")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let a = tagged(vec![vec![1.0, 2.0], vec![3.0, 4.0]], "WT");
        let same = tagged(vec![vec![1.0, 2.0], vec![3.0, 4.0]], "WT");
        assert!(matches!(
            two_way_anova(&a, &same, &NoopPlotter),
            Err(AnalysisError::InvalidRequest(_))
        ));

        let untagged = BinLongTable::from_bins("Weight", vec![vec![1.0], vec![2.0]]).unwrap();
        assert!(matches!(
            two_way_anova(&a, &untagged, &NoopPlotter),
            Err(AnalysisError::InvalidRequest(_))
        ));

        let sparse_a = tagged(vec![vec![1.0], vec![3.0]], "WT");
        let sparse_b = tagged(vec![vec![1.5], vec![2.5]], "KO");
        assert!(matches!(
            two_way_anova(&sparse_a, &sparse_b, &NoopPlotter),
            Err(AnalysisError::InsufficientData { .. })
        ));

        let constant_a = tagged(vec![vec![1.0, 1.0, 1.0], vec![2.0, 2.0]], "WT");
        let constant_b = tagged(vec![vec![3.0, 3.0], vec![4.0, 4.0]], "KO");
        assert!(matches!(
            two_way_anova(&constant_a, &constant_b, &NoopPlotter),
            Err(AnalysisError::Computation(_))
        ));
    }
}
