#![allow(dead_code)]
use std::io::Write;

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{
    Distribution,
    Normal,
};
use tempfile::NamedTempFile;

/// Builds a comma separated sheet in the merged-header layout: one row per
/// animal, `Genotype` and `Week` parameters, a `Weight` group spread over
/// `n_bins` columns and its `Total Weight`.
pub struct DemoSheetBuilder {
    seed:       u64,
    genotypes:  Vec<(String, f64)>,
    weeks:      Vec<u32>,
    n_bins:     usize,
    replicates: usize,
}

impl DemoSheetBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            genotypes: vec![("WT".into(), 0.0), ("KO".into(), 1.5)],
            weeks: vec![1, 2],
            n_bins: 3,
            replicates: 6,
        }
    }

    pub fn with_bins(
        mut self,
        n_bins: usize,
    ) -> Self {
        self.n_bins = n_bins;
        self
    }

    pub fn with_replicates(
        mut self,
        replicates: usize,
    ) -> Self {
        self.replicates = replicates;
        self
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn build(&self) -> String {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let noise = Normal::new(0.0, 1.0).unwrap();

        let mut header = vec!["Genotype".to_string(), "Week".to_string(), "Weight".to_string()];
        header.extend((1..self.n_bins).map(|i| format!("Unnamed: {}", i + 2)));
        header.push("Total Weight".to_string());

        let mut lines = vec![header.join(",")];
        for (genotype, shift) in &self.genotypes {
            for week in &self.weeks {
                for _ in 0..self.replicates {
                    let bins = (1..=self.n_bins)
                        .map(|bin| 10.0 + 2.0 * bin as f64 + shift + noise.sample(&mut rng))
                        .collect_vec();
                    let total: f64 = bins.iter().sum();
                    let cells = [genotype.clone(), week.to_string()]
                        .into_iter()
                        .chain(bins.iter().map(|v| format!("{:.3}", v)))
                        .chain(std::iter::once(format!("{:.3}", total)))
                        .join(",");
                    lines.push(cells);
                }
            }
        }
        lines.join("\n") + "\n"
    }

    pub fn write_temp(&self) -> anyhow::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
        file.write_all(self.build().as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}
