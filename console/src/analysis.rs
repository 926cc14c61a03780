use std::fs::File;
use std::io::Write;
use std::path::{
    Path,
    PathBuf,
};

use anyhow::Context;
use binstat::prelude::*;
use clap::Args;
use console::style;
use log::info;
use polars::prelude::{
    CsvWriter,
    SerWriter,
};

use crate::strings::analysis as strings;
use crate::utils::{
    validate_input,
    validate_output,
};

#[derive(Args, Debug, Clone)]
pub(crate) struct AnalysisArgs {
    #[arg(short, long, required = true, help = strings::INPUT)]
    input: PathBuf,

    #[arg(short, long, required = true, help = strings::PROPERTY)]
    property: String,

    #[arg(short = 'f', long = "filter", value_name = "COLUMN=VALUE", help = strings::FILTER)]
    filter: Vec<String>,

    #[arg(short = 'o', long, help = strings::OUTPUT)]
    output: Option<PathBuf>,

    #[arg(long, default_value_t = GRUBBS_ALPHA, help = strings::ALPHA)]
    alpha: f64,

    #[arg(long, default_value_t = 2, help = strings::MIN_SAMPLES)]
    min_samples: usize,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct SecondDatasetArgs {
    #[arg(short = 'b', long = "filter-b", value_name = "COLUMN=VALUE", help = strings::FILTER_B)]
    filter_b: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct PlotArgs {
    #[arg(long = "plot-output", help = strings::PLOT_OUTPUT)]
    plot_output: Option<PathBuf>,
}

impl AnalysisArgs {
    /// Loads the sheet and runs one analysis.
    pub fn run(
        &self,
        kind: AnalysisKind,
        second: Option<&SecondDatasetArgs>,
        plot: Option<&PlotArgs>,
    ) -> anyhow::Result<()> {
        let table = read_sheet_path(validate_input(&self.input)?)?;

        let mut request = AnalysisRequest::new(kind, self.property.as_str())
            .with_criteria(FilterCriteria::try_from_pairs(&self.filter)?);
        if let Some(second) = second {
            request = request.with_criteria(FilterCriteria::try_from_pairs(&second.filter_b)?);
        }
        let config = AnalysisConfig::default()
            .with_outlier_alpha(self.alpha)
            .with_min_samples(self.min_samples);

        let outcome = run_analysis(&table, &request, &config, &JsonPlotter)
            .with_context(|| format!("{} on '{}' failed", kind, self.property))?;
        info!("{} finished", kind);

        self.write_report(&outcome)?;
        if let (Some(path), Some(image)) = (plot.and_then(|p| p.plot_output.as_ref()), outcome.plot()) {
            validate_output(path)?;
            std::fs::write(path, image.as_bytes())
                .with_context(|| format!("Failed to write plot to {}", path.display()))?;
            eprintln!("{} {}", style("Plot request written to").green(), path.display());
        }
        Ok(())
    }

    fn write_report(
        &self,
        outcome: &AnalysisOutcome,
    ) -> anyhow::Result<()> {
        let Some(path) = self.output.as_deref()
        else {
            print_outcome(outcome)?;
            return Ok(());
        };
        validate_output(path)?;
        match outcome.anova_table() {
            Some(table) if is_csv(path) => {
                let mut df = table.to_df()?;
                let mut file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
            },
            _ => {
                let mut file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                serde_json::to_writer_pretty(&mut file, outcome)?;
                writeln!(file)?;
            },
        }
        eprintln!("{} {}", style("Report written to").green(), path.display());
        Ok(())
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn print_outcome(outcome: &AnalysisOutcome) -> anyhow::Result<()> {
    match outcome {
        AnalysisOutcome::StatisticalInfo { info } => println!("{}", info),
        AnalysisOutcome::OneWayAnova { table } => println!("{}", table),
        AnalysisOutcome::TwoWayAnova { factor, table, .. } => {
            println!("{}", style(format!("Second factor: {}", factor)).bold());
            println!("{}", table);
        },
        AnalysisOutcome::NormalityTests { info, normality } => {
            info.iter().for_each(|i| println!("{}", i));
            normality.results.iter().for_each(|r| println!("{}", r));
        },
        AnalysisOutcome::NullHypothesisTests {
            info,
            normality,
            hypothesis,
        } => {
            info.iter().for_each(|i| println!("{}", i));
            normality.results.iter().for_each(|r| println!("{}", r));
            hypothesis.results.iter().for_each(|r| println!("{}", r));
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_csv() {
        assert!(is_csv(Path::new("out/anova.CSV")));
        assert!(!is_csv(Path::new("out/anova.json")));
        assert!(!is_csv(Path::new("anova")));
    }
}
