mod analysis;
mod columns;
mod strings;
mod utils;

use analysis::{
    AnalysisArgs,
    PlotArgs,
    SecondDatasetArgs,
};
use binstat::prelude::AnalysisKind;
use clap::{
    Parser,
    Subcommand,
};
use columns::ColumnsArgs;
use utils::UtilsArgs;
use wild::ArgsOs;

pub(crate) trait PipelineCommand {
    fn run(&self) -> anyhow::Result<()>;
}

#[derive(Parser, Debug)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,)]
struct Cli {
    #[command(subcommand)]
    command: MainMenu,

    #[clap(flatten)]
    utils: UtilsArgs,
}

#[derive(Subcommand, Debug)]
enum MainMenu {
    /// Descriptive statistics of one dataset.
    Info {
        #[clap(flatten)]
        args: AnalysisArgs,
    },

    /// One-way ANOVA across the bins of a group.
    #[command(name = "one-way")]
    OneWay {
        #[clap(flatten)]
        args: AnalysisArgs,
    },

    /// Shapiro-Wilk and Levene tests on two datasets.
    Normality {
        #[clap(flatten)]
        args:   AnalysisArgs,
        #[clap(flatten)]
        second: SecondDatasetArgs,
    },

    /// Normality tests followed by t-test / rank-sum on two datasets.
    Compare {
        #[clap(flatten)]
        args:   AnalysisArgs,
        #[clap(flatten)]
        second: SecondDatasetArgs,
    },

    /// Two-way ANOVA (second factor × bin) on two datasets.
    #[command(name = "two-way")]
    TwoWay {
        #[clap(flatten)]
        args:   AnalysisArgs,
        #[clap(flatten)]
        second: SecondDatasetArgs,
        #[clap(flatten)]
        plot:   PlotArgs,
    },

    /// List parameters and bin groups of a sheet.
    Columns {
        #[clap(flatten)]
        args: ColumnsArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let args: ArgsOs = wild::args_os();
    let cli = Cli::parse_from(args);
    cli.utils.setup()?;

    match cli.command {
        MainMenu::Info { args } => args.run(AnalysisKind::StatisticalInfo, None, None)?,
        MainMenu::OneWay { args } => args.run(AnalysisKind::OneWayAnova, None, None)?,
        MainMenu::Normality { args, second } => {
            args.run(AnalysisKind::NormalityTests, Some(&second), None)?
        },
        MainMenu::Compare { args, second } => {
            args.run(AnalysisKind::NullHypothesisTests, Some(&second), None)?
        },
        MainMenu::TwoWay { args, second, plot } => {
            args.run(AnalysisKind::TwoWayAnova, Some(&second), Some(&plot))?
        },
        MainMenu::Columns { args } => args.run()?,
    }
    Ok(())
}
