use std::path::PathBuf;

use binstat::prelude::*;
use clap::Args;
use console::style;

use crate::strings::analysis as strings;
use crate::utils::validate_input;
use crate::PipelineCommand;

#[derive(Args, Debug, Clone)]
pub(crate) struct ColumnsArgs {
    #[arg(short, long, required = true, help = strings::INPUT)]
    input: PathBuf,
}

impl PipelineCommand for ColumnsArgs {
    fn run(&self) -> anyhow::Result<()> {
        let table = read_sheet_path(validate_input(&self.input)?)?;
        println!(
            "{} ({} rows)",
            style(self.input.display()).bold(),
            table.height()
        );

        println!("{}", style("Parameters:").cyan());
        for parameter in table.parameters() {
            let values = table.distinct_values(&parameter)?;
            println!("  {} [{} distinct]", parameter, values.len());
        }

        println!("{}", style("Bin groups:").cyan());
        for group in table.bin_groups() {
            let aggregate = table
                .aggregate_column(&group)
                .unwrap_or_else(|_| "no aggregate column".to_string());
            println!("  {} ({} bins, {})", group, table.bin_count(&group), aggregate);
        }
        Ok(())
    }
}
