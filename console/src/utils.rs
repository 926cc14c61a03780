use std::path::Path;

use anyhow::{
    anyhow,
    ensure,
};
use clap::Args;
use log::LevelFilter;

use crate::strings::utils as strings;

#[derive(Args, Debug, Clone)]
pub(crate) struct UtilsArgs {
    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = strings::VERBOSE)]
    pub verbose: u8,

    #[arg(long, global = true, help = strings::THREADS)]
    pub threads: Option<usize>,
}

impl UtilsArgs {
    /// Initialises logging and the polars thread pool size.
    ///
    /// Must run before the first polars operation.
    pub fn setup(&self) -> anyhow::Result<()> {
        if let Some(threads) = self.threads {
            ensure!(threads > 0, "Number of threads must be positive");
            std::env::set_var("POLARS_MAX_THREADS", threads.to_string());
        }
        let level = match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        pretty_env_logger::formatted_builder()
            .filter_level(level)
            .parse_default_env()
            .try_init()
            .map_err(|e| anyhow!("Failed to set up logger: {}", e))
    }
}

pub(crate) fn validate_input(path: &Path) -> anyhow::Result<&Path> {
    ensure!(path.exists(), "Input file {} does not exist", path.display());
    ensure!(path.is_file(), "Input path {} is not a file", path.display());
    Ok(path)
}

pub(crate) fn validate_output(path: &Path) -> anyhow::Result<&Path> {
    ensure!(!path.is_dir(), "Output path {} is a directory", path.display());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure!(
            parent.exists(),
            "Output directory {} does not exist",
            parent.display()
        );
    }
    Ok(path)
}
