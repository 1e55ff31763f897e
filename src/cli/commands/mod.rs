//! Command implementations for the regional ETL CLI
//!
//! Each command reads its input files, runs the library stages and hands
//! the result to [`shared::emit`].

pub mod livability;
pub mod regions;
pub mod reshape;
pub mod shared;
pub mod survey;

use crate::cli::args::{Args, Commands};
use anyhow::Result;

/// Dispatch to the subcommand handler
pub fn run(args: Args) -> Result<()> {
    shared::setup_logging(args.verbose);
    let config = shared::load_config(args.config.as_deref())?;

    match args.command {
        Commands::Livability(command) => livability::run_livability(&command, &config),
        Commands::Survey(command) => survey::run_survey(&command, &config),
        Commands::Regions(command) => regions::run_regions(&command, &config),
        Commands::EntryForm(command) => reshape::run_entry_form(&command, &config),
        Commands::Grid(command) => reshape::run_grid(&command),
        Commands::YearTable(command) => reshape::run_year_table(&command),
    }
}
