//! `entry-form`, `grid` and `year-table` commands

use super::shared::{CommandSummary, emit};
use crate::cli::args::{EntryFormArgs, GridArgs, YearTableArgs};
use crate::config::EtlConfig;
use crate::reshape::{EntryFormPivot, YearTableReshape, reshape_multi_header};
use crate::source::{self, ReadOptions};
use anyhow::{Context, Result};

pub fn run_entry_form(args: &EntryFormArgs, config: &EtlConfig) -> Result<()> {
    let mut summary = CommandSummary::start("Entry Form Summary");
    let entries = source::read_table(&args.input, &ReadOptions::lookup())
        .with_context(|| format!("Failed to read entry form {}", args.input.display()))?;

    let mut pivoted = EntryFormPivot::from_config(&config.entry_form)
        .pivot(&entries)
        .with_context(|| format!("Failed to pivot {}", args.input.display()))?;

    summary.rows_in = entries.height();
    summary.rows_out = pivoted.height();
    emit(&mut pivoted, args.output.output.as_deref())?;
    summary.print(args.output.output.as_deref());
    Ok(())
}

pub fn run_grid(args: &GridArgs) -> Result<()> {
    let mut summary = CommandSummary::start("Grid Reshape Summary");
    let grid = source::read_grid(&args.input)
        .with_context(|| format!("Failed to read grid {}", args.input.display()))?;

    let mut long = reshape_multi_header(&grid, &args.layout())
        .with_context(|| format!("Failed to reshape {}", args.input.display()))?;

    summary.rows_in = grid.height();
    summary.rows_out = long.height();
    emit(&mut long, args.output.output.as_deref())?;
    summary.print(args.output.output.as_deref());
    Ok(())
}

pub fn run_year_table(args: &YearTableArgs) -> Result<()> {
    let mut summary = CommandSummary::start("Year Table Summary");
    let grid = source::read_grid(&args.input)
        .with_context(|| format!("Failed to read sheet {}", args.input.display()))?;

    let reshape = YearTableReshape::new(args.rows)
        .with_columns(args.cols)
        .with_region(args.region.clone())
        .with_scale((!args.no_scale).then_some(100.0));
    let mut long = reshape
        .reshape(&grid)
        .with_context(|| format!("Failed to reshape {}", args.input.display()))?;

    summary.rows_in = grid.height();
    summary.rows_out = long.height();
    emit(&mut long, args.output.output.as_deref())?;
    summary.print(args.output.output.as_deref());
    Ok(())
}
