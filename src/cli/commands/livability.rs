//! `livability` command

use super::shared::{CommandSummary, emit};
use crate::cli::args::LivabilityArgs;
use crate::config::EtlConfig;
use crate::pipeline::{LivabilityInputs, LivabilityPipeline, ReferenceTables};
use crate::source::{self, ReadOptions};
use anyhow::{Context, Result};

pub fn run_livability(args: &LivabilityArgs, config: &EtlConfig) -> Result<()> {
    let mut summary = CommandSummary::start("Livability Summary");
    let inputs = LivabilityInputs {
        scores: args.scores.clone(),
        corrections: args.corrections.clone(),
        neighbourhoods: args.neighbourhoods.clone(),
    };

    let scores = source::read_table(&inputs.scores, &ReadOptions::lookup())
        .with_context(|| format!("Failed to read scores from {}", inputs.scores.display()))?;
    let references = ReferenceTables::load(&config.livability, &inputs)
        .context("Failed to load reference tables")?;

    let pipeline = LivabilityPipeline::new(config.livability.clone());
    let mut result = pipeline
        .run_frame(&scores, &references)
        .with_context(|| format!("Livability pipeline failed for {}", inputs.scores.display()))?;

    summary.rows_in = scores.height();
    summary.rows_out = result.height();
    emit(&mut result, args.output.output.as_deref())?;
    summary.print(args.output.output.as_deref());
    Ok(())
}
