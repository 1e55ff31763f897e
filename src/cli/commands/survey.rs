//! `survey` command

use super::shared::{CommandSummary, emit};
use crate::cli::args::SurveyArgs;
use crate::config::EtlConfig;
use crate::reshape::CompositeReshape;
use crate::source::{self, ReadOptions};
use anyhow::{Context, Result, bail};

pub fn run_survey(args: &SurveyArgs, config: &EtlConfig) -> Result<()> {
    let mut summary = CommandSummary::start("Survey Reshape Summary");
    if !args.separator.is_ascii() {
        bail!("Separator '{}' is not a single-byte character", args.separator);
    }

    let options = ReadOptions::lookup().with_separator(args.separator as u8);
    let wide = source::read_table(&args.input, &options)
        .with_context(|| format!("Failed to read survey export {}", args.input.display()))?;

    let mut reshape = CompositeReshape::from_config(&config.survey)
        .with_top_level(config.regions.top_level.clone());
    if args.keep_names {
        reshape = reshape.without_geoitem_codes();
    }
    let mut long = reshape
        .reshape(&wide)
        .with_context(|| format!("Failed to reshape {}", args.input.display()))?;

    summary.rows_in = wide.height();
    summary.rows_out = long.height();
    emit(&mut long, args.output.output.as_deref())?;
    summary.print(args.output.output.as_deref());
    Ok(())
}
