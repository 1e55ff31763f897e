//! `regions` command

use super::shared::{CommandSummary, emit};
use crate::cli::args::RegionsArgs;
use crate::config::EtlConfig;
use crate::models::GeoLevel;
use crate::normalizer::{CodeNormalizer, RegionOptions};
use crate::source::{self, ReadOptions};
use anyhow::{Context, Result};

impl RegionsArgs {
    fn region_options(&self) -> RegionOptions {
        // Accept an output geolevel such as `corop_id` as well as a raw token
        let mut options = match &self.geolevel {
            Some(name) => match GeoLevel::from_code(name) {
                Some(level) => RegionOptions::for_level(level),
                None => RegionOptions::for_geolevel(name.clone()),
            },
            None => RegionOptions::default(),
        };
        if self.sub_population {
            options = options.with_sub_population();
        }
        if self.codes {
            options = options.with_codes();
        }
        if self.drop_top_level {
            options = options.without_top_level();
        }
        options
    }
}

pub fn run_regions(args: &RegionsArgs, config: &EtlConfig) -> Result<()> {
    let mut summary = CommandSummary::start("Region Normalization Summary");
    let table = source::read_table(&args.input, &ReadOptions::lookup())
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let normalizer = CodeNormalizer::from_config(&config.regions);
    let mut normalized = normalizer
        .normalize_region_column(&table, &args.column, &args.region_options())
        .with_context(|| format!("Failed to normalize column '{}'", args.column))?;

    summary.rows_in = table.height();
    summary.rows_out = normalized.height();
    emit(&mut normalized, args.output.output.as_deref())?;
    summary.print(args.output.output.as_deref());
    Ok(())
}
