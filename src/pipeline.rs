//! Neighbourhood-to-region livability pipeline
//!
//! Chains the stages in their fixed order:
//!
//! ```text
//! scores -> corrections -> membership filter -> group join -> aggregation
//! ```
//!
//! The correction, membership and grouping lookups are loaded once from
//! their reference files; [`LivabilityPipeline::run_frame`] accepts them
//! already built so callers can substitute synthetic tables.

use crate::config::LivabilityConfig;
use crate::error::Result;
use crate::source::{self, ReadOptions};
use crate::stages::{
    AggregationSpec, CorrectionMap, GroupMapping, Measure, MembershipSet, aggregate,
    apply_corrections, attach_group, filter_members,
};
use polars::prelude::DataFrame;
use std::path::PathBuf;
use tracing::info;

/// Files consumed by one pipeline run
#[derive(Debug, Clone)]
pub struct LivabilityInputs {
    pub scores: PathBuf,
    pub corrections: PathBuf,
    /// Neighbourhood reference list with group labels
    pub neighbourhoods: PathBuf,
}

/// Lookups used between reading the scores and aggregating them
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub corrections: CorrectionMap,
    pub members: MembershipSet,
    pub groups: GroupMapping,
}

impl ReferenceTables {
    /// Load all lookups; the neighbourhood file provides both the
    /// membership list and the group labels
    pub fn load(config: &LivabilityConfig, inputs: &LivabilityInputs) -> Result<Self> {
        let corrections = CorrectionMap::from_file_with_columns(
            &inputs.corrections,
            &config.correction_original_column,
            &config.correction_corrected_column,
        )?;

        let neighbourhoods = source::read_table(&inputs.neighbourhoods, &ReadOptions::lookup())?;
        let members = MembershipSet::from_frame(&neighbourhoods, &config.reference_code_column)?;
        let groups = GroupMapping::from_frame(
            &neighbourhoods,
            &config.reference_code_column,
            &config.reference_group_column,
        )?;
        info!(
            "Reference tables: {} corrections, {} neighbourhoods, {} group assignments",
            corrections.len(),
            members.len(),
            groups.len()
        );

        Ok(Self {
            corrections,
            members,
            groups,
        })
    }
}

#[derive(Debug, Clone)]
pub struct LivabilityPipeline {
    config: LivabilityConfig,
}

impl LivabilityPipeline {
    pub fn new(config: LivabilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LivabilityConfig {
        &self.config
    }

    /// Aggregation settings derived from the configuration
    pub fn aggregation_spec(&self, group_column: &str) -> AggregationSpec {
        let config = &self.config;
        let mut spec = config
            .measures
            .iter()
            .fold(
                AggregationSpec::new(group_column, &config.period_column),
                |spec, measure| spec.with_measure(Measure::new(measure, config.aggregate)),
            )
            .with_periods(config.relevant_periods.clone())
            .with_renames(config.column_renames.clone());

        if !config.group_codes.is_empty() {
            // Codes apply to the group column under its final name
            let code_column = config
                .column_renames
                .get(group_column)
                .cloned()
                .unwrap_or_else(|| group_column.to_string());
            spec = spec.with_group_codes(code_column, config.group_codes.clone());
        }
        if !config.geolevel.is_empty() {
            spec = spec.with_geolevel(&config.geolevel);
        }
        spec
    }

    /// Read the scores and reference files, then run every stage
    pub fn run(&self, inputs: &LivabilityInputs) -> Result<DataFrame> {
        info!("Livability pipeline on {}", inputs.scores.display());
        let scores = source::read_table(&inputs.scores, &ReadOptions::lookup())?;
        let references = ReferenceTables::load(&self.config, inputs)?;
        self.run_frame(&scores, &references)
    }

    /// Run every stage on an in-memory scores frame
    pub fn run_frame(&self, scores: &DataFrame, references: &ReferenceTables) -> Result<DataFrame> {
        let id = self.config.id_column.as_str();

        let corrected = apply_corrections(scores, id, &references.corrections)?;
        let members = filter_members(&corrected, id, &references.members)?;
        let grouped = attach_group(&members, id, &references.groups)?;
        let spec = self.aggregation_spec(references.groups.group_column());
        let result = aggregate(&grouped, &spec)?;

        info!(
            "Livability pipeline: {} scores -> {} members -> {} regional rows",
            scores.height(),
            members.height(),
            result.height()
        );
        Ok(result)
    }
}
