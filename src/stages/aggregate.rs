//! Grouped aggregation of fine-grained records
//!
//! Rolls rows up per (group, period) with one aggregate per measure, then
//! applies the period allow-list, final indicator names and group codes.

use crate::constants::columns;
use crate::error::{EtlError, Result};
use crate::models::Period;
use crate::table::{self, NumericPolicy};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Aggregate applied to one measure column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFn {
    #[default]
    Mean,
    Sum,
    Min,
    Max,
    Median,
    Count,
}

impl AggregateFn {
    fn expr(&self, column: &str) -> Expr {
        let column = col(column);
        match self {
            AggregateFn::Mean => column.mean(),
            AggregateFn::Sum => column.sum(),
            AggregateFn::Min => column.min(),
            AggregateFn::Max => column.max(),
            AggregateFn::Median => column.median(),
            AggregateFn::Count => column.count(),
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            AggregateFn::Mean => "mean",
            AggregateFn::Sum => "sum",
            AggregateFn::Min => "min",
            AggregateFn::Max => "max",
            AggregateFn::Median => "median",
            AggregateFn::Count => "count",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub column: String,
    pub function: AggregateFn,
    pub alias: Option<String>,
}

impl Measure {
    pub fn new(column: impl Into<String>, function: AggregateFn) -> Self {
        Self {
            column: column.into(),
            function,
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn output_name(&self) -> String {
        self.alias.clone().unwrap_or_else(|| self.column.clone())
    }
}

/// Declarative description of one roll-up
#[derive(Debug, Clone)]
pub struct AggregationSpec {
    pub group_column: String,
    pub period_column: String,
    pub measures: Vec<Measure>,
    /// Periods kept after aggregation; empty keeps everything
    pub relevant_periods: Vec<String>,
    pub column_renames: BTreeMap<String, String>,
    /// Column (after renaming) whose group labels are replaced by codes
    pub group_code_column: String,
    pub group_codes: Option<BTreeMap<String, String>>,
    pub geolevel: Option<String>,
}

impl AggregationSpec {
    pub fn new(group_column: impl Into<String>, period_column: impl Into<String>) -> Self {
        Self {
            group_column: group_column.into(),
            period_column: period_column.into(),
            measures: Vec::new(),
            relevant_periods: Vec::new(),
            column_renames: BTreeMap::new(),
            group_code_column: columns::GEOITEM.to_string(),
            group_codes: None,
            geolevel: None,
        }
    }

    pub fn with_measure(mut self, measure: Measure) -> Self {
        self.measures.push(measure);
        self
    }

    pub fn with_periods<I, S>(mut self, periods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relevant_periods = periods.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_renames(mut self, renames: BTreeMap<String, String>) -> Self {
        self.column_renames = renames;
        self
    }

    pub fn with_group_codes(
        mut self,
        column: impl Into<String>,
        codes: BTreeMap<String, String>,
    ) -> Self {
        self.group_code_column = column.into();
        self.group_codes = Some(codes);
        self
    }

    pub fn with_geolevel(mut self, geolevel: impl Into<String>) -> Self {
        self.geolevel = Some(geolevel.into());
        self
    }
}

/// Render period cells canonically so `2020`, `2020.0` and `"2020"` compare equal
fn canonical_period(raw: &str) -> String {
    raw.parse::<Period>()
        .map(|period| period.to_string())
        .unwrap_or_else(|_| raw.trim().to_string())
}

/// Aggregate `df` according to `spec`
pub fn aggregate(df: &DataFrame, spec: &AggregationSpec) -> Result<DataFrame> {
    const TABLE: &str = "aggregation input";
    let group = spec.group_column.as_str();
    let period = spec.period_column.as_str();

    if spec.measures.is_empty() {
        return Err(EtlError::configuration("aggregation needs at least one measure"));
    }
    table::require_columns(df, &[group, period], TABLE)?;
    for measure in &spec.measures {
        table::require_column(df, &measure.column, TABLE)?;
    }

    let mut output_names = HashSet::new();
    for measure in &spec.measures {
        if !output_names.insert(measure.output_name()) {
            return Err(EtlError::configuration(format!(
                "measure '{}' is aggregated twice under the same name; give one an alias (e.g. '{}_{}')",
                measure.column,
                measure.column,
                measure.function.suffix()
            )));
        }
    }

    // Explicit schema: string keys, float measures
    let periods: Vec<Option<String>> = table::string_values(df, period)?
        .into_iter()
        .map(|value| value.map(|raw| canonical_period(&raw)))
        .collect();
    let mut frame_columns = vec![
        table::string_column(group, table::string_values(df, group)?),
        table::string_column(period, periods),
    ];
    let mut seen_inputs = HashSet::new();
    for measure in &spec.measures {
        if seen_inputs.insert(measure.column.clone()) {
            let values = table::numeric_values(df, &measure.column, NumericPolicy::Missing)?;
            frame_columns.push(table::float_column(&measure.column, values));
        }
    }
    let frame = DataFrame::new(frame_columns)?;

    let has_group: Vec<bool> = table::string_values(&frame, group)?
        .iter()
        .map(Option::is_some)
        .collect();
    let ungrouped = has_group.iter().filter(|g| !**g).count();
    if ungrouped > 0 {
        warn!(
            "{} rows without '{}' are left out of the aggregation",
            ungrouped, group
        );
    }
    let frame = table::filter_rows(&frame, &has_group)?;

    let aggregations: Vec<Expr> = spec
        .measures
        .iter()
        .map(|measure| {
            measure
                .function
                .expr(&measure.column)
                .alias(measure.output_name())
        })
        .collect();

    let mut aggregated = frame
        .lazy()
        .group_by([col(group), col(period)])
        .agg(aggregations)
        .sort_by_exprs([col(group), col(period)], SortMultipleOptions::default())
        .collect()?;
    debug!(
        "Aggregated {} rows into {} (group, period) rows",
        df.height(),
        aggregated.height()
    );

    if !spec.relevant_periods.is_empty() {
        let allowed: HashSet<String> = spec
            .relevant_periods
            .iter()
            .map(|p| canonical_period(p))
            .collect();
        let keep: Vec<bool> = table::string_values(&aggregated, period)?
            .iter()
            .map(|value| value.as_ref().is_some_and(|p| allowed.contains(p)))
            .collect();
        aggregated = table::filter_rows(&aggregated, &keep)?;
    }

    for (from, to) in &spec.column_renames {
        if table::has_column(&aggregated, from) {
            aggregated.rename(from, to.as_str().into())?;
        } else {
            debug!("Rename of absent column '{}' skipped", from);
        }
    }

    if let Some(codes) = &spec.group_codes {
        let code_column = spec.group_code_column.as_str();
        table::require_column(&aggregated, code_column, "aggregated table")?;
        let coded: Vec<Option<String>> = table::string_values(&aggregated, code_column)?
            .iter()
            .map(|label| label.as_ref().and_then(|l| codes.get(l)).cloned())
            .collect();
        let unmapped = coded.iter().filter(|code| code.is_none()).count();
        if unmapped > 0 {
            warn!("{} groups have no code in '{}'", unmapped, code_column);
        }
        aggregated = table::with_string_column(&aggregated, code_column, coded)?;
    }

    if let Some(geolevel) = &spec.geolevel {
        aggregated = table::with_literal_column(&aggregated, columns::GEOLEVEL, geolevel)?;
    }

    info!(
        "Aggregation by ('{}', '{}'): {} -> {} rows",
        group,
        period,
        df.height(),
        aggregated.height()
    );
    Ok(aggregated)
}
