//! Indicators derived from two statistics-table columns

use crate::constants::columns;
use crate::error::{EtlError, Result};
use crate::models::GeoLevel;
use crate::table::{self, NumericPolicy};
use polars::prelude::DataFrame;
use tracing::debug;

/// `numerator / denominator * scale`, one row per (region, period)
#[derive(Debug, Clone)]
pub struct RatioIndicator {
    pub region_column: String,
    pub period_column: String,
    pub numerator: String,
    pub denominator: String,
    pub scale: f64,
    pub output: String,
}

impl Default for RatioIndicator {
    fn default() -> Self {
        Self {
            region_column: "RegioS".to_string(),
            period_column: "Perioden".to_string(),
            numerator: "TotaleOppervlakte_243".to_string(),
            denominator: "TotaleBevolking_1".to_string(),
            scale: 1000.0,
            output: "mo_12d".to_string(),
        }
    }
}

impl RatioIndicator {
    /// Compute the indicator; rows with any missing input are dropped.
    ///
    /// Rows whose region equals `top_level_code` are marked national, all
    /// others get `geolevel`.
    pub fn compute(&self, df: &DataFrame, geolevel: &str, top_level_code: &str) -> Result<DataFrame> {
        table::require_columns(
            df,
            &[
                self.region_column.as_str(),
                self.period_column.as_str(),
                self.numerator.as_str(),
                self.denominator.as_str(),
            ],
            "statistics table",
        )?;
        if self.output == columns::GEOITEM || self.output == columns::PERIOD {
            return Err(EtlError::configuration(format!(
                "indicator name '{}' collides with a key column",
                self.output
            )));
        }

        let regions = table::string_values(df, &self.region_column)?;
        let periods = table::string_values(df, &self.period_column)?;
        let numerators = table::numeric_values(df, &self.numerator, NumericPolicy::Missing)?;
        let denominators = table::numeric_values(df, &self.denominator, NumericPolicy::Missing)?;

        let mut geoitems = Vec::new();
        let mut out_periods = Vec::new();
        let mut values = Vec::new();
        let mut geolevels = Vec::new();
        for row in 0..df.height() {
            let ratio = match (numerators[row], denominators[row]) {
                (Some(n), Some(d)) if d != 0.0 => Some(n / d * self.scale),
                _ => None,
            };
            let (Some(region), Some(period), Some(ratio)) =
                (regions[row].clone(), periods[row].clone(), ratio)
            else {
                continue;
            };

            let level = if region == top_level_code {
                GeoLevel::National.code()
            } else {
                geolevel
            };
            geolevels.push(Some(level.to_string()));
            geoitems.push(Some(region));
            out_periods.push(Some(period.trim().to_string()));
            values.push(Some(ratio));
        }

        debug!(
            "Derived '{}' for {} of {} rows",
            self.output,
            values.len(),
            df.height()
        );

        Ok(DataFrame::new(vec![
            table::string_column(columns::GEOITEM, geoitems),
            table::string_column(columns::PERIOD, out_periods),
            table::float_column(&self.output, values),
            table::string_column(columns::GEOLEVEL, geolevels),
        ])?)
    }
}
