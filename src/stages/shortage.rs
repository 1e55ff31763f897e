//! Housing-shortage percentages per region and year
//!
//! Sources publish the shortage in different shapes from year to year: as a
//! fraction, as an absolute count next to a known housing stock, or as a
//! stock table and a need table that still have to be compared. Each shape
//! becomes the same (region, period, value) frame; national reference
//! figures are supplied by the caller and the combined frame is coded by a
//! [`RegionFinalizer`].

use crate::config::TopLevelEntity;
use crate::constants::columns;
use crate::error::{EtlError, Result};
use crate::models::Period;
use crate::stages::finalize::RegionFinalizer;
use crate::table::{self, NumericPolicy};
use polars::prelude::DataFrame;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct HousingShortage {
    /// Region name column of every input table
    pub region_column: String,
    /// Indicator column of the output
    pub output: String,
}

impl Default for HousingShortage {
    fn default() -> Self {
        Self {
            region_column: "Regio".to_string(),
            output: "MO_11a".to_string(),
        }
    }
}

/// Rows under construction: (region, value)
type Figures = Vec<(String, f64)>;

impl HousingShortage {
    pub fn new(region_column: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            region_column: region_column.into(),
            output: output.into(),
        }
    }

    /// Shortage published as a fraction of the stock: `|fraction| * 100`
    pub fn from_fractions(&self, df: &DataFrame, column: &str, period: i32) -> Result<DataFrame> {
        let figures = self
            .read_figures(df, column)?
            .into_iter()
            .map(|(region, fraction)| (region, fraction.abs() * 100.0))
            .collect();
        self.frame(figures, period)
    }

    /// Absolute shortage against a housing stock per region:
    /// `|shortage / stock| * 100`
    ///
    /// Regions without a (non-zero) stock figure are dropped.
    pub fn from_counts(
        &self,
        df: &DataFrame,
        column: &str,
        housing_stock: &BTreeMap<String, f64>,
        period: i32,
    ) -> Result<DataFrame> {
        let mut figures = Vec::new();
        let mut without_stock = 0usize;
        for (region, shortage) in self.read_figures(df, column)? {
            match housing_stock.get(&region) {
                Some(&stock) if stock != 0.0 => {
                    figures.push((region, (shortage / stock).abs() * 100.0));
                }
                _ => without_stock += 1,
            }
        }
        if without_stock > 0 {
            warn!(
                "{} regions in '{}' have no housing stock figure for {}",
                without_stock, column, period
            );
        }
        self.frame(figures, period)
    }

    /// Need compared with stock: `(need - stock) / stock * 100`
    ///
    /// Only regions present in both tables are kept.
    pub fn from_need(
        &self,
        stock: &DataFrame,
        stock_column: &str,
        need: &DataFrame,
        need_column: &str,
        period: i32,
    ) -> Result<DataFrame> {
        let needs: HashMap<String, f64> = self.read_figures(need, need_column)?.into_iter().collect();

        let mut figures = Vec::new();
        let mut unmatched = 0usize;
        for (region, stock) in self.read_figures(stock, stock_column)? {
            match needs.get(&region) {
                Some(&need) if stock != 0.0 => figures.push((region, (need - stock) / stock * 100.0)),
                _ => unmatched += 1,
            }
        }
        if unmatched > 0 {
            debug!(
                "{} stock rows for {} had no matching need figure",
                unmatched, period
            );
        }
        self.frame(figures, period)
    }

    /// Reference percentages of the top-level entity, one row per year
    pub fn national_reference(
        &self,
        figures: &BTreeMap<i32, f64>,
        top_level: &TopLevelEntity,
    ) -> Result<DataFrame> {
        let mut frames = Vec::with_capacity(figures.len());
        for (&period, &value) in figures {
            frames.push(self.frame(vec![(top_level.name.clone(), value)], period)?);
        }
        self.stack(frames)
    }

    /// Stack per-year frames and code them with `finalizer`
    pub fn combine(&self, parts: Vec<DataFrame>, finalizer: &RegionFinalizer) -> Result<DataFrame> {
        let combined = self.stack(parts)?;
        if combined.height() == 0 {
            return Err(EtlError::empty_result("no housing-shortage figures to combine"));
        }
        let out = finalizer.finalize(&combined)?;
        info!("Combined {} housing-shortage figures", out.height());
        Ok(out)
    }

    /// Region and numeric value per row; rows missing either are dropped
    fn read_figures(&self, df: &DataFrame, column: &str) -> Result<Figures> {
        table::require_columns(df, &[self.region_column.as_str(), column], "housing table")?;
        let regions = table::string_values(df, &self.region_column)?;
        let values = table::numeric_values(df, column, NumericPolicy::Missing)?;

        let figures: Figures = regions
            .into_iter()
            .zip(values)
            .filter_map(|(region, value)| Some((region?.trim().to_string(), value?)))
            .collect();
        if figures.len() < df.height() {
            debug!(
                "Dropped {} rows of '{}' without a region or value",
                df.height() - figures.len(),
                column
            );
        }
        Ok(figures)
    }

    fn frame(&self, figures: Figures, period: i32) -> Result<DataFrame> {
        let period = Period::Year(period).to_string();
        let periods = vec![Some(period); figures.len()];
        let (regions, values): (Vec<_>, Vec<_>) = figures
            .into_iter()
            .map(|(region, value)| (Some(region), Some(value)))
            .unzip();

        Ok(DataFrame::new(vec![
            table::string_column(columns::REGION, regions),
            table::string_column(columns::PERIOD, periods),
            table::float_column(&self.output, values),
        ])?)
    }

    fn stack(&self, parts: Vec<DataFrame>) -> Result<DataFrame> {
        let mut parts = parts.into_iter();
        let Some(mut combined) = parts.next() else {
            return self.frame(Vec::new(), 0);
        };
        for part in parts {
            combined = combined.vstack(&part)?;
        }
        Ok(combined)
    }
}
