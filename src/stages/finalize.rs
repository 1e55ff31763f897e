//! Final region coding for combined long-format tables
//!
//! Used after tables for several regions (the regional groupings plus the
//! national total) have been stacked: assigns the geolevel per row, swaps
//! region names for codes and applies the output column names.

use crate::config::TopLevelEntity;
use crate::constants::columns;
use crate::error::Result;
use crate::models::GeoLevel;
use crate::reshape::normalize_dimension_text;
use crate::table;
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RegionFinalizer {
    pub region_column: String,
    pub year_column: Option<String>,
    /// Region name -> geoitem code
    pub region_codes: BTreeMap<String, String>,
    pub top_level: TopLevelEntity,
    /// Geolevel of every non-top-level row
    pub geolevel: String,
    pub column_renames: BTreeMap<String, String>,
}

impl RegionFinalizer {
    pub fn new(
        region_column: impl Into<String>,
        region_codes: BTreeMap<String, String>,
        geolevel: impl Into<String>,
    ) -> Self {
        Self {
            region_column: region_column.into(),
            year_column: None,
            region_codes,
            top_level: TopLevelEntity::default(),
            geolevel: geolevel.into(),
            column_renames: BTreeMap::new(),
        }
    }

    pub fn with_year_column(mut self, column: impl Into<String>) -> Self {
        self.year_column = Some(column.into());
        self
    }

    pub fn with_top_level(mut self, top_level: TopLevelEntity) -> Self {
        self.top_level = top_level;
        self
    }

    pub fn with_renames(mut self, renames: BTreeMap<String, String>) -> Self {
        self.column_renames = renames;
        self
    }

    pub fn finalize(&self, df: &DataFrame) -> Result<DataFrame> {
        let region = self.region_column.as_str();
        table::require_column(df, region, "combined table")?;

        let regions = table::string_values(df, region)?;
        let geolevels: Vec<Option<String>> = regions
            .iter()
            .map(|name| {
                let level = if name.as_deref() == Some(self.top_level.name.as_str()) {
                    GeoLevel::National.code()
                } else {
                    self.geolevel.as_str()
                };
                Some(level.to_string())
            })
            .collect();

        let codes: Vec<Option<String>> = regions
            .iter()
            .map(|name| {
                let name = name.as_deref()?;
                self.region_codes.get(name).cloned().or_else(|| {
                    (name == self.top_level.name).then(|| self.top_level.code.clone())
                })
            })
            .collect();
        let unmapped = codes.iter().filter(|code| code.is_none()).count();
        if unmapped > 0 {
            warn!("{} rows have a region without a code", unmapped);
        }

        let mut out = table::with_string_column(df, columns::GEOLEVEL, geolevels)?;
        out = table::with_string_column(&out, region, codes)?;
        if region != columns::GEOITEM {
            out.rename(region, columns::GEOITEM.into())?;
        }
        if let Some(year) = &self.year_column {
            if table::has_column(&out, year) && year != columns::PERIOD {
                out.rename(year, columns::PERIOD.into())?;
            }
        }
        for (from, to) in &self.column_renames {
            if table::has_column(&out, from) {
                out.rename(from, to.as_str().into())?;
            }
        }

        let dimension_columns: Vec<String> = out
            .get_column_names()
            .into_iter()
            .filter(|name| name.starts_with("dim_"))
            .map(|name| name.to_string())
            .collect();
        for name in &dimension_columns {
            let values = table::string_values(&out, name)?
                .into_iter()
                .map(|value| value.map(|text| normalize_dimension_text(&text)))
                .collect();
            out = table::with_string_column(&out, name, values)?;
        }
        debug!(
            "Finalized {} rows, normalized dimensions {:?}",
            out.height(),
            dimension_columns
        );

        Ok(out)
    }
}
