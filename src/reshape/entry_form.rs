//! Pivot of manual indicator entries
//!
//! Each input row is one entry: indicator number, entered value, the date it
//! was entered and an optional reference date. Entries are pivoted to one
//! row per month with one column per indicator.

use crate::config::EntryFormConfig;
use crate::constants::{columns, entry_form};
use crate::error::{EtlError, Result};
use crate::models::Period;
use crate::table;
use chrono::{Datelike, NaiveDate};
use polars::prelude::DataFrame;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct EntryFormPivot {
    pub geolevel: String,
    pub geoitem: String,
    pub date_format: String,
}

impl EntryFormPivot {
    pub fn from_config(config: &EntryFormConfig) -> Self {
        Self {
            geolevel: config.geolevel.clone(),
            geoitem: config.geoitem.clone(),
            date_format: config.date_format.clone(),
        }
    }

    /// `(year, month)` of a date cell, `None` when it does not parse
    fn month_of(&self, raw: &str) -> Option<(i32, u32)> {
        NaiveDate::parse_from_str(raw.trim(), &self.date_format)
            .ok()
            .map(|date| (date.year(), date.month()))
    }

    pub fn pivot(&self, df: &DataFrame) -> Result<DataFrame> {
        const TABLE: &str = "entry form";
        table::require_columns(
            df,
            &[entry_form::INDICATOR_COLUMN, entry_form::VALUE_COLUMN],
            TABLE,
        )?;
        if table::has_column(df, entry_form::STEWARD_COLUMN) {
            warn!(
                "Column '{}' holds personal data and is left out; remove it from the source file before publishing",
                entry_form::STEWARD_COLUMN
            );
        }

        let entry_dates = self.optional_values(df, entry_form::ENTRY_DATE_COLUMN)?;
        let reference_dates = self.optional_values(df, entry_form::REFERENCE_DATE_COLUMN)?;
        if entry_dates.is_none() && reference_dates.is_none() {
            return Err(EtlError::missing_column(entry_form::ENTRY_DATE_COLUMN, TABLE));
        }

        let indicators = table::string_values(df, entry_form::INDICATOR_COLUMN)?;
        let values = table::string_values(df, entry_form::VALUE_COLUMN)?;

        // (year, month) -> indicator -> first value
        let mut cells: BTreeMap<(i32, u32), BTreeMap<String, String>> = BTreeMap::new();
        let mut indicator_names = BTreeSet::new();
        let mut undated = 0usize;
        for row in 0..df.height() {
            let reference = date_cell(&reference_dates, row);
            let entered = date_cell(&entry_dates, row);
            let Some(month) = reference.or(entered).and_then(|raw| self.month_of(raw)) else {
                undated += 1;
                continue;
            };
            // Entries without an indicator or value add neither a period nor a column
            let (Some(indicator), Some(value)) = (&indicators[row], &values[row]) else {
                continue;
            };
            indicator_names.insert(indicator.clone());
            cells
                .entry(month)
                .or_default()
                .entry(indicator.clone())
                .or_insert_with(|| value.clone());
        }
        if undated > 0 {
            warn!(
                "{} entries without a valid '{}' date are left out",
                undated, self.date_format
            );
        }

        let periods: Vec<Option<String>> = cells
            .keys()
            .map(|&(year, month)| Some(Period::MonthYear { month, year }.to_string()))
            .collect();
        let mut frame_columns = vec![
            table::string_column(columns::GEOLEVEL, vec![Some(self.geolevel.clone()); periods.len()]),
            table::string_column(columns::GEOITEM, vec![Some(self.geoitem.clone()); periods.len()]),
            table::string_column(columns::PERIOD, periods),
        ];
        for indicator in &indicator_names {
            let column = cells
                .values()
                .map(|row| row.get(indicator).cloned())
                .collect();
            frame_columns.push(table::string_column(indicator, column));
        }

        let out = DataFrame::new(frame_columns)?;
        debug!("Entry form indicators: {:?}", indicator_names);
        info!(
            "Pivoted {} entries into {} periods x {} indicators",
            df.height(),
            out.height(),
            indicator_names.len()
        );
        Ok(out)
    }

    fn optional_values(&self, df: &DataFrame, column: &str) -> Result<Option<Vec<Option<String>>>> {
        if table::has_column(df, column) {
            Ok(Some(table::string_values(df, column)?))
        } else {
            Ok(None)
        }
    }
}

/// Non-blank date text at `row` of an optional column
fn date_cell(dates: &Option<Vec<Option<String>>>, row: usize) -> Option<&str> {
    dates
        .as_ref()
        .and_then(|dates| dates[row].as_deref())
        .filter(|raw| !raw.trim().is_empty())
}
