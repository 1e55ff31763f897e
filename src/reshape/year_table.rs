//! Categories down the side, years across the top

use crate::constants::columns;
use crate::error::{EtlError, Result};
use crate::table::{self, NumericPolicy};
use polars::prelude::DataFrame;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct YearTableReshape {
    /// Rows kept from the top of the grid, header row included
    pub n_rows: usize,
    /// Columns kept from the left of the grid, category column included
    pub n_cols: usize,
    pub region_label: String,
    /// Factor applied to every value, e.g. 100 for fractions to percentages
    pub scale: Option<f64>,
}

impl YearTableReshape {
    pub fn new(n_rows: usize) -> Self {
        Self {
            n_rows,
            n_cols: 6,
            region_label: "Nederland".to_string(),
            scale: Some(100.0),
        }
    }

    pub fn with_columns(mut self, n_cols: usize) -> Self {
        self.n_cols = n_cols;
        self
    }

    pub fn with_region(mut self, region_label: impl Into<String>) -> Self {
        self.region_label = region_label.into();
        self
    }

    pub fn with_scale(mut self, scale: Option<f64>) -> Self {
        self.scale = scale;
        self
    }

    pub fn reshape(&self, grid: &DataFrame) -> Result<DataFrame> {
        if self.n_rows < 2 || self.n_cols < 2 {
            return Err(EtlError::configuration(format!(
                "a year table needs a header row and a category column, got {} rows x {} columns",
                self.n_rows, self.n_cols
            )));
        }

        let rows: Vec<Vec<Option<String>>> = table::grid_rows(grid)?
            .into_iter()
            .take(self.n_rows)
            .map(|row| row.into_iter().take(self.n_cols).collect())
            .collect();
        let Some(header) = rows.first() else {
            return Err(EtlError::format_mismatch("year table is empty"));
        };

        // Header cells that are not years drop their column
        let years: Vec<(usize, i32)> = header
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, value)| {
                let year = value.as_deref()?.trim().parse::<f64>().ok()?;
                (year.is_finite() && year.fract() == 0.0).then_some((index, year as i32))
            })
            .collect();
        if years.is_empty() {
            return Err(EtlError::format_mismatch(
                "header row of the year table holds no years",
            ));
        }
        debug!("Year table columns: {:?}", years);

        let data_rows: Vec<&Vec<Option<String>>> = rows
            .iter()
            .skip(1)
            .filter(|row| row.first().is_some_and(Option::is_some))
            .collect();

        let mut regions = Vec::new();
        let mut periods = Vec::new();
        let mut categories = Vec::new();
        let mut values = Vec::new();
        for (index, year) in &years {
            for row in &data_rows {
                let raw = row.get(*index).and_then(|cell| cell.as_deref());
                let value = NumericPolicy::Missing
                    .apply(raw)
                    .map(|v| self.scale.map_or(v, |scale| v * scale));
                regions.push(Some(self.region_label.clone()));
                periods.push(Some(year.to_string()));
                categories.push(row[0].clone());
                values.push(value);
            }
        }

        let out = DataFrame::new(vec![
            table::string_column(columns::REGION, regions),
            table::string_column(columns::PERIOD, periods),
            table::string_column(columns::CATEGORY, categories),
            table::float_column(columns::VALUE, values),
        ])?;
        info!(
            "Year table: {} categories x {} years -> {} records",
            data_rows.len(),
            years.len(),
            out.height()
        );
        Ok(out)
    }
}
