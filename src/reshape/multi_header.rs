//! Multi-row-header reshape
//!
//! Layout handled here (cells shown with blanks as `_`):
//!
//! ```text
//! _      | Koop | _    | Huur | _
//! _      | 2019 | 2021 | 2019 | 2021
//! Venlo  | 1.5  | 2    | .    | 3
//! ```
//!
//! Merged category cells leave blanks in the category row; the label is
//! inherited from the nearest populated cell in the configured direction.

use crate::constants::{ZERO_MARKER, columns};
use crate::error::{EtlError, Result};
use crate::table::{self, NumericPolicy};
use polars::prelude::DataFrame;
use tracing::{debug, info};

/// Direction in which a category label propagates over blank cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillDirection {
    /// Blank cells take the label to their left
    Forward,
    /// Blank cells take the label to their right
    Backward,
}

/// Resolution for blank category cells with nothing to inherit from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadingBlank {
    Reject,
    Label(String),
}

/// Positions are zero-based grid coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLayout {
    pub category_row: usize,
    pub period_row: usize,
    pub data_start_row: usize,
    pub id_column: usize,
    pub fill: FillDirection,
    pub leading_blank: LeadingBlank,
}

impl HeaderLayout {
    /// Categories in row 0, periods in row 1, data from row 2, ids in column 0
    pub fn new(fill: FillDirection, leading_blank: LeadingBlank) -> Self {
        Self {
            category_row: 0,
            period_row: 1,
            data_start_row: 2,
            id_column: 0,
            fill,
            leading_blank,
        }
    }

    pub fn with_rows(mut self, category_row: usize, period_row: usize, data_start_row: usize) -> Self {
        self.category_row = category_row;
        self.period_row = period_row;
        self.data_start_row = data_start_row;
        self
    }

    pub fn with_id_column(mut self, id_column: usize) -> Self {
        self.id_column = id_column;
        self
    }

    fn validate(&self, height: usize, width: usize) -> Result<()> {
        if self.data_start_row <= self.category_row.max(self.period_row) {
            return Err(EtlError::configuration(format!(
                "data rows must start below the header rows (data_start_row {}, category_row {}, period_row {})",
                self.data_start_row, self.category_row, self.period_row
            )));
        }
        if self.category_row == self.period_row {
            return Err(EtlError::configuration(
                "category and period headers must be on different rows",
            ));
        }
        if height <= self.category_row.max(self.period_row) {
            return Err(EtlError::format_mismatch(format!(
                "grid has {} rows, header rows need at least {}",
                height,
                self.category_row.max(self.period_row) + 1
            )));
        }
        if self.id_column >= width {
            return Err(EtlError::format_mismatch(format!(
                "identifier column {} is outside a grid of {} columns",
                self.id_column, width
            )));
        }
        Ok(())
    }
}

/// Propagate category labels across blank cells, skipping the id column
fn fill_categories(
    row: &[Option<String>],
    id_column: usize,
    direction: FillDirection,
) -> Vec<Option<String>> {
    let mut filled = vec![None; row.len()];
    let order: Vec<usize> = match direction {
        FillDirection::Forward => (0..row.len()).collect(),
        FillDirection::Backward => (0..row.len()).rev().collect(),
    };

    let mut current: Option<String> = None;
    for index in order {
        if index == id_column {
            continue;
        }
        if let Some(label) = &row[index] {
            current = Some(label.clone());
        }
        filled[index] = current.clone();
    }
    filled
}

fn cell(row: &[Option<String>], index: usize) -> Option<&str> {
    row.get(index).and_then(|value| value.as_deref())
}

fn parse_value(raw: Option<&str>) -> Option<f64> {
    match raw {
        Some(ZERO_MARKER) => Some(0.0),
        other => NumericPolicy::Missing.apply(other),
    }
}

/// Reshape a header-less grid into `region, period, category, value` rows
pub fn reshape_multi_header(grid: &DataFrame, layout: &HeaderLayout) -> Result<DataFrame> {
    let rows = table::grid_rows(grid)?;
    let width = grid.width();
    layout.validate(rows.len(), width)?;

    let period_row = &rows[layout.period_row];
    let categories = fill_categories(&rows[layout.category_row], layout.id_column, layout.fill);

    // Data columns are the ones tagged with a period
    let mut data_columns = Vec::new();
    let mut periods: Vec<String> = Vec::new();
    for index in (0..width).filter(|&index| index != layout.id_column) {
        let Some(period) = cell(period_row, index) else {
            continue;
        };
        let category = match (&categories[index], &layout.leading_blank) {
            (Some(label), _) => label.clone(),
            (None, LeadingBlank::Label(label)) => label.clone(),
            (None, LeadingBlank::Reject) => {
                return Err(EtlError::format_mismatch(format!(
                    "column {} (period '{}') has no category label to inherit",
                    index, period
                )));
            }
        };
        if !periods.iter().any(|seen| seen == period) {
            periods.push(period.to_string());
        }
        data_columns.push((index, period.to_string(), category));
    }
    if data_columns.is_empty() {
        return Err(EtlError::format_mismatch(format!(
            "period row {} holds no period tags",
            layout.period_row
        )));
    }

    let data_rows: Vec<&Vec<Option<String>>> = rows
        .iter()
        .skip(layout.data_start_row)
        .filter(|row| cell(row, layout.id_column).is_some())
        .collect();
    debug!(
        "Grid of {} rows: {} data rows, {} data columns, periods {:?}",
        rows.len(),
        data_rows.len(),
        data_columns.len(),
        periods
    );

    let mut regions = Vec::new();
    let mut out_periods = Vec::new();
    let mut out_categories = Vec::new();
    let mut values = Vec::new();
    for period in &periods {
        for (index, _, category) in data_columns.iter().filter(|(_, p, _)| p == period) {
            for row in &data_rows {
                regions.push(cell(row, layout.id_column).map(str::to_string));
                out_periods.push(Some(period.clone()));
                out_categories.push(Some(category.clone()));
                values.push(parse_value(cell(row, *index)));
            }
        }
    }

    let out = DataFrame::new(vec![
        table::string_column(columns::REGION, regions),
        table::string_column(columns::PERIOD, out_periods),
        table::string_column(columns::CATEGORY, out_categories),
        table::float_column(columns::VALUE, values),
    ])?;
    info!(
        "Reshaped {}-period grid into {} records",
        periods.len(),
        out.height()
    );
    Ok(out)
}
