//! Shared fixtures for reshape tests

use polars::prelude::*;

mod composite_tests;

/// Build a header-less grid the way `read_grid` returns it; `""` is a blank cell
pub fn grid(rows: &[&[&str]]) -> DataFrame {
    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
    let columns: Vec<Column> = (0..width)
        .map(|index| {
            let values: Vec<Option<String>> = rows
                .iter()
                .map(|row| {
                    row.get(index)
                        .filter(|cell| !cell.is_empty())
                        .map(|cell| cell.to_string())
                })
                .collect();
            Series::new(format!("column_{}", index + 1).into(), values).into()
        })
        .collect();
    DataFrame::new(columns).unwrap()
}

pub fn strings(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    crate::table::string_values(df, column).unwrap()
}

pub fn floats(df: &DataFrame, column: &str) -> Vec<Option<f64>> {
    crate::table::numeric_values(df, column, crate::table::NumericPolicy::Missing).unwrap()
}

pub fn some(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|value| Some(value.to_string())).collect()
}
