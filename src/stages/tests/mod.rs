//! Shared fixtures for stage tests

use polars::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

mod hierarchy_tests;
mod membership_tests;

/// Write `content` to a temporary `.csv` file
pub fn create_csv_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "{}", content).unwrap();
    file.flush().unwrap();
    file
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

/// Neighbourhood scores as they come out of the livability export
pub fn scores_table() -> DataFrame {
    df!(
        "bu_code" => ["bu09350101", "BU09350102", "bu09830201", "BU03630001"],
        "jaar" => [2020i64, 2020, 2020, 2020],
        "lbm" => [Some(4.0), Some(4.2), Some(3.9), None],
    )
    .unwrap()
}
