//! Schema checks and cell access over raw tables.
//!
//! Source spreadsheets have no reliable types, so every stage reads cells
//! through these helpers: strings for identifiers, and numbers under an
//! explicit per-call-site [`NumericPolicy`].

use crate::error::{EtlError, Result};
use polars::prelude::*;

/// What to do with a cell that cannot be read as a number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericPolicy {
    /// Substitute a fixed value and keep the row
    Default(f64),
    /// Keep the row with a null value so aggregates skip it
    Missing,
}

impl NumericPolicy {
    pub fn apply(&self, raw: Option<&str>) -> Option<f64> {
        let parsed = raw.and_then(|value| value.trim().parse::<f64>().ok());
        match (parsed, self) {
            (Some(value), _) if value.is_finite() => Some(value),
            (_, NumericPolicy::Default(default)) => Some(*default),
            (_, NumericPolicy::Missing) => None,
        }
    }
}

pub fn has_column(df: &DataFrame, column: &str) -> bool {
    df.get_column_names()
        .iter()
        .any(|name| name.as_str() == column)
}

/// Fail with `MissingColumn` unless `column` exists in `df`
pub fn require_column(df: &DataFrame, column: &str, table: &str) -> Result<()> {
    if has_column(df, column) {
        Ok(())
    } else {
        Err(EtlError::missing_column(column, table))
    }
}

pub fn require_columns(df: &DataFrame, columns: &[&str], table: &str) -> Result<()> {
    for column in columns {
        require_column(df, column, table)?;
    }
    Ok(())
}

/// Read a column as optional strings, whatever its stored type
pub fn string_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let as_string = df.column(column)?.cast(&DataType::String)?;
    let values = as_string
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}

/// Read a column as numbers, resolving unparseable cells with `policy`
pub fn numeric_values(
    df: &DataFrame,
    column: &str,
    policy: NumericPolicy,
) -> Result<Vec<Option<f64>>> {
    Ok(string_values(df, column)?
        .iter()
        .map(|value| policy.apply(value.as_deref()))
        .collect())
}

/// Keep the rows whose mask entry is `true`
pub fn filter_rows(df: &DataFrame, keep: &[bool]) -> Result<DataFrame> {
    let mask = Series::new("mask".into(), keep);
    Ok(df.filter(mask.bool()?)?)
}

/// Return a copy of `df` with `column` replaced (or appended)
pub fn with_string_column(
    df: &DataFrame,
    column: &str,
    values: Vec<Option<String>>,
) -> Result<DataFrame> {
    let mut out = df.clone();
    out.with_column(Series::new(column.into(), values))?;
    Ok(out)
}

/// Return a copy of `df` with a constant string column
pub fn with_literal_column(df: &DataFrame, column: &str, value: &str) -> Result<DataFrame> {
    let values = vec![Some(value.to_string()); df.height()];
    with_string_column(df, column, values)
}

pub fn string_column(name: &str, values: Vec<Option<String>>) -> Column {
    Series::new(name.into(), values).into()
}

pub fn float_column(name: &str, values: Vec<Option<f64>>) -> Column {
    Series::new(name.into(), values).into()
}

/// Materialize a header-less frame as rows of optional strings.
///
/// Blank and whitespace-only cells become `None`.
pub fn grid_rows(df: &DataFrame) -> Result<Vec<Vec<Option<String>>>> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    let mut rows = vec![Vec::with_capacity(names.len()); df.height()];
    for name in &names {
        for (row, value) in string_values(df, name)?.into_iter().enumerate() {
            let cell = value
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty());
            rows[row].push(cell);
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_policy() {
        assert_eq!(NumericPolicy::Missing.apply(Some(" 12.5 ")), Some(12.5));
        assert_eq!(NumericPolicy::Missing.apply(Some("n/a")), None);
        assert_eq!(NumericPolicy::Missing.apply(None), None);
        assert_eq!(NumericPolicy::Default(0.0).apply(Some("n/a")), Some(0.0));
        assert_eq!(NumericPolicy::Default(0.0).apply(None), Some(0.0));
        assert_eq!(NumericPolicy::Missing.apply(Some("NaN")), None);
    }

    #[test]
    fn test_require_column() {
        let df = df!("bu_code" => ["BU01"]).unwrap();
        assert!(require_column(&df, "bu_code", "input").is_ok());

        let err = require_column(&df, "BU_CODE", "input").unwrap_err();
        assert!(matches!(
            err,
            EtlError::MissingColumn { ref column, ref table } if column == "BU_CODE" && table == "input"
        ));
    }

    #[test]
    fn test_string_values_from_numbers() {
        let df = df!("jaar" => [2020i64, 2022]).unwrap();
        let values = string_values(&df, "jaar").unwrap();
        assert_eq!(values, vec![Some("2020".to_string()), Some("2022".to_string())]);
    }

    #[test]
    fn test_filter_rows() {
        let df = df!("a" => [1i64, 2, 3]).unwrap();
        let filtered = filter_rows(&df, &[true, false, true]).unwrap();
        assert_eq!(filtered.height(), 2);
        assert_eq!(
            string_values(&filtered, "a").unwrap(),
            vec![Some("1".to_string()), Some("3".to_string())]
        );
    }

    #[test]
    fn test_grid_rows_blank_cells() {
        let df = df!(
            "column_1" => [Some("Regio"), Some("Venlo")],
            "column_2" => [Some("  "), None],
        )
        .unwrap();
        let rows = grid_rows(&df).unwrap();
        assert_eq!(rows[0], vec![Some("Regio".to_string()), None]);
        assert_eq!(rows[1], vec![Some("Venlo".to_string()), None]);
    }
}
