//! Core data structures for the long-format schema.
//!
//! Defines the geolevel vocabulary, period tokens and the typed
//! `LongRecord` view over a normalized output table.

use crate::constants::columns;
use crate::error::{EtlError, Result};
use crate::table;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Administrative granularity of a geographic row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoLevel {
    National,
    Provincial,
    RegionalGrouping,
    Neighbourhood,
}

impl GeoLevel {
    /// Token written to the `geolevel` output column
    pub fn code(&self) -> &'static str {
        match self {
            GeoLevel::National => "nederland",
            GeoLevel::Provincial => "prov_id",
            GeoLevel::RegionalGrouping => "corop_id",
            GeoLevel::Neighbourhood => "bu_code",
        }
    }

    /// Suffix token the statistics office appends to region labels, e.g. `(CR)`
    pub fn suffix_token(&self) -> Option<&'static str> {
        match self {
            GeoLevel::National => None,
            GeoLevel::Provincial => Some("pv"),
            GeoLevel::RegionalGrouping => Some("cr"),
            GeoLevel::Neighbourhood => Some("bu"),
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "nederland" => Some(GeoLevel::National),
            "prov_id" => Some(GeoLevel::Provincial),
            "corop_id" => Some(GeoLevel::RegionalGrouping),
            "bu_code" => Some(GeoLevel::Neighbourhood),
            _ => None,
        }
    }
}

impl fmt::Display for GeoLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Time reference of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Year(i32),
    /// Rendered as `m{month}y{year}`, e.g. `m1y1999`
    MonthYear { month: u32, year: i32 },
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Year(year) => write!(f, "{}", year),
            Period::MonthYear { month, year } => write!(f, "m{}y{}", month, year),
        }
    }
}

impl FromStr for Period {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || EtlError::format_mismatch(format!("'{}' is not a period token", s));

        if let Some(rest) = trimmed.strip_prefix('m') {
            let (month, year) = rest.split_once('y').ok_or_else(invalid)?;
            let month: u32 = month.parse().map_err(|_| invalid())?;
            let year: i32 = year.parse().map_err(|_| invalid())?;
            if !(1..=12).contains(&month) {
                return Err(invalid());
            }
            return Ok(Period::MonthYear { month, year });
        }

        // Years sometimes arrive as floats from type-inferred spreadsheets
        if let Ok(year) = trimmed.parse::<i32>() {
            return Ok(Period::Year(year));
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.fract() == 0.0 => Ok(Period::Year(value as i32)),
            _ => Err(invalid()),
        }
    }
}

/// One normalized output row
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    pub geolevel: String,
    pub geoitem: Option<String>,
    pub period: Period,
    pub indicator: String,
    pub dimensions: BTreeMap<String, Option<String>>,
    pub value: Option<f64>,
}

/// Convert a long-format frame into typed records.
///
/// Every column named in `indicator_columns` yields one record per row; any
/// column whose name starts with `dim_` is carried as a dimension.
pub fn records_from_frame(df: &DataFrame, indicator_columns: &[&str]) -> Result<Vec<LongRecord>> {
    const TABLE: &str = "long-format table";
    table::require_columns(
        df,
        &[columns::GEOLEVEL, columns::GEOITEM, columns::PERIOD],
        TABLE,
    )?;
    table::require_columns(df, indicator_columns, TABLE)?;

    let geolevels = table::string_values(df, columns::GEOLEVEL)?;
    let geoitems = table::string_values(df, columns::GEOITEM)?;
    let periods = table::string_values(df, columns::PERIOD)?;

    let dimension_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| name.starts_with("dim_"))
        .map(|name| name.to_string())
        .collect();
    let mut dimension_values = Vec::with_capacity(dimension_names.len());
    for name in &dimension_names {
        dimension_values.push(table::string_values(df, name)?);
    }

    let mut records = Vec::with_capacity(df.height() * indicator_columns.len());
    for indicator in indicator_columns {
        let values = table::numeric_values(df, indicator, table::NumericPolicy::Missing)?;
        for row in 0..df.height() {
            let period = periods[row]
                .as_deref()
                .ok_or_else(|| EtlError::format_mismatch(format!("row {} has no period", row)))?
                .parse::<Period>()?;
            let dimensions = dimension_names
                .iter()
                .zip(&dimension_values)
                .map(|(name, values)| (name.clone(), values[row].clone()))
                .collect();

            records.push(LongRecord {
                geolevel: geolevels[row].clone().unwrap_or_default(),
                geoitem: geoitems[row].clone(),
                period,
                indicator: indicator.to_string(),
                dimensions,
                value: values[row],
            });
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_period_rendering() {
        assert_eq!(Period::Year(2021).to_string(), "2021");
        assert_eq!(
            Period::MonthYear {
                month: 1,
                year: 1999
            }
            .to_string(),
            "m1y1999"
        );
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("2020".parse::<Period>().unwrap(), Period::Year(2020));
        assert_eq!("2020.0".parse::<Period>().unwrap(), Period::Year(2020));
        assert_eq!(
            "m12y2024".parse::<Period>().unwrap(),
            Period::MonthYear {
                month: 12,
                year: 2024
            }
        );
        assert!("m13y2024".parse::<Period>().is_err());
        assert!("spring".parse::<Period>().is_err());
    }

    #[test]
    fn test_geolevel_codes() {
        assert_eq!(GeoLevel::RegionalGrouping.code(), "corop_id");
        assert_eq!(GeoLevel::RegionalGrouping.suffix_token(), Some("cr"));
        assert_eq!(GeoLevel::National.suffix_token(), None);
        assert_eq!(GeoLevel::from_code("PROV_ID"), Some(GeoLevel::Provincial));
        assert_eq!(GeoLevel::from_code("gemeente"), None);
    }

    #[test]
    fn test_records_from_frame() {
        let df = df!(
            "geolevel" => ["corop_id", "corop_id"],
            "geoitem" => [Some("cr37"), None],
            "period" => ["2020", "2022"],
            "dim_eigendom_1" => ["2", "11"],
            "MO_11b" => [12.0, 30.5],
        )
        .unwrap();

        let records = records_from_frame(&df, &["MO_11b"]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].geoitem.as_deref(), Some("cr37"));
        assert_eq!(records[0].period, Period::Year(2020));
        assert_eq!(records[0].value, Some(12.0));
        assert_eq!(
            records[1].dimensions.get("dim_eigendom_1"),
            Some(&Some("11".to_string()))
        );
        assert_eq!(records[1].geoitem, None);
    }

    #[test]
    fn test_records_from_frame_missing_indicator() {
        let df = df!(
            "geolevel" => ["corop_id"],
            "geoitem" => ["cr37"],
            "period" => ["2020"],
        )
        .unwrap();

        let err = records_from_frame(&df, &["MO_10a"]).unwrap_err();
        assert!(matches!(err, EtlError::MissingColumn { ref column, .. } if column == "MO_10a"));
    }
}
