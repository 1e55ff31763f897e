//! Tests for group attachment

use super::{create_csv_file, strings};
use crate::error::EtlError;
use crate::stages::hierarchy::{GroupMapping, attach_group};
use polars::prelude::*;
use std::path::Path;

fn corop_mapping() -> GroupMapping {
    GroupMapping::new(
        "COROP_NAAM",
        [
            ("BU09350101", "Zuid-Limburg"),
            ("BU09350102", "Zuid-Limburg"),
            ("BU09830201", "Noord-Limburg"),
        ],
    )
}

#[test]
fn test_attach_group_left_lookup() {
    let df = df!("bu_code" => ["BU09350101", "BU09830201", "BU03630001"]).unwrap();
    let joined = attach_group(&df, "bu_code", &corop_mapping()).unwrap();

    // Unmapped rows survive with a null group
    assert_eq!(joined.height(), 3);
    assert_eq!(
        strings(&joined, "COROP_NAAM"),
        vec![
            Some("Zuid-Limburg".to_string()),
            Some("Noord-Limburg".to_string()),
            None
        ]
    );
}

#[test]
fn test_duplicate_keys_last_wins() {
    let mapping = GroupMapping::new("COROP_NAAM", [("BU01", "Noord-Limburg"), ("BU01", "Midden-Limburg")]);
    assert_eq!(mapping.len(), 1);
    assert_eq!(mapping.group_of("BU01"), Some("Midden-Limburg"));
}

#[test]
fn test_attach_group_missing_column() {
    let df = df!("code" => ["BU01"]).unwrap();
    assert!(matches!(
        attach_group(&df, "bu_code", &corop_mapping()),
        Err(EtlError::MissingColumn { ref column, .. }) if column == "bu_code"
    ));
}

#[test]
fn test_from_file() {
    let file = create_csv_file(
        "BU_CODE,COROP_NAAM,GM_NAAM\nBU09350101,Zuid-Limburg,Maastricht\nBU09830201,Noord-Limburg,Venlo\n",
    );
    let mapping = GroupMapping::from_file(file.path()).unwrap();
    assert_eq!(mapping.group_column(), "COROP_NAAM");
    assert_eq!(mapping.group_of("BU09830201"), Some("Noord-Limburg"));

    let by_municipality =
        GroupMapping::from_file_with_columns(file.path(), "BU_CODE", "GM_NAAM").unwrap();
    assert_eq!(by_municipality.group_of("BU09350101"), Some("Maastricht"));
}

#[test]
fn test_from_file_errors() {
    assert!(matches!(
        GroupMapping::from_file(Path::new("/nonexistent/buurten.csv")),
        Err(EtlError::NotFound { .. })
    ));

    let file = create_csv_file("BU_CODE\nBU01\n");
    assert!(matches!(
        GroupMapping::from_file(file.path()),
        Err(EtlError::MissingColumn { ref column, .. }) if column == "COROP_NAAM"
    ));
}
