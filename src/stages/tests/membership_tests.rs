//! Tests for the membership filter

use super::{create_csv_file, scores_table, some, strings};
use crate::error::EtlError;
use crate::stages::membership::{MembershipSet, filter_members};
use polars::prelude::*;
use std::path::Path;

#[test]
fn test_filter_keeps_members_only() {
    let set = MembershipSet::new(["bu09350101", "bu09830201"]);
    let filtered = filter_members(&scores_table(), "bu_code", &set).unwrap();

    assert_eq!(filtered.height(), 2);
    let codes = strings(&filtered, "bu_code");
    assert!(codes.iter().flatten().all(|code| set.contains(code)));
    assert_eq!(codes, some(&["bu09350101", "bu09830201"]));
}

#[test]
fn test_filter_is_exact_match() {
    // Membership is not case-folded; corrections uppercase beforehand
    let set = MembershipSet::new(["BU09350101"]);
    let filtered = filter_members(&scores_table(), "bu_code", &set);
    assert!(matches!(filtered, Err(EtlError::EmptyResult { .. })));
}

#[test]
fn test_empty_result_is_an_error() {
    let set = MembershipSet::new(["XX00"]);
    let err = filter_members(&scores_table(), "bu_code", &set).unwrap_err();
    assert!(matches!(err, EtlError::EmptyResult { ref reason } if reason.contains("bu_code")));
}

#[test]
fn test_missing_column() {
    let set = MembershipSet::new(["BU01"]);
    let df = df!("code" => ["BU01"]).unwrap();
    assert!(matches!(
        filter_members(&df, "bu_code", &set),
        Err(EtlError::MissingColumn { .. })
    ));
}

#[test]
fn test_from_file() {
    let file = create_csv_file("BU_CODE,COROP_NAAM\nBU09350101,Zuid-Limburg\nBU09830201,Noord-Limburg\n");
    let set = MembershipSet::from_file(file.path()).unwrap();
    assert_eq!(set.len(), 2);
    assert!(set.contains("BU09350101"));
    assert!(!set.contains("BU03630001"));
}

#[test]
fn test_from_file_errors() {
    assert!(matches!(
        MembershipSet::from_file(Path::new("/nonexistent/buurten.csv")),
        Err(EtlError::NotFound { .. })
    ));

    let file = create_csv_file("CODE\nBU01\n");
    assert!(matches!(
        MembershipSet::from_file(file.path()),
        Err(EtlError::MissingColumn { ref column, .. }) if column == "BU_CODE"
    ));
}
