//! Tests for the composite-label reshape

use super::{floats, some, strings};
use crate::config::{SurveyConfig, TopLevelEntity};
use crate::error::EtlError;
use crate::reshape::{CompositeLabel, CompositeReshape};
use polars::prelude::*;

fn survey_table() -> DataFrame {
    df!(
        "Provincies" => ["Limburg: Noord-Limburg", "Nederland"],
        "junk|2021|Eigenaar-bewoner|Erg tevreden" => ["12", "-"],
        "junk|2021|Private huur|Tevreden, niet ontevreden" => ["abc", "7.5"],
    )
    .unwrap()
}

#[test]
fn test_label_splits_into_four_parts() {
    let label = CompositeLabel::parse("junk|2021|Eigenaar-bewoner|Erg tevreden", '|', 4).unwrap();
    assert_eq!(label.len(), 4);
    assert_eq!(label.part(1), Some("2021"));
    assert_eq!(label.part(3), Some("Erg tevreden"));
}

#[test]
fn test_three_part_label_is_rejected() {
    let err = CompositeLabel::parse("junk|2021|Eigenaar-bewoner", '|', 4).unwrap_err();
    assert!(matches!(err, EtlError::FormatMismatch { ref reason } if reason.contains("junk|2021|Eigenaar-bewoner")));
}

#[test]
fn test_blank_part_reads_as_none() {
    let label = CompositeLabel::parse("junk| |Eigenaar-bewoner|Erg tevreden", '|', 4).unwrap();
    assert_eq!(label.part(1), None);
    assert_eq!(label.part(9), None);
}

#[test]
fn test_reshape_survey_table() {
    let reshape = CompositeReshape::from_config(&SurveyConfig::default());
    let long = reshape.reshape(&survey_table()).unwrap();

    let names: Vec<String> = long
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(
        names,
        vec!["geolevel", "geoitem", "period", "dim_eigendom_1", "dim_tevredenheid_0", "MO_11b"]
    );

    // Four cells, one no-data sentinel
    assert_eq!(long.height(), 3);
    assert_eq!(strings(&long, "geoitem"), some(&["cr37", "cr37", "nl00"]));
    assert_eq!(strings(&long, "geolevel"), some(&["corop_id", "corop_id", "nederland"]));
    assert_eq!(strings(&long, "period"), some(&["2021", "2021", "2021"]));
    assert_eq!(strings(&long, "dim_eigendom_1"), some(&["2", "12", "12"]));
    assert_eq!(
        strings(&long, "dim_tevredenheid_0"),
        some(&["erg_tevreden", "tevreden_niet_ontevreden", "tevreden_niet_ontevreden"])
    );
    assert_eq!(floats(&long, "MO_11b"), vec![Some(12.0), Some(0.0), Some(7.5)]);
}

#[test]
fn test_malformed_label_fails_whole_table() {
    let df = df!(
        "Provincies" => ["Nederland"],
        "junk|2021|Eigenaar-bewoner|Erg tevreden" => ["1"],
        "junk|2021|Eigenaar-bewoner" => ["2"],
    )
    .unwrap();
    let reshape = CompositeReshape::from_config(&SurveyConfig::default());
    assert!(matches!(
        reshape.reshape(&df),
        Err(EtlError::FormatMismatch { .. })
    ));
}

#[test]
fn test_incomplete_dimensions_are_dropped() {
    let df = df!(
        "Provincies" => [Some("Nederland"), None],
        "junk||Eigenaar-bewoner|Erg tevreden" => ["1", "2"],
        "junk|2022|Corporatiehuur|Ontevreden" => ["3", "4"],
    )
    .unwrap();
    let reshape = CompositeReshape::from_config(&SurveyConfig::default());
    let long = reshape.reshape(&df).unwrap();

    assert_eq!(long.height(), 1);
    assert_eq!(strings(&long, "period"), some(&["2022"]));
    assert_eq!(strings(&long, "dim_eigendom_1"), some(&["11"]));
    assert_eq!(floats(&long, "MO_11b"), vec![Some(3.0)]);
}

#[test]
fn test_unmapped_values_become_null() {
    let df = df!(
        "Provincies" => ["Gelderland"],
        "junk|2021|Onbekend|Erg tevreden" => ["5"],
    )
    .unwrap();
    let reshape = CompositeReshape::from_config(&SurveyConfig::default());
    let long = reshape.reshape(&df).unwrap();

    assert_eq!(strings(&long, "geoitem"), vec![None]);
    assert_eq!(strings(&long, "dim_eigendom_1"), vec![None]);
    assert_eq!(floats(&long, "MO_11b"), vec![Some(5.0)]);
}

#[test]
fn test_identifiers_kept_without_code_table() {
    let reshape = CompositeReshape::from_config(&SurveyConfig::default()).without_geoitem_codes();
    let long = reshape.reshape(&survey_table()).unwrap();
    assert_eq!(
        strings(&long, "geoitem"),
        some(&["Limburg: Noord-Limburg", "Limburg: Noord-Limburg", "Nederland"])
    );
    assert_eq!(strings(&long, "geolevel"), some(&["corop_id", "corop_id", "nederland"]));
}

#[test]
fn test_national_rows_follow_top_level_entity() {
    let mut config = SurveyConfig::default();
    config
        .geoitem_codes
        .insert("Belgie".to_string(), "be00".to_string());
    let df = df!(
        "Provincies" => ["Belgie", "Limburg: Zuid-Limburg", "Nederland"],
        "junk|2021|Eigenaar-bewoner|Tevreden" => ["1", "2", "3"],
    )
    .unwrap();

    let top_level = TopLevelEntity {
        name: "Belgie".to_string(),
        code: "be00".to_string(),
    };
    let long = CompositeReshape::from_config(&config)
        .with_top_level(top_level)
        .reshape(&df)
        .unwrap();

    assert_eq!(strings(&long, "geoitem"), some(&["be00", "cr39", "nl00"]));
    assert_eq!(strings(&long, "geolevel"), some(&["nederland", "corop_id", "corop_id"]));
}

#[test]
fn test_values_reproduce_wide_cells() {
    let df = df!(
        "Provincies" => ["Nederland", "Limburg: Zuid-Limburg"],
        "a|2019|Eigenaar-bewoner|Tevreden" => ["1.5", "2.5"],
        "a|2021|Eigenaar-bewoner|Tevreden" => ["3", "4"],
    )
    .unwrap();
    let reshape = CompositeReshape::from_config(&SurveyConfig::default());
    let long = reshape.reshape(&df).unwrap();

    assert_eq!(long.height(), 4);
    let total: f64 = floats(&long, "MO_11b").into_iter().flatten().sum();
    assert_eq!(total, 11.0);
    assert_eq!(strings(&long, "period"), some(&["2019", "2019", "2021", "2021"]));
}

#[test]
fn test_missing_id_column() {
    let df = df!("Regio" => ["Nederland"]).unwrap();
    let reshape = CompositeReshape::from_config(&SurveyConfig::default());
    assert!(matches!(
        reshape.reshape(&df),
        Err(EtlError::MissingColumn { ref column, .. }) if column == "Provincies"
    ));
}
