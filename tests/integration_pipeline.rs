//! Integration tests for the file-backed pipelines
//!
//! Every test writes small reference files to a temporary directory and
//! runs the public API end to end.

use regio_etl::config::{EtlConfig, LivabilityConfig};
use regio_etl::error::EtlError;
use regio_etl::normalizer::{CodeNormalizer, RegionOptions};
use regio_etl::pipeline::{LivabilityInputs, LivabilityPipeline};
use regio_etl::reshape::{CompositeReshape, FillDirection, HeaderLayout, LeadingBlank, reshape_multi_header};
use regio_etl::source::{self, CsvDirectorySource, ReadOptions};
use regio_etl::table::{NumericPolicy, numeric_values, string_values};
use regio_etl::models::{GeoLevel, Period, records_from_frame};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn livability_inputs(dir: &Path) -> LivabilityInputs {
    LivabilityInputs {
        scores: write(
            dir,
            "scores.csv",
            "bu_code,jaar,lbm,fys,vrz\n\
             bu09350101,2020,4.0,0.1,0.2\n\
             BU09350102,2020,4.4,0.3,0.4\n\
             bu09830201,2020,3.9,-0.2,0.0\n\
             bu09830201,2021,3.0,0.0,0.0\n\
             BU03630001,2020,5.0,0.5,0.5\n",
        ),
        corrections: write(
            dir,
            "corrections.csv",
            "BUURT_CODE,BUURT_CODE_CORRECTIE\nBU09350101,BU09350199\n",
        ),
        neighbourhoods: write(
            dir,
            "buurten.csv",
            "BU_CODE,COROP_NAAM\n\
             BU09350199,Zuid-Limburg\n\
             BU09350102,Zuid-Limburg\n\
             BU09830201,Noord-Limburg\n",
        ),
    }
}

#[test]
fn test_livability_pipeline_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let inputs = livability_inputs(temp_dir.path());

    let pipeline = LivabilityPipeline::new(LivabilityConfig::default());
    let out = pipeline.run(&inputs).unwrap();

    // 2021 is not a relevant period and BU03630001 lies outside Limburg
    assert_eq!(out.height(), 2);
    assert_eq!(
        string_values(&out, "geoitem").unwrap(),
        vec![Some("cr37".to_string()), Some("cr39".to_string())]
    );
    assert_eq!(
        string_values(&out, "geolevel").unwrap(),
        vec![Some("corop_id".to_string()), Some("corop_id".to_string())]
    );

    let lbm = numeric_values(&out, "MO_10a", NumericPolicy::Missing).unwrap();
    assert_eq!(lbm[0], Some(3.9));
    assert!((lbm[1].unwrap() - 4.2).abs() < 1e-9);

    let records = records_from_frame(&out, &["MO_10a", "D_39a", "D_39aa"]).unwrap();
    assert_eq!(records.len(), 6);
    assert!(records.iter().all(|record| record.period == Period::Year(2020)));
}

#[test]
fn test_livability_pipeline_missing_reference_file() {
    let temp_dir = TempDir::new().unwrap();
    let mut inputs = livability_inputs(temp_dir.path());
    inputs.corrections = temp_dir.path().join("missing.csv");

    let pipeline = LivabilityPipeline::new(LivabilityConfig::default());
    assert!(matches!(
        pipeline.run(&inputs),
        Err(EtlError::NotFound { .. })
    ));
}

#[test]
fn test_livability_pipeline_no_members() {
    let temp_dir = TempDir::new().unwrap();
    let mut inputs = livability_inputs(temp_dir.path());
    inputs.neighbourhoods = write(
        temp_dir.path(),
        "elders.csv",
        "BU_CODE,COROP_NAAM\nBU00000001,Twente\n",
    );

    let pipeline = LivabilityPipeline::new(LivabilityConfig::default());
    assert!(matches!(
        pipeline.run(&inputs),
        Err(EtlError::EmptyResult { .. })
    ));
}

#[test]
fn test_survey_export_reshape() {
    let temp_dir = TempDir::new().unwrap();
    let path = write(
        temp_dir.path(),
        "woononderzoek.csv",
        "Provincies;junk|2021|Eigenaar-bewoner|Erg tevreden;junk|2021|Corporatiehuur|Ontevreden\n\
         Limburg: Zuid-Limburg;31;-\n\
         Nederland;28;7\n",
    );

    let wide = source::read_table(&path, &ReadOptions::lookup().with_separator(b';')).unwrap();
    let long = CompositeReshape::from_config(&EtlConfig::default().survey)
        .reshape(&wide)
        .unwrap();

    assert_eq!(long.height(), 3);
    assert_eq!(
        string_values(&long, "geoitem").unwrap(),
        vec![
            Some("cr39".to_string()),
            Some("nl00".to_string()),
            Some("nl00".to_string())
        ]
    );
    assert_eq!(
        string_values(&long, "geolevel").unwrap(),
        vec![
            Some("corop_id".to_string()),
            Some("nederland".to_string()),
            Some("nederland".to_string())
        ]
    );
    assert_eq!(
        numeric_values(&long, "MO_11b", NumericPolicy::Missing).unwrap(),
        vec![Some(31.0), Some(28.0), Some(7.0)]
    );

    let records = records_from_frame(&long, &["MO_11b"]).unwrap();
    assert!(records
        .iter()
        .all(|record| (record.geolevel == "nederland") == (record.geoitem.as_deref() == Some("nl00"))));
}

#[test]
fn test_statistics_table_from_directory_source() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "70072ned.csv",
        "RegioS,Perioden,Bevolking\n\
         Nederland,2022,17590672\n\
         Noord-Limburg (CR),2022,289000\n\
         Zuid-Limburg (CR),2022,597000\n\
         Groot-Amsterdam (CR),2022,1460000\n\
         Limburg (PV),2022,1117000\n",
    );

    let source = CsvDirectorySource::new(temp_dir.path());
    let normalizer = CodeNormalizer::from_config(&EtlConfig::default().regions);
    let options = RegionOptions::for_level(GeoLevel::RegionalGrouping)
        .with_sub_population()
        .with_codes();
    let out = normalizer
        .prepare_regional_table(&source, "70072ned", "RegioS", &options)
        .unwrap();

    assert_eq!(
        string_values(&out, "RegioS").unwrap(),
        vec![
            Some("cr37".to_string()),
            Some("cr39".to_string()),
            Some("nl00".to_string())
        ]
    );
}

#[test]
fn test_grid_file_reshape() {
    let temp_dir = TempDir::new().unwrap();
    let path = write(
        temp_dir.path(),
        "woningtekort.csv",
        ",Koop,,Huur,\n,2019,2021,2019,2021\nVenlo,1,2,.,3\n",
    );

    let grid = source::read_grid(&path).unwrap();
    let layout = HeaderLayout::new(FillDirection::Forward, LeadingBlank::Reject);
    let long = reshape_multi_header(&grid, &layout).unwrap();

    assert_eq!(long.height(), 4);
    assert_eq!(
        numeric_values(&long, "value", NumericPolicy::Missing).unwrap(),
        vec![Some(1.0), Some(0.0), Some(2.0), Some(3.0)]
    );
}
