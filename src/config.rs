//! Configuration management and validation.
//!
//! All lookup tables (region name -> code, sub-populations, value domains,
//! indicator renames) live here as data and are handed to the components
//! at construction time. The defaults describe the Limburg regional
//! monitor; a JSON file can replace any part of them.

use crate::constants::{self, columns};
use crate::error::{EtlError, Result};
use crate::stages::aggregate::AggregateFn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

/// The single entity above every regional level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopLevelEntity {
    /// Label as it appears in source tables
    pub name: String,
    /// Canonical geoitem code
    pub code: String,
}

impl Default for TopLevelEntity {
    fn default() -> Self {
        Self {
            name: "Nederland".to_string(),
            code: "nl00".to_string(),
        }
    }
}

/// Region name tables, keyed by lowercase geolevel suffix token (e.g. `cr`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub region_codes: BTreeMap<String, BTreeMap<String, String>>,
    pub sub_populations: BTreeMap<String, Vec<String>>,
    pub top_level: TopLevelEntity,
}

impl Default for RegionConfig {
    fn default() -> Self {
        let corop_codes = limburg_corop_codes();
        let corop_names = corop_codes.keys().cloned().collect();

        let mut region_codes = BTreeMap::new();
        region_codes.insert("cr".to_string(), corop_codes);

        let mut sub_populations = BTreeMap::new();
        sub_populations.insert("cr".to_string(), corop_names);

        Self {
            region_codes,
            sub_populations,
            top_level: TopLevelEntity::default(),
        }
    }
}

/// Neighbourhood livability scores rolled up to regional groupings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivabilityConfig {
    /// Neighbourhood code column in the scores file
    pub id_column: String,
    pub period_column: String,
    pub measures: Vec<String>,
    pub aggregate: AggregateFn,
    /// Periods kept after aggregation; empty keeps everything
    pub relevant_periods: Vec<String>,
    pub column_renames: BTreeMap<String, String>,
    /// Group label -> geoitem code, applied after renaming
    pub group_codes: BTreeMap<String, String>,
    pub geolevel: String,
    pub correction_original_column: String,
    pub correction_corrected_column: String,
    pub reference_code_column: String,
    pub reference_group_column: String,
}

impl Default for LivabilityConfig {
    fn default() -> Self {
        let column_renames = [
            (constants::neighbourhoods::GROUP_COLUMN, columns::GEOITEM),
            ("jaar", columns::PERIOD),
            ("lbm", "MO_10a"),
            ("fys", "D_39a"),
            ("vrz", "D_39aa"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        Self {
            id_column: "bu_code".to_string(),
            period_column: "jaar".to_string(),
            measures: vec!["lbm".to_string(), "fys".to_string(), "vrz".to_string()],
            aggregate: AggregateFn::Mean,
            relevant_periods: ["2014", "2016", "2018", "2020", "2022"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            column_renames,
            group_codes: limburg_corop_codes(),
            geolevel: "corop_id".to_string(),
            correction_original_column: constants::corrections::ORIGINAL_COLUMN.to_string(),
            correction_corrected_column: constants::corrections::CORRECTED_COLUMN.to_string(),
            reference_code_column: constants::neighbourhoods::CODE_COLUMN.to_string(),
            reference_group_column: constants::neighbourhoods::GROUP_COLUMN.to_string(),
        }
    }
}

/// Housing survey export with composite `|`-joined column labels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub id_column: String,
    pub delimiter: char,
    pub dimension_names: Vec<String>,
    /// Dimensions parsed from the label but not emitted
    pub discarded_dimensions: Vec<String>,
    pub value_column: String,
    pub no_data_sentinel: String,
    pub default_value: f64,
    /// Dimension -> (source value -> short code)
    pub value_domains: BTreeMap<String, BTreeMap<String, String>>,
    /// Free-text dimensions that get lowercased and underscored
    pub normalized_dimensions: Vec<String>,
    pub geoitem_codes: BTreeMap<String, String>,
    pub geolevel: String,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        let ownership = [
            ("Eigenaar-bewoner", "2"),
            ("Private huur", "12"),
            ("Corporatiehuur", "11"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        let mut value_domains = BTreeMap::new();
        value_domains.insert("dim_eigendom_1".to_string(), ownership);

        let geoitem_codes = [
            ("Limburg: Noord-Limburg", "cr37"),
            ("Limburg: Midden-Limburg", "cr38"),
            ("Limburg: Zuid-Limburg", "cr39"),
            ("Nederland", "nl00"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        Self {
            id_column: "Provincies".to_string(),
            delimiter: constants::COMPOSITE_DELIMITER,
            dimension_names: vec![
                "nvt".to_string(),
                columns::PERIOD.to_string(),
                "dim_eigendom_1".to_string(),
                "dim_tevredenheid_0".to_string(),
            ],
            discarded_dimensions: vec!["nvt".to_string()],
            value_column: "MO_11b".to_string(),
            no_data_sentinel: constants::NO_DATA_SENTINEL.to_string(),
            default_value: 0.0,
            value_domains,
            normalized_dimensions: vec!["dim_tevredenheid_0".to_string()],
            geoitem_codes,
            geolevel: "corop_id".to_string(),
        }
    }
}

/// Manual entries exported from the provincial input application
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryFormConfig {
    pub geolevel: String,
    pub geoitem: String,
    pub date_format: String,
}

impl Default for EntryFormConfig {
    fn default() -> Self {
        Self {
            geolevel: "prov_id".to_string(),
            geoitem: "pv31".to_string(),
            date_format: constants::entry_form::DATE_FORMAT.to_string(),
        }
    }
}

/// Global configuration for the regional ETL engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub regions: RegionConfig,
    pub livability: LivabilityConfig,
    pub survey: SurveyConfig,
    pub entry_form: EntryFormConfig,
}

impl EtlConfig {
    /// Load a configuration file; absent sections keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EtlError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let config: EtlConfig = serde_json::from_str(&text)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Replace the region tables
    pub fn with_regions(mut self, regions: RegionConfig) -> Self {
        self.regions = regions;
        self
    }

    /// Replace the livability settings
    pub fn with_livability(mut self, livability: LivabilityConfig) -> Self {
        self.livability = livability;
        self
    }

    /// Replace the survey layout
    pub fn with_survey(mut self, survey: SurveyConfig) -> Self {
        self.survey = survey;
        self
    }

    /// Replace the entry-form settings
    pub fn with_entry_form(mut self, entry_form: EntryFormConfig) -> Self {
        self.entry_form = entry_form;
        self
    }

    /// Check that the tables are structurally consistent
    pub fn validate(&self) -> Result<()> {
        for token in self
            .regions
            .region_codes
            .keys()
            .chain(self.regions.sub_populations.keys())
        {
            if token.trim().is_empty() || *token != token.to_lowercase() {
                return Err(EtlError::configuration(format!(
                    "geolevel token '{}' must be non-empty lowercase",
                    token
                )));
            }
        }

        let survey = &self.survey;
        if survey.dimension_names.len() != constants::COMPOSITE_PART_COUNT {
            return Err(EtlError::configuration(format!(
                "survey labels have {} dimensions, {} are configured",
                constants::COMPOSITE_PART_COUNT,
                survey.dimension_names.len()
            )));
        }
        if survey.delimiter.is_alphanumeric() || survey.delimiter.is_whitespace() {
            return Err(EtlError::configuration(format!(
                "'{}' cannot delimit composite labels",
                survey.delimiter
            )));
        }
        let unique: HashSet<&String> = survey.dimension_names.iter().collect();
        if unique.len() != survey.dimension_names.len() {
            return Err(EtlError::configuration(format!(
                "survey dimension names repeat: {:?}",
                survey.dimension_names
            )));
        }
        let declared = |name: &String| survey.dimension_names.contains(name);
        if let Some(name) = survey
            .discarded_dimensions
            .iter()
            .chain(survey.normalized_dimensions.iter())
            .chain(survey.value_domains.keys())
            .find(|name| !declared(*name))
        {
            return Err(EtlError::configuration(format!(
                "survey dimension '{}' is not one of {:?}",
                name, survey.dimension_names
            )));
        }

        if self.livability.measures.is_empty() {
            return Err(EtlError::configuration(
                "livability aggregation needs at least one measure",
            ));
        }

        Ok(())
    }
}

fn limburg_corop_codes() -> BTreeMap<String, String> {
    [
        ("Noord-Limburg", "cr37"),
        ("Midden-Limburg", "cr38"),
        ("Zuid-Limburg", "cr39"),
    ]
    .into_iter()
    .map(|(name, code)| (name.to_string(), code.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = EtlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.survey.dimension_names.len(), constants::COMPOSITE_PART_COUNT);
        assert_eq!(
            config.regions.region_codes["cr"].get("Zuid-Limburg"),
            Some(&"cr39".to_string())
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "livability": { "relevant_periods": ["2020"] } }"#,
        )
        .unwrap();

        let config = EtlConfig::from_json_file(&path).unwrap();
        assert_eq!(config.livability.relevant_periods, vec!["2020".to_string()]);
        assert_eq!(config.livability.id_column, "bu_code");
        assert_eq!(config.regions.top_level.code, "nl00");
    }

    #[test]
    fn test_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            EtlConfig::from_json_file(&path).unwrap_err(),
            EtlError::ConfigParse(_)
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            EtlConfig::from_json_file(&temp_dir.path().join("absent.json")).unwrap_err(),
            EtlError::NotFound { .. }
        ));
    }

    #[test]
    fn test_undeclared_survey_dimension() {
        let mut survey = SurveyConfig::default();
        survey.normalized_dimensions.push("dim_unknown".to_string());
        let config = EtlConfig::default().with_survey(survey);

        assert!(matches!(
            config.validate().unwrap_err(),
            EtlError::Configuration { .. }
        ));
    }

    #[test]
    fn test_survey_dimension_count() {
        let mut survey = SurveyConfig::default();
        survey.dimension_names.pop();
        survey.discarded_dimensions.clear();
        let config = EtlConfig::default().with_survey(survey);
        assert!(matches!(
            config.validate().unwrap_err(),
            EtlError::Configuration { ref message } if message.contains("dimensions")
        ));
    }

    #[test]
    fn test_survey_delimiter_and_duplicates() {
        let mut survey = SurveyConfig::default();
        survey.delimiter = ' ';
        assert!(EtlConfig::default().with_survey(survey).validate().is_err());

        let mut survey = SurveyConfig::default();
        survey.dimension_names[0] = columns::PERIOD.to_string();
        survey.discarded_dimensions.clear();
        assert!(EtlConfig::default().with_survey(survey).validate().is_err());
    }

    #[test]
    fn test_uppercase_token_rejected() {
        let mut regions = RegionConfig::default();
        regions
            .sub_populations
            .insert("CR".to_string(), vec!["Zuid-Limburg".to_string()]);
        let config = EtlConfig::default().with_regions(regions);

        assert!(config.validate().is_err());
    }
}
