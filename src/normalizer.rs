//! Region label normalization and code resolution.
//!
//! Statistics-office tables label regions as free text such as
//! `"Noord-Limburg (CR)"`. This module canonicalizes those labels,
//! restricts them to a geolevel or sub-population, and replaces names by
//! their codes using tables injected at construction.

use crate::config::{RegionConfig, TopLevelEntity};
use crate::error::{EtlError, Result};
use crate::models::GeoLevel;
use crate::source::TableSource;
use crate::table;
use polars::prelude::DataFrame;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;
use tracing::{debug, info};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Lowercase, turn hyphens into spaces, collapse and trim whitespace
pub fn clean_label(raw: &str) -> String {
    let lowered = raw.to_lowercase().replace('-', " ");
    WHITESPACE.replace_all(lowered.trim(), " ").into_owned()
}

/// Matcher for a trailing `(token)` geolevel suffix, any casing
#[derive(Debug, Clone)]
pub struct SuffixPattern {
    token: String,
    regex: Regex,
}

impl SuffixPattern {
    pub fn new(token: &str) -> Result<Self> {
        let token = clean_label(token);
        if token.is_empty() {
            return Err(EtlError::configuration("geolevel token must not be empty"));
        }
        let pattern = format!(r"(?i)\(\s*{}\s*\)\s*$", regex::escape(&token));
        let regex = Regex::new(&pattern).map_err(|e| {
            EtlError::configuration(format!("invalid geolevel token '{}': {}", token, e))
        })?;
        Ok(Self { token, regex })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn matches(&self, label: &str) -> bool {
        self.regex.is_match(label)
    }

    /// Remove every trailing occurrence of the suffix
    pub fn strip(&self, label: &str) -> String {
        let mut current = label.trim().to_string();
        while self.regex.is_match(&current) {
            current = self.regex.replace(&current, "").trim().to_string();
        }
        current
    }
}

/// Canonical form of a single region label
pub fn normalize_label(raw: &str, geolevel: Option<&str>) -> Result<String> {
    let cleaned = clean_label(raw);
    match geolevel {
        Some(token) => Ok(SuffixPattern::new(token)?.strip(&cleaned)),
        None => Ok(cleaned),
    }
}

/// Options for [`CodeNormalizer::normalize_region_column`]
#[derive(Debug, Clone)]
pub struct RegionOptions {
    /// Suffix token of the geolevel to keep, e.g. `cr`
    pub geolevel: Option<String>,
    pub restrict_to_sub_population: bool,
    pub convert_to_codes: bool,
    /// Keep top-level rows regardless of the geolevel filter
    pub keep_top_level: bool,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            geolevel: None,
            restrict_to_sub_population: false,
            convert_to_codes: false,
            keep_top_level: true,
        }
    }
}

impl RegionOptions {
    pub fn for_geolevel(token: impl Into<String>) -> Self {
        Self {
            geolevel: Some(token.into()),
            ..Self::default()
        }
    }

    /// Filter on the suffix token of `level`; the national level has none
    pub fn for_level(level: GeoLevel) -> Self {
        Self {
            geolevel: level.suffix_token().map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_sub_population(mut self) -> Self {
        self.restrict_to_sub_population = true;
        self
    }

    pub fn with_codes(mut self) -> Self {
        self.convert_to_codes = true;
        self
    }

    pub fn without_top_level(mut self) -> Self {
        self.keep_top_level = false;
        self
    }
}

/// Resolves region labels to canonical codes
#[derive(Debug, Clone)]
pub struct CodeNormalizer {
    /// token -> cleaned name -> code
    region_codes: HashMap<String, HashMap<String, String>>,
    /// token -> cleaned member names
    sub_populations: HashMap<String, HashSet<String>>,
    top_level: TopLevelEntity,
}

impl CodeNormalizer {
    pub fn new(
        region_codes: &BTreeMap<String, BTreeMap<String, String>>,
        sub_populations: &BTreeMap<String, Vec<String>>,
        top_level: TopLevelEntity,
    ) -> Self {
        let region_codes = region_codes
            .iter()
            .map(|(token, names)| {
                let names = names
                    .iter()
                    .map(|(name, code)| (clean_label(name), code.clone()))
                    .collect();
                (clean_label(token), names)
            })
            .collect();

        let sub_populations = sub_populations
            .iter()
            .map(|(token, names)| {
                let names = names.iter().map(|name| clean_label(name)).collect();
                (clean_label(token), names)
            })
            .collect();

        Self {
            region_codes,
            sub_populations,
            top_level,
        }
    }

    pub fn from_config(config: &RegionConfig) -> Self {
        Self::new(
            &config.region_codes,
            &config.sub_populations,
            config.top_level.clone(),
        )
    }

    /// Code for a region name at a geolevel, if the tables know it
    pub fn code_for(&self, token: &str, name: &str) -> Option<&str> {
        self.region_codes
            .get(&clean_label(token))?
            .get(&clean_label(name))
            .map(String::as_str)
    }

    /// Normalize the region column of a statistics table.
    ///
    /// Top-level rows are set aside before the geolevel filter and appended
    /// afterwards, so a suffix filter can never drop them.
    pub fn normalize_region_column(
        &self,
        df: &DataFrame,
        column: &str,
        options: &RegionOptions,
    ) -> Result<DataFrame> {
        table::require_column(df, column, "region table")?;

        let token = options.geolevel.as_deref().map(clean_label);
        let pattern = token.as_deref().map(SuffixPattern::new).transpose()?;

        let sub_population = if options.restrict_to_sub_population {
            let token = token.as_deref().ok_or_else(|| {
                EtlError::configuration("sub-population filtering requires a geolevel")
            })?;
            let members = self.sub_populations.get(token).ok_or_else(|| {
                EtlError::configuration(format!(
                    "no sub-population table defined for geolevel '{}'",
                    token
                ))
            })?;
            Some(members)
        } else {
            None
        };

        // Step 1: set top-level rows aside
        let top_name = clean_label(&self.top_level.name);
        let is_top: Vec<bool> = table::string_values(df, column)?
            .iter()
            .map(|label| {
                options.keep_top_level
                    && label.as_deref().map(clean_label).as_deref() == Some(top_name.as_str())
            })
            .collect();
        let top_rows = table::filter_rows(df, &is_top)?;
        let top_labels = if options.convert_to_codes {
            vec![Some(self.top_level.code.clone()); top_rows.height()]
        } else {
            table::string_values(&top_rows, column)?
        };
        let top_rows = table::with_string_column(&top_rows, column, top_labels)?;
        if top_rows.height() > 0 {
            debug!("Set aside {} top-level rows", top_rows.height());
        }

        let not_top: Vec<bool> = is_top.iter().map(|top| !top).collect();
        let rest = table::filter_rows(df, &not_top)?;

        // Step 2: clean labels
        let mut labels: Vec<Option<String>> = table::string_values(&rest, column)?
            .into_iter()
            .map(|label| label.map(|text| clean_label(&text)))
            .collect();
        let mut keep = vec![true; labels.len()];

        // Step 3: geolevel filter and suffix removal
        if let Some(pattern) = &pattern {
            for (row, label) in labels.iter_mut().enumerate() {
                match label {
                    Some(text) if pattern.matches(text) => *text = pattern.strip(text),
                    _ => keep[row] = false,
                }
            }
            debug!(
                "Geolevel '{}' filter kept {} of {} rows",
                pattern.token(),
                keep.iter().filter(|k| **k).count(),
                keep.len()
            );
        }

        // Step 4: sub-population filter
        if let Some(members) = sub_population {
            for (row, label) in labels.iter().enumerate() {
                let is_member = label.as_ref().is_some_and(|text| members.contains(text));
                keep[row] = keep[row] && is_member;
            }
            debug!(
                "Sub-population filter kept {} rows",
                keep.iter().filter(|k| **k).count()
            );
        }

        // Step 5: names to codes; unknown names pass through
        if options.convert_to_codes {
            match token.as_deref().and_then(|t| self.region_codes.get(t)) {
                Some(codes) => {
                    for text in labels.iter_mut().flatten() {
                        if let Some(code) = codes.get(text.as_str()) {
                            *text = code.clone();
                        }
                    }
                }
                None => debug!("No code table for geolevel {:?}, labels kept", token),
            }
        }

        let rest = table::with_string_column(&rest, column, labels)?;
        let rest = table::filter_rows(&rest, &keep)?;

        // Step 6: merge top-level rows back
        let result = if top_rows.height() > 0 {
            rest.vstack(&top_rows)?
        } else {
            rest
        };

        info!(
            "Normalized region column '{}': {} -> {} rows",
            column,
            df.height(),
            result.height()
        );
        Ok(result)
    }

    /// Fetch a table from `source` and normalize its region column
    pub fn prepare_regional_table<S: TableSource + ?Sized>(
        &self,
        source: &S,
        table_id: &str,
        column: &str,
        options: &RegionOptions,
    ) -> Result<DataFrame> {
        let df = source.fetch(table_id)?;
        info!("Table '{}' fetched ({} rows)", table_id, df.height());
        self.normalize_region_column(&df, column, options)
    }
}
