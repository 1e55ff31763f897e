//! Composite-label reshape
//!
//! Survey exports name each value column by several dimensions joined with
//! a delimiter, e.g. `junk|2021|Eigenaar-bewoner|Erg tevreden`. Every
//! (row, value column) cell becomes one long record carrying the parsed
//! dimensions.

use crate::config::{SurveyConfig, TopLevelEntity};
use crate::constants::columns;
use crate::error::{EtlError, Result};
use crate::models::GeoLevel;
use crate::reshape::normalize_dimension_text;
use crate::table::{self, NumericPolicy};
use polars::prelude::DataFrame;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// A column label split into its dimension parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeLabel {
    parts: Vec<String>,
}

impl CompositeLabel {
    /// Split `label` on `delimiter`; anything but exactly `expected_parts`
    /// parts is a format error.
    pub fn parse(label: &str, delimiter: char, expected_parts: usize) -> Result<Self> {
        let parts: Vec<String> = label
            .split(delimiter)
            .map(|part| part.trim().to_string())
            .collect();
        if parts.len() != expected_parts {
            return Err(EtlError::format_mismatch(format!(
                "column label '{}' has {} parts separated by '{}', expected {}",
                label,
                parts.len(),
                delimiter,
                expected_parts
            )));
        }
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Part at `index`, `None` when blank
    pub fn part(&self, index: usize) -> Option<&str> {
        self.parts
            .get(index)
            .map(String::as_str)
            .filter(|part| !part.is_empty())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CompositeReshape {
    pub id_column: String,
    pub delimiter: char,
    pub dimension_names: Vec<String>,
    pub discarded_dimensions: Vec<String>,
    pub value_column: String,
    pub no_data_sentinel: String,
    pub default_value: f64,
    pub value_domains: BTreeMap<String, BTreeMap<String, String>>,
    pub normalized_dimensions: Vec<String>,
    pub geoitem_codes: Option<BTreeMap<String, String>>,
    /// Geolevel of every row except the top-level entity's
    pub geolevel: String,
    pub top_level: TopLevelEntity,
}

/// Long output columns under construction
struct LongColumns {
    geoitems: Vec<Option<String>>,
    dimensions: Vec<Vec<Option<String>>>,
    values: Vec<Option<f64>>,
}

impl CompositeReshape {
    pub fn from_config(config: &SurveyConfig) -> Self {
        Self {
            id_column: config.id_column.clone(),
            delimiter: config.delimiter,
            dimension_names: config.dimension_names.clone(),
            discarded_dimensions: config.discarded_dimensions.clone(),
            value_column: config.value_column.clone(),
            no_data_sentinel: config.no_data_sentinel.clone(),
            default_value: config.default_value,
            value_domains: config.value_domains.clone(),
            normalized_dimensions: config.normalized_dimensions.clone(),
            geoitem_codes: (!config.geoitem_codes.is_empty())
                .then(|| config.geoitem_codes.clone()),
            geolevel: config.geolevel.clone(),
            top_level: TopLevelEntity::default(),
        }
    }

    pub fn with_top_level(mut self, top_level: TopLevelEntity) -> Self {
        self.top_level = top_level;
        self
    }

    /// Keep identifiers as they are instead of mapping them to codes
    pub fn without_geoitem_codes(mut self) -> Self {
        self.geoitem_codes = None;
        self
    }

    /// Indices into `dimension_names` of the dimensions that are emitted
    fn emitted_dimensions(&self) -> Vec<usize> {
        let discarded: HashSet<&str> = self
            .discarded_dimensions
            .iter()
            .map(String::as_str)
            .collect();
        (0..self.dimension_names.len())
            .filter(|&index| !discarded.contains(self.dimension_names[index].as_str()))
            .collect()
    }

    /// Parse every value column label up front so a malformed label fails
    /// before any output is built
    fn value_labels(&self, df: &DataFrame) -> Result<Vec<(String, CompositeLabel)>> {
        df.get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != self.id_column)
            .map(|name| {
                let label =
                    CompositeLabel::parse(name, self.delimiter, self.dimension_names.len())?;
                Ok((name.to_string(), label))
            })
            .collect()
    }

    pub fn reshape(&self, df: &DataFrame) -> Result<DataFrame> {
        table::require_column(df, &self.id_column, "survey table")?;
        let labels = self.value_labels(df)?;
        let emitted = self.emitted_dimensions();
        let identifiers = table::string_values(df, &self.id_column)?;
        let value_policy = NumericPolicy::Default(self.default_value);

        let mut long = LongColumns {
            geoitems: Vec::new(),
            dimensions: vec![Vec::new(); emitted.len()],
            values: Vec::new(),
        };
        let mut incomplete = 0usize;
        let mut no_data = 0usize;

        for (column, label) in &labels {
            let parts: Vec<Option<&str>> = emitted.iter().map(|&index| label.part(index)).collect();
            let cells = table::string_values(df, column)?;
            if parts.iter().any(Option::is_none) {
                incomplete += cells.len();
                continue;
            }

            for (identifier, cell) in identifiers.iter().zip(&cells) {
                let Some(identifier) = identifier else {
                    incomplete += 1;
                    continue;
                };
                if cell.as_deref().map(str::trim) == Some(self.no_data_sentinel.as_str()) {
                    no_data += 1;
                    continue;
                }
                long.geoitems.push(Some(identifier.clone()));
                for (slot, part) in long.dimensions.iter_mut().zip(&parts) {
                    slot.push(part.map(str::to_string));
                }
                long.values.push(value_policy.apply(cell.as_deref()));
            }
        }

        debug!(
            "Composite reshape: {} records, {} incomplete and {} '{}' cells dropped",
            long.values.len(),
            incomplete,
            no_data,
            self.no_data_sentinel
        );

        let geoitems = self.code_geoitems(&long.geoitems);
        let geolevels = long
            .geoitems
            .iter()
            .zip(&geoitems)
            .map(|(identifier, code)| Some(self.geolevel_of(identifier, code).to_string()))
            .collect();

        let mut frame_columns = Vec::with_capacity(emitted.len() + 3);
        frame_columns.push(table::string_column(columns::GEOLEVEL, geolevels));
        frame_columns.push(table::string_column(columns::GEOITEM, geoitems));
        for (&index, values) in emitted.iter().zip(long.dimensions) {
            let name = &self.dimension_names[index];
            frame_columns.push(table::string_column(name, self.map_dimension(name, values)));
        }
        frame_columns.push(table::float_column(&self.value_column, long.values));

        let out = DataFrame::new(frame_columns)?;
        info!(
            "Reshaped {} x {} wide cells into {} records",
            df.height(),
            labels.len(),
            out.height()
        );
        Ok(out)
    }

    /// National for the top-level entity, by name or by code
    fn geolevel_of(&self, identifier: &Option<String>, code: &Option<String>) -> &str {
        let by_name = identifier.as_deref().map(str::trim) == Some(self.top_level.name.as_str());
        let by_code = code.as_deref() == Some(self.top_level.code.as_str());
        if by_name || by_code {
            GeoLevel::National.code()
        } else {
            &self.geolevel
        }
    }

    fn code_geoitems(&self, geoitems: &[Option<String>]) -> Vec<Option<String>> {
        let Some(codes) = &self.geoitem_codes else {
            return geoitems.to_vec();
        };
        let coded: Vec<Option<String>> = geoitems
            .iter()
            .map(|item| item.as_ref().and_then(|name| codes.get(name)).cloned())
            .collect();
        let unmapped = coded.iter().filter(|code| code.is_none()).count();
        if unmapped > 0 {
            warn!("{} records have an identifier without a geoitem code", unmapped);
        }
        coded
    }

    fn map_dimension(&self, name: &str, values: Vec<Option<String>>) -> Vec<Option<String>> {
        let mut values = values;
        if let Some(domain) = self.value_domains.get(name) {
            values = values
                .iter()
                .map(|value| value.as_ref().and_then(|v| domain.get(v)).cloned())
                .collect();
            let unmapped = values.iter().filter(|value| value.is_none()).count();
            if unmapped > 0 {
                warn!("{} values of '{}' are outside its value domain", unmapped, name);
            }
        }
        if self.normalized_dimensions.iter().any(|dim| dim == name) {
            values = values
                .into_iter()
                .map(|value| value.map(|text| normalize_dimension_text(&text)))
                .collect();
        }
        values
    }
}
