//! Neighbourhood code corrections
//!
//! Codes are renumbered between releases; a correction file maps retired
//! codes to their successors. Matching is case-insensitive and the
//! identifier column always comes out uppercased.

use crate::constants::corrections::{CORRECTED_COLUMN, ORIGINAL_COLUMN};
use crate::error::Result;
use crate::source::{self, ReadOptions};
use crate::table;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Uppercased original code -> uppercased corrected code
#[derive(Debug, Clone, Default)]
pub struct CorrectionMap {
    entries: HashMap<String, String>,
}

impl CorrectionMap {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let entries = pairs
            .into_iter()
            .map(|(from, to)| (from.as_ref().to_uppercase(), to.as_ref().to_uppercase()))
            .collect();
        Self { entries }
    }

    /// Load from a file with the default `BUURT_CODE` / `BUURT_CODE_CORRECTIE` columns
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_columns(path, ORIGINAL_COLUMN, CORRECTED_COLUMN)
    }

    pub fn from_file_with_columns(
        path: &Path,
        original_column: &str,
        corrected_column: &str,
    ) -> Result<Self> {
        let df = source::read_table(path, &ReadOptions::lookup())?;
        let map = Self::from_frame(&df, original_column, corrected_column)?;
        info!(
            "Loaded {} code corrections from {}",
            map.len(),
            path.display()
        );
        Ok(map)
    }

    pub fn from_frame(df: &DataFrame, original_column: &str, corrected_column: &str) -> Result<Self> {
        const TABLE: &str = "correction table";
        table::require_columns(df, &[original_column, corrected_column], TABLE)?;

        let originals = table::string_values(df, original_column)?;
        let corrected = table::string_values(df, corrected_column)?;

        // Incomplete correction rows carry no mapping
        let pairs = originals
            .into_iter()
            .zip(corrected)
            .filter_map(|(from, to)| Some((from?, to?)));
        Ok(Self::from_pairs(pairs))
    }

    /// Uppercased code, replaced by its correction when one exists
    pub fn correct(&self, code: &str) -> String {
        let upper = code.to_uppercase();
        match self.entries.get(&upper) {
            Some(corrected) => corrected.clone(),
            None => upper,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Apply `map` to `column`, uppercasing every value
pub fn apply_corrections(df: &DataFrame, column: &str, map: &CorrectionMap) -> Result<DataFrame> {
    table::require_column(df, column, "input table")?;

    let mut corrected_count = 0usize;
    let values: Vec<Option<String>> = table::string_values(df, column)?
        .into_iter()
        .map(|value| {
            value.map(|code| {
                let corrected = map.correct(&code);
                if corrected != code.to_uppercase() {
                    corrected_count += 1;
                }
                corrected
            })
        })
        .collect();

    debug!(
        "Corrected {} of {} codes in column '{}'",
        corrected_count,
        values.len(),
        column
    );

    table::with_string_column(df, column, values)
}
