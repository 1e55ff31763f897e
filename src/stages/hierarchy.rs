//! Attach regional grouping labels to fine-grained rows
//!
//! A left lookup: every input row survives, rows without a mapping get a
//! null group.

use crate::constants::neighbourhoods::{CODE_COLUMN, GROUP_COLUMN};
use crate::error::Result;
use crate::source::{self, ReadOptions};
use crate::table;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Many-to-one mapping from fine identifier to group label
#[derive(Debug, Clone)]
pub struct GroupMapping {
    group_column: String,
    groups: HashMap<String, String>,
}

impl GroupMapping {
    /// Build a mapping whose labels land in `group_column`.
    ///
    /// A key listed twice with different groups is reported; the last
    /// entry wins.
    pub fn new<I, K, V>(group_column: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut groups = HashMap::new();
        for (key, group) in pairs {
            let key = key.into();
            let group = group.into();
            if let Some(previous) = groups.get(&key) {
                if *previous != group {
                    warn!(
                        "Identifier '{}' maps to both '{}' and '{}', keeping '{}'",
                        key, previous, group, group
                    );
                }
            }
            groups.insert(key, group);
        }
        Self {
            group_column: group_column.into(),
            groups,
        }
    }

    /// Load from a file with the default `BU_CODE` / `COROP_NAAM` columns
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_columns(path, CODE_COLUMN, GROUP_COLUMN)
    }

    pub fn from_file_with_columns(path: &Path, key_column: &str, group_column: &str) -> Result<Self> {
        let df = source::read_table(path, &ReadOptions::lookup())?;
        let mapping = Self::from_frame(&df, key_column, group_column)?;
        info!(
            "Loaded {} group assignments from {}",
            mapping.len(),
            path.display()
        );
        Ok(mapping)
    }

    pub fn from_frame(df: &DataFrame, key_column: &str, group_column: &str) -> Result<Self> {
        table::require_columns(df, &[key_column, group_column], "group mapping table")?;

        let keys = table::string_values(df, key_column)?;
        let groups = table::string_values(df, group_column)?;
        let pairs = keys
            .into_iter()
            .zip(groups)
            .filter_map(|(key, group)| Some((key?, group?)));
        Ok(Self::new(group_column, pairs))
    }

    pub fn group_column(&self) -> &str {
        &self.group_column
    }

    pub fn group_of(&self, identifier: &str) -> Option<&str> {
        self.groups.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Add the mapping's group column to `df`, looked up by `column`
pub fn attach_group(df: &DataFrame, column: &str, mapping: &GroupMapping) -> Result<DataFrame> {
    table::require_column(df, column, "input table")?;

    let groups: Vec<Option<String>> = table::string_values(df, column)?
        .iter()
        .map(|value| {
            value
                .as_deref()
                .and_then(|id| mapping.group_of(id))
                .map(str::to_string)
        })
        .collect();

    let unmapped = groups.iter().filter(|group| group.is_none()).count();
    if unmapped > 0 {
        debug!(
            "{} of {} rows have no '{}' for column '{}'",
            unmapped,
            groups.len(),
            mapping.group_column(),
            column
        );
    }

    table::with_string_column(df, mapping.group_column(), groups)
}
