//! Sub-population membership filtering
//!
//! Keeps only the rows whose identifier appears in a reference list, e.g.
//! the neighbourhoods of one province. An empty result means the input or
//! the reference list is wrong, so it is an error rather than a valid
//! outcome.

use crate::constants::neighbourhoods::CODE_COLUMN;
use crate::error::{EtlError, Result};
use crate::source::{self, ReadOptions};
use crate::table;
use polars::prelude::DataFrame;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct MembershipSet {
    members: HashSet<String>,
}

impl MembershipSet {
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Load the reference list from the `BU_CODE` column of a file
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_column(path, CODE_COLUMN)
    }

    pub fn from_file_with_column(path: &Path, column: &str) -> Result<Self> {
        let df = source::read_table(path, &ReadOptions::lookup())?;
        let set = Self::from_frame(&df, column)?;
        info!(
            "Loaded {} reference identifiers from {}",
            set.len(),
            path.display()
        );
        Ok(set)
    }

    pub fn from_frame(df: &DataFrame, column: &str) -> Result<Self> {
        table::require_column(df, column, "reference table")?;
        Ok(Self::new(table::string_values(df, column)?.into_iter().flatten()))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.members.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Keep the rows of `df` whose `column` value is a member of `set`
pub fn filter_members(df: &DataFrame, column: &str, set: &MembershipSet) -> Result<DataFrame> {
    table::require_column(df, column, "input table")?;

    let keep: Vec<bool> = table::string_values(df, column)?
        .iter()
        .map(|value| value.as_deref().is_some_and(|id| set.contains(id)))
        .collect();
    let filtered = table::filter_rows(df, &keep)?;

    if filtered.height() == 0 {
        return Err(EtlError::empty_result(format!(
            "no rows of column '{}' belong to the reference set ({} members)",
            column,
            set.len()
        )));
    }

    info!(
        "Membership filter on '{}': {} -> {} rows",
        column,
        df.height(),
        filtered.height()
    );
    Ok(filtered)
}
