//! Wide-to-long reshaping of human-authored tables
//!
//! - [`composite`] - value columns named by `|`-joined composite labels
//! - [`multi_header`] - category and period header rows above a data block
//! - [`year_table`] - categories down the side, years across the top
//! - [`entry_form`] - manual indicator entries pivoted per period
//!
//! Every variant is a pure function of its input frame and layout.

pub mod composite;
pub mod entry_form;
pub mod multi_header;
pub mod year_table;

#[cfg(test)]
pub mod tests;

pub use composite::{CompositeLabel, CompositeReshape};
pub use entry_form::EntryFormPivot;
pub use multi_header::{FillDirection, HeaderLayout, LeadingBlank, reshape_multi_header};
pub use year_table::YearTableReshape;

/// Normalize a free-text dimension value: lowercase, spaces to `_`, no commas
pub fn normalize_dimension_text(value: &str) -> String {
    value.to_lowercase().replace(' ', "_").replace(',', "")
}
