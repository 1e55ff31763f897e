//! Application constants for the regional ETL engine
//!
//! Column names of the external reference files, output column names of the
//! long-format schema and the markers used by source spreadsheets.

// =============================================================================
// Long-format output columns
// =============================================================================

pub mod columns {
    pub const GEOLEVEL: &str = "geolevel";
    pub const GEOITEM: &str = "geoitem";
    pub const PERIOD: &str = "period";
    pub const CATEGORY: &str = "category";
    pub const VALUE: &str = "value";
    pub const REGION: &str = "region";
}

// =============================================================================
// External reference files
// =============================================================================

/// Neighbourhood code correction file (original code, corrected code)
pub mod corrections {
    pub const ORIGINAL_COLUMN: &str = "BUURT_CODE";
    pub const CORRECTED_COLUMN: &str = "BUURT_CODE_CORRECTIE";
}

/// Neighbourhood reference file listing members and their regional grouping
pub mod neighbourhoods {
    pub const CODE_COLUMN: &str = "BU_CODE";
    pub const GROUP_COLUMN: &str = "COROP_NAAM";
}

/// Entry-form exports from the provincial input application
pub mod entry_form {
    pub const INDICATOR_COLUMN: &str = "Indicator_nr";
    pub const VALUE_COLUMN: &str = "Invoerveld";
    pub const ENTRY_DATE_COLUMN: &str = "Datum van invoer";
    pub const REFERENCE_DATE_COLUMN: &str = "Peildatum (indien afwijkend van datum van invoer)";
    /// Personal data that must never be published
    pub const STEWARD_COLUMN: &str = "Operationeel databewaker";
    pub const DATE_FORMAT: &str = "%d-%m-%Y";
}

// =============================================================================
// Cell markers
// =============================================================================

/// Marker for "no data" cells in survey exports
pub const NO_DATA_SENTINEL: &str = "-";

/// Marker the statistics office uses for "zero / not applicable"
pub const ZERO_MARKER: &str = ".";

/// Delimiter joining the dimensions of a composite column label
pub const COMPOSITE_DELIMITER: char = '|';

/// Number of parts a survey composite label splits into
pub const COMPOSITE_PART_COUNT: usize = 4;

/// Delimited text extensions read with the CSV reader
pub const TEXT_EXTENSIONS: &[&str] = &["csv", "txt"];

/// Workbook extensions read from their first sheet
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// Rendering of date cells read from workbooks, as the entry form expects
pub const WORKBOOK_DATE_FORMAT: &str = entry_form::DATE_FORMAT;
