//! Tabular sources: reference files and statistics tables.
//!
//! Everything is read fully into memory with a single blocking call; a
//! missing file surfaces as `NotFound` and is never retried. Delimited text
//! goes through the polars CSV reader, workbooks through `calamine` (first
//! sheet only).

use crate::constants::{TEXT_EXTENSIONS, WORKBOOK_DATE_FORMAT, WORKBOOK_EXTENSIONS};
use crate::error::{EtlError, Result};
use calamine::{Data, Range, Reader, open_workbook_auto};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a tabular file should be read
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub has_header: bool,
    /// Field separator; ignored for workbooks
    pub separator: u8,
    /// Infer numeric column types; otherwise every cell is kept as a string
    pub infer_types: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            separator: b',',
            infer_types: true,
        }
    }
}

impl ReadOptions {
    /// Lookup tables are compared as text, so `0101` must stay `0101`
    pub fn lookup() -> Self {
        Self {
            infer_types: false,
            ..Self::default()
        }
    }

    /// Header-less spreadsheet grid with string cells
    pub fn grid() -> Self {
        Self {
            has_header: false,
            infer_types: false,
            ..Self::default()
        }
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }
}

/// Read a delimited file or the first sheet of a workbook into a frame
pub fn read_table(path: &Path, options: &ReadOptions) -> Result<DataFrame> {
    if !path.exists() {
        return Err(EtlError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let df = if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        read_delimited(path, options)?
    } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        read_workbook(path, options)?
    } else {
        return Err(EtlError::format_mismatch(format!(
            "unsupported file type '{}' for {}",
            extension,
            path.display()
        )));
    };

    debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );

    Ok(df)
}

fn read_delimited(path: &Path, options: &ReadOptions) -> Result<DataFrame> {
    let infer_length = if options.infer_types { Some(100) } else { Some(0) };
    let separator = options.separator;

    Ok(CsvReadOptions::default()
        .with_has_header(options.has_header)
        .with_infer_schema_length(infer_length)
        .map_parse_options(|parse| parse.with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?)
}

fn read_workbook(path: &Path, options: &ReadOptions) -> Result<DataFrame> {
    // calamine detects xls, xlsx, xlsb and ods from the file itself
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names();
    let Some(sheet) = sheet_names.first() else {
        return Err(EtlError::format_mismatch(format!(
            "workbook {} has no sheets",
            path.display()
        )));
    };
    debug!(
        "Reading sheet '{}' (first of {}) from {}",
        sheet,
        sheet_names.len(),
        path.display()
    );

    let range = workbook.worksheet_range(sheet)?;
    frame_from_range(&range, options)
}

/// Build a frame from a sheet range.
///
/// Cells keep their absolute sheet position, so leading blank rows and
/// columns stay in a header-less grid the way they are in the sheet.
pub fn frame_from_range(range: &Range<Data>, options: &ReadOptions) -> Result<DataFrame> {
    let Some((last_row, last_col)) = range.end() else {
        return Ok(DataFrame::empty());
    };
    let height = last_row as usize + 1;
    let width = last_col as usize + 1;
    let cell = |row: usize, col: usize| range.get_value((row as u32, col as u32));

    let body_start = usize::from(options.has_header);
    let mut columns = Vec::with_capacity(width);
    for col in 0..width {
        let name = if options.has_header {
            cell(0, col)
                .and_then(cell_text)
                .unwrap_or_else(|| default_column_name(col))
        } else {
            default_column_name(col)
        };

        let body: Vec<Option<&Data>> = (body_start..height).map(|row| cell(row, col)).collect();
        let numeric = options.infer_types
            && body.iter().flatten().any(|data| !matches!(data, Data::Empty))
            && body
                .iter()
                .flatten()
                .all(|data| matches!(data, Data::Empty | Data::Int(_) | Data::Float(_)));

        let column: Column = if numeric {
            let values: Vec<Option<f64>> = body
                .iter()
                .map(|data| match data {
                    Some(Data::Int(value)) => Some(*value as f64),
                    Some(Data::Float(value)) => Some(*value),
                    _ => None,
                })
                .collect();
            Series::new(name.as_str().into(), values).into()
        } else {
            let values: Vec<Option<String>> =
                body.iter().map(|data| data.and_then(cell_text)).collect();
            Series::new(name.as_str().into(), values).into()
        };
        columns.push(column);
    }

    Ok(DataFrame::new(columns)?)
}

/// Same naming the CSV reader uses for header-less input
fn default_column_name(index: usize) -> String {
    format!("column_{}", index + 1)
}

/// Text of a workbook cell; blanks and error cells are `None`
fn cell_text(data: &Data) -> Option<String> {
    let text = match data {
        Data::Empty | Data::Error(_) => return None,
        Data::String(text) => text.clone(),
        Data::Int(value) => value.to_string(),
        // Whole numbers are stored as floats; `2021.0` must read as `2021`
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::Float(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) => match value.as_datetime() {
            Some(datetime) => datetime.format(WORKBOOK_DATE_FORMAT).to_string(),
            None => value.as_f64().to_string(),
        },
        Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
    };
    (!text.is_empty()).then_some(text)
}

/// Read a header-less grid where every cell is a string
pub fn read_grid(path: &Path) -> Result<DataFrame> {
    read_table(path, &ReadOptions::grid())
}

/// External collaborator that yields a raw statistics table by identifier
pub trait TableSource {
    fn fetch(&self, table_id: &str) -> Result<DataFrame>;
}

/// Serves tables exported as `<dir>/<table_id>.csv`
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    root: PathBuf,
    options: ReadOptions,
}

impl CsvDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: ReadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }
}

impl TableSource for CsvDirectorySource {
    fn fetch(&self, table_id: &str) -> Result<DataFrame> {
        let path = self.root.join(format!("{}.csv", table_id));
        let df = read_table(&path, &self.options)?;
        debug!("Fetched table '{}' ({} rows)", table_id, df.height());
        Ok(df)
    }
}
