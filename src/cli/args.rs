//! Command-line argument definitions for the regional ETL tool

use crate::reshape::{FillDirection, HeaderLayout, LeadingBlank};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the regional statistics ETL
///
/// Turns neighbourhood scores, survey exports and hand-made spreadsheets
/// into long-format tables keyed by geolevel, geoitem and period.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "regio-etl",
    version,
    about = "Normalize, reshape and aggregate regional statistics tables"
)]
pub struct Args {
    /// JSON file overriding the built-in region and layout tables
    #[arg(short = 'c', long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Roll neighbourhood livability scores up to regional groupings
    Livability(LivabilityArgs),
    /// Reshape a survey export with composite column labels
    Survey(SurveyArgs),
    /// Normalize the region column of a statistics table
    Regions(RegionsArgs),
    /// Pivot manual indicator entries per month
    EntryForm(EntryFormArgs),
    /// Reshape a grid with category and period header rows
    Grid(GridArgs),
    /// Reshape a sheet with categories down the side and years across the top
    YearTable(YearTableArgs),
}

/// Output shared by every command
#[derive(Debug, Clone, ClapArgs)]
pub struct OutputArgs {
    /// Write the result as CSV instead of printing it
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct LivabilityArgs {
    /// Neighbourhood scores file
    #[arg(long, value_name = "PATH")]
    pub scores: PathBuf,

    /// Neighbourhood code correction file
    #[arg(long, value_name = "PATH")]
    pub corrections: PathBuf,

    /// Neighbourhood reference list with regional grouping names
    #[arg(long, value_name = "PATH")]
    pub neighbourhoods: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct SurveyArgs {
    /// Survey export file
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input: PathBuf,

    /// Field separator of the export
    #[arg(long, default_value_t = ';')]
    pub separator: char,

    /// Keep identifiers instead of mapping them to geoitem codes
    #[arg(long)]
    pub keep_names: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct RegionsArgs {
    /// Statistics table file
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input: PathBuf,

    /// Column holding region labels
    #[arg(long, default_value = "RegioS")]
    pub column: String,

    /// Geolevel to keep: a suffix token such as `cr` or a level such as `corop_id`
    #[arg(long)]
    pub geolevel: Option<String>,

    /// Keep only the configured sub-population of the geolevel
    #[arg(long, requires = "geolevel")]
    pub sub_population: bool,

    /// Replace region names with their codes
    #[arg(long)]
    pub codes: bool,

    /// Drop the national total instead of keeping it
    #[arg(long)]
    pub drop_top_level: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct EntryFormArgs {
    /// Entry form export file
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FillArg {
    Forward,
    Backward,
}

impl From<FillArg> for FillDirection {
    fn from(fill: FillArg) -> Self {
        match fill {
            FillArg::Forward => FillDirection::Forward,
            FillArg::Backward => FillDirection::Backward,
        }
    }
}

#[derive(Debug, Clone, ClapArgs)]
pub struct GridArgs {
    /// Grid file without a header row
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input: PathBuf,

    /// Direction in which merged category labels propagate
    #[arg(long, value_enum)]
    pub fill: FillArg,

    /// Label for leading blank category cells; without it they are an error
    #[arg(long, value_name = "LABEL")]
    pub leading_label: Option<String>,

    #[arg(long, default_value_t = 0)]
    pub category_row: usize,

    #[arg(long, default_value_t = 1)]
    pub period_row: usize,

    #[arg(long, default_value_t = 2)]
    pub data_start_row: usize,

    #[arg(long, default_value_t = 0)]
    pub id_column: usize,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl GridArgs {
    pub fn layout(&self) -> HeaderLayout {
        let leading_blank = match &self.leading_label {
            Some(label) => LeadingBlank::Label(label.clone()),
            None => LeadingBlank::Reject,
        };
        HeaderLayout::new(self.fill.into(), leading_blank)
            .with_rows(self.category_row, self.period_row, self.data_start_row)
            .with_id_column(self.id_column)
    }
}

#[derive(Debug, Clone, ClapArgs)]
pub struct YearTableArgs {
    /// Sheet exported without a header row
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input: PathBuf,

    /// Rows to keep, header row included
    #[arg(long)]
    pub rows: usize,

    /// Columns to keep, category column included
    #[arg(long, default_value_t = 6)]
    pub cols: usize,

    #[arg(long, default_value = "Nederland")]
    pub region: String,

    /// Keep fractions as they are instead of multiplying by 100
    #[arg(long)]
    pub no_scale: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}
