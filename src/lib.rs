//! Regional statistics ETL
//!
//! Turns heterogeneous regional tables into one long format keyed by
//! geolevel, geoitem and period:
//! - Normalizing region labels and resolving them to canonical codes
//! - Correcting, filtering and grouping neighbourhood identifiers
//! - Reshaping wide, human-authored layouts into long records
//! - Aggregating neighbourhood scores to regional groupings

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod reshape;
pub mod source;
pub mod stages;
pub mod table;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::EtlConfig;
pub use error::{EtlError, Result};
pub use models::{GeoLevel, LongRecord, Period};
pub use normalizer::{CodeNormalizer, RegionOptions};
pub use pipeline::LivabilityPipeline;
pub use source::{CsvDirectorySource, TableSource};
