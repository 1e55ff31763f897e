//! Shared helpers for command implementations

use crate::config::EtlConfig;
use anyhow::{Context, Result};
use colored::*;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// Initialize the tracing subscriber; `RUST_LOG` overrides the level
pub fn setup_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("regio_etl={}", log_level)));

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init();
}

/// Built-in configuration, or the file given with `--config`
pub fn load_config(path: Option<&Path>) -> Result<EtlConfig> {
    match path {
        Some(path) => EtlConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(EtlConfig::default()),
    }
}

/// Row counts and timing reported at the end of a command
#[derive(Debug, Clone)]
pub struct CommandSummary {
    pub title: &'static str,
    pub rows_in: usize,
    pub rows_out: usize,
    pub started: Instant,
}

impl CommandSummary {
    pub fn start(title: &'static str) -> Self {
        Self {
            title,
            rows_in: 0,
            rows_out: 0,
            started: Instant::now(),
        }
    }

    pub fn print(&self, output: Option<&Path>) {
        println!("\n{}", self.title.bright_green().bold());
        println!(
            "  {} {}ms",
            "Time elapsed:".bright_cyan(),
            self.started.elapsed().as_millis().to_string().bright_white()
        );
        println!(
            "  {} {}",
            "Rows read:".bright_cyan(),
            self.rows_in.to_string().bright_white()
        );
        println!(
            "  {} {}",
            "Rows written:".bright_cyan(),
            self.rows_out.to_string().bright_white().bold()
        );
        if let Some(path) = output {
            println!(
                "  {} {}",
                "Output:".bright_cyan(),
                path.display().to_string().bright_white()
            );
        }
    }
}

/// Write `df` as CSV to `output`, or print it when no path is given
pub fn emit(df: &mut DataFrame, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory {}", parent.display())
                })?;
            }
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(df)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => println!("{}", df),
    }
    Ok(())
}
