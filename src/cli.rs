//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::dataset::ingest::parse_medal_date;
use crate::models::MedalType;
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// MedalTally - Olympic medal tallies from a static dataset
///
/// Builds the cumulative medal timeline, per-country counts and highlighted
/// events for a selection of countries, days and medal types.
///
/// Examples:
///   medaltally --data data/medals.csv
///   medaltally --countries USA,CHN,GBR --all-dates --medals gold
///   medaltally --dates 2024-07-28,2024-07-29 --format json -o tally.json
///   medaltally --data data/medals.csv --check
///   medaltally --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Medals table (CSV or JSON)
    ///
    /// Defaults to data/medals.csv or the path in .medaltally.toml.
    #[arg(short, long, value_name = "FILE", env = "MEDALTALLY_DATA")]
    pub data: Option<PathBuf>,

    /// JSON map of country code to country name
    #[arg(long, value_name = "FILE")]
    pub country_codes: Option<PathBuf>,

    /// JSON event hierarchy for the bubble display
    ///
    /// When omitted the hierarchy is derived from the medals table.
    #[arg(long, value_name = "FILE")]
    pub hierarchy: Option<PathBuf>,

    /// Countries to select, in legend order (comma-separated, max 6)
    ///
    /// Example: --countries USA,CHN,JPN
    #[arg(long, value_name = "CODES", value_delimiter = ',')]
    pub countries: Option<Vec<String>>,

    /// Days to select (comma-separated, YYYY-MM-DD)
    #[arg(long, value_name = "DATES", value_delimiter = ',', value_parser = parse_date_arg)]
    pub dates: Option<Vec<NaiveDate>>,

    /// Select every medal day
    #[arg(long, conflicts_with = "dates")]
    pub all_dates: bool,

    /// Medal types to count (comma-separated: gold, silver, bronze)
    #[arg(long, value_name = "TYPES", value_delimiter = ',', value_parser = parse_medal_arg)]
    pub medals: Option<Vec<MedalType>>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .medaltally.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Load and validate the dataset, print a summary and exit
    #[arg(long)]
    pub check: bool,

    /// Generate a default .medaltally.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_medal_date(value).map_err(|e| e.to_string())
}

fn parse_medal_arg(value: &str) -> Result<MedalType, String> {
    value.parse::<MedalType>()
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref data) = self.data {
            if !data.is_file() {
                return Err(format!("Medals file does not exist: {}", data.display()));
            }
        }

        if let Some(ref countries) = self.countries {
            if countries.iter().any(|c| c.trim().is_empty()) {
                return Err("Country codes must not be empty".to_string());
            }
        }

        if let Some(ref medals) = self.medals {
            if medals.is_empty() {
                return Err("At least one medal type is required".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
