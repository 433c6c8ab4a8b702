//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.medaltally.toml` files.

use crate::analysis::{ColorPool, DEFAULT_COUNTRIES, DEFAULT_PALETTE};
use crate::cli::OutputFormat;
use crate::models::MedalFilter;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".medaltally.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input files.
    #[serde(default)]
    pub data: DataConfig,

    /// Initial selection.
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Default report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "medal_report.md".to_string()
}

/// Static dataset locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Medals table, CSV or JSON.
    #[serde(default = "default_medals")]
    pub medals: String,

    /// Country code to name map.
    #[serde(default = "default_country_codes")]
    pub country_codes: Option<String>,

    /// Event hierarchy for the bubble display. Derived from the medals when unset.
    #[serde(default)]
    pub hierarchy: Option<String>,

    /// First tally day. Defaults to the day before the first medal.
    #[serde(default)]
    pub first_day: Option<NaiveDate>,

    /// Last tally day. Defaults to the last medal day.
    #[serde(default)]
    pub last_day: Option<NaiveDate>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            medals: default_medals(),
            country_codes: default_country_codes(),
            hierarchy: None,
            first_day: None,
            last_day: None,
        }
    }
}

fn default_medals() -> String {
    "data/medals.csv".to_string()
}

fn default_country_codes() -> Option<String> {
    Some("data/countryCodes.json".to_string())
}

/// Selection applied before any user input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Country codes selected on start, in legend order.
    #[serde(default = "default_countries")]
    pub countries: Vec<String>,

    /// Colors handed out to selected countries.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,

    /// Select every medal day.
    #[serde(default)]
    pub all_dates: bool,

    /// Explicit dates to select.
    #[serde(default)]
    pub dates: Vec<NaiveDate>,

    /// Enabled medal types.
    #[serde(default)]
    pub medals: MedalFilter,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            countries: default_countries(),
            palette: default_palette(),
            all_dates: false,
            dates: Vec::new(),
            medals: MedalFilter::all(),
        }
    }
}

fn default_countries() -> Vec<String> {
    DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect()
}

fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
}

impl SelectionConfig {
    pub fn color_pool(&self) -> ColorPool {
        if self.palette.is_empty() {
            ColorPool::default()
        } else {
            ColorPool::new(self.palette.clone())
        }
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the cumulative timeline table.
    #[serde(default = "default_true")]
    pub include_timeline: bool,

    /// Include events highlighted by the selected dates.
    #[serde(default = "default_true")]
    pub include_events: bool,

    /// Include days without medals in the timeline table.
    #[serde(default)]
    pub include_idle_days: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_timeline: true,
            include_events: true,
            include_idle_days: false,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // Data files
        if let Some(ref medals) = args.data {
            self.data.medals = medals.display().to_string();
        }
        if let Some(ref codes) = args.country_codes {
            self.data.country_codes = Some(codes.display().to_string());
        }
        if let Some(ref hierarchy) = args.hierarchy {
            self.data.hierarchy = Some(hierarchy.display().to_string());
        }

        // Selection
        if let Some(ref countries) = args.countries {
            self.selection.countries = countries.clone();
        }
        if let Some(ref dates) = args.dates {
            self.selection.dates = dates.clone();
            self.selection.all_dates = false;
        }
        if args.all_dates {
            self.selection.all_dates = true;
        }
        if let Some(ref medals) = args.medals {
            self.selection.medals = MedalFilter::only(medals);
        }

        // Output
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level after merging: `--quiet` wins, then verbose from either source.
    pub fn log_level(&self, args: &crate::cli::Args) -> tracing::Level {
        if args.quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            args.log_level()
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use crate::models::MedalType;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.medals, "data/medals.csv");
        assert_eq!(config.selection.countries, vec!["USA", "CHN", "JPN", "AUS", "FRA"]);
        assert_eq!(config.selection.palette.len(), 6);
        assert!(config.report.include_timeline);
        assert_eq!(config.general.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "paris.json"
format = "json"

[data]
medals = "paris/medals.csv"
first_day = "2024-07-26"
last_day = "2024-08-11"

[selection]
countries = ["GBR", "NED"]
all_dates = true

[selection.medals]
bronze = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "paris.json");
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.data.medals, "paris/medals.csv");
        assert_eq!(config.data.first_day, NaiveDate::from_ymd_opt(2024, 7, 26));
        assert_eq!(config.data.country_codes.as_deref(), Some("data/countryCodes.json"));
        assert_eq!(config.selection.countries, vec!["GBR", "NED"]);
        assert!(config.selection.all_dates);
        assert!(config.selection.medals.gold);
        assert!(!config.selection.medals.bronze);
        assert_eq!(config.selection.palette.len(), 6);
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let mut args = make_args();
        args.countries = Some(vec!["KOR".to_string()]);
        args.medals = Some(vec![MedalType::Gold]);
        args.format = Some(OutputFormat::Json);

        config.merge_with_args(&args);

        assert_eq!(config.selection.countries, vec!["KOR"]);
        assert_eq!(config.selection.medals, MedalFilter::only(&[MedalType::Gold]));
        assert_eq!(config.general.format, OutputFormat::Json);
        // Untouched by the CLI.
        assert_eq!(config.data.medals, "data/medals.csv");
        assert_eq!(config.general.output, "medal_report.md");
    }

    #[test]
    fn test_verbose_from_config_file() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        let mut args = make_args();
        config.merge_with_args(&args);
        assert_eq!(config.log_level(&args), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(config.log_level(&args), tracing::Level::ERROR);

        let defaults = Config::default();
        assert_eq!(defaults.log_level(&make_args()), tracing::Level::INFO);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE), "[data]\nmedals = \"x.json\"\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.data.medals, "x.json");

        std::fs::write(dir.path().join(CONFIG_FILE), "[data\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[selection]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.selection.countries, Config::default().selection.countries);
    }
}
