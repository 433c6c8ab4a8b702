//! Data models for medal tallies.
//!
//! This module contains the core data structures shared by ingestion,
//! aggregation and report generation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Canonical medal type. Every input encoding is mapped to this at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedalType {
    Gold,
    Silver,
    Bronze,
}

impl MedalType {
    /// All medal types in podium order.
    pub const ALL: [MedalType; 3] = [MedalType::Gold, MedalType::Silver, MedalType::Bronze];

    /// Returns an emoji representation of the medal.
    pub fn emoji(&self) -> &'static str {
        match self {
            MedalType::Gold => "🥇",
            MedalType::Silver => "🥈",
            MedalType::Bronze => "🥉",
        }
    }

    /// Numeric medal code used by the source dataset (1 = gold).
    pub fn code(&self) -> u8 {
        match self {
            MedalType::Gold => 1,
            MedalType::Silver => 2,
            MedalType::Bronze => 3,
        }
    }

    /// Maps a numeric medal code to a medal type.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(MedalType::Gold),
            2 => Some(MedalType::Silver),
            3 => Some(MedalType::Bronze),
            _ => None,
        }
    }
}

impl fmt::Display for MedalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MedalType::Gold => write!(f, "Gold"),
            MedalType::Silver => write!(f, "Silver"),
            MedalType::Bronze => write!(f, "Bronze"),
        }
    }
}

impl FromStr for MedalType {
    type Err = String;

    /// Accepts `1`/`2`/`3` (also `1.0`), `gold`/`silver`/`bronze` in any case,
    /// and the long `Gold Medal` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Ok(value) = trimmed.parse::<f64>() {
            if value.fract() == 0.0 && (1.0..=3.0).contains(&value) {
                if let Some(medal) = MedalType::from_code(value as u8) {
                    return Ok(medal);
                }
            }
            return Err(format!("unknown medal code: {}", trimmed));
        }

        let lowered = trimmed.to_lowercase();
        let name = lowered.strip_suffix(" medal").unwrap_or(&lowered);
        match name {
            "gold" | "g" => Ok(MedalType::Gold),
            "silver" | "s" => Ok(MedalType::Silver),
            "bronze" | "b" => Ok(MedalType::Bronze),
            _ => Err(format!("unknown medal type: {}", trimmed)),
        }
    }
}

/// A single awarded medal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalRecord {
    /// Day of the medal ceremony.
    pub date: NaiveDate,
    pub medal: MedalType,
    /// Short country code, e.g. `USA`.
    pub country_code: String,
    /// Country display name, when the dataset provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub discipline: String,
    pub event: String,
    /// Athlete or team name, when the dataset provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub athlete: Option<String>,
}

/// Gold/silver/bronze counts for one country.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalCounts {
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
}

impl MedalCounts {
    pub fn add(&mut self, medal: MedalType) {
        match medal {
            MedalType::Gold => self.gold += 1,
            MedalType::Silver => self.silver += 1,
            MedalType::Bronze => self.bronze += 1,
        }
    }

    pub fn get(&self, medal: MedalType) -> u32 {
        match medal {
            MedalType::Gold => self.gold,
            MedalType::Silver => self.silver,
            MedalType::Bronze => self.bronze,
        }
    }

    pub fn total(&self) -> u32 {
        self.gold + self.silver + self.bronze
    }

    /// Sum of the medal types enabled in `filter`.
    pub fn weighted(&self, filter: &MedalFilter) -> u32 {
        MedalType::ALL
            .iter()
            .filter(|medal| filter.is_enabled(**medal))
            .map(|medal| self.get(*medal))
            .sum()
    }
}

/// Which medal types are switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalFilter {
    #[serde(default = "enabled")]
    pub gold: bool,
    #[serde(default = "enabled")]
    pub silver: bool,
    #[serde(default = "enabled")]
    pub bronze: bool,
}

fn enabled() -> bool {
    true
}

impl Default for MedalFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl MedalFilter {
    pub fn all() -> Self {
        Self {
            gold: true,
            silver: true,
            bronze: true,
        }
    }

    pub fn none() -> Self {
        Self {
            gold: false,
            silver: false,
            bronze: false,
        }
    }

    /// Enables only the listed medal types.
    pub fn only(medals: &[MedalType]) -> Self {
        let mut filter = Self::none();
        for medal in medals {
            filter.set(*medal, true);
        }
        filter
    }

    pub fn is_enabled(&self, medal: MedalType) -> bool {
        match medal {
            MedalType::Gold => self.gold,
            MedalType::Silver => self.silver,
            MedalType::Bronze => self.bronze,
        }
    }

    pub fn set(&mut self, medal: MedalType, on: bool) {
        match medal {
            MedalType::Gold => self.gold = on,
            MedalType::Silver => self.silver = on,
            MedalType::Bronze => self.bronze = on,
        }
    }

    pub fn enabled_types(&self) -> Vec<MedalType> {
        MedalType::ALL
            .into_iter()
            .filter(|medal| self.is_enabled(*medal))
            .collect()
    }
}

/// Cumulative counts per country as of the end of `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyRow {
    pub date: NaiveDate,
    pub per_country: BTreeMap<String, MedalCounts>,
}

impl TallyRow {
    /// Counts for a country; untracked countries read as zero.
    pub fn counts(&self, country_code: &str) -> MedalCounts {
        self.per_country
            .get(country_code)
            .copied()
            .unwrap_or_default()
    }
}

/// One point of a timeline line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub total: u32,
}

/// Timeline data for one selected country.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountrySeries {
    pub country_code: String,
    pub country_name: String,
    pub color: String,
    pub points: Vec<SeriesPoint>,
}

impl CountrySeries {
    /// Total on the last day of the series.
    pub fn final_total(&self) -> u32 {
        self.points.last().map(|p| p.total).unwrap_or(0)
    }
}

/// Filtered medal count for one country (choropleth input).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryCount {
    pub country_code: String,
    pub country_name: String,
    pub count: usize,
}

/// An event highlighted in the bubble display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightedEvent {
    pub discipline: String,
    pub event: String,
    pub dates: Vec<NaiveDate>,
}

/// Country/color pair as shown in the selection legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedCountry {
    pub code: String,
    pub color: String,
}

/// Metadata about the generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the medals dataset.
    pub dataset: String,
    pub generated_at: DateTime<Utc>,
    pub records_loaded: usize,
    pub rows_skipped: usize,
    /// First and last tally day, if any records were loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

/// Snapshot of the selection the report was computed for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub countries: Vec<SelectedCountry>,
    pub dates: Vec<NaiveDate>,
    pub medals: MedalFilter,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub selection: SelectionSummary,
    /// Cumulative lines for the selected countries.
    pub timeline: Vec<CountrySeries>,
    /// Largest final value among the timeline lines.
    pub medal_extent: u32,
    /// Filtered counts per selected country.
    pub country_counts: Vec<CountryCount>,
    /// Number of records that matched the selection.
    pub filtered_total: usize,
    pub highlighted_events: Vec<HighlightedEvent>,
    /// Notices produced while applying the selection.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
}
