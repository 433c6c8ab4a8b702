//! MedalTally - Olympic medal aggregation.
//!
//! Loads a static table of awarded medals once and derives the data behind a
//! linked medal dashboard: the cumulative per-day tally for the timeline, and
//! selection-filtered per-country counts for the map and bubble displays.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod models;
pub mod report;

pub use analysis::{
    count_by_country, filter, tally, tally_range, ColorPool, MedalAggregator, Selection,
    SelectionError,
};
pub use dataset::{load_dataset, Dataset, DatasetPaths, LoadState};
pub use models::{MedalCounts, MedalFilter, MedalRecord, MedalType, TallyRow};
