//! Static dataset ingestion.

pub mod hierarchy;
pub mod ingest;
pub mod loader;

pub use hierarchy::{build_hierarchy, focus_dates, highlighted_events, EventNode};
pub use ingest::{ingest_csv, ingest_json, IngestResult, RawMedalRow, RowError};
pub use loader::{load_dataset, load_with_progress, Dataset, DatasetPaths, LoadState};
