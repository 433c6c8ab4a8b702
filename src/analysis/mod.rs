//! Aggregation over medal records and the shared selection.

pub mod aggregator;
pub mod selection;

pub use aggregator::*;
pub use selection::{ColorPool, Selection, SelectionError, DEFAULT_COUNTRIES, DEFAULT_PALETTE, MAX_COUNTRIES};
