//! Medal aggregation.
//!
//! Pure functions over medal records: the cumulative per-day tally consumed by
//! the timeline, selection filtering, and per-country counts consumed by the
//! map and bubble displays. [`MedalAggregator`] wraps them around a
//! [`LoadState`] so that queries against a dataset that has not loaded yet
//! answer empty instead of failing.

use super::selection::Selection;
use crate::dataset::{highlighted_events, Dataset, LoadState};
use crate::models::{
    CountryCount, CountrySeries, HighlightedEvent, MedalCounts, MedalFilter, MedalRecord,
    SeriesPoint, TallyRow,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Cumulative per-day tally.
///
/// The first row is a seed day one day before the first medal, with every
/// country at zero. One row follows per calendar day up to the last medal day,
/// including days without ceremonies. Returns nothing when the first medal
/// falls on the earliest representable day, since no seed day exists.
pub fn tally(records: &[MedalRecord]) -> Vec<TallyRow> {
    let Some((first, last)) = date_span(records) else {
        return Vec::new();
    };
    let Some(seed) = first.pred_opt() else {
        warn!("No seed day before {}, tally skipped", first);
        return Vec::new();
    };
    tally_range(records, seed, last)
}

/// Cumulative tally over an explicit window.
///
/// Medals awarded before `first` are already counted in the first row; medals
/// after `last` have no row and are left out.
pub fn tally_range(records: &[MedalRecord], first: NaiveDate, last: NaiveDate) -> Vec<TallyRow> {
    if records.is_empty() || first > last {
        return Vec::new();
    }

    let mut running: BTreeMap<String, MedalCounts> = records
        .iter()
        .map(|r| (r.country_code.clone(), MedalCounts::default()))
        .collect();

    let mut by_day: BTreeMap<NaiveDate, Vec<&MedalRecord>> = BTreeMap::new();
    let mut dropped = 0usize;
    for record in records {
        if record.date > last {
            dropped += 1;
            continue;
        }
        by_day.entry(record.date.max(first)).or_default().push(record);
    }
    if dropped > 0 {
        debug!("{} medals fall after {} and are not tallied", dropped, last);
    }

    let mut rows = Vec::new();
    for date in first.iter_days().take_while(|d| *d <= last) {
        if let Some(day_records) = by_day.get(&date) {
            for record in day_records {
                if let Some(counts) = running.get_mut(&record.country_code) {
                    counts.add(record.medal);
                }
            }
        }
        rows.push(TallyRow {
            date,
            per_country: running.clone(),
        });
    }

    rows
}

/// First and last medal day.
pub fn date_span(records: &[MedalRecord]) -> Option<(NaiveDate, NaiveDate)> {
    let first = records.iter().map(|r| r.date).min()?;
    let last = records.iter().map(|r| r.date).max()?;
    Some((first, last))
}

/// Distinct medal days, ascending.
pub fn medal_dates(records: &[MedalRecord]) -> Vec<NaiveDate> {
    records
        .iter()
        .map(|r| r.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Records matching the selection, in input order.
///
/// A record is kept iff its date is selected, its country is selected and its
/// medal type is enabled.
pub fn filter<'a>(records: &'a [MedalRecord], selection: &Selection) -> Vec<&'a MedalRecord> {
    if selection.dates().is_empty() || selection.countries().is_empty() {
        return Vec::new();
    }

    records
        .iter()
        .filter(|r| {
            selection.dates().contains(&r.date)
                && selection.contains_country(&r.country_code)
                && selection.medals().is_enabled(r.medal)
        })
        .collect()
}

/// Count records per country.
///
/// Every selected country appears, with 0 when nothing matched, so consumers
/// can tell "no medals" apart from "not tracked".
pub fn count_by_country(filtered: &[&MedalRecord], selection: &Selection) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = selection
        .countries()
        .iter()
        .map(|c| (c.code.clone(), 0))
        .collect();

    for record in filtered {
        *counts.entry(record.country_code.clone()).or_default() += 1;
    }

    counts
}

/// Timeline points for one country, counting only enabled medal types.
pub fn series(rows: &[TallyRow], country_code: &str, medals: &MedalFilter) -> Vec<SeriesPoint> {
    rows.iter()
        .map(|row| SeriesPoint {
            date: row.date,
            total: row.counts(country_code).weighted(medals),
        })
        .collect()
}

/// Highest final total among the selected countries (timeline y-axis domain).
pub fn medal_extent(rows: &[TallyRow], selection: &Selection) -> u32 {
    let Some(last) = rows.last() else {
        return 0;
    };

    selection
        .countries()
        .iter()
        .map(|c| last.counts(&c.code).weighted(selection.medals()))
        .max()
        .unwrap_or(0)
}

/// The tally row for `date`.
pub fn snapshot_on(rows: &[TallyRow], date: NaiveDate) -> Option<&TallyRow> {
    rows.binary_search_by_key(&date, |row| row.date)
        .ok()
        .map(|index| &rows[index])
}

/// Dataset-backed aggregator.
///
/// The tally does not depend on the selection and is computed once when the
/// dataset arrives; everything else is recomputed per selection snapshot.
#[derive(Debug, Clone, Default)]
pub struct MedalAggregator {
    state: LoadState,
    tally: Vec<TallyRow>,
    /// The first tally row is the synthetic day before the first medal.
    seeded: bool,
}

impl MedalAggregator {
    /// An aggregator whose dataset has not loaded yet.
    pub fn pending() -> Self {
        Self::default()
    }

    /// Tally over the dataset's own date span.
    pub fn new(dataset: Arc<Dataset>) -> Self {
        let tally = tally(&dataset.records);
        Self {
            state: LoadState::Loaded(dataset),
            tally,
            seeded: true,
        }
    }

    /// Tally over a fixed games window.
    pub fn with_window(dataset: Arc<Dataset>, first: NaiveDate, last: NaiveDate) -> Self {
        let tally = tally_range(&dataset.records, first, last);
        Self {
            state: LoadState::Loaded(dataset),
            tally,
            seeded: false,
        }
    }

    pub fn from_state(state: LoadState) -> Self {
        match state {
            LoadState::Pending => Self::pending(),
            LoadState::Loaded(dataset) => Self::new(dataset),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_loaded()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.state.dataset()
    }

    pub fn records(&self) -> &[MedalRecord] {
        self.dataset().map(|d| d.records.as_slice()).unwrap_or(&[])
    }

    pub fn tally(&self) -> &[TallyRow] {
        &self.tally
    }

    /// Days a user can select: every tally day except the synthetic seed.
    pub fn selectable_dates(&self) -> Vec<NaiveDate> {
        let skip = usize::from(self.seeded);
        self.tally.iter().skip(skip).map(|row| row.date).collect()
    }

    /// Every day with at least one medal, including days outside the tally window.
    pub fn medal_dates(&self) -> Vec<NaiveDate> {
        medal_dates(self.records())
    }

    pub fn filter(&self, selection: &Selection) -> Vec<&MedalRecord> {
        filter(self.records(), selection)
    }

    pub fn count_by_country(&self, selection: &Selection) -> BTreeMap<String, usize> {
        if !self.is_loaded() {
            return BTreeMap::new();
        }
        count_by_country(&self.filter(selection), selection)
    }

    /// Filtered counts with display names, in selection order.
    pub fn country_counts(&self, selection: &Selection) -> Vec<CountryCount> {
        let Some(dataset) = self.dataset() else {
            return Vec::new();
        };
        let counts = self.count_by_country(selection);

        selection
            .countries()
            .iter()
            .map(|c| CountryCount {
                country_code: c.code.clone(),
                country_name: dataset.country_name(&c.code).to_string(),
                count: counts.get(&c.code).copied().unwrap_or(0),
            })
            .collect()
    }

    /// One cumulative line per selected country.
    pub fn timeline(&self, selection: &Selection) -> Vec<CountrySeries> {
        let Some(dataset) = self.dataset() else {
            return Vec::new();
        };

        selection
            .countries()
            .iter()
            .map(|c| CountrySeries {
                country_code: c.code.clone(),
                country_name: dataset.country_name(&c.code).to_string(),
                color: c.color.clone(),
                points: series(&self.tally, &c.code, selection.medals()),
            })
            .collect()
    }

    pub fn medal_extent(&self, selection: &Selection) -> u32 {
        medal_extent(&self.tally, selection)
    }

    pub fn snapshot_on(&self, date: NaiveDate) -> Option<&TallyRow> {
        snapshot_on(&self.tally, date)
    }

    /// Bubble events whose ceremony falls on a selected date.
    pub fn highlighted_events(&self, selection: &Selection) -> Vec<HighlightedEvent> {
        match self.dataset() {
            Some(dataset) => highlighted_events(&dataset.hierarchy, selection.dates()),
            None => Vec::new(),
        }
    }
}
