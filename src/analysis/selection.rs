//! User selection shared by all displays.
//!
//! A [`Selection`] is mutated only in response to user input and handed to the
//! aggregator as an immutable snapshot. Country colors come from a
//! [`ColorPool`] so a removed country gives its color back.

use crate::models::{MedalFilter, MedalType, SelectedCountry, SelectionSummary};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use thiserror::Error;

/// Maximum number of countries selectable at once.
pub const MAX_COUNTRIES: usize = 6;

/// Colors assigned to selected countries, in hand-out order.
pub const DEFAULT_PALETTE: [&str; MAX_COUNTRIES] = [
    "dodgerblue",
    "crimson",
    "lightseagreen",
    "orange",
    "mediumorchid",
    "goldenrod",
];

/// Countries selected on first load.
pub const DEFAULT_COUNTRIES: [&str; 5] = ["USA", "CHN", "JPN", "AUS", "FRA"];

/// A rejected selection change. The selection is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("at most {max} countries can be selected; remove one before adding {code}")]
    TooManyCountries { max: usize, code: String },
    #[error("{0} is already selected")]
    AlreadySelected(String),
    #[error("{0} is not selected")]
    NotSelected(String),
    #[error("unknown country code: {0}")]
    UnknownCountry(String),
}

/// Ordered pool of display colors with explicit acquire/release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPool {
    palette: Vec<String>,
    in_use: Vec<bool>,
}

impl Default for ColorPool {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect())
    }
}

impl ColorPool {
    pub fn new(palette: Vec<String>) -> Self {
        let in_use = vec![false; palette.len()];
        Self { palette, in_use }
    }

    /// Take the first free color in palette order.
    pub fn acquire(&mut self) -> Option<String> {
        let index = self.in_use.iter().position(|used| !used)?;
        self.in_use[index] = true;
        Some(self.palette[index].clone())
    }

    /// Return a color to the pool. Unknown or already free colors are ignored.
    pub fn release(&mut self, color: &str) -> bool {
        match self
            .palette
            .iter()
            .zip(self.in_use.iter_mut())
            .find(|(c, used)| c.as_str() == color && **used)
        {
            Some((_, used)) => {
                *used = false;
                true
            }
            None => false,
        }
    }

    pub fn available(&self) -> usize {
        self.in_use.iter().filter(|used| !**used).count()
    }

    pub fn capacity(&self) -> usize {
        self.palette.len()
    }
}

/// Countries, dates and medal types currently selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    countries: Vec<SelectedCountry>,
    dates: BTreeSet<NaiveDate>,
    medals: MedalFilter,
    colors: ColorPool,
    max_countries: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(ColorPool::default())
    }
}

impl Selection {
    /// Empty selection with all medal types enabled.
    ///
    /// The country limit is the smaller of [`MAX_COUNTRIES`] and the palette size.
    pub fn new(colors: ColorPool) -> Self {
        let max_countries = colors.capacity().min(MAX_COUNTRIES);
        Self {
            countries: Vec::new(),
            dates: BTreeSet::new(),
            medals: MedalFilter::all(),
            colors,
            max_countries,
        }
    }

    /// The selection shown on first load: the top five medal nations.
    pub fn with_defaults() -> Self {
        let mut selection = Self::default();
        for code in DEFAULT_COUNTRIES {
            // The default list is shorter than the palette.
            let _ = selection.add_country(code);
        }
        selection
    }

    pub fn countries(&self) -> &[SelectedCountry] {
        &self.countries
    }

    pub fn dates(&self) -> &BTreeSet<NaiveDate> {
        &self.dates
    }

    pub fn medals(&self) -> &MedalFilter {
        &self.medals
    }

    pub fn max_countries(&self) -> usize {
        self.max_countries
    }

    pub fn contains_country(&self, code: &str) -> bool {
        self.countries.iter().any(|c| c.code == code)
    }

    pub fn color_of(&self, code: &str) -> Option<&str> {
        self.countries
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.color.as_str())
    }

    /// Append a country with the next free color.
    pub fn add_country(&mut self, code: &str) -> Result<&SelectedCountry, SelectionError> {
        let code = code.trim().to_uppercase();

        if self.contains_country(&code) {
            return Err(SelectionError::AlreadySelected(code));
        }
        if self.countries.len() >= self.max_countries {
            return Err(SelectionError::TooManyCountries {
                max: self.max_countries,
                code,
            });
        }
        let color = self
            .colors
            .acquire()
            .ok_or_else(|| SelectionError::TooManyCountries {
                max: self.max_countries,
                code: code.clone(),
            })?;

        self.countries.push(SelectedCountry { code, color });
        Ok(&self.countries[self.countries.len() - 1])
    }

    /// Like [`Selection::add_country`], but only for codes `is_known` accepts.
    pub fn add_known_country<F>(&mut self, code: &str, is_known: F) -> Result<&SelectedCountry, SelectionError>
    where
        F: Fn(&str) -> bool,
    {
        let normalized = code.trim().to_uppercase();
        if !is_known(&normalized) {
            return Err(SelectionError::UnknownCountry(normalized));
        }
        self.add_country(&normalized)
    }

    /// Drop a country and give its color back to the pool.
    pub fn remove_country(&mut self, code: &str) -> Result<SelectedCountry, SelectionError> {
        let code = code.trim().to_uppercase();
        let index = self
            .countries
            .iter()
            .position(|c| c.code == code)
            .ok_or(SelectionError::NotSelected(code))?;

        let removed = self.countries.remove(index);
        self.colors.release(&removed.color);
        Ok(removed)
    }

    /// Select an unselected date, or deselect a selected one. Returns whether
    /// the date is selected afterwards.
    pub fn toggle_date(&mut self, date: NaiveDate) -> bool {
        if self.dates.remove(&date) {
            false
        } else {
            self.dates.insert(date);
            true
        }
    }

    pub fn select_dates<I>(&mut self, dates: I)
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        self.dates.extend(dates);
    }

    pub fn clear_dates(&mut self) {
        self.dates.clear();
    }

    pub fn set_medal(&mut self, medal: MedalType, enabled: bool) {
        self.medals.set(medal, enabled);
    }

    pub fn set_medals(&mut self, medals: MedalFilter) {
        self.medals = medals;
    }

    pub fn summary(&self) -> SelectionSummary {
        SelectionSummary {
            countries: self.countries.clone(),
            dates: self.dates.iter().copied().collect(),
            medals: self.medals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    #[test]
    fn test_color_pool_acquire_release() {
        let mut pool = ColorPool::new(vec!["red".into(), "green".into(), "blue".into()]);

        assert_eq!(pool.acquire().as_deref(), Some("red"));
        assert_eq!(pool.acquire().as_deref(), Some("green"));
        assert!(pool.release("red"));
        assert!(!pool.release("red"));
        assert!(!pool.release("purple"));
        assert_eq!(pool.acquire().as_deref(), Some("red"));
        assert_eq!(pool.acquire().as_deref(), Some("blue"));
        assert_eq!(pool.acquire(), None);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_defaults() {
        let selection = Selection::with_defaults();
        let codes: Vec<_> = selection.countries().iter().map(|c| c.code.as_str()).collect();

        assert_eq!(codes, DEFAULT_COUNTRIES.to_vec());
        assert_eq!(selection.color_of("USA"), Some("dodgerblue"));
        assert_eq!(selection.color_of("FRA"), Some("mediumorchid"));
        assert!(selection.dates().is_empty());
        assert_eq!(*selection.medals(), MedalFilter::all());
    }

    #[test]
    fn test_seventh_country_rejected() {
        let mut selection = Selection::with_defaults();
        selection.add_country("GBR").unwrap();
        let before = selection.clone();

        let err = selection.add_country("KOR").unwrap_err();
        assert_eq!(
            err,
            SelectionError::TooManyCountries {
                max: 6,
                code: "KOR".to_string()
            }
        );
        assert_eq!(selection, before);
        assert_eq!(selection.countries().len(), 6);
    }

    #[test]
    fn test_duplicate_and_unknown_rejected() {
        let mut selection = Selection::default();
        selection.add_country("usa").unwrap();

        assert_eq!(
            selection.add_country("USA").unwrap_err(),
            SelectionError::AlreadySelected("USA".to_string())
        );
        assert_eq!(
            selection
                .add_known_country("zzz", |code| code == "CHN")
                .unwrap_err(),
            SelectionError::UnknownCountry("ZZZ".to_string())
        );
        assert!(selection.add_known_country("chn", |code| code == "CHN").is_ok());
    }

    #[test]
    fn test_remove_releases_color() {
        let mut selection = Selection::with_defaults();
        selection.add_country("GBR").unwrap();

        let removed = selection.remove_country("CHN").unwrap();
        assert_eq!(removed.color, "crimson");

        let added = selection.add_country("KOR").unwrap();
        assert_eq!(added.color, "crimson");
        assert_eq!(selection.countries().last().map(|c| c.code.as_str()), Some("KOR"));

        assert_eq!(
            selection.remove_country("CHN").unwrap_err(),
            SelectionError::NotSelected("CHN".to_string())
        );
    }

    #[test]
    fn test_small_palette_limits_countries() {
        let mut selection = Selection::new(ColorPool::new(vec!["red".into(), "blue".into()]));
        assert_eq!(selection.max_countries(), 2);

        selection.add_country("USA").unwrap();
        selection.add_country("CHN").unwrap();
        assert!(matches!(
            selection.add_country("JPN"),
            Err(SelectionError::TooManyCountries { max: 2, .. })
        ));
    }

    #[test]
    fn test_date_toggling() {
        let mut selection = Selection::default();

        assert!(selection.toggle_date(day(28)));
        assert!(!selection.toggle_date(day(28)));
        assert!(selection.dates().is_empty());

        selection.select_dates([day(27), day(29), day(27)]);
        assert_eq!(selection.dates().len(), 2);

        selection.clear_dates();
        assert!(selection.dates().is_empty());
    }

    #[test]
    fn test_medal_toggles_in_summary() {
        let mut selection = Selection::with_defaults();
        selection.set_medal(MedalType::Silver, false);
        selection.toggle_date(day(30));

        let summary = selection.summary();
        assert!(!summary.medals.silver);
        assert!(summary.medals.gold);
        assert_eq!(summary.dates, vec![day(30)]);
        assert_eq!(summary.countries.len(), 5);
    }
}
