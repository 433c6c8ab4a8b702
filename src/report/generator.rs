//! Report generation.
//!
//! This module renders the chart data derived for a selection as Markdown or
//! JSON.

use crate::analysis::{MedalAggregator, Selection};
use crate::config::ReportConfig;
use crate::models::{
    CountryCount, CountrySeries, HighlightedEvent, MedalType, Report, ReportMetadata,
    SelectionSummary,
};
use anyhow::Result;
use chrono::Utc;
use std::collections::BTreeSet;

/// Compute everything the three displays need for one selection snapshot.
pub fn build_report(
    aggregator: &MedalAggregator,
    selection: &Selection,
    dataset_path: &str,
    notices: Vec<String>,
) -> Report {
    let tally = aggregator.tally();
    let date_range = match (tally.first(), tally.last()) {
        (Some(first), Some(last)) => Some((first.date, last.date)),
        _ => None,
    };

    let metadata = ReportMetadata {
        dataset: dataset_path.to_string(),
        generated_at: Utc::now(),
        records_loaded: aggregator.records().len(),
        rows_skipped: aggregator.dataset().map(|d| d.skipped.len()).unwrap_or(0),
        date_range,
    };

    let country_counts = aggregator.country_counts(selection);
    let filtered_total = country_counts.iter().map(|c| c.count).sum();

    Report {
        metadata,
        selection: selection.summary(),
        timeline: aggregator.timeline(selection),
        medal_extent: aggregator.medal_extent(selection),
        country_counts,
        filtered_total,
        highlighted_events: aggregator.highlighted_events(selection),
        notices,
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str("# Medal Tally Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_selection_section(&report.selection, &report.notices));
    output.push_str(&generate_counts_section(
        &report.country_counts,
        report.filtered_total,
        &report.selection,
    ));

    if options.include_timeline {
        output.push_str(&generate_timeline_section(
            &report.timeline,
            report.medal_extent,
            options.include_idle_days,
        ));
    }

    if options.include_events {
        output.push_str(&generate_events_section(&report.highlighted_events));
    }

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.dataset));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Medals Loaded:** {}\n", metadata.records_loaded));
    if metadata.rows_skipped > 0 {
        section.push_str(&format!("- **Rows Skipped:** {}\n", metadata.rows_skipped));
    }
    if let Some((first, last)) = metadata.date_range {
        section.push_str(&format!("- **Tally Range:** {} to {}\n", first, last));
    }
    section.push('\n');

    section
}

fn generate_selection_section(selection: &SelectionSummary, notices: &[String]) -> String {
    let mut section = String::new();

    section.push_str("## Selection\n\n");

    let countries: Vec<String> = selection
        .countries
        .iter()
        .map(|c| format!("{} ({})", c.code, c.color))
        .collect();
    section.push_str(&format!(
        "- **Countries:** {}\n",
        if countries.is_empty() {
            "none".to_string()
        } else {
            countries.join(", ")
        }
    ));

    let medals: Vec<String> = selection
        .medals
        .enabled_types()
        .iter()
        .map(|m| format!("{} {}", m.emoji(), m))
        .collect();
    section.push_str(&format!(
        "- **Medals:** {}\n",
        if medals.is_empty() {
            "none".to_string()
        } else {
            medals.join(", ")
        }
    ));

    section.push_str(&format!("- **Days:** {}\n", describe_dates(selection)));

    for notice in notices {
        section.push_str(&format!("\n> ⚠️ {}\n", notice));
    }
    section.push('\n');

    section
}

fn describe_dates(selection: &SelectionSummary) -> String {
    match (selection.dates.first(), selection.dates.last()) {
        (None, _) | (_, None) => "none".to_string(),
        (Some(only), Some(_)) if selection.dates.len() == 1 => only.to_string(),
        (Some(first), Some(last)) => {
            format!("{} selected ({} to {})", selection.dates.len(), first, last)
        }
    }
}

/// The map/bubble table: filtered counts per selected country.
fn generate_counts_section(
    counts: &[CountryCount],
    total: usize,
    selection: &SelectionSummary,
) -> String {
    let mut section = String::new();

    section.push_str("## Medals by Country\n\n");

    if selection.dates.is_empty() {
        section.push_str("No days selected.\n\n");
        return section;
    }
    if counts.is_empty() {
        section.push_str("No countries selected.\n\n");
        return section;
    }

    section.push_str("| Country | Code | Medals |\n");
    section.push_str("|:---|:---:|:---:|\n");

    let mut sorted: Vec<&CountryCount> = counts.iter().collect();
    sorted.sort_by_key(|c| std::cmp::Reverse(c.count));

    for count in sorted {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            count.country_name, count.country_code, count.count
        ));
    }
    section.push_str(&format!("| **Total** | | **{}** |\n\n", total));

    section
}

/// The timeline table: one column per selected country.
fn generate_timeline_section(series: &[CountrySeries], extent: u32, include_idle_days: bool) -> String {
    let mut section = String::new();

    section.push_str("## Cumulative Medals\n\n");

    let Some(first) = series.first() else {
        section.push_str("No countries selected.\n\n");
        return section;
    };
    if first.points.is_empty() {
        section.push_str("No medals loaded.\n\n");
        return section;
    }

    section.push_str(&format!("*Highest total: {}*\n\n", extent));

    section.push_str("| Date |");
    for line in series {
        section.push_str(&format!(" {} |", line.country_code));
    }
    section.push('\n');
    section.push_str("|:---|");
    section.push_str(&":---:|".repeat(series.len()));
    section.push('\n');

    for (index, point) in first.points.iter().enumerate() {
        let changed = index == 0
            || series
                .iter()
                .any(|line| line.points[index].total != line.points[index - 1].total);
        let is_last = index + 1 == first.points.len();
        if !include_idle_days && !changed && !is_last {
            continue;
        }

        section.push_str(&format!("| {} |", point.date));
        for line in series {
            section.push_str(&format!(" {} |", line.points[index].total));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn generate_events_section(events: &[HighlightedEvent]) -> String {
    let mut section = String::new();

    section.push_str("## Events on Selected Days\n\n");

    if events.is_empty() {
        section.push_str("No events on the selected days.\n\n");
        return section;
    }

    let disciplines: BTreeSet<&str> = events.iter().map(|e| e.discipline.as_str()).collect();
    for discipline in disciplines {
        section.push_str(&format!("### {}\n\n", discipline));
        for event in events.iter().filter(|e| e.discipline == discipline) {
            let dates: Vec<String> = event.dates.iter().map(|d| d.to_string()).collect();
            section.push_str(&format!("- {} ({})\n", event.event, dates.join(", ")));
        }
        section.push('\n');
    }

    section
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// One-line medal summary for a country, e.g. `🥇 3 | 🥈 1 | 🥉 0`.
pub fn medal_line(counts: &crate::models::MedalCounts) -> String {
    MedalType::ALL
        .iter()
        .map(|m| format!("{} {}", m.emoji(), counts.get(*m)))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::models::{MedalCounts, MedalRecord};
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn record(date: NaiveDate, medal: MedalType, country: &str, event: &str) -> MedalRecord {
        MedalRecord {
            date,
            medal,
            country_code: country.to_string(),
            country: None,
            discipline: "Swimming".to_string(),
            event: event.to_string(),
            athlete: None,
        }
    }

    fn create_test_aggregator() -> MedalAggregator {
        let records = vec![
            record(day(27), MedalType::Gold, "USA", "100m Free"),
            record(day(27), MedalType::Silver, "CHN", "100m Free"),
            record(day(30), MedalType::Gold, "CHN", "Relay"),
        ];
        let mut names = HashMap::new();
        names.insert("USA".to_string(), "United States".to_string());
        names.insert("CHN".to_string(), "China".to_string());
        MedalAggregator::new(Arc::new(Dataset::new(records, names, None)))
    }

    fn create_test_selection(dates: &[NaiveDate]) -> Selection {
        let mut selection = Selection::default();
        selection.add_country("USA").unwrap();
        selection.add_country("CHN").unwrap();
        selection.select_dates(dates.iter().copied());
        selection
    }

    #[test]
    fn test_build_report() {
        let aggregator = create_test_aggregator();
        let selection = create_test_selection(&[day(27)]);

        let report = build_report(&aggregator, &selection, "medals.csv", Vec::new());

        assert_eq!(report.metadata.records_loaded, 3);
        assert_eq!(report.metadata.date_range, Some((day(26), day(30))));
        assert_eq!(report.filtered_total, 2);
        assert_eq!(report.medal_extent, 2);
        assert_eq!(report.timeline.len(), 2);
        assert_eq!(report.highlighted_events.len(), 1);
        assert_eq!(report.highlighted_events[0].event, "100m Free");
    }

    #[test]
    fn test_generate_markdown_report() {
        let aggregator = create_test_aggregator();
        let selection = create_test_selection(&[day(27), day(30)]);
        let report = build_report(
            &aggregator,
            &selection,
            "medals.csv",
            vec!["at most 6 countries can be selected".to_string()],
        );

        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("# Medal Tally Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("USA (dodgerblue), CHN (crimson)"));
        assert!(markdown.contains("| China | CHN | 2 |"));
        assert!(markdown.contains("| United States | USA | 1 |"));
        assert!(markdown.contains("| **Total** | | **3** |"));
        assert!(markdown.contains("### Swimming"));
        assert!(markdown.contains("⚠️ at most 6 countries"));
    }

    #[test]
    fn test_timeline_skips_idle_days() {
        let aggregator = create_test_aggregator();
        let selection = create_test_selection(&[]);
        let report = build_report(&aggregator, &selection, "medals.csv", Vec::new());

        let compact = generate_timeline_section(&report.timeline, report.medal_extent, false);
        assert!(compact.contains("| 2024-07-26 | 0 | 0 |"));
        assert!(compact.contains("| 2024-07-27 | 1 | 1 |"));
        assert!(!compact.contains("2024-07-28"));
        assert!(compact.contains("| 2024-07-30 | 1 | 2 |"));

        let full = generate_timeline_section(&report.timeline, report.medal_extent, true);
        assert!(full.contains("| 2024-07-28 | 1 | 1 |"));
    }

    #[test]
    fn test_no_dates_selected() {
        let aggregator = create_test_aggregator();
        let selection = create_test_selection(&[]);
        let report = build_report(&aggregator, &selection, "medals.csv", Vec::new());

        let markdown = generate_markdown_report(&report, &ReportConfig::default());
        assert!(markdown.contains("No days selected."));
        assert!(markdown.contains("No events on the selected days."));
        assert_eq!(report.filtered_total, 0);
    }

    #[test]
    fn test_pending_dataset_report() {
        let report = build_report(
            &MedalAggregator::pending(),
            &Selection::with_defaults(),
            "medals.csv",
            Vec::new(),
        );

        assert_eq!(report.metadata.records_loaded, 0);
        assert!(report.metadata.date_range.is_none());
        assert!(report.timeline.is_empty());
        assert!(report.country_counts.is_empty());
    }

    #[test]
    fn test_generate_json_report() {
        let aggregator = create_test_aggregator();
        let selection = create_test_selection(&[day(27)]);
        let report = build_report(&aggregator, &selection, "medals.csv", Vec::new());

        let json = generate_json_report(&report).unwrap();
        assert!(json.contains("\"timeline\""));
        assert!(json.contains("\"country_counts\""));
        assert!(json.contains("\"dodgerblue\""));
        assert!(!json.contains("\"notices\""));
    }

    #[test]
    fn test_medal_line() {
        let counts = MedalCounts {
            gold: 3,
            silver: 1,
            bronze: 0,
        };
        assert_eq!(medal_line(&counts), "🥇 3 | 🥈 1 | 🥉 0");
    }
}
