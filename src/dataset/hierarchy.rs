//! Event hierarchy used by the bubble display.
//!
//! The tree is discipline → event → country. Event nodes carry the dates of
//! their medal ceremonies; country leaves carry a packing value, the athletes
//! and a medal emoji string.

use crate::models::{HighlightedEvent, MedalRecord, MedalType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A node of the event hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EventNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dates: Vec<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub athletes: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub medals: String,
}

impl EventNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Sum of leaf values below this node.
    pub fn total_value(&self) -> f64 {
        if self.is_leaf() {
            self.value.unwrap_or(0.0)
        } else {
            self.children.iter().map(EventNode::total_value).sum()
        }
    }

    pub fn child(&self, name: &str) -> Option<&EventNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Ceremony dates under this node, ascending and deduplicated.
    pub fn collect_dates(&self) -> Vec<NaiveDate> {
        let mut dates = BTreeSet::new();
        self.collect_dates_into(&mut dates);
        dates.into_iter().collect()
    }

    fn collect_dates_into(&self, out: &mut BTreeSet<NaiveDate>) {
        out.extend(self.dates.iter().copied());
        for child in &self.children {
            child.collect_dates_into(out);
        }
    }
}

/// Build the hierarchy from medal records when no static file is shipped.
pub fn build_hierarchy(records: &[MedalRecord]) -> EventNode {
    #[derive(Default)]
    struct Leaf {
        value: u32,
        athletes: BTreeSet<String>,
        medals: Vec<MedalType>,
    }

    #[derive(Default)]
    struct Event {
        dates: BTreeSet<NaiveDate>,
        countries: BTreeMap<String, Leaf>,
    }

    let mut disciplines: BTreeMap<&str, BTreeMap<&str, Event>> = BTreeMap::new();

    for record in records {
        let event = disciplines
            .entry(record.discipline.as_str())
            .or_default()
            .entry(record.event.as_str())
            .or_default();
        event.dates.insert(record.date);

        let leaf = event
            .countries
            .entry(record.country_code.clone())
            .or_default();
        leaf.value += 1;
        leaf.medals.push(record.medal);
        if let Some(ref athlete) = record.athlete {
            leaf.athletes.insert(athlete.clone());
        }
    }

    let children = disciplines
        .into_iter()
        .map(|(discipline, events)| EventNode {
            name: discipline.to_string(),
            children: events
                .into_iter()
                .map(|(event, data)| EventNode {
                    name: event.to_string(),
                    dates: data.dates.into_iter().collect(),
                    children: data
                        .countries
                        .into_iter()
                        .map(|(country, mut leaf)| {
                            leaf.medals.sort();
                            EventNode {
                                name: country,
                                value: Some(leaf.value as f64),
                                athletes: leaf.athletes.into_iter().collect(),
                                medals: leaf.medals.iter().map(MedalType::emoji).collect(),
                                ..Default::default()
                            }
                        })
                        .collect(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        })
        .collect();

    EventNode {
        name: "Olympics".to_string(),
        children,
        ..Default::default()
    }
}

/// Events whose first listed ceremony date is among `dates`.
///
/// Static hierarchies keep their own date order; the first entry is the one
/// that counts, whether or not it is the earliest.
pub fn highlighted_events(root: &EventNode, dates: &BTreeSet<NaiveDate>) -> Vec<HighlightedEvent> {
    let mut highlighted = Vec::new();

    for discipline in &root.children {
        for event in &discipline.children {
            let Some(first) = event.dates.first() else {
                continue;
            };
            if dates.contains(first) {
                highlighted.push(HighlightedEvent {
                    discipline: discipline.name.clone(),
                    event: event.name.clone(),
                    dates: event.dates.clone(),
                });
            }
        }
    }

    highlighted
}

/// Dates to highlight on the timeline when a bubble is focused.
///
/// Focusing a discipline highlights every ceremony date of its events; an
/// unknown node highlights nothing.
pub fn focus_dates(root: &EventNode, discipline: &str, event: Option<&str>) -> Vec<NaiveDate> {
    let Some(discipline_node) = root.child(discipline) else {
        return Vec::new();
    };

    match event {
        Some(name) => discipline_node
            .child(name)
            .map(EventNode::collect_dates)
            .unwrap_or_default(),
        None => discipline_node.collect_dates(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn record(date: NaiveDate, medal: MedalType, country: &str, discipline: &str, event: &str) -> MedalRecord {
        MedalRecord {
            date,
            medal,
            country_code: country.to_string(),
            country: None,
            discipline: discipline.to_string(),
            event: event.to_string(),
            athlete: Some(format!("{} athlete", country)),
        }
    }

    fn sample() -> EventNode {
        build_hierarchy(&[
            record(day(27), MedalType::Gold, "USA", "Swimming", "100m Free"),
            record(day(27), MedalType::Bronze, "USA", "Swimming", "100m Free"),
            record(day(27), MedalType::Silver, "AUS", "Swimming", "100m Free"),
            record(day(29), MedalType::Gold, "CHN", "Diving", "Synchro 3m"),
            record(day(30), MedalType::Gold, "CHN", "Swimming", "Relay"),
        ])
    }

    #[test]
    fn test_build_hierarchy_shape() {
        let root = sample();

        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].name, "Diving");
        assert_eq!(root.total_value(), 5.0);

        let free = root.child("Swimming").and_then(|s| s.child("100m Free")).unwrap();
        assert_eq!(free.dates, vec![day(27)]);
        let usa = free.child("USA").unwrap();
        assert_eq!(usa.value, Some(2.0));
        assert_eq!(usa.medals, "🥇🥉");
        assert_eq!(usa.athletes, vec!["USA athlete".to_string()]);
    }

    #[test]
    fn test_highlighted_events() {
        let root = sample();
        let dates: BTreeSet<_> = [day(27), day(30)].into_iter().collect();

        let events = highlighted_events(&root, &dates);
        let names: Vec<_> = events.iter().map(|e| e.event.as_str()).collect();
        assert_eq!(names, vec!["100m Free", "Relay"]);

        assert!(highlighted_events(&root, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_focus_dates() {
        let root = sample();

        assert_eq!(focus_dates(&root, "Swimming", None), vec![day(27), day(30)]);
        assert_eq!(focus_dates(&root, "Swimming", Some("Relay")), vec![day(30)]);
        assert!(focus_dates(&root, "Fencing", None).is_empty());
        assert!(focus_dates(&root, "Swimming", Some("Nope")).is_empty());
    }

    #[test]
    fn test_parse_static_hierarchy() {
        let json = r#"{
            "name": "root",
            "children": [{
                "name": "Archery",
                "children": [{
                    "name": "Women's Team",
                    "dates": ["2024-07-28"],
                    "children": [{"name": "KOR", "value": 1, "athletes": ["LIM Sihyeon"], "medals": "🥇"}]
                }]
            }]
        }"#;
        let root: EventNode = serde_json::from_str(json).unwrap();

        assert_eq!(root.total_value(), 1.0);
        assert_eq!(focus_dates(&root, "Archery", None), vec![day(28)]);
    }

    #[test]
    fn test_highlight_uses_first_listed_date() {
        let json = r#"{
            "name": "root",
            "children": [{
                "name": "Athletics",
                "children": [{
                    "name": "Marathon",
                    "dates": ["2024-07-30", "2024-07-27"],
                    "children": [{"name": "ETH", "value": 1}]
                }]
            }]
        }"#;
        let root: EventNode = serde_json::from_str(json).unwrap();

        let first_listed: BTreeSet<_> = [day(30)].into_iter().collect();
        let earliest: BTreeSet<_> = [day(27)].into_iter().collect();
        assert_eq!(highlighted_events(&root, &first_listed).len(), 1);
        assert!(highlighted_events(&root, &earliest).is_empty());
    }
}
