//! Raw dataset rows and their normalization into [`MedalRecord`]s.
//!
//! Rows that cannot be normalized are skipped and logged; a bad row never
//! aborts the whole load.

use crate::models::{MedalRecord, MedalType};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Earliest year a medal date may carry (first modern Games).
pub const FIRST_MEDAL_YEAR: i32 = 1896;
/// Latest year a medal date may carry.
pub const LAST_MEDAL_YEAR: i32 = 2100;

/// Reason a raw row was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("missing medal date")]
    MissingDate,
    #[error("unparseable medal date: {0}")]
    BadDate(String),
    #[error("medal date {0} is outside the supported years")]
    DateOutOfRange(NaiveDate),
    #[error("missing medal code")]
    MissingMedal,
    #[error("unknown medal code: {0}")]
    UnknownMedal(String),
    #[error("missing country code")]
    MissingCountry,
    #[error("malformed row: {0}")]
    Malformed(String),
}

/// A row as it appears in the medals table. Every column is optional so that
/// partially filled rows reach [`RawMedalRow::normalize`] instead of failing
/// deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMedalRow {
    #[serde(default, alias = "date")]
    pub medal_date: Option<String>,
    #[serde(default, alias = "medal", deserialize_with = "lenient_string")]
    pub medal_code: Option<String>,
    #[serde(default)]
    pub medal_type: Option<String>,
    #[serde(default, alias = "countryCode")]
    pub country_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, alias = "sport")]
    pub discipline: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Accepts strings and numbers alike (JSON datasets store the code as a number).
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(
        match Option::<StringOrNumber>::deserialize(deserializer)? {
            Some(StringOrNumber::Str(s)) => Some(s),
            Some(StringOrNumber::Int(n)) => Some(n.to_string()),
            Some(StringOrNumber::Float(n)) => Some(n.to_string()),
            None => None,
        },
    )
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl RawMedalRow {
    /// Convert into a [`MedalRecord`], mapping every medal encoding to [`MedalType`].
    pub fn normalize(&self) -> Result<MedalRecord, RowError> {
        let date = parse_medal_date(non_empty(&self.medal_date).ok_or(RowError::MissingDate)?)?;
        let medal = self.medal()?;
        let country_code = non_empty(&self.country_code)
            .ok_or(RowError::MissingCountry)?
            .to_uppercase();

        Ok(MedalRecord {
            date,
            medal,
            country_code,
            country: non_empty(&self.country).map(String::from),
            discipline: non_empty(&self.discipline).unwrap_or_default().to_string(),
            event: non_empty(&self.event).unwrap_or_default().to_string(),
            athlete: non_empty(&self.name).map(String::from),
        })
    }

    /// The numeric code wins when both columns are present.
    fn medal(&self) -> Result<MedalType, RowError> {
        let raw = non_empty(&self.medal_code)
            .or_else(|| non_empty(&self.medal_type))
            .ok_or(RowError::MissingMedal)?;
        raw.parse::<MedalType>()
            .map_err(|_| RowError::UnknownMedal(raw.to_string()))
    }
}

/// Parse `YYYY-MM-DD`, tolerating a trailing time component.
///
/// Years outside [`FIRST_MEDAL_YEAR`]..=[`LAST_MEDAL_YEAR`] are rejected so a
/// mistyped year cannot stretch the tally over centuries.
pub fn parse_medal_date(input: &str) -> Result<NaiveDate, RowError> {
    let input = input.trim();

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").ok().or_else(|| {
        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
            .map(|dt| dt.date())
    });

    match date {
        Some(date) if (FIRST_MEDAL_YEAR..=LAST_MEDAL_YEAR).contains(&date.year()) => Ok(date),
        Some(date) => Err(RowError::DateOutOfRange(date)),
        None => Err(RowError::BadDate(input.to_string())),
    }
}

/// Outcome of normalizing a batch of rows.
#[derive(Debug, Clone, Default)]
pub struct IngestResult {
    pub records: Vec<MedalRecord>,
    /// `(row number, reason)` for every dropped row. Row numbers are 1-based
    /// and count data rows only.
    pub skipped: Vec<(usize, RowError)>,
}

impl IngestResult {
    fn push(&mut self, row_number: usize, row: Result<RawMedalRow, RowError>) {
        match row.and_then(|raw| raw.normalize()) {
            Ok(record) => self.records.push(record),
            Err(e) => {
                warn!("Skipping medal row {}: {}", row_number, e);
                self.skipped.push((row_number, e));
            }
        }
    }
}

/// Parse a CSV medals table.
pub fn ingest_csv(data: &[u8]) -> IngestResult {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut result = IngestResult::default();
    for (index, row) in reader.deserialize::<RawMedalRow>().enumerate() {
        let row = row.map_err(|e| RowError::Malformed(e.to_string()));
        result.push(index + 1, row);
    }
    result
}

/// Parse a JSON array of medal rows.
pub fn ingest_json(data: &[u8]) -> anyhow::Result<IngestResult> {
    let values: Vec<serde_json::Value> = serde_json::from_slice(data)?;

    let mut result = IngestResult::default();
    for (index, value) in values.into_iter().enumerate() {
        let row = serde_json::from_value::<RawMedalRow>(value)
            .map_err(|e| RowError::Malformed(e.to_string()));
        result.push(index + 1, row);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
medal_type,medal_code,medal_date,name,country_code,country,discipline,event
Gold Medal,1.0,2024-07-27,EVENEPOEL Remco,BEL,Belgium,Cycling Road,Men's Individual Time Trial
Silver Medal,2.0,2024-07-27,GANNA Filippo,ITA,Italy,Cycling Road,Men's Individual Time Trial
Bronze Medal,3.0,not-a-date,VAN AERT Wout,BEL,Belgium,Cycling Road,Men's Individual Time Trial
Gold Medal,9,2024-07-28,SOMEONE,USA,United States,Swimming,Men's 100m
,,2024-07-28,NOBODY,USA,United States,Swimming,Men's 100m
";

    #[test]
    fn test_ingest_csv_skips_bad_rows() {
        let result = ingest_csv(SAMPLE.as_bytes());

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.skipped.len(), 3);
        assert_eq!(result.records[0].country_code, "BEL");
        assert_eq!(result.records[0].medal, MedalType::Gold);
        assert_eq!(result.records[1].medal, MedalType::Silver);
        assert_eq!(result.records[0].athlete.as_deref(), Some("EVENEPOEL Remco"));

        assert!(matches!(result.skipped[0], (3, RowError::BadDate(_))));
        assert!(matches!(result.skipped[1], (4, RowError::UnknownMedal(_))));
        assert!(matches!(result.skipped[2], (5, RowError::MissingMedal)));
    }

    #[test]
    fn test_medal_type_column_used_without_code() {
        let data = "medal_date,medal_type,country_code\n2024-08-01,Bronze Medal,fra\n";
        let result = ingest_csv(data.as_bytes());

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].medal, MedalType::Bronze);
        assert_eq!(result.records[0].country_code, "FRA");
        assert_eq!(result.records[0].discipline, "");
    }

    #[test]
    fn test_missing_country_is_skipped() {
        let data = "medal_date,medal_code,country_code\n2024-08-01,1,\n";
        let result = ingest_csv(data.as_bytes());

        assert!(result.records.is_empty());
        assert_eq!(result.skipped[0].1, RowError::MissingCountry);
    }

    #[test]
    fn test_ingest_json_numeric_codes() {
        let data = r#"[
            {"date": "2024-07-28", "medal": 1, "countryCode": "USA", "sport": "Swimming", "event": "Relay"},
            {"date": "2024-07-29", "medal": 2.0, "countryCode": "CHN"},
            {"date": "2024-07-29", "medal": "gold"},
            42
        ]"#;
        let result = ingest_json(data.as_bytes()).unwrap();

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].medal, MedalType::Gold);
        assert_eq!(result.records[0].discipline, "Swimming");
        assert_eq!(result.records[1].medal, MedalType::Silver);
        assert_eq!(result.skipped.len(), 2);
        assert_eq!(result.skipped[0].1, RowError::MissingCountry);
        assert!(matches!(result.skipped[1].1, RowError::Malformed(_)));
    }

    #[test]
    fn test_parse_medal_date_with_time() {
        let expected = NaiveDate::from_ymd_opt(2024, 8, 3).unwrap();
        assert_eq!(parse_medal_date("2024-08-03"), Ok(expected));
        assert_eq!(parse_medal_date("2024-08-03 18:30:00"), Ok(expected));
        assert_eq!(parse_medal_date("2024-08-03T18:30:00"), Ok(expected));
        assert!(parse_medal_date("03/08/2024").is_err());
    }

    #[test]
    fn test_outlier_years_are_skipped() {
        let data = "\
medal_date,medal_code,country_code
2024-07-28,1,USA
0224-07-28,1,USA
9999-07-28,2,CHN
-262143-01-01,3,FRA
";
        let result = ingest_csv(data.as_bytes());

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.skipped.len(), 3);
        assert!(result
            .skipped
            .iter()
            .all(|(_, reason)| matches!(reason, RowError::DateOutOfRange(_))));

        let rows = crate::analysis::tally(&result.records);
        assert_eq!(rows.len(), 2);
    }
}
