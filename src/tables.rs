//! Delimited-text inputs: the per-period volume and AHT tables and the raw
//! interaction event feed.
//!
//! Volume and AHT tables share one layout, period identifier first:
//!
//! ```text
//! period,primary_email,primary_chat,secondary_email,secondary_chat
//! 2025-01,9000,2691,350,120
//! ```
//!
//! AHT values are in seconds. The event feed needs a `timestamp` and a
//! `team` column; any other columns are ignored.

use crate::error::{PlanningError, PlanningResult};
use crate::model::{Channel, ChannelPair, Period, PerTier, Tier};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const PERIOD_COLUMN: &str = "period";
pub const TIER_CHANNEL_COLUMNS: [&str; 4] = [
    "primary_email",
    "primary_chat",
    "secondary_email",
    "secondary_chat",
];
pub const EVENT_COLUMNS: [&str; 2] = ["timestamp", "team"];

/// One row of the volume or AHT table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub period: Period,
    pub values: PerTier<ChannelPair<f64>>,
}

impl PeriodRecord {
    pub fn value(&self, tier: Tier, channel: Channel) -> f64 {
        *self.values.get(tier).get(channel)
    }
}

#[derive(Debug, Deserialize)]
struct PeriodCsvRow {
    period: String,
    primary_email: String,
    primary_chat: String,
    secondary_email: String,
    secondary_chat: String,
}

#[derive(Debug, Deserialize)]
struct EventCsvRow {
    timestamp: String,
    team: Option<String>,
}

/// One raw interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub timestamp: NaiveDateTime,
    pub team: String,
}

impl RawEvent {
    pub fn new(timestamp: NaiveDateTime, team: impl Into<String>) -> Self {
        Self {
            timestamp,
            team: team.into(),
        }
    }
}

pub fn read_volume_table<R: Read>(reader: R) -> PlanningResult<Vec<PeriodRecord>> {
    read_period_table("volume table", reader)
}

pub fn read_aht_table<R: Read>(reader: R) -> PlanningResult<Vec<PeriodRecord>> {
    read_period_table("AHT table", reader)
}

pub fn load_volume_table<P: AsRef<Path>>(path: P) -> PlanningResult<Vec<PeriodRecord>> {
    read_volume_table(File::open(path)?)
}

pub fn load_aht_table<P: AsRef<Path>>(path: P) -> PlanningResult<Vec<PeriodRecord>> {
    read_aht_table(File::open(path)?)
}

pub fn load_events<P: AsRef<Path>>(path: P) -> PlanningResult<Vec<RawEvent>> {
    read_events(File::open(path)?)
}

fn read_period_table<R: Read>(input: &str, reader: R) -> PlanningResult<Vec<PeriodRecord>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();
    check_columns(input, &headers, std::iter::once(PERIOD_COLUMN).chain(TIER_CHANNEL_COLUMNS))?;
    if headers.get(0) != Some(PERIOD_COLUMN) {
        return Err(PlanningError::parse(
            input,
            None,
            format!("'{PERIOD_COLUMN}' must be the first column"),
        ));
    }

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for (idx, row) in reader.deserialize::<PeriodCsvRow>().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let row = row?;
        let period: Period = row
            .period
            .parse()
            .map_err(|msg: String| PlanningError::parse(input, Some(line), msg))?;
        if !seen.insert(period) {
            return Err(PlanningError::parse(
                input,
                Some(line),
                format!("duplicate period {period}"),
            ));
        }
        let number = |column: &str, raw: &str| parse_number(input, line, column, raw);
        records.push(PeriodRecord {
            period,
            values: PerTier::new(
                ChannelPair::new(
                    number("primary_email", &row.primary_email)?,
                    number("primary_chat", &row.primary_chat)?,
                ),
                ChannelPair::new(
                    number("secondary_email", &row.secondary_email)?,
                    number("secondary_chat", &row.secondary_chat)?,
                ),
            ),
        });
    }
    Ok(records)
}

pub fn read_events<R: Read>(reader: R) -> PlanningResult<Vec<RawEvent>> {
    const INPUT: &str = "event feed";
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();
    check_columns(INPUT, &headers, EVENT_COLUMNS)?;

    let mut events = Vec::new();
    for (idx, row) in reader.deserialize::<EventCsvRow>().enumerate() {
        let line = idx + 2;
        let row = row?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
            PlanningError::parse(
                INPUT,
                Some(line),
                format!("invalid timestamp '{}'", row.timestamp),
            )
        })?;
        events.push(RawEvent {
            timestamp,
            team: row.team.unwrap_or_default(),
        });
    }
    Ok(events)
}

fn check_columns<'a>(
    input: &str,
    headers: &csv::StringRecord,
    required: impl IntoIterator<Item = &'a str>,
) -> PlanningResult<()> {
    for column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(PlanningError::MissingColumn {
                input: input.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

fn parse_number(input: &str, line: usize, column: &str, raw: &str) -> PlanningResult<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    let value = trimmed.replace(',', "").parse::<f64>().map_err(|_| {
        PlanningError::parse(input, Some(line), format!("invalid number '{raw}' in {column}"))
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(PlanningError::parse(
            input,
            Some(line),
            format!("{column} must be a non-negative number (got {raw})"),
        ));
    }
    Ok(value)
}

const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parses the timestamp layouts exported by common helpdesk tools. Zoned
/// RFC 3339 values keep their local wall-clock time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(zoned) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(zoned.naive_local());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn timestamps_in_supported_layouts() {
        for raw in [
            "2025-03-04 13:05:00",
            "2025-03-04 13:05",
            "2025-03-04T13:05:00",
            "03/04/2025 13:05",
            "2025-03-04T13:05:00+02:00",
        ] {
            let ts = parse_timestamp(raw).unwrap_or_else(|| panic!("failed on {raw}"));
            assert_eq!(ts.hour(), 13, "{raw}");
        }
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn thousands_separators_and_blanks() {
        assert_eq!(parse_number("t", 2, "c", "11,691").unwrap(), 11691.0);
        assert_eq!(parse_number("t", 2, "c", "").unwrap(), 0.0);
        assert!(parse_number("t", 2, "c", "-3").is_err());
    }
}
