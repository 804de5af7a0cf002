//! Turns raw crash rows into normalized [`CrashRecord`]s.
//!
//! Rows with a missing or unparseable timestamp are skipped individually; the
//! rest of the batch is still normalized.

use crate::crash::record::{CrashRecord, InjurySeverity, TimeBucket, Weather};
use serde::Deserialize;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::warn;

const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0;

const TIMESTAMP_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
    format_description!(
        "[month padding:none]/[day padding:none]/[year] [hour repr:12 padding:none]:[minute]:[second] [period case_sensitive:false]"
    ),
    format_description!(
        "[month padding:none]/[day padding:none]/[year] [hour repr:12 padding:none]:[minute] [period case_sensitive:false]"
    ),
];

/// One row of the crash dataset as it appears on disk.
///
/// Malformed numeric cells deserialize to `None` instead of failing the row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(
        default,
        rename = "CrashDateTime",
        alias = "crash_datetime",
        alias = "timestamp"
    )]
    pub timestamp: Option<String>,
    #[serde(
        default,
        rename = "Latitude",
        alias = "latitude",
        alias = "lat",
        deserialize_with = "csv::invalid_option"
    )]
    pub latitude: Option<f64>,
    #[serde(
        default,
        rename = "Longitude",
        alias = "longitude",
        alias = "lon",
        deserialize_with = "csv::invalid_option"
    )]
    pub longitude: Option<f64>,
    #[serde(
        default,
        rename = "FatalInjuries",
        alias = "fatal_injuries",
        deserialize_with = "csv::invalid_option"
    )]
    pub fatal_injuries: Option<u32>,
    #[serde(
        default,
        rename = "SevereInjuries",
        alias = "severe_injuries",
        deserialize_with = "csv::invalid_option"
    )]
    pub severe_injuries: Option<u32>,
    #[serde(
        default,
        rename = "ModerateInjuries",
        alias = "moderate_injuries",
        deserialize_with = "csv::invalid_option"
    )]
    pub moderate_injuries: Option<u32>,
    #[serde(
        default,
        rename = "MinorInjuries",
        alias = "minor_injuries",
        deserialize_with = "csv::invalid_option"
    )]
    pub minor_injuries: Option<u32>,
    #[serde(default, rename = "Weather", alias = "weather")]
    pub weather: Option<String>,
    #[serde(default, rename = "CollisionType", alias = "collision_type")]
    pub collision_type: Option<String>,
    #[serde(default, rename = "PedestrianInvolved", alias = "pedestrian_involved")]
    pub pedestrian_involved: Option<String>,
    #[serde(default, rename = "AStreetName", alias = "a_street_name")]
    pub a_street_name: Option<String>,
    #[serde(default, rename = "BStreetName", alias = "b_street_name")]
    pub b_street_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<CrashRecord>,
    pub skipped: usize,
}

pub fn normalize(raw: &[RawRecord]) -> Normalized {
    normalize_at(raw, OffsetDateTime::now_utc())
}

/// Normalizes `raw` with `yearsAgo` measured against `now`.
pub fn normalize_at(raw: &[RawRecord], now: OffsetDateTime) -> Normalized {
    let mut records = Vec::with_capacity(raw.len());
    let mut skipped = 0usize;

    for (index, row) in raw.iter().enumerate() {
        match normalize_record(row, now) {
            Some(record) => records.push(record),
            None => {
                skipped += 1;
                warn!(
                    row = index,
                    timestamp = row.timestamp.as_deref().unwrap_or(""),
                    "Skipping crash record with unparseable timestamp"
                );
            }
        }
    }

    Normalized { records, skipped }
}

fn normalize_record(row: &RawRecord, now: OffsetDateTime) -> Option<CrashRecord> {
    let timestamp = parse_timestamp(row.timestamp.as_deref()?)?;
    let hour = timestamp.hour();
    let elapsed = (now - timestamp.assume_utc()).as_seconds_f64();

    Some(CrashRecord {
        timestamp,
        latitude: row.latitude,
        longitude: row.longitude,
        injury_severity: classify_severity(row),
        weather: classify_weather(row.weather.as_deref()),
        collision_type: non_blank(row.collision_type.as_deref()),
        pedestrian_involved: row.pedestrian_involved.as_deref().and_then(parse_flag),
        location: location_label(row.a_street_name.as_deref(), row.b_street_name.as_deref()),
        hour,
        day_of_week: timestamp.weekday(),
        time_bucket: TimeBucket::from_hour(hour),
        years_ago: (elapsed / SECONDS_PER_YEAR).max(0.0),
    })
}

pub fn parse_timestamp(value: &str) -> Option<PrimitiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(value, format).ok())
}

/// Maps free-text weather to a canonical condition. First match wins in the
/// order rain, snow, fog, windy; any other text is clear. Blank is `Other`.
pub fn classify_weather(text: Option<&str>) -> Weather {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Weather::Other;
    };
    let text = text.to_lowercase();
    if text.contains("rain") {
        Weather::Rain
    } else if text.contains("snow") {
        Weather::Snow
    } else if text.contains("fog") {
        Weather::Fog
    } else if text.contains("wind") {
        Weather::Windy
    } else {
        Weather::Clear
    }
}

pub fn classify_severity(row: &RawRecord) -> InjurySeverity {
    let positive = |count: Option<u32>| count.unwrap_or(0) > 0;
    if positive(row.fatal_injuries) {
        InjurySeverity::Fatal
    } else if positive(row.severe_injuries) {
        InjurySeverity::Severe
    } else if positive(row.moderate_injuries) {
        InjurySeverity::Moderate
    } else if positive(row.minor_injuries) {
        InjurySeverity::Minor
    } else {
        InjurySeverity::None
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Some(true),
        "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn location_label(a_street: Option<&str>, b_street: Option<&str>) -> Option<String> {
    match (non_blank(a_street), non_blank(b_street)) {
        (Some(a), Some(b)) => Some(format!("{a} & {b}")),
        (a, b) => a.or(b),
    }
}
