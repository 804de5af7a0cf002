//! Descriptive statistics over the crash dataset: distributions and hotspots.

use crate::crash::record::{CrashRecord, InjurySeverity, TimeBucket, Weather};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use time::Weekday;

pub const DEFAULT_HOTSPOT_LIMIT: usize = 10;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
    Weekday::Sunday,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hotspot {
    pub location: String,
    pub crash_count: usize,
    pub avg_severity: f64,
    pub peak_hour: u8,
    pub peak_day: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    pub total_incidents: usize,
    pub incidents_by_hour: BTreeMap<u8, usize>,
    pub incidents_by_day: BTreeMap<String, usize>,
    pub incidents_by_bucket: BTreeMap<TimeBucket, usize>,
    pub weather_distribution: BTreeMap<Weather, usize>,
    pub severity_distribution: BTreeMap<InjurySeverity, usize>,
    pub incidents_by_year: BTreeMap<i32, usize>,
    pub hotspots: Vec<Hotspot>,
}

impl DatasetStats {
    pub fn from_records(records: &[CrashRecord]) -> Self {
        Self::with_hotspot_limit(records, DEFAULT_HOTSPOT_LIMIT)
    }

    pub fn with_hotspot_limit(records: &[CrashRecord], hotspot_limit: usize) -> Self {
        let mut incidents_by_hour: BTreeMap<u8, usize> = (0..24).map(|h| (h, 0)).collect();
        let mut incidents_by_bucket: BTreeMap<TimeBucket, usize> =
            TimeBucket::ALL.iter().map(|b| (*b, 0)).collect();
        let mut incidents_by_day = BTreeMap::new();
        let mut weather_distribution = BTreeMap::new();
        let mut severity_distribution = BTreeMap::new();
        let mut incidents_by_year = BTreeMap::new();

        for record in records {
            *incidents_by_hour.entry(record.hour).or_insert(0) += 1;
            *incidents_by_bucket.entry(record.time_bucket).or_insert(0) += 1;
            *incidents_by_day
                .entry(record.day_of_week.to_string())
                .or_insert(0) += 1;
            *weather_distribution.entry(record.weather).or_insert(0) += 1;
            *severity_distribution
                .entry(record.injury_severity)
                .or_insert(0) += 1;
            *incidents_by_year.entry(record.timestamp.year()).or_insert(0) += 1;
        }

        Self {
            total_incidents: records.len(),
            incidents_by_hour,
            incidents_by_day,
            incidents_by_bucket,
            weather_distribution,
            severity_distribution,
            incidents_by_year,
            hotspots: hotspots(records, hotspot_limit),
        }
    }
}

/// Ranks locations by crash count. Ties go to the alphabetically first location.
pub fn hotspots(records: &[CrashRecord], limit: usize) -> Vec<Hotspot> {
    let mut by_location: HashMap<&str, Vec<&CrashRecord>> = HashMap::new();
    for record in records {
        if let Some(location) = record.location.as_deref() {
            by_location.entry(location).or_default().push(record);
        }
    }

    let mut ranked: Vec<(&str, Vec<&CrashRecord>)> = by_location.into_iter().collect();
    ranked.sort_by(|(a_loc, a), (b_loc, b)| b.len().cmp(&a.len()).then_with(|| a_loc.cmp(b_loc)));

    ranked
        .into_iter()
        .take(limit)
        .map(|(location, crashes)| summarize_hotspot(location, &crashes))
        .collect()
}

fn summarize_hotspot(location: &str, crashes: &[&CrashRecord]) -> Hotspot {
    let severity_total: u32 = crashes
        .iter()
        .map(|c| u32::from(c.injury_severity.rank()))
        .sum();
    let avg_severity = severity_total as f64 / crashes.len().max(1) as f64;

    let mut hour_counts = [0usize; 24];
    let mut day_counts = [0usize; 7];
    for crash in crashes {
        hour_counts[usize::from(crash.hour % 24)] += 1;
        day_counts[usize::from(crash.day_of_week.number_days_from_monday())] += 1;
    }

    Hotspot {
        location: location.to_string(),
        crash_count: crashes.len(),
        avg_severity: (avg_severity * 10.0).round() / 10.0,
        peak_hour: first_max_index(&hour_counts) as u8,
        peak_day: WEEKDAYS[first_max_index(&day_counts)].to_string(),
    }
}

fn first_max_index(counts: &[usize]) -> usize {
    let mut best = 0;
    for (index, count) in counts.iter().enumerate() {
        if *count > counts[best] {
            best = index;
        }
    }
    best
}
