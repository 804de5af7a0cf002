//! Per time-of-day safety scores from historical crashes.
//!
//! Each bucket gets three components (crash frequency, severity-weighted
//! impact and recency-weighted impact), each normalized against the worst
//! bucket, then blended 50/30/20 onto the 1-10 scale.

use crate::crash::record::{CrashRecord, TimeBucket};
use crate::scoring::BucketScores;
use std::borrow::Borrow;

pub const FREQUENCY_WEIGHT: f64 = 0.5;
pub const SEVERITY_WEIGHT: f64 = 0.3;
pub const RECENCY_WEIGHT: f64 = 0.2;
pub const RECENCY_DECAY: f64 = 0.3;
pub const RECENCY_FLOOR: f64 = 0.2;

/// Scores used when there are no crash records at all.
pub fn default_bucket_scores() -> BucketScores {
    TimeBucket::ALL
        .iter()
        .map(|bucket| (*bucket, default_bucket_score(*bucket)))
        .collect()
}

pub fn default_bucket_score(bucket: TimeBucket) -> f64 {
    match bucket {
        TimeBucket::EarlyMorning => 8.5,
        TimeBucket::MorningRush => 6.8,
        TimeBucket::MidDay => 7.2,
        TimeBucket::EveningRush => 6.5,
        TimeBucket::Evening => 7.8,
        TimeBucket::LateNight => 8.7,
    }
}

pub fn recency_weight(years_ago: f64) -> f64 {
    (-RECENCY_DECAY * years_ago).exp().max(RECENCY_FLOOR)
}

/// Scores every bucket from `records`. All six buckets are always present.
pub fn score_by_time_bucket<R: Borrow<CrashRecord>>(records: &[R]) -> BucketScores {
    if records.is_empty() {
        return default_bucket_scores();
    }

    let mut frequency = [0.0f64; 6];
    let mut severity = [0.0f64; 6];
    let mut recency = [0.0f64; 6];

    for record in records {
        let record = record.borrow();
        let index = bucket_index(record.time_bucket);
        frequency[index] += 1.0;
        severity[index] += record.injury_severity.weight();
        recency[index] += recency_weight(record.years_ago);
    }

    let frequency = normalize_inverse(&frequency);
    let severity = normalize_inverse(&severity);
    let recency = normalize_inverse(&recency);

    TimeBucket::ALL
        .iter()
        .enumerate()
        .map(|(index, bucket)| {
            let composite = FREQUENCY_WEIGHT * frequency[index]
                + SEVERITY_WEIGHT * severity[index]
                + RECENCY_WEIGHT * recency[index];
            (*bucket, composite * 9.0 + 1.0)
        })
        .collect()
}

/// Position of `bucket` in [`TimeBucket::ALL`].
fn bucket_index(bucket: TimeBucket) -> usize {
    match bucket {
        TimeBucket::EarlyMorning => 0,
        TimeBucket::MorningRush => 1,
        TimeBucket::MidDay => 2,
        TimeBucket::EveningRush => 3,
        TimeBucket::Evening => 4,
        TimeBucket::LateNight => 5,
    }
}

// 1 - v/max, so the worst bucket is 0. No data anywhere means every bucket is 1.
fn normalize_inverse(values: &[f64; 6]) -> [f64; 6] {
    let max = values.iter().copied().fold(0.0f64, f64::max);
    if max <= 0.0 {
        return [1.0; 6];
    }
    values.map(|v| 1.0 - v / max)
}
