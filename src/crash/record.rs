use serde::{Deserialize, Serialize};
use std::fmt;
use time::{PrimitiveDateTime, Weekday};

/// Time-of-day window used to group crashes and to describe when a trip happens.
///
/// Variant order is the canonical reporting order; the windows are disjoint
/// and together cover all 24 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    EarlyMorning,
    MorningRush,
    MidDay,
    EveningRush,
    Evening,
    LateNight,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 6] = [
        TimeBucket::EarlyMorning,
        TimeBucket::MorningRush,
        TimeBucket::MidDay,
        TimeBucket::EveningRush,
        TimeBucket::Evening,
        TimeBucket::LateNight,
    ];

    /// Maps a clock hour (0-23) to its bucket. Hours past 23 wrap.
    pub fn from_hour(hour: u8) -> Self {
        match hour % 24 {
            5..=6 => TimeBucket::EarlyMorning,
            7..=8 => TimeBucket::MorningRush,
            9..=15 => TimeBucket::MidDay,
            16..=18 => TimeBucket::EveningRush,
            19..=21 => TimeBucket::Evening,
            _ => TimeBucket::LateNight,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeBucket::EarlyMorning => "early_morning",
            TimeBucket::MorningRush => "morning_rush",
            TimeBucket::MidDay => "mid_day",
            TimeBucket::EveningRush => "evening_rush",
            TimeBucket::Evening => "evening",
            TimeBucket::LateNight => "late_night",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeBucket::EarlyMorning => "Early Morning (5-7 AM)",
            TimeBucket::MorningRush => "Morning Rush (7-9 AM)",
            TimeBucket::MidDay => "Mid-Day (9 AM-4 PM)",
            TimeBucket::EveningRush => "Evening Rush (4-7 PM)",
            TimeBucket::Evening => "Evening (7-10 PM)",
            TimeBucket::LateNight => "Late Night (10 PM-5 AM)",
        }
    }

    pub fn is_rush_hour(self) -> bool {
        matches!(self, TimeBucket::MorningRush | TimeBucket::EveningRush)
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weather condition, shared by crash records and route requests.
///
/// Normalized crash records only ever carry `Clear`, `Rain`, `Snow`, `Fog`,
/// `Windy` or `Other`; `Cloudy` and `Storm` exist for requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    Clear,
    Cloudy,
    Rain,
    Snow,
    Fog,
    Windy,
    Storm,
    Other,
}

impl Weather {
    pub fn as_str(self) -> &'static str {
        match self {
            Weather::Clear => "clear",
            Weather::Cloudy => "cloudy",
            Weather::Rain => "rain",
            Weather::Snow => "snow",
            Weather::Fog => "fog",
            Weather::Windy => "windy",
            Weather::Storm => "storm",
            Weather::Other => "other",
        }
    }

    pub fn is_adverse(self) -> bool {
        matches!(
            self,
            Weather::Rain | Weather::Fog | Weather::Snow | Weather::Storm
        )
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Highest injury outcome of a crash. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjurySeverity {
    None,
    Minor,
    Moderate,
    Severe,
    Fatal,
}

impl InjurySeverity {
    pub const ALL: [InjurySeverity; 5] = [
        InjurySeverity::None,
        InjurySeverity::Minor,
        InjurySeverity::Moderate,
        InjurySeverity::Severe,
        InjurySeverity::Fatal,
    ];

    /// Exponential impact weight used when aggregating severity.
    pub fn weight(self) -> f64 {
        match self {
            InjurySeverity::None => 1.0,
            InjurySeverity::Minor => 2.0,
            InjurySeverity::Moderate => 4.0,
            InjurySeverity::Severe => 8.0,
            InjurySeverity::Fatal => 16.0,
        }
    }

    /// Linear 1-5 rank, used for averages in reporting.
    pub fn rank(self) -> u8 {
        match self {
            InjurySeverity::None => 1,
            InjurySeverity::Minor => 2,
            InjurySeverity::Moderate => 3,
            InjurySeverity::Severe => 4,
            InjurySeverity::Fatal => 5,
        }
    }

    pub fn is_serious(self) -> bool {
        matches!(self, InjurySeverity::Severe | InjurySeverity::Fatal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InjurySeverity::None => "none",
            InjurySeverity::Minor => "minor",
            InjurySeverity::Moderate => "moderate",
            InjurySeverity::Severe => "severe",
            InjurySeverity::Fatal => "fatal",
        }
    }
}

/// A normalized historical crash. Built once at load time and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct CrashRecord {
    pub timestamp: PrimitiveDateTime,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub injury_severity: InjurySeverity,
    pub weather: Weather,
    pub collision_type: Option<String>,
    pub pedestrian_involved: Option<bool>,
    pub location: Option<String>,
    pub hour: u8,
    pub day_of_week: Weekday,
    pub time_bucket: TimeBucket,
    pub years_ago: f64,
}

impl CrashRecord {
    /// Returns `(latitude, longitude)` when both are present and finite.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn involves_bicycle(&self) -> bool {
        self.collision_type.as_deref().is_some_and(|kind| {
            let kind = kind.to_lowercase();
            kind.contains("bicycle") || kind.contains("bike") || kind.contains("cyclist")
        })
    }

    pub fn involves_pedestrian(&self) -> bool {
        self.pedestrian_involved == Some(true)
            || self
                .collision_type
                .as_deref()
                .is_some_and(|kind| kind.to_lowercase().contains("pedestrian"))
    }

    pub fn is_recent(&self, years: f64) -> bool {
        self.years_ago <= years
    }
}
