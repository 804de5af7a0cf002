//! Departure window recommendations.
//!
//! Given a wanted arrival time, the advisor works backwards through the
//! travel time, a schedule buffer and half the lateness tolerance. All clock
//! arithmetic wraps across midnight.

use crate::crash::record::{TimeBucket, Weather};
use crate::request::{TrafficDensity, TransportMode, UserPreferences};
use crate::scoring::composite::estimated_duration_minutes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, Time};

pub const DEFAULT_LATENESS_TOLERANCE_MINUTES: f64 = 5.0;
pub const EARLY_WINDOW_MINUTES: f64 = 5.0;
pub const DEFAULT_TRIP_MINUTES: f64 = 25.0;
pub const MIN_TRIP_MINUTES: f64 = 5.0;

const CLOCK_12H: &[BorrowedFormatItem<'static>] =
    format_description!("[hour repr:12 padding:none]:[minute] [period case_sensitive:false]");
const CLOCK_24H: &[BorrowedFormatItem<'static>] =
    format_description!("[hour padding:none]:[minute]");
const DISPLAY_12H: &[BorrowedFormatItem<'static>] =
    format_description!("[hour repr:12 padding:none]:[minute] [period]");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    Strict,
    #[default]
    Moderate,
    Flexible,
}

impl ScheduleType {
    pub fn buffer_minutes(self) -> u32 {
        match self {
            ScheduleType::Strict => 15,
            ScheduleType::Moderate => 10,
            ScheduleType::Flexible => 5,
        }
    }
}

fn default_weather() -> Weather {
    Weather::Clear
}

fn default_traffic() -> TrafficDensity {
    TrafficDensity::Medium
}

fn default_mode() -> TransportMode {
    TransportMode::Driving
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartureRequest {
    pub origin: String,
    pub destination: String,
    /// `HH:MM` (24h) or `H:MM AM|PM`.
    pub arrival_time: String,
    #[serde(default)]
    pub schedule_type: ScheduleType,
    #[serde(default)]
    pub lateness_tolerance_minutes: Option<f64>,
    /// Inferred from the arrival hour when absent.
    #[serde(default)]
    pub travel_time_bucket: Option<TimeBucket>,
    #[serde(default = "default_weather")]
    pub weather: Weather,
    #[serde(default = "default_traffic")]
    pub traffic_density: TrafficDensity,
    #[serde(default = "default_mode")]
    pub transport_mode: TransportMode,
    #[serde(default)]
    pub user_preferences: Option<UserPreferences>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartureAdvice {
    pub arrival_time: String,
    pub time_bucket: TimeBucket,
    pub estimated_duration_minutes: u32,
    pub buffer_minutes: u32,
    pub lateness_tolerance_minutes: f64,
    pub optimal_departure: String,
    pub earliest_departure: String,
    pub latest_departure: String,
    pub explanation: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum AdvisorError {
    #[error("arrival time {0:?} is not HH:MM or H:MM AM/PM")]
    InvalidArrivalTime(String),
    #[error("failed to format departure time")]
    Format,
}

pub fn parse_arrival_time(value: &str) -> Result<Time, AdvisorError> {
    let trimmed = value.trim();
    let format = if trimmed.to_ascii_uppercase().ends_with('M') {
        CLOCK_12H
    } else {
        CLOCK_24H
    };
    Time::parse(trimmed, format).map_err(|_| AdvisorError::InvalidArrivalTime(value.to_string()))
}

pub fn format_clock(time: Time) -> Result<String, AdvisorError> {
    time.format(DISPLAY_12H).map_err(|_| AdvisorError::Format)
}

fn weather_slowdown(weather: Weather) -> f64 {
    match weather {
        Weather::Rain => 1.3,
        Weather::Fog => 1.2,
        Weather::Snow => 1.5,
        Weather::Storm => 1.4,
        Weather::Clear | Weather::Cloudy | Weather::Windy | Weather::Other => 1.0,
    }
}

fn traffic_slowdown(traffic: TrafficDensity) -> f64 {
    match traffic {
        TrafficDensity::Low => 0.8,
        TrafficDensity::Medium => 1.0,
        TrafficDensity::High => 1.4,
    }
}

fn mode_slowdown(mode: TransportMode) -> f64 {
    match mode {
        TransportMode::Driving => 1.0,
        TransportMode::Walking => 4.0,
        TransportMode::Bicycling => 1.5,
        TransportMode::Transit => 1.2,
    }
}

/// Trip time in minutes. With a known route length the scoring speed table is
/// used; otherwise a typical 25 minute trip is scaled by the conditions.
pub fn estimate_trip_minutes(
    route_length_miles: Option<f64>,
    mode: TransportMode,
    weather: Weather,
    traffic: TrafficDensity,
) -> f64 {
    let minutes = match route_length_miles.filter(|miles| miles.is_finite() && *miles > 0.0) {
        Some(miles) => estimated_duration_minutes(miles, mode, traffic) * weather_slowdown(weather),
        None => {
            DEFAULT_TRIP_MINUTES
                * weather_slowdown(weather)
                * traffic_slowdown(traffic)
                * mode_slowdown(mode)
        }
    };
    minutes.max(MIN_TRIP_MINUTES)
}

fn minutes(value: f64) -> Duration {
    Duration::seconds((value * 60.0).round() as i64)
}

pub fn recommend_departure(
    request: &DepartureRequest,
    route_length_miles: Option<f64>,
) -> Result<DepartureAdvice, AdvisorError> {
    let arrival = parse_arrival_time(&request.arrival_time)?;
    let time_bucket = request
        .travel_time_bucket
        .unwrap_or_else(|| TimeBucket::from_hour(arrival.hour()));
    let tolerance = request
        .lateness_tolerance_minutes
        .filter(|value| value.is_finite())
        .unwrap_or(DEFAULT_LATENESS_TOLERANCE_MINUTES)
        .max(0.0);
    let buffer = request.schedule_type.buffer_minutes();
    let trip_minutes = estimate_trip_minutes(
        route_length_miles,
        request.transport_mode,
        request.weather,
        request.traffic_density,
    );

    let optimal = arrival - minutes(trip_minutes + f64::from(buffer) + tolerance / 2.0);
    let earliest = optimal - minutes(EARLY_WINDOW_MINUTES);
    let latest = optimal + minutes((tolerance - f64::from(buffer) / 2.0).max(0.0));

    let arrival_label = format_clock(arrival)?;
    let estimated_duration_minutes = trip_minutes.round() as u32;
    let explanation = explain(request, &arrival_label, estimated_duration_minutes, buffer);

    Ok(DepartureAdvice {
        arrival_time: arrival_label,
        time_bucket,
        estimated_duration_minutes,
        buffer_minutes: buffer,
        lateness_tolerance_minutes: tolerance,
        optimal_departure: format_clock(optimal)?,
        earliest_departure: format_clock(earliest)?,
        latest_departure: format_clock(latest)?,
        explanation,
    })
}

fn explain(request: &DepartureRequest, arrival: &str, duration: u32, buffer: u32) -> String {
    let mut text = format!(
        "Trip by {} from {} to {}: ",
        request.transport_mode,
        request.origin.trim(),
        request.destination.trim()
    );
    if request.weather != Weather::Clear {
        text.push_str(&format!("{} weather, ", request.weather));
    }
    text.push_str(&format!(
        "{} traffic, about {duration} minutes of travel. ",
        request.traffic_density.as_str()
    ));
    text.push_str(&match request.schedule_type {
        ScheduleType::Strict => format!("Strict schedule, so {buffer} minutes of buffer. "),
        ScheduleType::Moderate => format!("{buffer} minutes of buffer for delays. "),
        ScheduleType::Flexible => format!("Flexible schedule, only {buffer} minutes of buffer. "),
    });
    text.push_str(&format!("Arrives by {arrival}."));

    if let Some(focus) = request.user_preferences.as_ref().and_then(preference_focus) {
        text.push(' ');
        text.push_str(focus);
    }
    text
}

fn preference_focus(preferences: &UserPreferences) -> Option<&'static str> {
    [
        (preferences.time_efficiency, "Prioritizes the fastest route."),
        (preferences.safety, "Prioritizes safer routes."),
        (preferences.comfort, "Prioritizes fewer transfers and stops."),
        (preferences.scenic, "Prioritizes scenic routes."),
    ]
    .into_iter()
    .filter(|(weight, _)| weight.is_finite() && *weight > 0.0)
    .fold(None, |best: Option<(f64, &'static str)>, (weight, text)| match best {
        Some((top, _)) if top >= weight => best,
        _ => Some((weight, text)),
    })
    .map(|(_, text)| text)
}
