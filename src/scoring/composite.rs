//! Composite route scoring: historical crashes near the route blended with
//! route characteristics and current conditions.
//!
//! `final = 0.6 * historical + 0.25 * route + 0.15 * conditions`, then
//! optional preference sharpening and a clamp to [1, 10].

use crate::crash::record::{CrashRecord, Weather};
use crate::geo::{Coordinate, filter_near_route, haversine_miles};
use crate::request::{RouteRequest, TrafficDensity, TransportMode, UserPreferences};
use crate::scoring::bucket::score_by_time_bucket;
use crate::scoring::risk::SafetyLevel;
use crate::scoring::{
    ComponentBreakdown, SafetyAssessment, ScoringError, clamp_score, ensure_finite, round_score,
};
use tracing::debug;

pub const HISTORICAL_WEIGHT: f64 = 0.6;
pub const ROUTE_WEIGHT: f64 = 0.25;
pub const CONDITIONS_WEIGHT: f64 = 0.15;

pub const ROUTE_BASE_SCORE: f64 = 8.0;
pub const CONDITIONS_BASE_SCORE: f64 = 7.5;

/// Mode-specific subsets are only trusted above this many records.
pub const MODE_SAMPLE_THRESHOLD: usize = 5;
pub const RECENT_YEARS: f64 = 2.0;
pub const MAX_ALERTS: u32 = 10;
/// Haversine round-off must not push a 5 mile route into the long-route band.
pub const DISTANCE_BAND_TOLERANCE_MILES: f64 = 1e-9;

pub fn score_route(
    request: &RouteRequest,
    origin: Coordinate,
    destination: Coordinate,
    records: &[CrashRecord],
    max_distance_km: f64,
) -> Result<SafetyAssessment, ScoringError> {
    if !origin.is_valid() || !destination.is_valid() {
        return Err(ScoringError::InvalidCoordinate);
    }

    let near_route = filter_near_route(records, origin, destination, max_distance_km);
    let route_length_miles = ensure_finite("route_length_miles", haversine_miles(origin, destination))?;

    let scored = select_mode_records(near_route, request.transport_mode);
    let crash_count = scored.len();
    let bucket_scores = score_by_time_bucket(&scored);
    let bucket_score = bucket_scores
        .get(&request.travel_time_bucket)
        .copied()
        .ok_or(ScoringError::MissingBucket(request.travel_time_bucket))?;

    let summary = CrashSummary::from_records(&scored);
    let historical = ensure_finite(
        "historical",
        bucket_score * historical_penalty(&summary, route_length_miles),
    )?;

    let route = ROUTE_BASE_SCORE
        + distance_factor(route_length_miles)
        + mode_factor(request.transport_mode, route_length_miles);
    let conditions = CONDITIONS_BASE_SCORE
        + weather_factor(request.weather, &scored)
        + traffic_factor(request.traffic_density);

    let mut combined =
        HISTORICAL_WEIGHT * historical + ROUTE_WEIGHT * route + CONDITIONS_WEIGHT * conditions;
    if let Some(preferences) = request.user_preferences.as_ref() {
        combined = apply_preferences(combined, preferences);
    }
    let final_score = clamp_score(ensure_finite("final_score", combined)?);

    debug!(
        crash_count,
        route_length_miles, historical, route, conditions, final_score, "Route scored"
    );

    Ok(SafetyAssessment {
        final_score,
        display_score: round_score(final_score),
        safety_level: SafetyLevel::from_score(final_score),
        bucket_scores,
        crash_count,
        route_length_miles,
        estimated_duration_minutes: estimated_duration_minutes(
            route_length_miles,
            request.transport_mode,
            request.traffic_density,
        ),
        alert_count: alert_count(summary.recent, summary.serious),
        component_breakdown: Some(ComponentBreakdown {
            historical,
            route,
            conditions,
        }),
        data_backed: true,
    })
}

/// Narrows to bicycle or pedestrian crashes for those modes when the subset
/// is large enough to be meaningful.
pub fn select_mode_records(near_route: Vec<&CrashRecord>, mode: TransportMode) -> Vec<&CrashRecord> {
    let predicate: fn(&CrashRecord) -> bool = match mode {
        TransportMode::Bicycling => CrashRecord::involves_bicycle,
        TransportMode::Walking => CrashRecord::involves_pedestrian,
        TransportMode::Driving | TransportMode::Transit => return near_route,
    };

    let subset: Vec<&CrashRecord> = near_route.iter().copied().filter(|r| predicate(r)).collect();
    if subset.len() > MODE_SAMPLE_THRESHOLD {
        subset
    } else {
        near_route
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrashSummary {
    pub count: usize,
    pub serious: usize,
    pub recent: usize,
}

impl CrashSummary {
    pub fn from_records(records: &[&CrashRecord]) -> Self {
        Self {
            count: records.len(),
            serious: records
                .iter()
                .filter(|r| r.injury_severity.is_serious())
                .count(),
            recent: records.iter().filter(|r| r.is_recent(RECENT_YEARS)).count(),
        }
    }
}

/// Multiplier for the historical score from crash density, the share of
/// severe/fatal crashes and the share of recent crashes. 1.0 with no crashes.
pub fn historical_penalty(summary: &CrashSummary, route_length_miles: f64) -> f64 {
    if summary.count == 0 {
        return 1.0;
    }
    let count = summary.count as f64;
    let density_per_mile = count / route_length_miles.max(0.1);
    let severity_ratio = summary.serious as f64 / count;
    let recent_ratio = summary.recent as f64 / count;

    (1.0 - (density_per_mile / 20.0).min(1.0) * 0.5)
        * (1.0 - severity_ratio * 0.3)
        * (1.0 - recent_ratio * 0.2)
}

pub fn distance_factor(miles: f64) -> f64 {
    if miles < 2.0 {
        0.5
    } else if miles <= 5.0 + DISTANCE_BAND_TOLERANCE_MILES {
        0.0
    } else {
        (-0.5 - (miles - 5.0) * 0.1).max(-1.5)
    }
}

pub fn mode_factor(mode: TransportMode, miles: f64) -> f64 {
    match mode {
        TransportMode::Driving => 0.0,
        TransportMode::Walking if miles > 3.0 => -0.5,
        TransportMode::Walking => 0.5,
        TransportMode::Bicycling if miles > 5.0 => -1.0,
        TransportMode::Bicycling => -0.5,
        TransportMode::Transit if miles > 7.0 => 0.5,
        TransportMode::Transit => 0.3,
    }
}

pub fn base_weather_factor(weather: Weather) -> f64 {
    match weather {
        Weather::Clear => 0.5,
        Weather::Cloudy => 0.2,
        Weather::Other => 0.0,
        Weather::Windy => -0.5,
        Weather::Rain => -1.0,
        Weather::Fog => -1.5,
        Weather::Snow => -2.0,
        Weather::Storm => -2.5,
    }
}

/// Weather adjustment, amplified when the route's own history shows the
/// requested adverse weather is a dominant crash condition.
pub fn weather_factor(weather: Weather, route_records: &[&CrashRecord]) -> f64 {
    let factor = base_weather_factor(weather);
    if factor >= 0.0 || route_records.len() <= 15 {
        return factor;
    }
    let matching = route_records.iter().filter(|r| r.weather == weather).count();
    let share = matching as f64 / route_records.len() as f64;
    if matching > 5 && share > 0.3 {
        (factor * 1.5).max(-2.5)
    } else {
        factor
    }
}

pub fn traffic_factor(traffic: TrafficDensity) -> f64 {
    match traffic {
        TrafficDensity::Low => 1.0,
        TrafficDensity::Medium => 0.0,
        TrafficDensity::High => -1.0,
    }
}

/// Pushes confident scores further toward the ends of the scale for users who
/// weight safety and comfort. Scores in [5, 7] are left alone.
pub fn apply_preferences(combined: f64, preferences: &UserPreferences) -> f64 {
    let adjustment = (preferences.safety + preferences.comfort / 2.0) / 0.5;
    if combined > 7.0 {
        combined + (10.0 - combined) * adjustment * 0.5
    } else if combined < 5.0 {
        combined - (combined - 1.0) * adjustment * 0.5
    } else {
        combined
    }
}

pub fn alert_count(recent: usize, serious: usize) -> u32 {
    let alerts = recent / 3 + serious;
    u32::try_from(alerts).unwrap_or(MAX_ALERTS).min(MAX_ALERTS)
}

pub fn base_speed_mph(mode: TransportMode) -> f64 {
    match mode {
        TransportMode::Driving => 30.0,
        TransportMode::Walking => 3.0,
        TransportMode::Bicycling => 10.0,
        TransportMode::Transit => 15.0,
    }
}

pub fn estimated_duration_minutes(miles: f64, mode: TransportMode, traffic: TrafficDensity) -> f64 {
    let traffic_multiplier = match (mode, traffic) {
        (TransportMode::Driving | TransportMode::Transit, TrafficDensity::High) => 0.6,
        (TransportMode::Driving | TransportMode::Transit, TrafficDensity::Medium) => 0.8,
        _ => 1.0,
    };
    miles / (base_speed_mph(mode) * traffic_multiplier) * 60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crash::record::{InjurySeverity, TimeBucket};
    use time::macros::datetime;

    const ORIGIN: Coordinate = Coordinate::new(37.30, -121.90);

    fn north_of_origin(miles: f64) -> Coordinate {
        let km = miles / crate::geo::MILES_PER_KM;
        // Inverse haversine for a due-north offset.
        let degrees = (km / crate::geo::EARTH_RADIUS_KM).to_degrees();
        Coordinate::new(ORIGIN.latitude + degrees, ORIGIN.longitude)
    }

    fn request(mode: TransportMode) -> RouteRequest {
        RouteRequest {
            origin: "A".to_string(),
            destination: "B".to_string(),
            travel_time_bucket: TimeBucket::MorningRush,
            weather: Weather::Clear,
            traffic_density: TrafficDensity::Medium,
            transport_mode: mode,
            user_preferences: None,
        }
    }

    fn crash_on_route(hour: u8, severity: InjurySeverity, years_ago: f64) -> CrashRecord {
        let timestamp = datetime!(2021-06-01 0:00).replace_hour(hour).expect("hour");
        CrashRecord {
            timestamp,
            latitude: Some(ORIGIN.latitude + 0.001),
            longitude: Some(ORIGIN.longitude),
            injury_severity: severity,
            weather: Weather::Clear,
            collision_type: None,
            pedestrian_involved: None,
            location: None,
            hour,
            day_of_week: timestamp.weekday(),
            time_bucket: TimeBucket::from_hour(hour),
            years_ago,
        }
    }

    #[test]
    fn empty_dataset_uses_default_bucket_score() -> Result<(), ScoringError> {
        let destination = north_of_origin(5.0);

        let assessment = score_route(&request(TransportMode::Driving), ORIGIN, destination, &[], 1.0)?;

        let breakdown = assessment.component_breakdown.expect("breakdown");
        assert_eq!(breakdown.historical, 6.8);
        assert_eq!(breakdown.route, 8.0);
        assert_eq!(breakdown.conditions, 8.0);
        let expected = 0.6 * 6.8 + 0.25 * 8.0 + 0.15 * 8.0;
        assert!((assessment.final_score - expected).abs() < 1e-9);
        assert_eq!(assessment.display_score, 7.3);
        assert_eq!(assessment.crash_count, 0);
        assert_eq!(assessment.alert_count, 0);
        assert!(assessment.data_backed);
        assert!((assessment.route_length_miles - 5.0).abs() < 1e-6);
        assert_eq!(distance_factor(assessment.route_length_miles), 0.0);
        // 5 miles at 30 mph * 0.8
        assert!((assessment.estimated_duration_minutes - 12.5).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn historical_penalty_applies_density_severity_and_recency() {
        let summary = CrashSummary {
            count: 10,
            serious: 5,
            recent: 4,
        };

        let penalty = historical_penalty(&summary, 1.0);

        // density 10/mile -> 0.75; severity 0.5 -> 0.85; recent 0.4 -> 0.92
        assert!((penalty - 0.75 * 0.85 * 0.92).abs() < 1e-12);
        assert_eq!(historical_penalty(&CrashSummary::default(), 1.0), 1.0);
    }

    #[test]
    fn short_routes_use_minimum_length_for_density() {
        let summary = CrashSummary {
            count: 1,
            serious: 0,
            recent: 0,
        };
        // 1 crash / 0.1 mile = 10 per mile -> 0.75
        assert!((historical_penalty(&summary, 0.0) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn distance_factor_bands() {
        assert_eq!(distance_factor(1.0), 0.5);
        assert_eq!(distance_factor(2.0), 0.0);
        assert_eq!(distance_factor(5.0), 0.0);
        assert_eq!(distance_factor(5.0 + 1e-12), 0.0);
        assert!((distance_factor(7.0) - -0.7).abs() < 1e-12);
        assert_eq!(distance_factor(40.0), -1.5);
    }

    #[test]
    fn mode_factor_switches_past_thresholds() {
        assert_eq!(mode_factor(TransportMode::Walking, 3.0), 0.5);
        assert_eq!(mode_factor(TransportMode::Walking, 3.1), -0.5);
        assert_eq!(mode_factor(TransportMode::Bicycling, 5.0), -0.5);
        assert_eq!(mode_factor(TransportMode::Bicycling, 5.1), -1.0);
        assert_eq!(mode_factor(TransportMode::Transit, 7.0), 0.3);
        assert_eq!(mode_factor(TransportMode::Transit, 7.1), 0.5);
        assert_eq!(mode_factor(TransportMode::Driving, 100.0), 0.0);
    }

    #[test]
    fn dominant_adverse_weather_is_amplified() {
        let mut records: Vec<CrashRecord> = (0..16)
            .map(|_| crash_on_route(8, InjurySeverity::Minor, 1.0))
            .collect();
        for record in records.iter_mut().take(6) {
            record.weather = Weather::Rain;
        }
        let refs: Vec<&CrashRecord> = records.iter().collect();

        assert_eq!(weather_factor(Weather::Rain, &refs), -1.5);
        assert_eq!(weather_factor(Weather::Fog, &refs), -1.5);
        assert_eq!(weather_factor(Weather::Clear, &refs), 0.5);

        for record in records.iter_mut() {
            record.weather = Weather::Snow;
        }
        let refs: Vec<&CrashRecord> = records.iter().collect();
        assert_eq!(weather_factor(Weather::Snow, &refs), -2.5);

        let few: Vec<&CrashRecord> = records.iter().take(15).collect();
        assert_eq!(weather_factor(Weather::Snow, &few), -2.0);
    }

    #[test]
    fn preferences_sharpen_extremes_only() {
        let preferences = UserPreferences {
            time_efficiency: 0.2,
            safety: 0.5,
            comfort: 0.2,
            scenic: 0.1,
        };

        let high = apply_preferences(8.0, &preferences);
        assert!((high - 9.2).abs() < 1e-9, "got {high}");

        assert_eq!(apply_preferences(6.0, &preferences), 6.0);

        let low = apply_preferences(3.0, &preferences);
        // 3.0 - (3.0 - 1.0) * 1.2 * 0.5
        assert!((low - 1.8).abs() < 1e-9, "got {low}");
    }

    #[test]
    fn alert_count_is_capped() {
        assert_eq!(alert_count(0, 0), 0);
        assert_eq!(alert_count(7, 1), 3);
        assert_eq!(alert_count(90, 4), 10);
    }

    #[test]
    fn duration_scales_with_traffic_for_motorized_modes() {
        assert!((estimated_duration_minutes(15.0, TransportMode::Driving, TrafficDensity::Low) - 30.0).abs() < 1e-9);
        assert!((estimated_duration_minutes(9.0, TransportMode::Transit, TrafficDensity::High) - 60.0).abs() < 1e-9);
        assert!((estimated_duration_minutes(3.0, TransportMode::Walking, TrafficDensity::High) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn walking_uses_pedestrian_subset_only_when_large_enough() {
        let mut records: Vec<CrashRecord> = (0..10)
            .map(|_| crash_on_route(12, InjurySeverity::Minor, 1.0))
            .collect();
        for record in records.iter_mut().take(5) {
            record.pedestrian_involved = Some(true);
        }
        let refs: Vec<&CrashRecord> = records.iter().collect();
        assert_eq!(select_mode_records(refs, TransportMode::Walking).len(), 10);

        records[5].collision_type = Some("Vehicle/Pedestrian".to_string());
        let refs: Vec<&CrashRecord> = records.iter().collect();
        assert_eq!(select_mode_records(refs, TransportMode::Walking).len(), 6);
    }

    #[test]
    fn crashes_near_route_lower_the_historical_score() -> Result<(), ScoringError> {
        let destination = north_of_origin(4.0);
        let records = vec![
            crash_on_route(8, InjurySeverity::Fatal, 0.5),
            crash_on_route(12, InjurySeverity::Minor, 5.0),
        ];

        let assessment = score_route(
            &request(TransportMode::Driving),
            ORIGIN,
            destination,
            &records,
            1.0,
        )?;

        assert_eq!(assessment.crash_count, 2);
        assert_eq!(assessment.bucket_scores[&TimeBucket::MorningRush], 1.0);
        let breakdown = assessment.component_breakdown.expect("breakdown");
        assert!(breakdown.historical < 1.0);
        assert_eq!(assessment.alert_count, 1);
        assert!((1.0..=10.0).contains(&assessment.final_score));
        Ok(())
    }

    #[test]
    fn invalid_coordinates_are_a_computation_error() {
        let result = score_route(
            &request(TransportMode::Driving),
            Coordinate::new(f64::NAN, 0.0),
            ORIGIN,
            &[],
            1.0,
        );
        assert!(matches!(result, Err(ScoringError::InvalidCoordinate)));
    }
}
