//! Condition-only safety estimate used when crash history cannot be applied.
//!
//! Baseline safety is 7.0; each condition adds a signed delta and the result
//! is clamped to [1, 10].

use crate::crash::record::{TimeBucket, Weather};
use crate::request::{RouteRequest, TrafficDensity};
use crate::scoring::composite::estimated_duration_minutes;
use crate::scoring::risk::SafetyLevel;
use crate::scoring::{BucketScores, SafetyAssessment, clamp_score, round_score};

pub const BASELINE_SAFETY: f64 = 7.0;

pub fn time_delta(bucket: TimeBucket) -> f64 {
    match bucket {
        TimeBucket::EarlyMorning => 0.3,
        TimeBucket::LateNight => -1.0,
        TimeBucket::MidDay => -1.1,
        TimeBucket::Evening => -1.2,
        TimeBucket::MorningRush => -1.5,
        TimeBucket::EveningRush => -1.5,
    }
}

pub fn weather_delta(weather: Weather) -> f64 {
    match weather {
        Weather::Clear => 0.5,
        Weather::Cloudy => 0.2,
        Weather::Other => 0.0,
        Weather::Windy => -0.3,
        Weather::Rain => -0.7,
        Weather::Fog => -1.0,
        Weather::Snow => -1.5,
        Weather::Storm => -2.0,
    }
}

pub fn traffic_delta(traffic: TrafficDensity) -> f64 {
    match traffic {
        TrafficDensity::Low => 0.8,
        TrafficDensity::Medium => -0.2,
        TrafficDensity::High => -1.0,
    }
}

pub fn fallback_score(request: &RouteRequest) -> f64 {
    fallback_score_for(
        request.travel_time_bucket,
        request.weather,
        request.traffic_density,
    )
}

pub fn fallback_score_for(bucket: TimeBucket, weather: Weather, traffic: TrafficDensity) -> f64 {
    clamp_score(BASELINE_SAFETY + time_delta(bucket) + weather_delta(weather) + traffic_delta(traffic))
}

/// Builds a heuristic assessment. `route_length_miles` is `None` when the
/// route could not be resolved; distance-dependent fields are then zero.
pub fn heuristic_assessment(
    request: &RouteRequest,
    route_length_miles: Option<f64>,
) -> SafetyAssessment {
    let bucket_scores: BucketScores = TimeBucket::ALL
        .iter()
        .map(|bucket| {
            (
                *bucket,
                fallback_score_for(*bucket, request.weather, request.traffic_density),
            )
        })
        .collect();
    let final_score = fallback_score(request);
    let route_length_miles = route_length_miles
        .filter(|miles| miles.is_finite() && *miles >= 0.0)
        .unwrap_or(0.0);

    SafetyAssessment {
        final_score,
        display_score: round_score(final_score),
        safety_level: SafetyLevel::from_score(final_score),
        bucket_scores,
        crash_count: 0,
        route_length_miles,
        estimated_duration_minutes: estimated_duration_minutes(
            route_length_miles,
            request.transport_mode,
            request.traffic_density,
        ),
        alert_count: 0,
        component_breakdown: None,
        data_backed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::TransportMode;

    const WEATHERS: [Weather; 8] = [
        Weather::Clear,
        Weather::Cloudy,
        Weather::Rain,
        Weather::Snow,
        Weather::Fog,
        Weather::Windy,
        Weather::Storm,
        Weather::Other,
    ];
    const TRAFFIC: [TrafficDensity; 3] = [
        TrafficDensity::Low,
        TrafficDensity::Medium,
        TrafficDensity::High,
    ];

    fn request(bucket: TimeBucket, weather: Weather, traffic: TrafficDensity) -> RouteRequest {
        RouteRequest {
            origin: "A".to_string(),
            destination: "B".to_string(),
            travel_time_bucket: bucket,
            weather,
            traffic_density: traffic,
            transport_mode: TransportMode::Driving,
            user_preferences: None,
        }
    }

    #[test]
    fn every_combination_is_in_range() {
        for bucket in TimeBucket::ALL {
            for weather in WEATHERS {
                for traffic in TRAFFIC {
                    let score = fallback_score(&request(bucket, weather, traffic));
                    assert!((1.0..=10.0).contains(&score), "{bucket} {weather} -> {score}");
                }
            }
        }
    }

    #[test]
    fn time_deltas_follow_expected_ordering() {
        let d = time_delta;
        assert!(d(TimeBucket::EarlyMorning) > d(TimeBucket::LateNight));
        assert!(d(TimeBucket::LateNight) > d(TimeBucket::MidDay));
        assert!(d(TimeBucket::MidDay) > d(TimeBucket::Evening));
        assert!(d(TimeBucket::Evening) > d(TimeBucket::MorningRush));
        assert_eq!(d(TimeBucket::MorningRush), d(TimeBucket::EveningRush));
    }

    #[test]
    fn weather_and_traffic_deltas_are_monotonic() {
        assert!(weather_delta(Weather::Clear) >= weather_delta(Weather::Cloudy));
        assert!(weather_delta(Weather::Cloudy) > weather_delta(Weather::Rain));
        assert!(weather_delta(Weather::Rain) > weather_delta(Weather::Fog));
        assert!(weather_delta(Weather::Fog) > weather_delta(Weather::Snow));
        assert!(weather_delta(Weather::Fog) > weather_delta(Weather::Storm));

        assert!(traffic_delta(TrafficDensity::Low) > traffic_delta(TrafficDensity::Medium));
        assert!(traffic_delta(TrafficDensity::Medium) > traffic_delta(TrafficDensity::High));
    }

    #[test]
    fn heuristic_assessment_is_flagged_and_complete() {
        let req = request(TimeBucket::MorningRush, Weather::Rain, TrafficDensity::High);

        let assessment = heuristic_assessment(&req, None);

        assert!(!assessment.data_backed);
        assert_eq!(assessment.bucket_scores.len(), 6);
        assert_eq!(assessment.route_length_miles, 0.0);
        assert_eq!(assessment.estimated_duration_minutes, 0.0);
        // 7.0 - 1.5 - 0.7 - 1.0
        assert!((assessment.final_score - 3.8).abs() < 1e-9);
        assert_eq!(assessment.display_score, 3.8);
    }
}
