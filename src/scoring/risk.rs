use crate::crash::record::{TimeBucket, Weather};
use serde::Serialize;
use std::collections::BTreeMap;
use time::Weekday;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    High,
    Moderate,
    Caution,
    Low,
}

impl SafetyLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            SafetyLevel::High
        } else if score >= 6.0 {
            SafetyLevel::Moderate
        } else if score >= 4.0 {
            SafetyLevel::Caution
        } else {
            SafetyLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskPrediction {
    pub risk_level: RiskLevel,
    pub probability: f64,
    pub class_probabilities: BTreeMap<RiskLevel, f64>,
}

/// Rule-based incident risk for a trip's conditions.
///
/// Rush hours and late night raise risk, adverse weather raises it further,
/// and Friday/Saturday trips add a weekend bump.
pub fn classify_risk(bucket: TimeBucket, weather: Weather, day: Option<Weekday>) -> RiskPrediction {
    let (mut level, mut probability) = (RiskLevel::Medium, 0.6);

    if bucket.is_rush_hour() {
        (level, probability) = (RiskLevel::High, 0.8);
    } else if bucket == TimeBucket::LateNight {
        (level, probability) = (RiskLevel::High, 0.75);
    }

    if weather.is_adverse() {
        (level, probability) = (RiskLevel::High, 0.82);
    }

    if matches!(day, Some(Weekday::Friday | Weekday::Saturday)) {
        if level == RiskLevel::High {
            probability += 0.05;
        } else {
            (level, probability) = (RiskLevel::Medium, 0.65);
        }
    }

    RiskPrediction {
        risk_level: level,
        probability,
        class_probabilities: class_probabilities(level, probability),
    }
}

fn class_probabilities(level: RiskLevel, probability: f64) -> BTreeMap<RiskLevel, f64> {
    let (low, medium, high) = match level {
        RiskLevel::High => (0.05, 1.0 - probability - 0.05, probability),
        RiskLevel::Medium => (0.2, probability, 1.0 - probability - 0.2),
        RiskLevel::Low => (probability, 0.3, 1.0 - probability - 0.3),
    };
    BTreeMap::from([
        (RiskLevel::Low, low),
        (RiskLevel::Medium, medium),
        (RiskLevel::High, high),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safety_level_thresholds() {
        assert_eq!(SafetyLevel::from_score(9.1), SafetyLevel::High);
        assert_eq!(SafetyLevel::from_score(8.0), SafetyLevel::High);
        assert_eq!(SafetyLevel::from_score(7.99), SafetyLevel::Moderate);
        assert_eq!(SafetyLevel::from_score(4.0), SafetyLevel::Caution);
        assert_eq!(SafetyLevel::from_score(1.0), SafetyLevel::Low);
    }

    #[test]
    fn calm_midday_is_medium_risk() {
        let risk = classify_risk(TimeBucket::MidDay, Weather::Clear, Some(Weekday::Tuesday));
        assert_eq!(risk.risk_level, RiskLevel::Medium);
        assert_eq!(risk.probability, 0.6);
    }

    #[test]
    fn adverse_weather_overrides_time_risk() {
        let risk = classify_risk(TimeBucket::LateNight, Weather::Fog, None);
        assert_eq!(risk.risk_level, RiskLevel::High);
        assert_eq!(risk.probability, 0.82);
    }

    #[test]
    fn weekend_bumps_high_risk_and_sets_medium_otherwise() {
        let rush = classify_risk(TimeBucket::EveningRush, Weather::Clear, Some(Weekday::Friday));
        assert_eq!(rush.risk_level, RiskLevel::High);
        assert!((rush.probability - 0.85).abs() < 1e-12);

        let calm = classify_risk(TimeBucket::Evening, Weather::Clear, Some(Weekday::Saturday));
        assert_eq!(calm.risk_level, RiskLevel::Medium);
        assert_eq!(calm.probability, 0.65);
    }

    #[test]
    fn class_probabilities_sum_to_one() {
        for bucket in TimeBucket::ALL {
            for weather in [Weather::Clear, Weather::Storm] {
                for day in [None, Some(Weekday::Saturday)] {
                    let risk = classify_risk(bucket, weather, day);
                    let total: f64 = risk.class_probabilities.values().sum();
                    assert!((total - 1.0).abs() < 1e-9);
                    assert!(risk.class_probabilities.values().all(|p| *p >= 0.0));
                }
            }
        }
    }
}
