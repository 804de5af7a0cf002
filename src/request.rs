use crate::crash::record::{TimeBucket, Weather};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const PREFERENCE_SUM_MIN: f64 = 0.8;
pub const PREFERENCE_SUM_MAX: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficDensity {
    Low,
    Medium,
    High,
}

impl TrafficDensity {
    pub fn as_str(self) -> &'static str {
        match self {
            TrafficDensity::Low => "low",
            TrafficDensity::Medium => "medium",
            TrafficDensity::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TransportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Driving => "driving",
            TransportMode::Walking => "walking",
            TransportMode::Bicycling => "bicycling",
            TransportMode::Transit => "transit",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub time_efficiency: f64,
    #[serde(default)]
    pub safety: f64,
    #[serde(default)]
    pub comfort: f64,
    #[serde(default)]
    pub scenic: f64,
}

impl UserPreferences {
    pub fn sum(&self) -> f64 {
        self.time_efficiency + self.safety + self.comfort + self.scenic
    }

    /// Checks the weights and rescales them to sum to 1.
    pub fn normalized(&self) -> Result<Self, InvalidRequestError> {
        let weights = [self.time_efficiency, self.safety, self.comfort, self.scenic];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(InvalidRequestError::PreferenceWeight);
        }
        let sum = self.sum();
        if !(PREFERENCE_SUM_MIN..=PREFERENCE_SUM_MAX).contains(&sum) {
            return Err(InvalidRequestError::PreferenceSum(sum));
        }
        Ok(Self {
            time_efficiency: self.time_efficiency / sum,
            safety: self.safety / sum,
            comfort: self.comfort / sum,
            scenic: self.scenic / sum,
        })
    }
}

/// One user query. Enum fields reject unknown values at deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin: String,
    pub destination: String,
    pub travel_time_bucket: TimeBucket,
    pub weather: Weather,
    pub traffic_density: TrafficDensity,
    pub transport_mode: TransportMode,
    #[serde(default)]
    pub user_preferences: Option<UserPreferences>,
}

#[derive(Debug, Error, PartialEq)]
pub enum InvalidRequestError {
    #[error("{0} location is required")]
    MissingLocation(&'static str),
    #[error("preference weights must be finite and non-negative")]
    PreferenceWeight,
    #[error("preference weights must sum to between 0.8 and 1.2, got {0}")]
    PreferenceSum(f64),
}

impl RouteRequest {
    /// Validates the request and returns a copy with trimmed locations and
    /// normalized preference weights.
    pub fn validated(&self) -> Result<Self, InvalidRequestError> {
        let origin = self.origin.trim();
        if origin.is_empty() {
            return Err(InvalidRequestError::MissingLocation("origin"));
        }
        let destination = self.destination.trim();
        if destination.is_empty() {
            return Err(InvalidRequestError::MissingLocation("destination"));
        }
        let user_preferences = self
            .user_preferences
            .as_ref()
            .map(UserPreferences::normalized)
            .transpose()?;

        Ok(Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            user_preferences,
            ..self.clone()
        })
    }
}
