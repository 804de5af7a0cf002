use crate::crash::record::TimeBucket;
use crate::geocode::{GeocodeError, Geocoder};
use crate::request::{InvalidRequestError, RouteRequest};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

pub mod bucket;
pub mod composite;
pub mod fallback;
pub mod model;
pub mod risk;

use model::SafetyModel;
use risk::SafetyLevel;

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 10.0;

pub type BucketScores = BTreeMap<TimeBucket, f64>;

/// The three weighted inputs of a data-backed score, kept for explanation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentBreakdown {
    pub historical: f64,
    pub route: f64,
    pub conditions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyAssessment {
    /// Unrounded score in [1, 10].
    pub final_score: f64,
    /// `final_score` rounded to one decimal.
    pub display_score: f64,
    pub safety_level: SafetyLevel,
    pub bucket_scores: BucketScores,
    pub crash_count: usize,
    pub route_length_miles: f64,
    pub estimated_duration_minutes: f64,
    pub alert_count: u32,
    pub component_breakdown: Option<ComponentBreakdown>,
    /// False when the score came from the condition-only fallback.
    pub data_backed: bool,
}

/// Failures inside composite scoring. These never reach callers of a
/// [`SafetyModel`]; they are converted into a heuristic result.
#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("route endpoints are not valid coordinates")]
    InvalidCoordinate,
    #[error("non-finite value computed for {0}")]
    NonFinite(&'static str),
    #[error("no score computed for bucket {0}")]
    MissingBucket(TimeBucket),
}

/// Errors a caller of [`assess_route`] has to handle itself.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    InvalidRequest(#[from] InvalidRequestError),
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
}

pub fn clamp_score(score: f64) -> f64 {
    score.clamp(MIN_SCORE, MAX_SCORE)
}

pub fn round_score(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<f64, ScoringError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScoringError::NonFinite(name))
    }
}

/// Validates the request, resolves both endpoints and scores the route.
///
/// Invalid requests and unresolvable locations are returned as errors; every
/// other failure is absorbed by the model's fallback.
pub fn assess_route(
    model: &dyn SafetyModel,
    geocoder: &dyn Geocoder,
    request: &RouteRequest,
) -> Result<SafetyAssessment, RouteError> {
    let request = request.validated()?;
    let origin = geocoder.resolve(&request.origin)?;
    let destination = geocoder.resolve(&request.destination)?;

    let assessment = model.assess(&request, origin, destination);
    if assessment.data_backed {
        info!(
            model = model.name(),
            score = assessment.display_score,
            crashes = assessment.crash_count,
            "Route assessed"
        );
    } else {
        warn!(
            model = model.name(),
            score = assessment.display_score,
            "Route assessed with heuristic fallback"
        );
    }
    Ok(assessment)
}
