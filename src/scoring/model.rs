//! Safety model trait for pluggable route scoring.
//!
//! Models are selected via `[scoring].model` in `config.toml` and built once at
//! startup.

use crate::crash::dataset::CrashDataset;
use crate::geo::{Coordinate, DEFAULT_MAX_DISTANCE_KM, haversine_miles};
use crate::request::RouteRequest;
use crate::scoring::SafetyAssessment;
use crate::scoring::composite::score_route;
use crate::scoring::fallback::heuristic_assessment;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

pub const CRASH_HISTORY_MODEL: &str = "crash_history";
pub const HEURISTIC_MODEL: &str = "heuristic";

/// Trait for models that turn a resolved route into a safety assessment.
///
/// `assess` is total: implementations degrade to a heuristic result instead
/// of failing.
pub trait SafetyModel: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn assess(
        &self,
        request: &RouteRequest,
        origin: Coordinate,
        destination: Coordinate,
    ) -> SafetyAssessment;

    /// Assessment for a route whose endpoints could not be resolved. There is
    /// no route length, so no distance-dependent adjustment applies.
    fn assess_unresolved(&self, request: &RouteRequest) -> SafetyAssessment {
        heuristic_assessment(request, None)
    }
}

/// Condition-only model. Never looks at crash history.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicModel;

impl SafetyModel for HeuristicModel {
    fn name(&self) -> &'static str {
        HEURISTIC_MODEL
    }

    fn assess(
        &self,
        request: &RouteRequest,
        origin: Coordinate,
        destination: Coordinate,
    ) -> SafetyAssessment {
        let miles = (origin.is_valid() && destination.is_valid())
            .then(|| haversine_miles(origin, destination));
        heuristic_assessment(request, miles)
    }
}

/// Scores routes from historical crashes near the route, falling back to
/// [`HeuristicModel`] when the computation fails.
#[derive(Debug)]
pub struct CrashHistoryModel {
    dataset: Arc<CrashDataset>,
    max_distance_km: f64,
    fallback: HeuristicModel,
}

impl CrashHistoryModel {
    pub fn new(dataset: Arc<CrashDataset>, max_distance_km: f64) -> Self {
        Self {
            dataset,
            max_distance_km,
            fallback: HeuristicModel,
        }
    }

    pub fn dataset(&self) -> &CrashDataset {
        &self.dataset
    }
}

impl SafetyModel for CrashHistoryModel {
    fn name(&self) -> &'static str {
        CRASH_HISTORY_MODEL
    }

    fn assess(
        &self,
        request: &RouteRequest,
        origin: Coordinate,
        destination: Coordinate,
    ) -> SafetyAssessment {
        match score_route(
            request,
            origin,
            destination,
            self.dataset.records(),
            self.max_distance_km,
        ) {
            Ok(assessment) => assessment,
            Err(err) => {
                warn!(error = %err, "Crash history scoring failed");
                warn!("Falling back to heuristic model");
                self.fallback.assess(request, origin, destination)
            }
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("unknown scoring model: {0}")]
    UnknownModel(String),
    #[error("max_distance_km must be a non-negative number, got {0}")]
    InvalidDistance(f64),
}

// Model Factory
pub fn create_model(
    name: &str,
    dataset: Arc<CrashDataset>,
    max_distance_km: Option<f64>,
) -> Result<Box<dyn SafetyModel>, ModelError> {
    let max_distance_km = max_distance_km.unwrap_or(DEFAULT_MAX_DISTANCE_KM);
    if !max_distance_km.is_finite() || max_distance_km < 0.0 {
        return Err(ModelError::InvalidDistance(max_distance_km));
    }

    match name {
        CRASH_HISTORY_MODEL => Ok(Box::new(CrashHistoryModel::new(dataset, max_distance_km))),
        HEURISTIC_MODEL => Ok(Box::new(HeuristicModel)),
        other => Err(ModelError::UnknownModel(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crash::record::{TimeBucket, Weather};
    use crate::request::{TrafficDensity, TransportMode};

    fn request() -> RouteRequest {
        RouteRequest {
            origin: "A".to_string(),
            destination: "B".to_string(),
            travel_time_bucket: TimeBucket::MidDay,
            weather: Weather::Clear,
            traffic_density: TrafficDensity::Low,
            transport_mode: TransportMode::Bicycling,
            user_preferences: None,
        }
    }

    #[test]
    fn crash_history_model_falls_back_on_bad_coordinates() {
        let model = CrashHistoryModel::new(Arc::new(CrashDataset::empty()), 1.0);

        let assessment = model.assess(
            &request(),
            Coordinate::new(f64::NAN, -121.9),
            Coordinate::new(37.3, -121.9),
        );

        assert!(!assessment.data_backed);
        assert_eq!(assessment.route_length_miles, 0.0);
        assert!((1.0..=10.0).contains(&assessment.final_score));
    }

    #[test]
    fn heuristic_model_keeps_route_length() {
        let assessment = HeuristicModel.assess(
            &request(),
            Coordinate::new(37.30, -121.90),
            Coordinate::new(37.31, -121.90),
        );

        assert!(!assessment.data_backed);
        assert!(assessment.route_length_miles > 0.6);
        assert!(assessment.estimated_duration_minutes > 0.0);
    }

    #[test]
    fn unresolved_routes_have_no_distance() {
        let model = CrashHistoryModel::new(Arc::new(CrashDataset::empty()), 1.0);

        let assessment = model.assess_unresolved(&request());

        assert!(!assessment.data_backed);
        assert_eq!(assessment.route_length_miles, 0.0);
        assert_eq!(assessment.crash_count, 0);
    }

    #[test]
    fn factory_builds_known_models() -> Result<(), ModelError> {
        let dataset = Arc::new(CrashDataset::empty());

        assert_eq!(
            create_model(CRASH_HISTORY_MODEL, Arc::clone(&dataset), None)?.name(),
            CRASH_HISTORY_MODEL
        );
        assert_eq!(
            create_model(HEURISTIC_MODEL, Arc::clone(&dataset), Some(2.0))?.name(),
            HEURISTIC_MODEL
        );
        Ok(())
    }

    #[test]
    fn factory_rejects_unknown_model_and_bad_distance() {
        let dataset = Arc::new(CrashDataset::empty());

        assert_eq!(
            create_model("random_forest", Arc::clone(&dataset), None).err(),
            Some(ModelError::UnknownModel("random_forest".to_string()))
        );
        assert_eq!(
            create_model(CRASH_HISTORY_MODEL, dataset, Some(-1.0)).err(),
            Some(ModelError::InvalidDistance(-1.0))
        );
    }
}
