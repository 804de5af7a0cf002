use crate::advisor::DepartureAdvice;
use crate::crash::stats::DatasetStats;
use crate::scoring::SafetyAssessment;
use crate::scoring::risk::RiskPrediction;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RouteSafetySuccessResponse {
    #[serde(flatten)]
    pub assessment: SafetyAssessment,
    pub risk: RiskPrediction,
    /// False when a location could not be resolved and no route was scored.
    pub geocoded: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DepartureSuccessResponse {
    #[serde(flatten)]
    pub advice: DepartureAdvice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_length_miles: Option<f64>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StatsSuccessResponse {
    #[serde(flatten)]
    pub stats: DatasetStats,
    pub skipped_rows: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub model: String,
    pub records: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorResponse {
    pub error_code: ErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    InvalidArrivalTime,
    InternalError,
}
