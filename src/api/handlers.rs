use crate::advisor::{AdvisorError, DepartureRequest, recommend_departure};
use crate::api::responses::{
    DepartureSuccessResponse, ErrorCode, ErrorResponse, HealthStatus, HealthSuccessResponse,
    RouteSafetySuccessResponse, StatsSuccessResponse,
};
use crate::geo::haversine_miles;
use crate::request::RouteRequest;
use crate::scoring::risk::classify_risk;
use crate::scoring::{RouteError, assess_route};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

pub enum ApiResponse<T> {
    Success(T),
    Error {
        status: StatusCode,
        body: ErrorResponse,
    },
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn post_route_safety(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> impl IntoResponse {
    match payload {
        Ok(Json(request)) => build_route_response(&state, &request, SystemTime::now()),
        Err(rejection) => invalid_request(rejection.body_text(), SystemTime::now()),
    }
}

pub async fn post_departure(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DepartureRequest>, JsonRejection>,
) -> impl IntoResponse {
    match payload {
        Ok(Json(request)) => build_departure_response(&state, &request, SystemTime::now()),
        Err(rejection) => invalid_request(rejection.body_text(), SystemTime::now()),
    }
}

pub async fn get_crash_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    build_stats_response(&state, SystemTime::now())
}

pub async fn get_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    build_health_response(&state, SystemTime::now())
}

fn build_route_response(
    state: &AppState,
    request: &RouteRequest,
    now: SystemTime,
) -> ApiResponse<RouteSafetySuccessResponse> {
    let (assessment, geocoded) =
        match assess_route(state.model(), state.geocoder(), request) {
            Ok(assessment) => (assessment, true),
            Err(RouteError::InvalidRequest(err)) => {
                return invalid_request(err.to_string(), now);
            }
            Err(RouteError::Geocode(err)) => {
                warn!(error = %err, "Geocoding failed, scoring conditions only");
                (state.model().assess_unresolved(request), false)
            }
        };
    let weekday = OffsetDateTime::from(now).weekday();
    let risk = classify_risk(request.travel_time_bucket, request.weather, Some(weekday));

    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success(RouteSafetySuccessResponse {
            assessment,
            risk,
            geocoded,
            timestamp,
        }),
        Err(err) => internal_error("/api/route/safety", &err.to_string()),
    }
}

fn build_departure_response(
    state: &AppState,
    request: &DepartureRequest,
    now: SystemTime,
) -> ApiResponse<DepartureSuccessResponse> {
    let geocoder = state.geocoder();
    let route_length_miles = match (
        geocoder.resolve(&request.origin),
        geocoder.resolve(&request.destination),
    ) {
        (Ok(origin), Ok(destination)) => Some(haversine_miles(origin, destination)),
        (Err(err), _) | (_, Err(err)) => {
            warn!(error = %err, "Geocoding failed, using typical trip duration");
            None
        }
    };

    let advice = match recommend_departure(request, route_length_miles) {
        Ok(advice) => advice,
        Err(err @ AdvisorError::InvalidArrivalTime(_)) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidArrivalTime,
                err.to_string(),
                now,
            );
        }
        Err(err @ AdvisorError::Format) => {
            return internal_error("/api/departure", &err.to_string());
        }
    };

    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success(DepartureSuccessResponse {
            advice,
            route_length_miles,
            timestamp,
        }),
        Err(err) => internal_error("/api/departure", &err.to_string()),
    }
}

fn build_stats_response(state: &AppState, now: SystemTime) -> ApiResponse<StatsSuccessResponse> {
    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success(StatsSuccessResponse {
            stats: state.stats().clone(),
            skipped_rows: state.dataset().skipped(),
            timestamp,
        }),
        Err(err) => internal_error("/api/crashes/stats", &err.to_string()),
    }
}

fn build_health_response(state: &AppState, now: SystemTime) -> ApiResponse<HealthSuccessResponse> {
    let records = state.dataset().len();
    let status = if records == 0 {
        HealthStatus::Degraded
    } else {
        HealthStatus::Ok
    };

    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success(HealthSuccessResponse {
            status,
            model: state.model().name().to_string(),
            records,
            timestamp,
        }),
        Err(err) => internal_error("/api/health", &err.to_string()),
    }
}

fn invalid_request<T>(message: String, now: SystemTime) -> ApiResponse<T> {
    error_response(StatusCode::BAD_REQUEST, ErrorCode::InvalidRequest, message, now)
}

fn error_response<T>(
    status: StatusCode,
    error_code: ErrorCode,
    error_message: String,
    now: SystemTime,
) -> ApiResponse<T> {
    ApiResponse::Error {
        status,
        body: ErrorResponse {
            error_code,
            error_message,
            timestamp: fallback_timestamp(now),
        },
    }
}

fn internal_error<T>(endpoint: &str, message: &str) -> ApiResponse<T> {
    error!(
        endpoint = endpoint,
        message = message,
        "Internal error while handling request"
    );
    ApiResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            error_code: ErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: fallback_timestamp(SystemTime::now()),
        },
    }
}

fn fallback_timestamp(now: SystemTime) -> String {
    format_timestamp(now).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format error timestamp");
        OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
    })
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, TimestampError> {
    let datetime = OffsetDateTime::from(timestamp);
    datetime.format(&Rfc3339).map_err(TimestampError::Format)
}
