use crate::api::responses::{
    HealthStatus, HealthSuccessResponse, SimulationErrorCode, SimulationErrorResponse,
    SimulationRequest, SimulationSuccessResponse,
};
use crate::report::run_and_report;
use crate::simulation::SimulationConfig;
use crate::simulation::arrivals::resolve_seed;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info};

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

pub enum SimulationResponse {
    Success(SimulationSuccessResponse),
    Error {
        status: StatusCode,
        body: SimulationErrorResponse,
    },
}

impl IntoResponse for SimulationResponse {
    fn into_response(self) -> Response {
        match self {
            SimulationResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            SimulationResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn post_simulation(
    State(state): State<Arc<RwLock<AppState>>>,
    Json(request): Json<SimulationRequest>,
) -> impl IntoResponse {
    // The engine is a long synchronous loop; keep it off the async workers.
    let run = tokio::task::spawn_blocking(move || build_run_response(state, request));
    match run.await {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, "Simulation task failed");
            internal_error("/api/simulations", "simulation task failed")
        }
    }
}

pub async fn get_latest(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    build_latest_response(state)
}

pub async fn get_health(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    build_health_response(state, SystemTime::now())
}

fn build_run_response(
    state: Arc<RwLock<AppState>>,
    request: SimulationRequest,
) -> SimulationResponse {
    let config =
        match SimulationConfig::new(request.arrival_rate, request.service_time, request.spaces) {
            Ok(config) => config,
            Err(err) => return invalid_input_response(err.to_string(), SystemTime::now()),
        };

    let mut settings = match state.read() {
        Ok(guard) => guard.settings().clone(),
        Err(_) => {
            return internal_error("/api/simulations", "state lock poisoned while reading settings");
        }
    };
    if let Some(policy) = request.policy {
        settings.policy = policy;
    }
    let seed = resolve_seed(request.seed.or(settings.seed));

    info!(
        arrival_rate = config.arrival_rate,
        service_time = config.service_time,
        spaces = config.spaces,
        seed,
        "Running simulation for API request"
    );
    let report = run_and_report(config, settings, seed);
    let finished_at = SystemTime::now();

    match state.write() {
        Ok(mut guard) => guard.record_run(report.clone(), finished_at),
        Err(_) => {
            return internal_error("/api/simulations", "state lock poisoned while storing report");
        }
    }

    success_response(report, finished_at)
}

fn build_latest_response(state: Arc<RwLock<AppState>>) -> SimulationResponse {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return internal_error(
                "/api/simulations/latest",
                "state lock poisoned while reading latest run",
            );
        }
    };
    let latest = guard.latest().cloned();
    drop(guard);

    match latest {
        Some(run) => success_response(run.report, run.finished_at),
        None => no_data_response(SystemTime::now()),
    }
}

fn success_response(
    report: crate::report::SimulationReport,
    timestamp: SystemTime,
) -> SimulationResponse {
    match format_timestamp(timestamp) {
        Ok(formatted) => SimulationResponse::Success(SimulationSuccessResponse {
            report,
            timestamp: formatted,
        }),
        Err(_err) => internal_error("/api/simulations", "timestamp formatting failure"),
    }
}

fn invalid_input_response(message: String, timestamp: SystemTime) -> SimulationResponse {
    match format_timestamp(timestamp) {
        Ok(formatted) => SimulationResponse::Error {
            status: StatusCode::BAD_REQUEST,
            body: SimulationErrorResponse {
                error_code: SimulationErrorCode::InvalidInput,
                error_message: message,
                timestamp: formatted,
            },
        },
        Err(_err) => internal_error("/api/simulations", "timestamp formatting failure"),
    }
}

fn no_data_response(timestamp: SystemTime) -> SimulationResponse {
    match format_timestamp(timestamp) {
        Ok(formatted) => SimulationResponse::Error {
            status: StatusCode::NOT_FOUND,
            body: SimulationErrorResponse {
                error_code: SimulationErrorCode::NoData,
                error_message: "No simulation has been run yet".to_string(),
                timestamp: formatted,
            },
        },
        Err(_err) => internal_error("/api/simulations/latest", "timestamp formatting failure"),
    }
}

fn internal_error(route: &str, message: &str) -> SimulationResponse {
    error!(route, message = message, "Internal error while handling request");
    SimulationResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: SimulationErrorResponse {
            error_code: SimulationErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: now_or_epoch(),
        },
    }
}

fn build_health_response(state: Arc<RwLock<AppState>>, now: SystemTime) -> Response {
    let runs_completed = match state.read() {
        Ok(guard) => guard.runs_completed(),
        Err(_) => {
            return internal_error("/api/health", "state lock poisoned while reading run count")
                .into_response();
        }
    };

    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => {
            return internal_error("/api/health", "timestamp formatting failure").into_response();
        }
    };

    (
        StatusCode::OK,
        Json(HealthSuccessResponse {
            status: HealthStatus::Ok,
            runs_completed,
            timestamp,
        }),
    )
        .into_response()
}

fn now_or_epoch() -> String {
    format_timestamp(SystemTime::now()).unwrap_or_else(|err| {
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
