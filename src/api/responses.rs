use crate::report::SimulationReport;
use crate::simulation::occupancy::OverflowPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationRequest {
    pub arrival_rate: u32,
    pub service_time: u32,
    pub spaces: u32,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub policy: Option<OverflowPolicy>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SimulationSuccessResponse {
    pub report: SimulationReport,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SimulationErrorResponse {
    pub error_code: SimulationErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationErrorCode {
    InvalidInput,
    NoData,
    InternalError,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub runs_completed: u64,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_defaults_optional_fields() {
        let request: SimulationRequest = serde_json::from_value(json!({
            "arrival_rate": 100,
            "service_time": 100,
            "spaces": 5
        }))
        .expect("deserialize request");

        assert_eq!(request.arrival_rate, 100);
        assert_eq!(request.seed, None);
        assert_eq!(request.policy, None);
    }

    #[test]
    fn request_accepts_policy_and_seed() {
        let request: SimulationRequest = serde_json::from_value(json!({
            "arrival_rate": 100,
            "service_time": 100,
            "spaces": 5,
            "seed": 9,
            "policy": "block"
        }))
        .expect("deserialize request");

        assert_eq!(request.seed, Some(9));
        assert_eq!(request.policy, Some(OverflowPolicy::Block));
    }

    #[test]
    fn error_response_uses_screaming_snake_case_code() {
        let response = SimulationErrorResponse {
            error_code: SimulationErrorCode::InvalidInput,
            error_message: "space count must be at least one".to_string(),
            timestamp: "2026-01-11T12:32:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize error response");
        assert_eq!(
            value,
            json!({
                "error_code": "INVALID_INPUT",
                "error_message": "space count must be at least one",
                "timestamp": "2026-01-11T12:32:00Z"
            })
        );
    }

    #[test]
    fn health_success_response_serializes_status() {
        let response = HealthSuccessResponse {
            status: HealthStatus::Ok,
            runs_completed: 4,
            timestamp: "2026-01-11T12:33:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize health success response");
        assert_eq!(
            value,
            json!({
                "status": "ok",
                "runs_completed": 4,
                "timestamp": "2026-01-11T12:33:00Z"
            })
        );
    }
}
