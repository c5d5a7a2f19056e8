use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    utils::{error_codes, error_with_data_to_api_response, success_to_api_response},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            success_to_api_response(HealthResponse {
                status: "ok".into(),
                database: "ok".into(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "database ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                error_with_data_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "database unreachable".into(),
                    HealthResponse {
                        status: "degraded".into(),
                        database: "unreachable".into(),
                    },
                ),
            )
        }
    }
}
