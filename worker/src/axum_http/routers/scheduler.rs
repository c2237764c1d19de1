use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use tracing::{error, info};

use crate::{
    config::config_model::DotEnvyConfig, usecases::lesson_scheduler::LessonSchedulerUseCase,
};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/scheduler/run" \
//     -H "Authorization: Bearer $INTERNAL_SCHEDULER_TOKEN"

#[derive(Clone)]
pub struct SchedulerRouteState {
    config: Arc<DotEnvyConfig>,
    usecase: Arc<LessonSchedulerUseCase>,
}

pub fn routes(config: Arc<DotEnvyConfig>, usecase: Arc<LessonSchedulerUseCase>) -> Router {
    Router::new()
        .route("/run", post(run_scheduler))
        .with_state(SchedulerRouteState { config, usecase })
}

pub async fn run_scheduler(
    State(state): State<SchedulerRouteState>,
    headers: HeaderMap,
) -> Response {
    let Some(expected_token) = state.config.scheduler.internal_token.as_deref() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "scheduler token is not configured",
        )
            .into_response();
    };

    if let Err(status) = authorize_bearer(&headers, expected_token) {
        return (status, "unauthorized").into_response();
    }

    info!("scheduler router: on-demand run requested");
    match state.usecase.run(Utc::now()).await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => {
            error!(error = ?err, "scheduler router: run failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "scheduler run failed").into_response()
        }
    }
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == expected_token {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}
