use axum::{Json, Router, response::IntoResponse, routing::get};
use crates::domain::value_objects::plans::plan_catalog;

pub fn routes() -> Router {
    Router::new().route("/", get(list_plans))
}

pub async fn list_plans() -> impl IntoResponse {
    Json(plan_catalog())
}
