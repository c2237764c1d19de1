use crate::{
    axum_http::error_responses::AppError,
    usecases::enrollments::{EnrollmentUseCase, MpesaGateway},
};
use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};
use crates::domain::{
    repositories::{
        learning::LearningRepository, messaging::OutboundChannel,
        outbound_messages::OutboundMessageRepository, payments::PaymentRepository,
        users::UserRepository,
    },
    value_objects::enrollments::LessonAcknowledgement,
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

pub fn routes<U, P, L, O, C, G>(usecase: Arc<EnrollmentUseCase<U, P, L, O, C, G>>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    L: LearningRepository + Send + Sync + 'static,
    O: OutboundMessageRepository + Send + Sync + 'static,
    C: OutboundChannel + Send + Sync + 'static,
    G: MpesaGateway + 'static,
{
    Router::new()
        .route("/lessons", post(acknowledge_lesson))
        .with_state(usecase)
}

pub async fn acknowledge_lesson<U, P, L, O, C, G>(
    State(usecase): State<Arc<EnrollmentUseCase<U, P, L, O, C, G>>>,
    Json(acknowledgement): Json<LessonAcknowledgement>,
) -> Response
where
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    L: LearningRepository + Send + Sync + 'static,
    O: OutboundMessageRepository + Send + Sync + 'static,
    C: OutboundChannel + Send + Sync + 'static,
    G: MpesaGateway + 'static,
{
    let lesson_id = acknowledgement.lesson_id;
    match usecase.acknowledge_lesson(acknowledgement).await {
        Ok(recorded) => Json(json!({
            "lesson_id": lesson_id,
            "recorded": recorded,
        }))
        .into_response(),
        Err(err) => {
            error!(%lesson_id, error = ?err, "progress router: acknowledge_lesson failed");
            AppError::from(err).into_response()
        }
    }
}
