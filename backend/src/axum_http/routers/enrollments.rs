use crate::{
    axum_http::error_responses::AppError,
    usecases::enrollments::{EnrollmentUseCase, MpesaGateway},
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use crates::domain::{
    repositories::{
        learning::LearningRepository, messaging::OutboundChannel,
        outbound_messages::OutboundMessageRepository, payments::PaymentRepository,
        users::UserRepository,
    },
    value_objects::enrollments::EnrollmentRequest,
};
use std::sync::Arc;
use tracing::{error, warn};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_BACKEND/api/v1/enrollments" \
//     -H "Content-Type: application/json" \
//     -d '{"name":"Amina","whatsapp_number":"0712345678","plan":"weekly","preferred_time":"9:00 AM"}'

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
        .route("/", post(start_enrollment))
        .with_state(usecase)
}

pub async fn start_enrollment<U, P, L, O, C, G>(
    State(usecase): State<Arc<EnrollmentUseCase<U, P, L, O, C, G>>>,
    Json(request): Json<EnrollmentRequest>,
) -> Response
where
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    L: LearningRepository + Send + Sync + 'static,
    O: OutboundMessageRepository + Send + Sync + 'static,
    C: OutboundChannel + Send + Sync + 'static,
    G: MpesaGateway + 'static,
{
    match usecase.start_enrollment(request).await {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(err) => {
            if err.status_code().is_server_error() {
                error!(error = ?err, "enrollments router: start_enrollment failed");
            } else {
                warn!(error = %err, "enrollments router: enrollment rejected");
            }
            AppError::from(err).into_response()
        }
    }
}
