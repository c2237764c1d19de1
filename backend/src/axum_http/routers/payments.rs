use crate::{
    axum_http::error_responses::AppError,
    usecases::enrollments::{EnrollmentError, EnrollmentUseCase, MpesaGateway},
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::domain::{
    repositories::{
        learning::LearningRepository, messaging::OutboundChannel,
        outbound_messages::OutboundMessageRepository, payments::PaymentRepository,
        users::UserRepository,
    },
    value_objects::mpesa_callback::MpesaCallbackAck,
};
use std::sync::Arc;
use tracing::{error, info};

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
        .route("/mpesa/callback", post(mpesa_callback))
        .route("/:checkout_request_id/status", get(payment_status))
        .with_state(usecase)
}

/// Provider-facing: the body is always an acknowledgement object, even on failure.
pub async fn mpesa_callback<U, P, L, O, C, G>(
    State(usecase): State<Arc<EnrollmentUseCase<U, P, L, O, C, G>>>,
    body: Bytes,
) -> Response
where
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    L: LearningRepository + Send + Sync + 'static,
    O: OutboundMessageRepository + Send + Sync + 'static,
    C: OutboundChannel + Send + Sync + 'static,
    G: MpesaGateway + 'static,
{
    match usecase.handle_provider_callback(&body).await {
        Ok(ack) => Json(ack).into_response(),
        Err(err) => {
            let status = err.status_code();
            let reason = match &err {
                EnrollmentError::CallbackParse(_) => "Invalid callback payload",
                _ => "Callback could not be processed",
            };
            error!(error = ?err, "payments router: mpesa callback failed");
            (status, Json(MpesaCallbackAck::rejected(reason))).into_response()
        }
    }
}

pub async fn payment_status<U, P, L, O, C, G>(
    State(usecase): State<Arc<EnrollmentUseCase<U, P, L, O, C, G>>>,
    Path(checkout_request_id): Path<String>,
) -> Response
where
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    L: LearningRepository + Send + Sync + 'static,
    O: OutboundMessageRepository + Send + Sync + 'static,
    C: OutboundChannel + Send + Sync + 'static,
    G: MpesaGateway + 'static,
{
    info!(%checkout_request_id, "payments router: status requested");
    match usecase.reconcile_payment(&checkout_request_id).await {
        Ok(status) => Json(status).into_response(),
        Err(err) => {
            error!(%checkout_request_id, error = ?err, "payments router: reconcile failed");
            AppError::from(err).into_response()
        }
    }
}
