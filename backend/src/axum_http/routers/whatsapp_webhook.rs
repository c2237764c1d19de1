use crate::{
    axum_http::error_responses::ErrorResponse,
    usecases::commands::CommandRouterUseCase,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use crates::domain::{
    repositories::{
        learning::LearningRepository, messaging::OutboundChannel,
        outbound_messages::OutboundMessageRepository, users::UserRepository,
    },
    value_objects::whatsapp_webhook::WhatsAppWebhookEnvelope,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

pub struct WebhookRouteState<U, L, O, C>
where
    U: UserRepository + Send + Sync + 'static,
    L: LearningRepository + Send + Sync + 'static,
    O: OutboundMessageRepository + Send + Sync + 'static,
    C: OutboundChannel + Send + Sync + 'static,
{
    verify_token: Arc<str>,
    usecase: Arc<CommandRouterUseCase<U, L, O, C>>,
}

impl<U, L, O, C> Clone for WebhookRouteState<U, L, O, C>
where
    U: UserRepository + Send + Sync + 'static,
    L: LearningRepository + Send + Sync + 'static,
    O: OutboundMessageRepository + Send + Sync + 'static,
    C: OutboundChannel + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            verify_token: Arc::clone(&self.verify_token),
            usecase: Arc::clone(&self.usecase),
        }
    }
}

pub fn routes<U, L, O, C>(
    verify_token: String,
    usecase: Arc<CommandRouterUseCase<U, L, O, C>>,
) -> Router
where
    U: UserRepository + Send + Sync + 'static,
    L: LearningRepository + Send + Sync + 'static,
    O: OutboundMessageRepository + Send + Sync + 'static,
    C: OutboundChannel + Send + Sync + 'static,
{
    Router::new()
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .with_state(WebhookRouteState {
            verify_token: Arc::from(verify_token),
            usecase,
        })
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// Subscription handshake: echo the challenge only for a matching token.
pub async fn verify_webhook<U, L, O, C>(
    State(state): State<WebhookRouteState<U, L, O, C>>,
    Query(query): Query<VerifyQuery>,
) -> Response
where
    U: UserRepository + Send + Sync + 'static,
    L: LearningRepository + Send + Sync + 'static,
    O: OutboundMessageRepository + Send + Sync + 'static,
    C: OutboundChannel + Send + Sync + 'static,
{
    let token_matches = query.verify_token.as_deref() == Some(&*state.verify_token);
    match (query.mode.as_deref(), query.challenge) {
        (Some("subscribe"), Some(challenge)) if token_matches => {
            info!("whatsapp webhook: subscription verified");
            (StatusCode::OK, challenge).into_response()
        }
        _ => {
            warn!(mode = ?query.mode, "whatsapp webhook: verification rejected");
            (StatusCode::FORBIDDEN, "Forbidden").into_response()
        }
    }
}

/// Always 200 for a JSON body so the platform does not redeliver; per-message failures are logged.
pub async fn receive_webhook<U, L, O, C>(
    State(state): State<WebhookRouteState<U, L, O, C>>,
    body: Bytes,
) -> Response
where
    U: UserRepository + Send + Sync + 'static,
    L: LearningRepository + Send + Sync + 'static,
    O: OutboundMessageRepository + Send + Sync + 'static,
    C: OutboundChannel + Send + Sync + 'static,
{
    let envelope: WhatsAppWebhookEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "whatsapp webhook: body is not a webhook envelope");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    code: StatusCode::BAD_REQUEST.as_u16(),
                    message: "Invalid webhook payload".to_string(),
                }),
            )
                .into_response();
        }
    };

    let summary = state.usecase.handle_webhook(envelope).await;
    info!(
        received = summary.received,
        handled = summary.handled,
        onboarded = summary.onboarded,
        unroutable = summary.unroutable,
        failed = summary.failed,
        "whatsapp webhook: delivery processed"
    );

    Json(summary).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::commands::ReplySettings;
    use axum::{body::Body, http::Request};
    use crates::domain::{
        entities::users::UserEntity,
        repositories::{
            learning::MockLearningRepository, messaging::MockOutboundChannel,
            outbound_messages::MockOutboundMessageRepository, users::MockUserRepository,
        },
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(users: MockUserRepository) -> Router {
        app_with(
            users,
            MockOutboundMessageRepository::new(),
            MockOutboundChannel::new(),
        )
    }

    fn app_with(
        users: MockUserRepository,
        message_log: MockOutboundMessageRepository,
        channel: MockOutboundChannel,
    ) -> Router {
        routes(
            "s3cret".to_string(),
            Arc::new(CommandRouterUseCase::new(
                Arc::new(users),
                Arc::new(MockLearningRepository::new()),
                Arc::new(message_log),
                Arc::new(channel),
                ReplySettings {
                    signup_url: "https://skillboost.test".to_string(),
                    support_phone: "+254 700 000 000".to_string(),
                },
            )),
        )
    }

    #[tokio::test]
    async fn verification_echoes_challenge_for_matching_token() {
        let response = app(MockUserRepository::new())
            .oneshot(
                Request::get(
                    "/webhook?hub.mode=subscribe&hub.verify_token=s3cret&hub.challenge=1158201444",
                )
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"1158201444");
    }

    #[tokio::test]
    async fn verification_with_wrong_token_is_forbidden() {
        let response = app(MockUserRepository::new())
            .oneshot(
                Request::get("/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn status_only_delivery_is_acknowledged() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_whatsapp_number().never();

        let payload = serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{ "id": "1", "changes": [{ "field": "messages", "value": {
                "statuses": [{ "id": "wamid.x", "status": "delivered" }]
            }}]}]
        });
        let response = app(users)
            .oneshot(
                Request::post("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn non_json_body_is_bad_request() {
        let response = app(MockUserRepository::new())
            .oneshot(
                Request::post("/webhook")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn start_from_unpaid_subscriber_does_not_activate() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_whatsapp_number()
            .withf(|number| number == "+254712345678")
            .returning(|_| {
                let now = chrono::Utc::now();
                let user = UserEntity {
                    id: uuid::Uuid::new_v4(),
                    whatsapp_number: "+254712345678".to_string(),
                    name: "Kamau".to_string(),
                    email: None,
                    preferred_time: "7:00 AM".to_string(),
                    subscription_plan: "weekly".to_string(),
                    subscription_status: "inactive".to_string(),
                    subscription_expires_at: None,
                    created_at: now,
                    updated_at: now,
                };
                Box::pin(async move { Ok(Some(user)) })
            });
        users.expect_update_status().never();

        let mut channel = MockOutboundChannel::new();
        channel
            .expect_send_text()
            .withf(|_, body| body.contains("isn't active yet"))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok("wamid.out".to_string()) }));
        let mut message_log = MockOutboundMessageRepository::new();
        message_log
            .expect_log_message()
            .times(1)
            .returning(|_| Box::pin(async { Ok(uuid::Uuid::new_v4()) }));

        let payload = serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{ "id": "1", "changes": [{ "field": "messages", "value": {
                "messages": [{ "from": "254712345678", "id": "wamid.in", "type": "text",
                               "text": { "body": "START" } }]
            }}]}]
        });
        let response = app_with(users, message_log, channel)
            .oneshot(
                Request::post("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let summary: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(summary["handled"], 1);
        assert_eq!(summary["failed"], 0);
    }
}
