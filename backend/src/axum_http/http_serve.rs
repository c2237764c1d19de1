use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    usecases::{
        commands::{CommandRouterUseCase, ReplySettings},
        enrollments::EnrollmentUseCase,
    },
};
use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::{
    infra::{
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{
                learning::LearningPostgres, outbound_messages::OutboundMessagePostgres,
                payments::PaymentPostgres, users::UserPostgres,
            },
        },
        messaging::whatsapp::{WhatsAppClient, WhatsAppConfig},
    },
    payments::mpesa_client::{MpesaClient, MpesaConfig, MpesaEnvironment},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

pub type PostgresEnrollments = EnrollmentUseCase<
    UserPostgres,
    PaymentPostgres,
    LearningPostgres,
    OutboundMessagePostgres,
    WhatsAppClient,
    MpesaClient,
>;

pub type PostgresCommands =
    CommandRouterUseCase<UserPostgres, LearningPostgres, OutboundMessagePostgres, WhatsAppClient>;

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let request_timeout = Duration::from_secs(config.http_client.timeout_secs);

    let mpesa = Arc::new(MpesaClient::new(MpesaConfig {
        environment: MpesaEnvironment::from_str(&config.mpesa.environment),
        consumer_key: config.mpesa.consumer_key.clone(),
        consumer_secret: config.mpesa.consumer_secret.clone(),
        shortcode: config.mpesa.shortcode.clone(),
        passkey: config.mpesa.passkey.clone(),
        callback_url: config.mpesa.callback_url.clone(),
        base_url: config.mpesa.base_url.clone(),
        request_timeout,
    })?);
    let whatsapp = Arc::new(WhatsAppClient::new(WhatsAppConfig {
        access_token: config.whatsapp.access_token.clone(),
        phone_number_id: config.whatsapp.phone_number_id.clone(),
        base_url: config.whatsapp.api_base_url.clone(),
        request_timeout,
    })?);

    let user_repository = Arc::new(UserPostgres::new(Arc::clone(&db_pool)));
    let learning_repository = Arc::new(LearningPostgres::new(Arc::clone(&db_pool)));
    let message_log = Arc::new(OutboundMessagePostgres::new(Arc::clone(&db_pool)));

    let enrollments: Arc<PostgresEnrollments> = Arc::new(EnrollmentUseCase::new(
        Arc::clone(&user_repository),
        Arc::new(PaymentPostgres::new(Arc::clone(&db_pool))),
        Arc::clone(&learning_repository),
        Arc::clone(&message_log),
        Arc::clone(&whatsapp),
        mpesa,
    ));
    let commands: Arc<PostgresCommands> = Arc::new(CommandRouterUseCase::new(
        user_repository,
        learning_repository,
        message_log,
        whatsapp,
        ReplySettings {
            signup_url: config.brand.signup_url.clone(),
            support_phone: config.brand.support_phone.clone(),
        },
    ));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/enrollments",
            routers::enrollments::routes(Arc::clone(&enrollments)),
        )
        .nest(
            "/api/v1/payments",
            routers::payments::routes(Arc::clone(&enrollments)),
        )
        .nest("/api/v1/plans", routers::plans::routes())
        .nest("/api/v1/progress", routers::progress::routes(enrollments))
        .nest(
            "/api/v1/whatsapp",
            routers::whatsapp_webhook::routes(config.whatsapp.verify_token.clone(), commands),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = ?err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
