use anyhow::Result;
use crates::domain::repositories::{
    learning::LearningRepository, messaging::OutboundChannel,
    outbound_messages::OutboundMessageRepository, users::UserRepository,
};
use crates::infra::{
    db::{
        postgres::postgres_connection,
        repositories::{
            learning::LearningPostgres, outbound_messages::OutboundMessagePostgres,
            users::UserPostgres,
        },
    },
    messaging::whatsapp::{WhatsAppClient, WhatsAppConfig},
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};
use worker::{
    axum_http, config,
    services::scheduler_loop,
    usecases::lesson_scheduler::{LessonSchedulerSettings, LessonSchedulerUseCase},
};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.database.pool_size,
    )?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    let user_repository: Arc<dyn UserRepository + Send + Sync> =
        Arc::new(UserPostgres::new(Arc::clone(&db_pool_arc)));
    let learning_repository: Arc<dyn LearningRepository + Send + Sync> =
        Arc::new(LearningPostgres::new(Arc::clone(&db_pool_arc)));
    let message_log: Arc<dyn OutboundMessageRepository + Send + Sync> =
        Arc::new(OutboundMessagePostgres::new(Arc::clone(&db_pool_arc)));

    let whatsapp = &dotenvy_env.whatsapp;
    let channel: Arc<dyn OutboundChannel + Send + Sync> =
        Arc::new(WhatsAppClient::new(WhatsAppConfig {
            access_token: whatsapp.access_token.clone(),
            phone_number_id: whatsapp.phone_number_id.clone(),
            base_url: whatsapp.api_base_url.clone(),
            request_timeout: Duration::from_secs(dotenvy_env.http_client.timeout_secs),
        })?);

    let scheduler = &dotenvy_env.scheduler;
    let scheduler_usecase = Arc::new(LessonSchedulerUseCase::new(
        user_repository,
        learning_repository,
        message_log,
        channel,
        LessonSchedulerSettings {
            utc_offset_hours: scheduler.utc_offset_hours,
            max_concurrency: scheduler.max_concurrency,
            pacing: Duration::from_millis(scheduler.pacing_ms),
            reminder_hour: scheduler.reminder_hour,
        },
    ));

    let server_config = Arc::clone(&dotenvy_env);
    let server_usecase = Arc::clone(&scheduler_usecase);
    let http_server =
        tokio::spawn(async move { axum_http::http_serve::start(server_config, server_usecase).await });

    if dotenvy_env.scheduler.enabled {
        let scheduler_loop = tokio::spawn(scheduler_loop::run_scheduler_loop(scheduler_usecase));
        tokio::select! {
            result = scheduler_loop => result??,
            result = http_server => result??,
        };
    } else {
        warn!("Scheduler loop disabled; runs only via the internal endpoint");
        http_server.await??;
    }

    Ok(())
}
