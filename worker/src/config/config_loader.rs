use super::config_model::{Database, DotEnvyConfig, HttpClient, Scheduler, WhatsApp, WorkerServer};
use anyhow::{Context, Result, ensure};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let worker_server = WorkerServer {
        port: std::env::var("SERVER_PORT_WORKER")
            .expect("SERVER_PORT_WORKER is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
        pool_size: std::env::var("DATABASE_POOL_SIZE")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_POOL_SIZE is invalid")?,
    };

    let whatsapp = WhatsApp {
        access_token: std::env::var("WHATSAPP_ACCESS_TOKEN")
            .expect("WHATSAPP_ACCESS_TOKEN is invalid"),
        phone_number_id: std::env::var("WHATSAPP_PHONE_NUMBER_ID")
            .expect("WHATSAPP_PHONE_NUMBER_ID is invalid"),
        api_base_url: optional_env("WHATSAPP_API_BASE_URL"),
    };

    let http_client = HttpClient {
        timeout_secs: std::env::var("HTTP_CLIENT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("HTTP_CLIENT_TIMEOUT_SECS is invalid")?,
    };

    let utc_offset_hours: i32 = std::env::var("SCHEDULER_UTC_OFFSET_HOURS")
        .unwrap_or_else(|_| "3".to_string())
        .parse()
        .context("SCHEDULER_UTC_OFFSET_HOURS is invalid")?;
    ensure!(
        (-12..=14).contains(&utc_offset_hours),
        "SCHEDULER_UTC_OFFSET_HOURS must be between -12 and 14"
    );

    let reminder_hour: u32 = std::env::var("SCHEDULER_REMINDER_HOUR")
        .unwrap_or_else(|_| "10".to_string())
        .parse()
        .context("SCHEDULER_REMINDER_HOUR is invalid")?;
    ensure!(reminder_hour < 24, "SCHEDULER_REMINDER_HOUR must be 0-23");

    let scheduler = Scheduler {
        enabled: std::env::var("SCHEDULER_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .context("SCHEDULER_ENABLED is invalid")?,
        utc_offset_hours,
        max_concurrency: std::env::var("SCHEDULER_MAX_CONCURRENCY")
            .unwrap_or_else(|_| "4".to_string())
            .parse()
            .context("SCHEDULER_MAX_CONCURRENCY is invalid")?,
        pacing_ms: std::env::var("SCHEDULER_PACING_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .context("SCHEDULER_PACING_MS is invalid")?,
        reminder_hour,
        internal_token: optional_env("INTERNAL_SCHEDULER_TOKEN"),
    };

    Ok(DotEnvyConfig {
        worker_server,
        database,
        whatsapp,
        http_client,
        scheduler,
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|v| {
        let trimmed = v.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}
