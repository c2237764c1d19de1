use anyhow::{Context, Result};
use url::Url;

use super::config_model::{
    BackendServer, Brand, Database, DotEnvyConfig, HttpClient, Mpesa, WhatsApp,
};

const DEFAULT_SIGNUP_URL: &str = "https://skillboost.co.ke";
const DEFAULT_SUPPORT_PHONE: &str = "+254 700 123 456";

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: std::env::var("SERVER_PORT_BACKEND")
            .expect("SERVER_PORT_BACKEND is invalid")
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
        pool_size: optional_env("DATABASE_POOL_SIZE")
            .map(|v| v.parse())
            .transpose()
            .context("DATABASE_POOL_SIZE must be a positive integer")?
            .unwrap_or(10),
    };

    let callback_url = std::env::var("MPESA_CALLBACK_URL").expect("MPESA_CALLBACK_URL is invalid");
    Url::parse(&callback_url).context("MPESA_CALLBACK_URL must be an absolute URL")?;

    let mpesa = Mpesa {
        environment: std::env::var("MPESA_ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string()),
        consumer_key: std::env::var("MPESA_CONSUMER_KEY").expect("MPESA_CONSUMER_KEY is invalid"),
        consumer_secret: std::env::var("MPESA_CONSUMER_SECRET")
            .expect("MPESA_CONSUMER_SECRET is invalid"),
        shortcode: std::env::var("MPESA_SHORTCODE").expect("MPESA_SHORTCODE is invalid"),
        passkey: std::env::var("MPESA_PASSKEY").expect("MPESA_PASSKEY is invalid"),
        callback_url,
        base_url: optional_env("MPESA_BASE_URL"),
    };

    let whatsapp = WhatsApp {
        access_token: std::env::var("WHATSAPP_ACCESS_TOKEN")
            .expect("WHATSAPP_ACCESS_TOKEN is invalid"),
        phone_number_id: std::env::var("WHATSAPP_PHONE_NUMBER_ID")
            .expect("WHATSAPP_PHONE_NUMBER_ID is invalid"),
        verify_token: std::env::var("WHATSAPP_VERIFY_TOKEN")
            .expect("WHATSAPP_VERIFY_TOKEN is invalid"),
        api_base_url: optional_env("WHATSAPP_API_BASE_URL"),
    };

    let http_client = HttpClient {
        timeout_secs: optional_env("HTTP_CLIENT_TIMEOUT_SECS")
            .map(|v| v.parse())
            .transpose()
            .context("HTTP_CLIENT_TIMEOUT_SECS must be a number of seconds")?
            .unwrap_or(30),
    };

    let brand = Brand {
        signup_url: optional_env("SIGNUP_URL").unwrap_or_else(|| DEFAULT_SIGNUP_URL.to_string()),
        support_phone: optional_env("SUPPORT_PHONE")
            .unwrap_or_else(|| DEFAULT_SUPPORT_PHONE.to_string()),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        mpesa,
        whatsapp,
        http_client,
        brand,
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
