#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub mpesa: Mpesa,
    pub whatsapp: WhatsApp,
    pub http_client: HttpClient,
    pub brand: Brand,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone)]
pub struct Mpesa {
    pub environment: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub shortcode: String,
    pub passkey: String,
    pub callback_url: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WhatsApp {
    pub access_token: String,
    pub phone_number_id: String,
    pub verify_token: String,
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    pub timeout_secs: u64,
}

/// Values interpolated into user-facing message texts.
#[derive(Debug, Clone)]
pub struct Brand {
    pub signup_url: String,
    pub support_phone: String,
}
