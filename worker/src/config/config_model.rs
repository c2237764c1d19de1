#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub whatsapp: WhatsApp,
    pub http_client: HttpClient,
    pub scheduler: Scheduler,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone)]
pub struct WhatsApp {
    pub access_token: String,
    pub phone_number_id: String,
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    /// When false only the internal trigger endpoint runs the scheduler.
    pub enabled: bool,
    pub utc_offset_hours: i32,
    pub max_concurrency: usize,
    pub pacing_ms: u64,
    pub reminder_hour: u32,
    pub internal_token: Option<String>,
}
