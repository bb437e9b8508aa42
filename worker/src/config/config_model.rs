#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub sweep: Sweep,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
    /// Bearer token for the manual sweep endpoint. The endpoint answers 503 without it.
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone)]
pub struct Sweep {
    pub interval_secs: u64,
}
