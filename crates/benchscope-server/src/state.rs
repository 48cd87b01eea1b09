//! Shared application state for the Axum server.

use std::sync::Arc;

use benchscope_core::DashConfig;

#[derive(Clone)]
pub struct AppState {
    /// Upstream backend root, without trailing slash.
    pub upstream: Arc<String>,
    pub http: reqwest::Client,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            upstream: Arc::new(config.api_base_url.trim_end_matches('/').to_string()),
            http,
            config: Arc::new(config),
        })
    }
}

/// Configuration for the web server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub stale_time_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&DashConfig::default())
    }
}

impl From<&DashConfig> for ServerConfig {
    fn from(c: &DashConfig) -> Self {
        Self {
            host: c.host.clone(),
            port: c.port,
            api_base_url: c.api_base().to_string(),
            request_timeout_secs: c.request_timeout_secs,
            stale_time_secs: c.stale_time_secs,
            poll_interval_secs: c.poll_interval_secs,
        }
    }
}
