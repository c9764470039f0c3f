use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_GITHUB_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_CREDENTIALS_PATH: &str = ".commit-dashboard/credentials.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub github_api_base_url: String,
    pub listen_addr: SocketAddr,
    pub credentials_path: PathBuf,
    /// OTLP/gRPC endpoint; span export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let listen_addr = get("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid LISTEN_ADDR: {listen_addr}"))?;

        Ok(Self {
            github_api_base_url: get("GITHUB_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_BASE_URL.to_string()),
            listen_addr,
            credentials_path: get("CREDENTIALS_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH), PathBuf::from),
            otlp_endpoint: get("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }
}
