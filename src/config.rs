use std::net::SocketAddr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub referer: String,
    pub title: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub model: ModelConfig,
    pub nutrition_table_path: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let listen_addr = parse_listen_addr(
            &std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            &std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into()),
        )?;
        let model = ModelConfig {
            base_url: std::env::var("MODEL_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".into()),
            api_key: std::env::var("MODEL_API_KEY")
                .map_err(|_| anyhow::anyhow!("MODEL_API_KEY must be set"))?,
            model: std::env::var("MODEL_NAME")
                .unwrap_or_else(|_| "google/gemini-2.0-pro-exp-02-05:free".into()),
            referer: std::env::var("MODEL_REFERER").unwrap_or_else(|_| "localhost:19000".into()),
            title: std::env::var("MODEL_TITLE").unwrap_or_else(|_| "SnapCal".into()),
            timeout_secs: std::env::var("MODEL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok()),
        };
        let nutrition_table_path = std::env::var("NUTRITION_TABLE_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty());
        Ok(Self {
            listen_addr,
            model,
            nutrition_table_path,
        })
    }
}

pub fn parse_listen_addr(host: &str, port: &str) -> anyhow::Result<SocketAddr> {
    format!("{}:{}", host.trim(), port.trim())
        .parse()
        .with_context(|| format!("invalid APP_HOST/APP_PORT {}:{}", host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_addr_from_host_and_port() {
        let addr = parse_listen_addr("127.0.0.1", " 9090 ").unwrap();
        assert_eq!(addr.port(), 9090);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn bad_port_is_reported() {
        let err = parse_listen_addr("0.0.0.0", "http").unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }
}
