use anyhow::{Context, Result};

const DEFAULT_SEARCH_API_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub search_api_url: String,
    pub search_api_key: String,
    pub search_engine_id: String,
    /// Resume analyzer endpoint. Optional: ranking degrades to
    /// "no resume signal" when unset.
    pub analyzer_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            search_api_url: std::env::var("SEARCH_API_URL")
                .unwrap_or_else(|_| DEFAULT_SEARCH_API_URL.to_string()),
            search_api_key: require_env("SEARCH_API_KEY")?,
            search_engine_id: require_env("SEARCH_ENGINE_ID")?,
            analyzer_url: std::env::var("ANALYZER_URL").ok(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
