//! Server configuration, read from the environment.

use std::path::PathBuf;

/// Origins allowed when `INKDRAFT_CORS_ORIGINS` is not set.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://127.0.0.1:5173"];

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Lifetime of issued bearer tokens
    pub token_ttl_minutes: i64,
    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,
    /// Gemini API key; AI rewrites return a placeholder without one
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let port = var("INKDRAFT_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let database_path = var("INKDRAFT_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("inkdraft-server")
                    .join("inkdraft.db")
            });

        let token_ttl_minutes = var("INKDRAFT_TOKEN_TTL_MINUTES")
            .and_then(|m| m.parse().ok())
            .filter(|m: &i64| *m > 0)
            .unwrap_or(60 * 24);

        let cors_origins = match var("INKDRAFT_CORS_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let gemini_api_key = var("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());
        let gemini_model = var("GEMINI_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        Self {
            port,
            database_path,
            token_ttl_minutes,
            cors_origins,
            gemini_api_key,
            gemini_model,
        }
    }
}
