use crate::translations::{DEFAULT_DOCUMENT_CACHE_CAPACITY, DEFAULT_PAGE_CACHE_CAPACITY};
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Content
    pub translations_dir: PathBuf,
    pub quizzes_dir: PathBuf,
    pub static_dir: PathBuf,
    pub audio_dir: PathBuf,

    // Translation caches
    pub document_cache_capacity: usize,
    pub page_cache_capacity: usize,

    // Admin (translation reload endpoint)
    pub admin_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let static_dir = PathBuf::from(env_or("STATIC_DIR", "static"));

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port: match std::env::var("PORT") {
                Ok(port) => port
                    .parse()
                    .with_context(|| format!("PORT must be a port number, got '{}'", port))?,
                Err(_) => 5051,
            },

            translations_dir: PathBuf::from(env_or("TRANSLATIONS_DIR", "translations")),
            quizzes_dir: std::env::var("QUIZZES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| static_dir.join("quizzes")),
            audio_dir: std::env::var("AUDIO_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| static_dir.join("assets")),
            static_dir,

            document_cache_capacity: std::env::var("DOCUMENT_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_DOCUMENT_CACHE_CAPACITY),
            page_cache_capacity: std::env::var("PAGE_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PAGE_CACHE_CAPACITY),

            admin_api_key: std::env::var("ADMIN_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
        })
    }

    /// Address the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
