use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub gemini_api_key: String,
    pub google_project_id: String,
    /// Static OAuth token for local development; production resolves tokens
    /// from the metadata server when this is unset.
    pub google_access_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            gemini_api_key: env::var("GEMINI_API_KEY")
                .context("GEMINI_API_KEY must be set")?,
            google_project_id: env::var("GOOGLE_PROJECT_ID")
                .context("GOOGLE_PROJECT_ID must be set")?,
            google_access_token: env::var("GOOGLE_ACCESS_TOKEN").ok(),
        })
    }
}
