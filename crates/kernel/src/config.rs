//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// YAML file of per-resource-type policy rules. When None, every
    /// resource type gets the default policy.
    pub policy_file: Option<PathBuf>,

    /// JSON file declaring resource types and their initial records.
    pub seed_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| parse_list(&v))
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let policy_file = env::var("POLICY_FILE").ok().map(PathBuf::from);
        let seed_file = env::var("SEED_FILE").ok().map(PathBuf::from);

        Ok(Self {
            port,
            cors_allowed_origins,
            policy_file,
            seed_file,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            cors_allowed_origins: vec!["*".to_string()],
            policy_file: None,
            seed_file: None,
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
