use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads every setting through `lookup`, which returns `None` for unset
    /// keys.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("BRIDGE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!(
                "BRIDGE_JWT_SECRET is unset or still a placeholder; \
                 it must match the secret used to mint session tokens"
            );
        }

        let db_path = lookup("BRIDGE_DB_PATH").unwrap_or_else(|| "alumnibridge.db".into());
        let host = lookup("BRIDGE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("BRIDGE_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("BRIDGE_PORT is not a valid port: {:?}", raw))?,
            None => 8080,
        };

        Ok(Self {
            jwt_secret,
            db_path: PathBuf::from(db_path),
            host,
            port,
        })
    }
}
