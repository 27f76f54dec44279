use std::path::PathBuf;
use std::{env, fmt::Display, str::FromStr};

use anyhow::{Context, Result};
use tracing::info;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// JSON array of timeline drafts loaded into an empty database.
    pub seed_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            host: try_load("TRACKER_HOST", "0.0.0.0")?,
            port: try_load("TRACKER_PORT", "3000")?,
            db_path: try_load("TRACKER_DB_PATH", "tracker.db")?,
            seed_path: env::var("TRACKER_SEED_PATH")
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value '{raw}'"))
}
