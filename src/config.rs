use crate::constants::DEFAULT_SOURCE_URL;
use crate::error::{Result, ScrapeError};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page the flow readings are scraped from.
    pub source_url: String,
    /// SQLite database file holding the readings.
    pub db_path: String,
    /// Port for the read API and chart page.
    pub port: u16,
    /// Seconds between poll cycles.
    pub poll_interval_secs: u64,
    /// Request timeout for the page and image fetches.
    pub fetch_timeout_secs: u64,
    /// Wall-clock bound for one full poll cycle.
    pub cycle_timeout_secs: u64,
    /// Tesseract language code.
    pub ocr_language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            db_path: "data.db".to_string(),
            port: 3000,
            poll_interval_secs: 3600,
            fetch_timeout_secs: 30,
            cycle_timeout_secs: 300,
            ocr_language: "eng".to_string(),
        }
    }
}

impl Config {
    /// Loads `config.toml` from the working directory, falling back to
    /// defaults when the file is absent. A `PORT` environment variable
    /// overrides the configured port.
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        let mut config = match fs::read_to_string(config_path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| ScrapeError::Config(format!("Failed to parse '{}': {}", config_path, e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => {
                return Err(ScrapeError::Config(format!(
                    "Failed to read config file '{}': {}",
                    config_path, e
                )))
            }
        };

        if let Ok(port) = std::env::var("PORT") {
            config.port = port
                .parse()
                .map_err(|_| ScrapeError::Config(format!("Invalid PORT value: {}", port)))?;
        }

        Ok(config)
    }
}
