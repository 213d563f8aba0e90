//! # Configuration Management Module
//!
//! Questhall reads a single TOML file with three sections:
//!
//! - [`GameConfig`] - Board name, data and seed directories, page size
//! - [`LoggingConfig`] - Log level and optional log files
//! - [`SecurityConfig`] - Argon2 cost, session lifetime, password policy
//!
//! ## Usage
//!
//! ```rust,no_run
//! use questhall::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("config.toml").await?;
//!     let config = Config::load("config.toml").await?;
//!     println!("Board: {}", config.game.name);
//!     println!("Database: {}", config.db_path().display());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [game]
//! name = "Questhall"
//! data_dir = "./data"
//! seeds_dir = "./data/seeds"
//! quest_page_size = 10
//!
//! [logging]
//! level = "info"
//! file = "questhall.log"
//! security_file = "questhall-security.log"
//!
//! [security]
//! session_ttl_hours = 168
//! min_password_length = 6
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::game::{DEFAULT_MIN_PASSWORD_LEN, DEFAULT_PAGE_SIZE, DEFAULT_SESSION_TTL_HOURS, MAX_PAGE_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub game: GameConfig,
    pub logging: LoggingConfig,
    pub security: Option<SecurityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub name: String,
    pub data_dir: String,
    /// Optional override for the sled database path; defaults to `<data_dir>/questhall.db`.
    #[serde(default)]
    pub db_path: Option<String>,
    #[serde(default = "default_seeds_dir")]
    pub seeds_dir: String,
    #[serde(default = "default_quest_page_size")]
    pub quest_page_size: usize,
}

fn default_seeds_dir() -> String {
    "./data/seeds".to_string()
}

fn default_quest_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    #[serde(default)]
    pub security_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Argon2Config {
    #[serde(default)]
    pub memory_kib: Option<u32>,
    #[serde(default)]
    pub time_cost: Option<u32>,
    #[serde(default)]
    pub parallelism: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub argon2: Option<Argon2Config>,
    #[serde(default)]
    pub session_ttl_hours: Option<i64>,
    #[serde(default)]
    pub min_password_length: Option<usize>,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.game.data_dir.trim().is_empty() {
            return Err(anyhow!("game.data_dir must not be empty"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.game.quest_page_size) {
            return Err(anyhow!(
                "game.quest_page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            ));
        }
        if let Some(ttl) = self.security.as_ref().and_then(|s| s.session_ttl_hours) {
            if ttl <= 0 {
                return Err(anyhow!("security.session_ttl_hours must be positive"));
            }
        }
        Ok(())
    }

    /// Sled database location.
    pub fn db_path(&self) -> PathBuf {
        match &self.game.db_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.game.data_dir).join("questhall.db"),
        }
    }

    pub fn seeds_dir(&self) -> PathBuf {
        PathBuf::from(&self.game.seeds_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            game: GameConfig {
                name: "Questhall".to_string(),
                data_dir: "./data".to_string(),
                db_path: None,
                seeds_dir: default_seeds_dir(),
                quest_page_size: DEFAULT_PAGE_SIZE,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("questhall.log".to_string()),
                security_file: Some("questhall-security.log".to_string()),
            },
            security: Some(SecurityConfig {
                argon2: None,
                session_ttl_hours: Some(DEFAULT_SESSION_TTL_HOURS),
                min_password_length: Some(DEFAULT_MIN_PASSWORD_LEN),
            }),
        }
    }
}
