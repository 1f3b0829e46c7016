//! Configuration management for chainscan

use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Bound applied to prefix searches.
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: default_db_path(),
            search_limit: default_search_limit(),
        }
    }
}

fn default_db_path() -> String {
    "./data/chainscan.db".to_string()
}

fn default_search_limit() -> u32 {
    50
}

pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let config_str = fs::read_to_string("config.toml").unwrap_or_default();
    let config: Config = if config_str.is_empty() {
        // Sane defaults when config.toml is absent
        Config {
            database: DatabaseConfig::default(),
        }
    } else {
        toml::from_str(&config_str)?
    };

    if config.database.path.is_empty() {
        return Err("database.path must be set in config.toml".into());
    }

    Ok(config)
}
