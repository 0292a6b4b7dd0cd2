use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub database_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: "0.0.0.0:8080".to_string(),
            database_url: "sqlite://cotacoes.db".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub pair: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            base_url: "https://economia.awesomeapi.com.br".to_string(),
            pair: "USD-BRL".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub service_url: String,
    pub output_path: PathBuf,
    pub label: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            service_url: "http://localhost:8080/cotacao".to_string(),
            output_path: PathBuf::from("cotacao.txt"),
            label: "Dólar".to_string(),
        }
    }
}

/// Independent time budgets, in milliseconds.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub fetch_ms: u64,
    pub store_ms: u64,
    pub client_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        TimeoutsConfig {
            fetch_ms: 200,
            store_ms: 10,
            client_ms: 300,
        }
    }
}

impl TimeoutsConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_ms)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_millis(self.client_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub client: ClientConfig,
    pub timeouts: TimeoutsConfig,
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults when it does not exist.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("br", "cotacao", "cotacao")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
