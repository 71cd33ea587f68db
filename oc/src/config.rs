//! Console configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable that overrides `orchestrator.base-url`
pub const ORCHESTRATOR_URL_ENV: &str = "ORCHESTRATOR_URL";

/// Project-local config file, looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = ".orchconsole.yml";

/// Implicit config locations, most specific first
fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("orchconsole").join("orchconsole.yml"));
    }
    paths
}

/// Main console configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Orchestrator endpoint configuration
    pub orchestrator: OrchestratorConfig,

    /// Console display options
    pub console: ConsoleConfig,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        let url = self.orchestrator.base_url.trim();
        if url.is_empty() {
            return Err(eyre::eyre!("Orchestrator base-url is empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(eyre::eyre!(
                "Orchestrator base-url must start with http:// or https://, got '{}'",
                url
            ));
        }
        if self.orchestrator.timeout_ms == 0 {
            return Err(eyre::eyre!("Orchestrator timeout-ms must be greater than zero"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain, then apply environment overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_files(config_path)?;
        config.apply_env();
        Ok(config)
    }

    fn load_files(config_path: Option<&PathBuf>) -> Result<Self> {
        // An explicit path must load; implicit locations are best effort
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }
        Ok(Self::load_first(&search_paths()))
    }

    /// First file in `paths` that parses; broken files are skipped with a warning
    fn load_first(paths: &[PathBuf]) -> Self {
        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => warn!(path = %path.display(), error = %e, "load_first: skipping config file"),
            }
        }
        info!(searched = paths.len(), "No config file found, using defaults");
        Self::default()
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ORCHESTRATOR_URL_ENV)
            && !url.trim().is_empty()
        {
            info!("Using {} from environment", ORCHESTRATOR_URL_ENV);
            self.orchestrator.base_url = url.trim().to_string();
        }
    }
}

/// Orchestrator endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Base URL of the orchestrator service
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path appended to the base URL
    #[serde(rename = "endpoint-path")]
    pub endpoint_path: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            endpoint_path: "/orchestrate".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl OrchestratorConfig {
    /// Full endpoint URL, joined without doubling or dropping the slash
    pub fn endpoint_url(&self) -> String {
        let base = self.base_url.trim().trim_end_matches('/');
        let path = self.endpoint_path.trim();
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path.trim_start_matches('/'))
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Console display options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Show the metadata panel under each answer
    #[serde(rename = "show-metadata")]
    pub show_metadata: bool,
}
