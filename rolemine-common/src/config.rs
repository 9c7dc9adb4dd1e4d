//! Configuration loading and resolution
//!
//! Priority order (highest first):
//! 1. Command-line arguments
//! 2. Environment variables (`ROLEMINE_*`)
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing TOML file is not an error: the wizard starts with defaults and logs a warning.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming the TOML config file
pub const ENV_CONFIG_PATH: &str = "ROLEMINE_CONFIG";
/// Environment variable overriding the backend base URL
pub const ENV_BACKEND_URL: &str = "ROLEMINE_BACKEND_URL";
/// Environment variable overriding the listen port
pub const ENV_PORT: &str = "ROLEMINE_PORT";
/// Environment variable overriding the backend failure policy
pub const ENV_ON_FAILURE: &str = "ROLEMINE_ON_FAILURE";

/// Default per-file upload limit (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// What to do when a backend call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Substitute placeholder data and keep the wizard moving
    #[default]
    Fallback,
    /// Surface the network error to the caller
    Fail,
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(FailurePolicy::Fallback),
            "fail" => Ok(FailurePolicy::Fail),
            other => Err(Error::Config(format!(
                "Unknown failure policy '{}' (expected 'fallback' or 'fail')",
                other
            ))),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Fallback => f.write_str("fallback"),
            FailurePolicy::Fail => f.write_str("fail"),
        }
    }
}

/// Where uploaded CSV files are parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionMode {
    /// Parse in-process
    #[default]
    Local,
    /// Forward the batch to the backend upload endpoint
    Remote,
}

/// Role mining backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub on_failure: FailurePolicy,

    #[serde(default)]
    pub ingestion: IngestionMode,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            on_failure: FailurePolicy::default(),
            ingestion: IngestionMode::default(),
        }
    }
}

/// Wizard HTTP service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Upload limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Complete configuration file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5790
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE_BYTES
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend_url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub on_failure: Option<FailurePolicy>,
}

impl TomlConfig {
    /// Apply `ROLEMINE_*` environment variables on top of the file values
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var(ENV_BACKEND_URL) {
            self.backend.base_url = url;
        }
        if let Ok(port) = std::env::var(ENV_PORT) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("{} is not a valid port: {}", ENV_PORT, e)))?;
        }
        if let Ok(policy) = std::env::var(ENV_ON_FAILURE) {
            self.backend.on_failure = policy.parse()?;
        }
        Ok(())
    }

    /// Apply command-line values (highest priority)
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.backend_url {
            self.backend.base_url = url.clone();
        }
        if let Some(host) = &overrides.host {
            self.server.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(policy) = overrides.on_failure {
            self.backend.on_failure = policy;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.backend.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "backend.base_url must start with http:// or https:// (got '{}')",
                self.backend.base_url
            )));
        }
        if self.backend.timeout_secs == 0 {
            return Err(Error::Config("backend.timeout_secs must be at least 1".into()));
        }
        if self.upload.max_file_size_bytes == 0 {
            return Err(Error::Config(
                "upload.max_file_size_bytes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Platform default config file: `<config_dir>/rolemine/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rolemine").join("config.toml"))
}

/// Locate the TOML file: CLI argument → `ROLEMINE_CONFIG` → platform default
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        return Some(PathBuf::from(path));
    }
    default_config_path()
}

/// Load a TOML config file, falling back to defaults when the file is missing
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file {} not found, using defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Write a config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Resolve the effective configuration from all tiers
pub fn resolve_config(cli_config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<TomlConfig> {
    let mut config = match resolve_config_path(cli_config_path) {
        Some(path) => load_toml_config(&path)?,
        None => {
            warn!("No config directory available, using defaults");
            TomlConfig::default()
        }
    };

    config.apply_env()?;
    config.apply_overrides(overrides);
    config.validate()?;
    Ok(config)
}
