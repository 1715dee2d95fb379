//! Application configuration.
//!
//! Configuration is stored as YAML, by default in the platform config
//! directory (`FREIGHTDESK_CONFIG` overrides the path), and includes:
//! - The backend base URL (`FREIGHTDESK_API_URL` overrides it)
//! - Ticket table page size and background refresh interval
//! - Detail cache TTL, capacity and fetch concurrency
//! - Text filter debounce and HTTP request timeout

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};

pub const CONFIG_ENV: &str = "FREIGHTDESK_CONFIG";
pub const API_URL_ENV: &str = "FREIGHTDESK_API_URL";

/// Keys accepted by `config get` / `config set`
pub const CONFIG_KEYS: &[&str] = &[
    "api_url",
    "page_size",
    "refresh_interval_secs",
    "detail_ttl_secs",
    "detail_concurrency",
    "detail_cache_max_entries",
    "debounce_ms",
    "request_timeout_secs",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Tickets per page (default: 10)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Background list refresh period in seconds (default: 300)
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// How long a fetched timeline stays fresh, in seconds (default: 300)
    #[serde(default = "default_detail_ttl_secs")]
    pub detail_ttl_secs: u64,

    /// Maximum concurrent timeline fetches (default: 3)
    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,

    /// Optional cap on cached timelines; unbounded when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_cache_max_entries: Option<usize>,

    /// Quiet period for text filters in milliseconds (default: 500)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// HTTP request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_refresh_interval_secs() -> u64 {
    300
}

fn default_detail_ttl_secs() -> u64 {
    300
}

fn default_detail_concurrency() -> usize {
    3
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            page_size: default_page_size(),
            refresh_interval_secs: default_refresh_interval_secs(),
            detail_ttl_secs: default_detail_ttl_secs(),
            detail_concurrency: default_detail_concurrency(),
            detail_cache_max_entries: None,
            debounce_ms: default_debounce_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV)
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }

        directories::ProjectDirs::from("com", "freightdesk", "freightdesk")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from(".freightdesk").join("config.yaml"))
    }

    /// Load configuration from the default path, or defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DeskError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                DeskError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content).map_err(|e| {
            DeskError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;

        // Set restrictive permissions on Unix (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, permissions)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api_url)
            .map_err(|e| DeskError::Config(format!("api_url '{}': {}", self.api_url, e)))?;
        if self.page_size == 0 {
            return Err(DeskError::Config("page_size must be at least 1".to_string()));
        }
        if self.detail_concurrency == 0 {
            return Err(DeskError::Config(
                "detail_concurrency must be at least 1".to_string(),
            ));
        }
        if self.detail_cache_max_entries == Some(0) {
            return Err(DeskError::Config(
                "detail_cache_max_entries must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Backend URL, preferring the environment over the config file
    pub fn api_url(&self) -> String {
        if let Ok(url) = env::var(API_URL_ENV)
            && !url.is_empty()
        {
            return url;
        }
        self.api_url.clone()
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn detail_ttl(&self) -> Duration {
        Duration::from_secs(self.detail_ttl_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Read a single key as a display string
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "api_url" => self.api_url.clone(),
            "page_size" => self.page_size.to_string(),
            "refresh_interval_secs" => self.refresh_interval_secs.to_string(),
            "detail_ttl_secs" => self.detail_ttl_secs.to_string(),
            "detail_concurrency" => self.detail_concurrency.to_string(),
            "detail_cache_max_entries" => self
                .detail_cache_max_entries
                .map(|n| n.to_string())
                .ok_or_else(|| DeskError::Config(format!("{key} is not set")))?,
            "debounce_ms" => self.debounce_ms.to_string(),
            "request_timeout_secs" => self.request_timeout_secs.to_string(),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Update a single key from a string; the result is validated.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "api_url" => self.api_url = value.to_string(),
            "page_size" => self.page_size = parse_number(key, value)?,
            "refresh_interval_secs" => self.refresh_interval_secs = parse_number(key, value)?,
            "detail_ttl_secs" => self.detail_ttl_secs = parse_number(key, value)?,
            "detail_concurrency" => self.detail_concurrency = parse_number(key, value)?,
            "detail_cache_max_entries" => {
                self.detail_cache_max_entries = if value.is_empty() || value == "none" {
                    None
                } else {
                    Some(parse_number(key, value)?)
                }
            }
            "debounce_ms" => self.debounce_ms = parse_number(key, value)?,
            "request_timeout_secs" => self.request_timeout_secs = parse_number(key, value)?,
            _ => return Err(unknown_key(key)),
        }
        self.validate()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "api_url: {}", self.api_url)?;
        writeln!(f, "page_size: {}", self.page_size)?;
        writeln!(f, "refresh_interval_secs: {}", self.refresh_interval_secs)?;
        writeln!(f, "detail_ttl_secs: {}", self.detail_ttl_secs)?;
        writeln!(f, "detail_concurrency: {}", self.detail_concurrency)?;
        match self.detail_cache_max_entries {
            Some(n) => writeln!(f, "detail_cache_max_entries: {n}")?,
            None => writeln!(f, "detail_cache_max_entries: unbounded")?,
        }
        writeln!(f, "debounce_ms: {}", self.debounce_ms)?;
        write!(f, "request_timeout_secs: {}", self.request_timeout_secs)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| DeskError::Config(format!("{key} expects a number, got '{value}'")))
}

fn unknown_key(key: &str) -> DeskError {
    DeskError::Config(format!(
        "unknown config key '{}', expected one of: {}",
        key,
        CONFIG_KEYS.join(", ")
    ))
}
