//! Client configuration file support.
//!
//! Configuration is read from a TOML file and then overridden by environment
//! variables. Every setting has a default, so a missing file is not an error.
//!
//! ```toml
//! [server]
//! base_url = "https://scheduler.example.edu"
//! timeout_ms = 5000
//! course_timeout_ms = 15000
//!
//! [storage]
//! state_path = "trojan-state.json"
//!
//! [coursebin]
//! default_term = "20203"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ClientError, ClientResult};
use crate::models::settings::DEFAULT_TERM;

/// Client configuration from file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub coursebin: CoursebinSettings,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for ordinary requests, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Timeout for course fetches, which scrape the registrar, in milliseconds
    #[serde(default = "default_course_timeout_ms")]
    pub course_timeout_ms: u64,
}

/// Local state snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

/// Coursebin defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoursebinSettings {
    #[serde(default = "default_term")]
    pub default_term: String,
    /// Courses older than this are refetched by a refresh, in minutes
    #[serde(default = "default_course_lifetime_min")]
    pub course_lifetime_min: i64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_course_timeout_ms() -> u64 {
    15_000
}

fn default_state_path() -> PathBuf {
    PathBuf::from("trojan-state.json")
}

fn default_term() -> String {
    DEFAULT_TERM.to_string()
}

fn default_course_lifetime_min() -> i64 {
    10
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            course_timeout_ms: default_course_timeout_ms(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

impl Default for CoursebinSettings {
    fn default() -> Self {
        Self {
            default_term: default_term(),
            course_lifetime_min: default_course_lifetime_min(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(ClientConfig)` if successful
    /// * `Err(ClientError::Config)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> ClientResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ClientError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> ClientResult<Self> {
        toml::from_str(content)
            .map_err(|e| ClientError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Load configuration from the default location, then apply the environment.
    ///
    /// Uses `$TROJAN_CONFIG` when set, otherwise `trojan.toml` in the current
    /// directory. A missing default file yields the built-in defaults; a
    /// missing `$TROJAN_CONFIG` file is an error.
    pub fn load() -> ClientResult<Self> {
        let config = match env::var("TROJAN_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => {
                let path = PathBuf::from("trojan.toml");
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.with_env_overrides()
    }

    /// Apply environment variable overrides.
    ///
    /// # Environment Variables
    /// - `TROJAN_BASE_URL`: backend base URL
    /// - `TROJAN_STATE_PATH`: state snapshot file
    /// - `TROJAN_TIMEOUT_MS`: default request timeout
    /// - `TROJAN_COURSE_TIMEOUT_MS`: course fetch timeout
    /// - `TROJAN_TERM`: default term code
    pub fn with_env_overrides(mut self) -> ClientResult<Self> {
        if let Ok(url) = env::var("TROJAN_BASE_URL") {
            self.server.base_url = url;
        }
        if let Ok(path) = env::var("TROJAN_STATE_PATH") {
            self.storage.state_path = PathBuf::from(path);
        }
        if let Ok(ms) = env::var("TROJAN_TIMEOUT_MS") {
            self.server.timeout_ms = ms.parse().map_err(|_| {
                ClientError::Config("TROJAN_TIMEOUT_MS must be a number of milliseconds".into())
            })?;
        }
        if let Ok(ms) = env::var("TROJAN_COURSE_TIMEOUT_MS") {
            self.server.course_timeout_ms = ms.parse().map_err(|_| {
                ClientError::Config(
                    "TROJAN_COURSE_TIMEOUT_MS must be a number of milliseconds".into(),
                )
            })?;
        }
        if let Ok(term) = env::var("TROJAN_TERM") {
            self.coursebin.default_term = term;
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.server.timeout_ms)
    }

    pub fn course_timeout(&self) -> Duration {
        Duration::from_millis(self.server.course_timeout_ms)
    }

    pub fn course_lifetime(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.coursebin.course_lifetime_min)
    }
}
