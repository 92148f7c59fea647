//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. environment variables
//! 2. `contacts-export.toml` (or the file passed with `--config`)
//! 3. defaults
//!
//! Inside the config file, `${VAR_NAME}` is replaced with the value of the
//! environment variable, so credentials can stay out of the file.

use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Config file looked up in the working directory by [`Config::load`]
pub const DEFAULT_CONFIG_FILE: &str = "contacts-export.toml";

/// CardDAV collection and credentials
#[derive(Debug, Clone, Default)]
pub struct CarddavConfig {
    /// Address book collection URL (the PROPFIND target)
    pub url: String,

    /// Username for basic authentication
    pub username: String,

    /// Password (app password for Google accounts)
    pub password: String,

    /// Prefix that item hrefs are appended to. Derived from `url` when unset.
    pub host: Option<String>,
}

/// Where the combined vCard file is written
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub dir: String,

    pub file_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            file_name: default_output_file(),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_output_file() -> String {
    "contacts_combined.vcf".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Main configuration for contacts-export
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub carddav: CarddavConfig,

    pub output: OutputConfig,

    pub http: HttpConfig,
}

impl Config {
    /// Replace `${VAR_NAME}` with the environment value.
    ///
    /// Unset variables expand to an empty string. A `$` not followed by `{`
    /// is copied through unchanged.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // '{'

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load settings from a TOML file, then apply environment overrides.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut cfg = Self::from_toml_str(&toml_content)?;
        cfg.apply_env_overrides();
        cfg.validate()?;

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    fn from_toml_str(content: &str) -> Result<Self> {
        let toml: TomlConfig = toml::from_str(content)?;
        Ok(Self::from_toml_config(toml))
    }

    /// Use `contacts-export.toml` from the working directory if it exists,
    /// otherwise read everything from the environment.
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Expansion runs on the parsed values, so quotes or backslashes in an
    /// environment value never reach the TOML parser.
    fn from_toml_config(toml: TomlConfig) -> Self {
        let carddav = toml.carddav.unwrap_or_default();
        let output = toml.output.unwrap_or_default();
        let http = toml.http.unwrap_or_default();
        let expand = |value: Option<String>| value.map(|v| Self::expand_env_vars(&v));

        Config {
            carddav: CarddavConfig {
                url: expand(carddav.url).unwrap_or_default(),
                username: expand(carddav.username).unwrap_or_default(),
                password: expand(carddav.password).unwrap_or_default(),
                host: expand(carddav.host).filter(|h| !h.is_empty()),
            },
            output: OutputConfig {
                dir: expand(output.dir).unwrap_or_else(default_output_dir),
                file_name: expand(output.file_name).unwrap_or_else(default_output_file),
            },
            http: HttpConfig {
                timeout_secs: http.timeout_secs.unwrap_or_else(default_timeout_secs),
            },
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CARDDAV_URL") {
            if !url.is_empty() {
                self.carddav.url = url;
            }
        }
        if let Ok(username) = std::env::var("CARDDAV_USERNAME") {
            if !username.is_empty() {
                self.carddav.username = username;
            }
        }
        if let Ok(password) = std::env::var("CARDDAV_PASSWORD") {
            if !password.is_empty() {
                self.carddav.password = password;
            }
        }
        if let Ok(host) = std::env::var("CARDDAV_HOST") {
            if !host.is_empty() {
                self.carddav.host = Some(host);
            }
        }

        if let Ok(dir) = std::env::var("OUTPUT_DIR") {
            if !dir.is_empty() {
                self.output.dir = dir;
            }
        }
        if let Ok(file_name) = std::env::var("OUTPUT_FILE") {
            if !file_name.is_empty() {
                self.output.file_name = file_name;
            }
        }

        if let Ok(timeout) = std::env::var("HTTP_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => self.http.timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid HTTP_TIMEOUT_SECS: {}", timeout),
            }
        }
    }

    /// Check that everything needed to talk to the server is present.
    pub fn validate(&self) -> Result<()> {
        if self.carddav.url.is_empty() {
            return Err(Error::Config("CARDDAV_URL not set".to_string()));
        }
        if self.carddav.username.is_empty() {
            return Err(Error::Config("CARDDAV_USERNAME not set".to_string()));
        }
        if self.carddav.password.is_empty() {
            return Err(Error::Config("CARDDAV_PASSWORD not set".to_string()));
        }

        Url::parse(&self.carddav.url)
            .map_err(|e| Error::Config(format!("Invalid CardDAV URL '{}': {}", self.carddav.url, e)))?;

        if self.output.file_name.is_empty() {
            return Err(Error::Config("Output file name is empty".to_string()));
        }

        if self.http.timeout_secs == 0 {
            return Err(Error::Config("HTTP timeout must be at least 1 second".to_string()));
        }

        Ok(())
    }

    /// Prefix for item hrefs: the configured host, or the origin of the
    /// collection URL (`https://www.google.com` for Google's endpoint).
    pub fn host(&self) -> Result<String> {
        if let Some(host) = &self.carddav.host {
            return Ok(host.trim_end_matches('/').to_string());
        }

        let url = Url::parse(&self.carddav.url)
            .map_err(|e| Error::Config(format!("Invalid CardDAV URL '{}': {}", self.carddav.url, e)))?;

        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(Error::Config(format!(
                "Cannot derive host from CardDAV URL '{}'",
                self.carddav.url
            )));
        }

        Ok(origin.ascii_serialization())
    }

    /// Full path of the combined output file
    pub fn combined_path(&self) -> PathBuf {
        Path::new(&self.output.dir).join(&self.output.file_name)
    }

    /// Point the output at an explicit file path (the `--output` flag).
    pub fn with_output_path(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        self.output.dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.display().to_string(),
            _ => default_output_dir(),
        };
        if let Some(name) = path.file_name() {
            self.output.file_name = name.to_string_lossy().into_owned();
        }

        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

// ============================================================================
// TOML file structure
// ============================================================================

#[derive(Debug, Deserialize)]
struct TomlConfig {
    carddav: Option<TomlCarddavConfig>,
    output: Option<TomlOutputConfig>,
    http: Option<TomlHttpConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlCarddavConfig {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    host: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlOutputConfig {
    #[serde(default)]
    dir: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlHttpConfig {
    #[serde(default)]
    timeout_secs: Option<u64>,
}
