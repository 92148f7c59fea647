//! Data models for contacts export

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;

/// Settings the CardDAV client needs for one run
#[derive(Debug, Clone)]
pub struct ContactsConfig {
    /// Address book collection URL (PROPFIND target)
    pub collection_url: String,
    /// Prefix that item hrefs are appended to, without trailing slash
    pub host: String,
    /// Username for authentication
    pub username: String,
    /// Password for authentication
    pub password: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ContactsConfig {
    /// Create a new contacts config with the default 30 second timeout
    pub fn new(
        collection_url: impl Into<String>,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let host: String = host.into();
        Self {
            collection_url: collection_url.into(),
            host: host.trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Build from the application config, deriving the host if needed
    pub fn from_config(config: &ce_core::Config) -> Result<Self> {
        let host = config.host()?;
        Ok(Self::new(
            config.carddav.url.clone(),
            host,
            config.carddav.username.clone(),
            config.carddav.password.clone(),
        )
        .with_timeout(config.timeout()))
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Outcome of one export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// References returned by the listing
    pub listed: usize,
    /// Contacts written to the combined file
    pub saved: usize,
    /// References whose fetch failed
    pub skipped: usize,
    /// Combined output file
    pub path: PathBuf,
}
