//! Client configuration
//!
//! Built programmatically via `Config::new` or loaded from a TOML file
//! via `Config::load`. When loading, the client secret is resolved from
//! the ADA_CLIENT_SECRET env var or a client_secret_file, so the TOML
//! itself never has to carry it.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::DEFAULT_EXPIRY_LEEWAY_SECS;
use crate::error::{Error, Result};
use crate::secret::Secret;

/// Client configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// OAuth2 client identifier
    pub client_id: String,
    /// OAuth2 client secret
    #[serde(default)]
    pub client_secret: Secret,
    /// Service root URL; the token endpoint and API root are derived from it
    pub url: String,
    /// Return raw responses instead of errors for non-success API statuses
    #[serde(default)]
    pub silent_mode: bool,
    /// Path to a file containing the client secret (alternative to ADA_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    /// Seconds before nominal expiry at which the cached token is renewed
    #[serde(default = "default_expiry_leeway")]
    pub expiry_leeway_secs: u64,
}

fn default_expiry_leeway() -> u64 {
    DEFAULT_EXPIRY_LEEWAY_SECS
}

impl Config {
    /// Programmatic configuration with defaults for the optional knobs.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret),
            url: url.into(),
            silent_mode: false,
            client_secret_file: None,
            expiry_leeway_secs: DEFAULT_EXPIRY_LEEWAY_SECS,
        }
    }

    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Client secret resolution order:
    /// 1. ADA_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    /// 3. client_secret value in the TOML
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))?;

        // Validate url is a valid URL with http(s) scheme
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(Error::Config(format!(
                "url must start with http:// or https://, got: {}",
                config.url
            )));
        }

        // Resolve client secret: env var takes precedence over file
        if let Ok(secret) = std::env::var("ADA_CLIENT_SECRET") {
            config.client_secret = Secret::new(secret);
        } else if let Some(ref secret_file) = config.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.client_secret = Secret::new(secret);
            }
        }

        Ok(config)
    }

    /// Check the fields the client cannot operate without.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(Error::Config("client_id must not be empty".into()));
        }
        if self.client_secret.is_empty() {
            return Err(Error::Config("client_secret must not be empty".into()));
        }
        if self.url.is_empty() {
            return Err(Error::Config("url must not be empty".into()));
        }
        Ok(())
    }
}
