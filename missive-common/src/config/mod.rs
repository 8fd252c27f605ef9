//! Configuration for a send run.
//!
//! Loaded from a RON file; every section is optional and falls back to its
//! default, so an empty `()` is a valid (if not very useful) configuration.
//!
//! ```ron
//! (
//!     server: (host: "smtp.example.com", client_id: "laptop.example.com"),
//!     tls: (security: tls),
//!     credentials: Some("/home/alice/.config/missive/credentials.ron"),
//! )
//! ```
//!
//! ## Modules
//!
//! - [`tls`]: transport security and certificate validation

pub mod tls;

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use tls::{Security, TlsCertificatePolicy, TlsConfig};

use crate::{error::ConfigError, message::Limits};

/// Where to connect and how to introduce ourselves.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    /// Defaults to the conventional port for the configured [`Security`].
    pub port: Option<u16>,
    /// The argument to `EHLO`.
    pub client_id: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            client_id: "localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub tls: TlsConfig,
    /// Path to the credential file, required for [`Security::Tls`].
    pub credentials: Option<PathBuf>,
    pub limits: Limits,
}

impl Config {
    /// Read a configuration file.
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid RON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The port to connect to.
    pub fn port(&self) -> u16 {
        self.server
            .port
            .unwrap_or_else(|| self.tls.security.default_port())
    }

    /// Check the settings before anything touches the network.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::MissingField("server.host"));
        }

        if self.server.client_id.is_empty() {
            return Err(ConfigError::MissingField("server.client_id"));
        }

        if self.server.port == Some(0) {
            return Err(ConfigError::InvalidConfiguration {
                field: "server.port".to_string(),
                reason: "must be between 1-65535".to_string(),
            });
        }

        if self.tls.is_secure() && self.credentials.is_none() {
            return Err(ConfigError::MissingCredentials("no credential file configured"));
        }

        if self.limits.max_reply_size < 3 {
            return Err(ConfigError::InvalidConfiguration {
                field: "limits.max_reply_size".to_string(),
                reason: "must hold at least a status code".to_string(),
            });
        }

        Ok(())
    }
}
