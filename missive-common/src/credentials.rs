//! Credentials for AUTH LOGIN, loaded from a RON file:
//!
//! ```ron
//! (
//!     username: "alice@example.com",
//!     password: "correct horse battery staple",
//! )
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read and validate a credential file.
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if it is not valid RON, and [`ConfigError::MissingCredentials`] if
    /// either value is empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let credentials: Self = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        credentials.validate()?;
        Ok(credentials)
    }

    /// # Errors
    /// [`ConfigError::MissingCredentials`] if the username or password is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.is_empty() {
            return Err(ConfigError::MissingCredentials("username is empty"));
        }

        if self.password.is_empty() {
            return Err(ConfigError::MissingCredentials("password is empty"));
        }

        Ok(())
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
