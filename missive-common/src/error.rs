//! Error types shared by the missive crates.
//!
//! Everything here is raised before a connection is attempted, so none of it
//! ever leaves a half-finished SMTP session behind.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while loading or validating configuration and credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The secure variant was selected but no usable credentials were given.
    #[error("Credentials are required for the secure variant: {0}")]
    MissingCredentials(&'static str),

    /// A required field has no value.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A value is present but unusable.
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Failed to read a configuration or credential file.
    #[error("Unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A configuration or credential file is not valid RON.
    #[error("Unable to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}
