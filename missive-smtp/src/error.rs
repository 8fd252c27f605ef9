//! Error types for the SMTP session engine.

use std::io;

use missive_common::error::ConfigError;
use thiserror::Error;

use crate::script::Step;

/// Failures establishing the transport. All of them are fatal.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The host name did not resolve to any address.
    #[error("Unable to resolve {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Every resolved address refused or timed out.
    #[error("Unable to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    /// The host cannot be used as a TLS server name.
    #[error("Invalid TLS server name {0}")]
    InvalidServerName(String),

    /// The TLS handshake did not complete.
    #[error("TLS handshake with {target} failed: {reason}")]
    Handshake { target: String, reason: String },
}

/// Errors that abort a send.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Read or write failure on the transport itself.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A read or write failed while `step` was in progress.
    #[error("{step} failed: {source}")]
    Interrupted {
        step: Step,
        #[source]
        source: io::Error,
    },

    /// The server closed the connection while a reply to `step` was expected.
    #[error("Connection closed unexpectedly during {step}")]
    ConnectionClosed { step: Step },

    /// The server answered with a different status code than the step needs.
    #[error("{step} failed: sent {command:?}, expected {expected}, received {actual} ({message})")]
    UnexpectedResponse {
        step: Step,
        command: String,
        expected: u16,
        actual: u16,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// The step that failed, when the failure happened inside the script.
    #[must_use]
    pub const fn step(&self) -> Option<Step> {
        match self {
            Self::UnexpectedResponse { step, .. }
            | Self::Interrupted { step, .. }
            | Self::ConnectionClosed { step } => Some(*step),
            _ => None,
        }
    }

    /// Attach `step` to a bare transport failure.
    #[must_use]
    pub fn during(self, step: Step) -> Self {
        match self {
            Self::Io(source) => Self::Interrupted { step, source },
            other => other,
        }
    }
}

/// Why an attachment was left out of a message. Never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("Attachment has no name or no content")]
    Empty,

    #[error("Encoded attachment is {encoded} bytes, over the {limit} byte limit")]
    TooLarge { encoded: usize, limit: usize },
}

/// Specialized `Result` type for SMTP client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
