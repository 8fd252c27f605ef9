//! Command-line arguments.
//!
//! Every flag is optional: connection flags override the configuration file,
//! message flags skip the matching prompt.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use missive_common::config::{Config, Security};

use crate::prompt::MessageDraft;

/// Send one message over SMTP
#[derive(Parser, Debug, Default)]
#[command(name = "missive")]
#[command(about = "Send one message over SMTP", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (RON); overrides `MISSIVE_CONFIG` and the default locations
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host name of the submission server
    #[arg(long)]
    pub server: Option<String>,

    /// Port to connect to [default: 25 for plain, 465 for tls]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Plaintext, or TLS followed by AUTH LOGIN
    #[arg(long, value_enum)]
    pub security: Option<SecurityArg>,

    /// Accept invalid TLS certificates (testing only)
    #[arg(long)]
    pub accept_invalid_certs: bool,

    /// Credential file (RON) used for AUTH LOGIN
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// Name to announce in EHLO
    #[arg(long)]
    pub client_id: Option<String>,

    /// Sender address
    #[arg(short, long)]
    pub from: Option<String>,

    /// Recipient address
    #[arg(short, long)]
    pub to: Option<String>,

    #[arg(short, long)]
    pub subject: Option<String>,

    /// Message text
    #[arg(short, long)]
    pub body: Option<String>,

    /// File to attach
    #[arg(short, long)]
    pub attach: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); overrides `MISSIVE_LOG`
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityArg {
    Plain,
    Tls,
}

impl From<SecurityArg> for Security {
    fn from(arg: SecurityArg) -> Self {
        match arg {
            SecurityArg::Plain => Self::Plain,
            SecurityArg::Tls => Self::Tls,
        }
    }
}

impl Cli {
    /// Apply the connection flags on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(server) = &self.server {
            config.server.host.clone_from(server);
        }

        if let Some(port) = self.port {
            config.server.port = Some(port);
        }

        if let Some(client_id) = &self.client_id {
            config.server.client_id.clone_from(client_id);
        }

        if let Some(security) = self.security {
            config.tls.security = security.into();
        }

        if self.accept_invalid_certs {
            config.tls.certificate.accept_invalid_certs = true;
        }

        if let Some(credentials) = &self.credentials {
            config.credentials = Some(credentials.clone());
        }
    }

    /// The message fields given on the command line.
    pub fn draft(&self) -> MessageDraft {
        MessageDraft {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
            attachment: self.attach.clone(),
        }
    }
}
