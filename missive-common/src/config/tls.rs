//! TLS settings for the connection to the submission server.

use serde::Deserialize;

/// How the transport is secured.
///
/// There is no STARTTLS upgrade: a secure connection performs the TLS
/// handshake immediately after connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Security {
    /// Plaintext TCP. No authentication is attempted.
    #[default]
    Plain,

    /// TLS from the first byte, followed by AUTH LOGIN.
    Tls,
}

impl Security {
    /// The conventional port for this kind of connection.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Plain => 25,
            Self::Tls => 465,
        }
    }
}

/// Certificate validation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub struct TlsCertificatePolicy {
    /// Accept self-signed, expired or otherwise invalid certificates.
    ///
    /// **SECURITY WARNING**: this makes the connection open to
    /// man-in-the-middle attacks. Only meant for test servers.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub struct TlsConfig {
    #[serde(default)]
    pub security: Security,

    #[serde(default)]
    pub certificate: TlsCertificatePolicy,
}

impl TlsConfig {
    /// Plaintext, certificates irrelevant.
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            security: Security::Plain,
            certificate: TlsCertificatePolicy {
                accept_invalid_certs: false,
            },
        }
    }

    /// Implicit TLS with full certificate validation.
    #[must_use]
    pub const fn secure() -> Self {
        Self {
            security: Security::Tls,
            certificate: TlsCertificatePolicy {
                accept_invalid_certs: false,
            },
        }
    }

    /// Implicit TLS against a server with a self-signed certificate.
    ///
    /// **WARNING**: Only use in test environments.
    #[must_use]
    pub const fn insecure() -> Self {
        Self {
            security: Security::Tls,
            certificate: TlsCertificatePolicy {
                accept_invalid_certs: true,
            },
        }
    }

    #[must_use]
    pub const fn is_secure(&self) -> bool {
        matches!(self.security, Security::Tls)
    }

    #[must_use]
    pub const fn accepts_invalid_certs(&self) -> bool {
        self.certificate.accept_invalid_certs
    }
}
