//! Byte transport under the SMTP session.
//!
//! The session only ever talks to a [`Transport`], so the same command script
//! runs over a plain TCP stream, a TLS stream, or a scripted stand-in in
//! tests.

use std::{future::Future, io, net::SocketAddr};

use missive_common::{config::TlsConfig, tracing};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use tokio_rustls::client::TlsStream;

use crate::{
    error::{Result, TransportError},
    tls,
};

/// Send and receive raw bytes.
pub trait Transport {
    /// Write all of `data`, returning the number of bytes written.
    fn send(&mut self, data: &[u8]) -> impl Future<Output = Result<usize>> + Send;

    /// Wait for data and return whatever arrived, up to `max_bytes`.
    ///
    /// An empty buffer means the peer closed the connection.
    fn receive(&mut self, max_bytes: usize) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Shut the connection down.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Where to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub tls: TlsConfig,
}

impl Target {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, tls: TlsConfig) -> Self {
        Self {
            host: host.into(),
            port,
            tls,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A connection to an SMTP server that can be either plain TCP or TLS-wrapped.
pub enum Connection {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Connection {
    /// Resolve, connect and, for a secure target, complete the TLS handshake
    /// before returning. Nothing has been read from the server yet.
    ///
    /// # Errors
    /// Any [`TransportError`]; none of them are retried.
    #[tracing::instrument(level = "debug", skip_all, fields(target = %target.address()), err)]
    pub async fn open(target: &Target) -> std::result::Result<Self, TransportError> {
        let address = target.address();

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&address)
            .await
            .map_err(|source| TransportError::Resolve {
                target: address.clone(),
                source,
            })?
            .collect();

        if addrs.is_empty() {
            return Err(TransportError::Resolve {
                target: address,
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
            });
        }

        let stream = TcpStream::connect(addrs.as_slice())
            .await
            .map_err(|source| TransportError::Connect {
                target: address.clone(),
                source,
            })?;

        tracing::debug!(peer = ?stream.peer_addr().ok(), "Connected");

        if target.tls.is_secure() {
            let stream =
                tls::handshake(stream, &target.host, target.tls.accepts_invalid_certs()).await?;
            tracing::debug!("TLS handshake complete");
            Ok(Self::Tls(Box::new(stream)))
        } else {
            Ok(Self::Plain(stream))
        }
    }
}

impl Transport for Connection {
    async fn send(&mut self, data: &[u8]) -> Result<usize> {
        match self {
            Self::Plain(stream) => stream.write_all(data).await?,
            Self::Tls(stream) => {
                stream.write_all(data).await?;
                stream.flush().await?;
            }
        }
        Ok(data.len())
    }

    async fn receive(&mut self, max_bytes: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; max_bytes];
        let n = match self {
            Self::Plain(stream) => stream.read(&mut buffer).await?,
            Self::Tls(stream) => stream.read(&mut buffer).await?,
        };
        buffer.truncate(n);
        Ok(buffer)
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            Self::Plain(stream) => stream.shutdown().await?,
            Self::Tls(stream) => stream.shutdown().await?,
        }
        Ok(())
    }
}
