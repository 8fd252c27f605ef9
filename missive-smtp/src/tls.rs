//! TLS client setup for the secure transport.

use std::sync::Arc;

use missive_common::tracing;
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    client::TlsStream,
    rustls::{
        ClientConfig, DigitallySignedStruct, Error as RustlsError, RootCertStore,
        SignatureScheme,
        client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
        pki_types::{CertificateDer, ServerName, UnixTime},
    },
};

use crate::error::TransportError;

/// Root store populated from the platform's certificate store.
fn native_roots() -> RootCertStore {
    let mut root_store = RootCertStore::empty();

    let certs = rustls_native_certs::load_native_certs();
    let (added, ignored) = root_store.add_parsable_certificates(certs.certs);
    if !certs.errors.is_empty() {
        tracing::warn!(?certs.errors, "Some certificates could not be loaded");
    }
    tracing::trace!(added, ignored, "Loaded native root certificates");

    root_store
}

fn client_config(accept_invalid_certs: bool) -> ClientConfig {
    let mut config = ClientConfig::builder()
        .with_root_certificates(native_roots())
        .with_no_client_auth();

    if accept_invalid_certs {
        config
            .dangerous()
            .set_certificate_verifier(Arc::new(NoVerifier));
    }

    config
}

/// Run the client handshake over a freshly connected stream.
///
/// # Errors
/// [`TransportError::InvalidServerName`] if `host` cannot be used for SNI,
/// [`TransportError::Handshake`] if the handshake fails.
pub async fn handshake(
    stream: TcpStream,
    host: &str,
    accept_invalid_certs: bool,
) -> Result<TlsStream<TcpStream>, TransportError> {
    if accept_invalid_certs {
        tracing::warn!(
            server = %host,
            "SECURITY WARNING: TLS certificate validation is disabled for this connection"
        );
    }

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| TransportError::InvalidServerName(host.to_string()))?;

    let connector = TlsConnector::from(Arc::new(client_config(accept_invalid_certs)));

    connector
        .connect(server_name, stream)
        .await
        .map_err(|e| TransportError::Handshake {
            target: host.to_string(),
            reason: e.to_string(),
        })
}

/// A certificate verifier that accepts all certificates (for testing only).
#[derive(Debug)]
struct NoVerifier;

impl ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, RustlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ED25519,
        ]
    }
}
