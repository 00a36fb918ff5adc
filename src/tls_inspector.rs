// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

// Raw TLS handshake used by the TLS posture probe.
// Certificates are inspected, never enforced: an expired or self-signed
// certificate must still complete the handshake so it can be reported.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{AlertDescription, ClientConfig, DigitallySignedStruct, ProtocolVersion, SignatureScheme};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::errors::TransportError;

/// What a completed handshake negotiated
#[derive(Debug, Clone, PartialEq)]
pub struct TlsSession {
    /// e.g. `TLSv1.2`, `TLSv1.3`
    pub protocol: String,
    /// IANA-style suite name, e.g. `TLS13_AES_256_GCM_SHA384`
    pub cipher_suite: String,
    /// DER encoding of the end-entity certificate
    pub peer_certificate: Option<Vec<u8>>,
}

#[derive(Clone)]
pub struct TlsInspector {
    connector: TlsConnector,
    timeout: Duration,
}

impl TlsInspector {
    pub fn new(timeout: Duration) -> Result<Self, rustls::Error> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_protocol_versions(rustls::ALL_VERSIONS)?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(InspectOnlyVerifier { provider }))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            timeout,
        })
    }

    pub async fn handshake(&self, host: &str, port: u16) -> Result<TlsSession, TransportError> {
        let addr = format!("{}:{}", host, port);

        let server_name =
            ServerName::try_from(host.to_string()).map_err(|e| TransportError::InvalidUrl {
                url: addr.clone(),
                reason: e.to_string(),
            })?;

        let tcp = match timeout(self.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(TransportError::Connect {
                    url: addr,
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(TransportError::Timeout {
                    url: addr,
                    timeout: self.timeout,
                })
            }
        };

        let stream = match timeout(self.timeout, self.connector.connect(server_name, tcp)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(classify_handshake_error(host, &e)),
            Err(_) => {
                return Err(TransportError::Timeout {
                    url: addr,
                    timeout: self.timeout,
                })
            }
        };

        let (_, connection) = stream.get_ref();

        let session = TlsSession {
            protocol: connection
                .protocol_version()
                .map(protocol_label)
                .unwrap_or_else(|| "unknown".to_string()),
            cipher_suite: connection
                .negotiated_cipher_suite()
                .map(|suite| format!("{:?}", suite.suite()))
                .unwrap_or_default(),
            peer_certificate: connection
                .peer_certificates()
                .and_then(|chain| chain.first())
                .map(|cert| cert.as_ref().to_vec()),
        };

        debug!(
            host = host,
            protocol = %session.protocol,
            cipher = %session.cipher_suite,
            "TLS handshake completed"
        );

        Ok(session)
    }
}

/// A server that only speaks SSLv3 or TLS 1.0/1.1 either answers our hello
/// with a `protocol_version` alert or selects a version rustls will not
/// negotiate. Both mean the server offers nothing newer than TLS 1.1.
pub fn classify_handshake_error(host: &str, err: &std::io::Error) -> TransportError {
    let rustls_error = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>());

    match rustls_error {
        Some(rustls::Error::AlertReceived(AlertDescription::ProtocolVersion))
        | Some(rustls::Error::PeerIncompatible(_)) => TransportError::LegacyProtocolOnly {
            host: host.to_string(),
            reason: err.to_string(),
        },
        _ => TransportError::TlsHandshake {
            host: host.to_string(),
            reason: err.to_string(),
        },
    }
}

/// Label a negotiated protocol the way servers and scanners usually print it
pub fn protocol_label(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::SSLv2 => "SSLv2".to_string(),
        ProtocolVersion::SSLv3 => "SSLv3".to_string(),
        ProtocolVersion::TLSv1_0 => "TLSv1".to_string(),
        ProtocolVersion::TLSv1_1 => "TLSv1.1".to_string(),
        ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
        ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
        other => format!("{:?}", other),
    }
}

/// Accepts any certificate chain; handshake signatures are still checked.
#[derive(Debug)]
struct InspectOnlyVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for InspectOnlyVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
