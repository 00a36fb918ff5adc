// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - TLS Posture Probe
 * Certificate expiry, negotiated protocol version and cipher suite checks
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use url::{Host, Url};

use super::{probe_failure_finding, Probe};
use crate::errors::TransportError;
use crate::http_client::Transport;
use crate::tls_inspector::TlsSession;
use crate::types::{Finding, Severity};

const A02: &str = "A02:2021 - Cryptographic Failures";

const WEAK_PROTOCOLS: [&str; 4] = ["SSLv2", "SSLv3", "TLSv1", "TLSv1.1"];

/// Matched case-insensitively against the negotiated suite name
const WEAK_CIPHER_MARKERS: [&str; 6] = ["RC4", "DES", "MD5", "NULL", "EXPORT", "ANON"];

const EXPIRY_WARNING_DAYS: i64 = 30;

pub struct TlsProbe {
    transport: Arc<dyn Transport>,
}

impl TlsProbe {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    fn no_tls_finding(target: &Url) -> Finding {
        Finding::new(
            "HTTP Only - No SSL/TLS",
            Severity::High,
            "The application is served over HTTP without encryption. All traffic is transmitted in clear text.",
            format!("URL scheme: {}", target.scheme()),
            "Serve the application over HTTPS with a valid certificate and redirect all HTTP traffic to HTTPS.",
        )
        .with_cwe("CWE-319")
        .with_owasp(A02)
    }

    fn handshake_failure_finding(target: &Url, err: &TransportError) -> Finding {
        match err {
            TransportError::TlsHandshake { reason, .. } => Finding::new(
                "SSL/TLS Handshake Failed",
                Severity::Info,
                "The TLS handshake with the target could not be completed.",
                format!("Handshake error: {}", reason),
                "Review the server's TLS configuration and make sure it offers TLS 1.2 or newer.",
            ),
            TransportError::LegacyProtocolOnly { reason, .. } => weak_protocol_finding(
                "The server rejected TLS 1.2 and TLS 1.3 and only accepts older protocol versions.",
                format!("Handshake refused for TLSv1.2/TLSv1.3: {}", reason),
            ),
            other => probe_failure_finding("SSL/TLS Configuration", target, other),
        }
    }

    /// Findings for a completed handshake; no I/O
    pub fn assess_session(session: &TlsSession, now: DateTime<Utc>) -> Vec<Finding> {
        let mut findings = Vec::new();

        if let Some(der) = &session.peer_certificate {
            match certificate_not_after(der) {
                Ok(not_after) => findings.extend(assess_expiry(not_after, now)),
                Err(reason) => findings.push(Finding::new(
                    "Certificate Could Not Be Parsed",
                    Severity::Info,
                    "The server certificate could not be decoded, so its validity period was not checked.",
                    format!("Parse error: {}", reason),
                    "Verify the certificate chain served by the target.",
                )),
            }
        }

        findings.push(assess_protocol(&session.protocol));

        if let Some(finding) = assess_cipher(&session.cipher_suite) {
            findings.push(finding);
        }

        findings
    }
}

/// `notAfter` of a DER-encoded certificate
pub fn certificate_not_after(der: &[u8]) -> Result<DateTime<Utc>, String> {
    let (_, cert) = x509_parser::parse_x509_certificate(der).map_err(|e| e.to_string())?;
    let timestamp = cert.validity().not_after.timestamp();
    DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| format!("notAfter out of range: {}", timestamp))
}

pub fn assess_expiry(not_after: DateTime<Utc>, now: DateTime<Utc>) -> Option<Finding> {
    let stamp = not_after.format("%b %d %H:%M:%S %Y GMT");

    if not_after < now {
        return Some(
            Finding::new(
                "Expired SSL Certificate",
                Severity::Critical,
                "The SSL certificate has expired.",
                format!("Certificate expired on: {}", stamp),
                "Renew the SSL certificate immediately.",
            )
            .with_cwe("CWE-295")
            .with_owasp(A02),
        );
    }

    let days_left = (not_after - now).num_days();
    if days_left < EXPIRY_WARNING_DAYS {
        return Some(
            Finding::new(
                "SSL Certificate Expiring Soon",
                Severity::Medium,
                format!("The SSL certificate will expire in {} days.", days_left),
                format!("Certificate expires on: {}", stamp),
                "Renew the SSL certificate before it expires.",
            )
            .with_cwe("CWE-295")
            .with_owasp(A02),
        );
    }

    None
}

fn weak_protocol_finding(description: impl Into<String>, evidence: impl Into<String>) -> Finding {
    Finding::new(
        "Weak SSL/TLS Protocol Version",
        Severity::High,
        description,
        evidence,
        "Disable SSLv2, SSLv3, TLSv1.0 and TLSv1.1. Use TLSv1.2 or TLSv1.3.",
    )
    .with_cwe("CWE-327")
    .with_owasp(A02)
}

pub fn assess_protocol(protocol: &str) -> Finding {
    if WEAK_PROTOCOLS.contains(&protocol) {
        weak_protocol_finding(
            format!("The server negotiated a weak protocol version: {}", protocol),
            format!("Negotiated protocol: {}", protocol),
        )
    } else {
        Finding::new(
            "Strong SSL/TLS Protocol",
            Severity::Info,
            format!("The server uses a secure protocol version: {}", protocol),
            format!("Negotiated protocol: {}", protocol),
            "Continue using current TLS versions.",
        )
    }
}

pub fn assess_cipher(cipher_suite: &str) -> Option<Finding> {
    let upper = cipher_suite.to_uppercase();
    WEAK_CIPHER_MARKERS
        .iter()
        .any(|marker| upper.contains(marker))
        .then(|| {
            Finding::new(
                "Weak Cipher Suite",
                Severity::High,
                "The server negotiated a weak cipher suite.",
                format!("Cipher: {}", cipher_suite),
                "Disable weak cipher suites and prefer AEAD suites such as AES-GCM or ChaCha20-Poly1305.",
            )
            .with_cwe("CWE-327")
            .with_owasp(A02)
        })
}

/// Hostname suitable for SNI and socket connect (IPv6 without brackets)
fn connect_host(target: &Url) -> Option<String> {
    match target.host()? {
        Host::Domain(domain) => Some(domain.to_string()),
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
    }
}

#[async_trait]
impl Probe for TlsProbe {
    fn name(&self) -> &'static str {
        "tls"
    }

    fn label(&self) -> &'static str {
        "SSL/TLS Configuration"
    }

    async fn analyze(&self, target: &Url) -> Vec<Finding> {
        info!("[SSL/TLS] Scanning: {}", target);

        if target.scheme() != "https" {
            debug!("[SSL/TLS] {} is not served over TLS, skipping handshake", target);
            return vec![Self::no_tls_finding(target)];
        }

        let Some(host) = connect_host(target) else {
            let err = TransportError::InvalidUrl {
                url: target.to_string(),
                reason: "URL has no host".to_string(),
            };
            return vec![probe_failure_finding(self.label(), target, &err)];
        };
        let port = target.port().unwrap_or(443);

        let findings = match self.transport.tls_handshake(&host, port).await {
            Ok(session) => Self::assess_session(&session, Utc::now()),
            Err(e) => vec![Self::handshake_failure_finding(target, &e)],
        };

        info!(
            "[SUCCESS] [SSL/TLS] Completed scan, found {} issues",
            findings.len()
        );

        findings
    }
}
