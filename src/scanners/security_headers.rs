// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Security Headers Probe
 * Tests for missing HTTP security headers and technology disclosure
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use url::Url;

use super::{probe_failure_finding, Probe};
use crate::http_client::{HttpResponse, Transport};
use crate::types::{Finding, Severity};

const A01: &str = "A01:2021 - Broken Access Control";
const A03: &str = "A03:2021 - Injection";
const A05: &str = "A05:2021 - Security Misconfiguration";

/// Tracked header and the finding emitted when it is absent
pub struct HeaderRule {
    pub name: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub remediation: &'static str,
    pub cwe_id: &'static str,
    pub owasp: &'static str,
}

pub const TRACKED_HEADERS: [HeaderRule; 7] = [
    HeaderRule {
        name: "Strict-Transport-Security",
        severity: Severity::Medium,
        description: "HTTP Strict Transport Security (HSTS) ensures the browser only connects via HTTPS.",
        remediation: "Add 'Strict-Transport-Security: max-age=31536000; includeSubDomains; preload' to all HTTPS responses.",
        cwe_id: "CWE-523",
        owasp: A05,
    },
    HeaderRule {
        name: "Content-Security-Policy",
        severity: Severity::High,
        description: "Content Security Policy (CSP) limits which resources can load and mitigates XSS.",
        remediation: "Implement a Content-Security-Policy header with directives suited to the application.",
        cwe_id: "CWE-1021",
        owasp: A03,
    },
    HeaderRule {
        name: "X-Frame-Options",
        severity: Severity::Medium,
        description: "X-Frame-Options prevents clickjacking by controlling whether the page can be framed.",
        remediation: "Add 'X-Frame-Options: DENY' or 'X-Frame-Options: SAMEORIGIN'.",
        cwe_id: "CWE-1021",
        owasp: A05,
    },
    HeaderRule {
        name: "X-Content-Type-Options",
        severity: Severity::Low,
        description: "X-Content-Type-Options prevents MIME-sniffing attacks.",
        remediation: "Add 'X-Content-Type-Options: nosniff' to all responses.",
        cwe_id: "CWE-16",
        owasp: A05,
    },
    HeaderRule {
        name: "X-XSS-Protection",
        severity: Severity::Low,
        description: "X-XSS-Protection enables the legacy browser XSS filter (superseded by CSP).",
        remediation: "Add 'X-XSS-Protection: 1; mode=block', or better, rely on Content-Security-Policy.",
        cwe_id: "CWE-79",
        owasp: A03,
    },
    HeaderRule {
        name: "Referrer-Policy",
        severity: Severity::Low,
        description: "Referrer-Policy controls how much referrer information is sent with requests.",
        remediation: "Add 'Referrer-Policy: strict-origin-when-cross-origin' or 'no-referrer'.",
        cwe_id: "CWE-200",
        owasp: A01,
    },
    HeaderRule {
        name: "Permissions-Policy",
        severity: Severity::Info,
        description: "Permissions-Policy controls which browser features the page may use.",
        remediation: "Add a Permissions-Policy header restricting unneeded browser features.",
        cwe_id: "CWE-250",
        owasp: A05,
    },
];

/// Substrings of a `Server` value that reveal product or version
const SERVER_DISCLOSURE_MARKERS: [&str; 4] = ["apache", "nginx", "iis", "/"];

pub struct SecurityHeadersProbe {
    transport: Arc<dyn Transport>,
}

impl SecurityHeadersProbe {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Findings for a single response; no I/O
    pub fn check_response(response: &HttpResponse) -> Vec<Finding> {
        let mut findings = Vec::new();

        for rule in &TRACKED_HEADERS {
            if !response.has_header(rule.name) {
                findings.push(
                    Finding::new(
                        format!("Missing Security Header: {}", rule.name),
                        rule.severity,
                        rule.description,
                        format!("Header '{}' not found in response", rule.name),
                        rule.remediation,
                    )
                    .with_cwe(rule.cwe_id)
                    .with_owasp(rule.owasp),
                );
            }
        }

        if let Some(server) = response.header("server") {
            let lower = server.to_lowercase();
            if SERVER_DISCLOSURE_MARKERS.iter().any(|m| lower.contains(m)) {
                findings.push(
                    Finding::new(
                        "Server Version Disclosure in Headers",
                        Severity::Info,
                        "The Server header reveals web server software or version information.",
                        format!("Server: {}", server),
                        "Configure the web server to suppress version information in the Server header.",
                    )
                    .with_cwe("CWE-200")
                    .with_owasp(A05),
                );
            }
        }

        if let Some(powered_by) = response.header("x-powered-by") {
            findings.push(
                Finding::new(
                    "Technology Disclosure via X-Powered-By Header",
                    Severity::Info,
                    "The X-Powered-By header reveals technology stack information.",
                    format!("X-Powered-By: {}", powered_by),
                    "Remove the X-Powered-By header from responses.",
                )
                .with_cwe("CWE-200")
                .with_owasp(A05),
            );
        }

        findings
    }
}

#[async_trait]
impl Probe for SecurityHeadersProbe {
    fn name(&self) -> &'static str {
        "security_headers"
    }

    fn label(&self) -> &'static str {
        "Security Headers"
    }

    async fn analyze(&self, target: &Url) -> Vec<Finding> {
        info!("[Security Headers] Scanning: {}", target);

        let findings = match self.transport.get(target.as_str()).await {
            Ok(response) => Self::check_response(&response),
            Err(e) => vec![probe_failure_finding(self.label(), target, &e)],
        };

        info!(
            "[SUCCESS] [Security Headers] Completed scan, found {} issues",
            findings.len()
        );

        findings
    }
}
