// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - SQL Injection Probe
 * Error-based detection through query parameters and form submissions
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use super::forms::{self, Form};
use super::{probe_failure_finding, Absorbed, Probe};
use crate::http_client::{HttpResponse, Transport};
use crate::types::{Finding, Severity};

/// Classic error-triggering payloads, in the order they are tried
pub const SQL_PAYLOADS: [&str; 3] = ["'", "1' OR '1'='1", "' OR '1'='1' --"];

/// Database error fragments, matched against the lowercased body
pub const SQL_ERROR_SIGNATURES: [&str; 10] = [
    "mysql",
    "sql syntax",
    "sqlite",
    "postgresql",
    "oracle",
    "odbc",
    "microsoft sql",
    "syntax error",
    "unclosed quotation",
    "quoted string not properly terminated",
];

const A03: &str = "A03:2021 - Injection";

const MAX_FORMS: usize = 3;

/// Field types that never carry the payload
const SKIPPED_KINDS: [&str; 4] = ["submit", "button", "image", "reset"];

pub struct SqlInjectionProbe {
    transport: Arc<dyn Transport>,
}

/// First database error signature found in a response, if any
pub fn detect_sql_error(response: &HttpResponse) -> Option<&'static str> {
    let body = response.body.to_lowercase();
    SQL_ERROR_SIGNATURES.iter().copied().find(|sig| body.contains(sig))
}

impl SqlInjectionProbe {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Submission values with `payload` in every eligible field; other named
    /// fields keep their declared value, or `test` when empty
    fn submission(form: &Form, payload: &str) -> Vec<(String, String)> {
        form.fields
            .iter()
            .map(|f| {
                let value = if f.is_kind(&SKIPPED_KINDS) {
                    if f.value.is_empty() {
                        "test".to_string()
                    } else {
                        f.value.clone()
                    }
                } else {
                    payload.to_string()
                };
                (f.name.clone(), value)
            })
            .collect()
    }

    fn has_injectable_field(form: &Form) -> bool {
        form.fields.iter().any(|f| !f.is_kind(&SKIPPED_KINDS))
    }

    async fn test_params(&self, target: &Url, absorbed: &mut Absorbed) -> Option<Finding> {
        for param in forms::query_param_names(target) {
            for payload in SQL_PAYLOADS {
                let test_url = forms::with_param(target, &param, payload);

                match self.transport.get(test_url.as_str()).await {
                    Ok(response) => {
                        if let Some(signature) = detect_sql_error(&response) {
                            return Some(
                                Finding::new(
                                    "SQL Injection Vulnerability (Error-Based)",
                                    Severity::Critical,
                                    format!(
                                        "Parameter '{}' appears vulnerable to SQL injection. Database error messages were triggered.",
                                        param
                                    ),
                                    format!("Payload '{}' triggered SQL error pattern: '{}'", payload, signature),
                                    "Use parameterized queries for all database access and never concatenate user input into SQL.",
                                )
                                .with_cwe("CWE-89")
                                .with_owasp(A03),
                            );
                        }
                    }
                    Err(e) => absorbed.record(&format!("Parameter '{}'", param), &e),
                }
            }
        }

        None
    }

    async fn test_forms(&self, forms: &[Form], absorbed: &mut Absorbed) -> Option<Finding> {
        for (i, form) in forms.iter().take(MAX_FORMS).enumerate() {
            if !Self::has_injectable_field(form) {
                debug!("[SQLi] Form #{} has no injectable fields", i + 1);
                continue;
            }

            for payload in SQL_PAYLOADS {
                let values = Self::submission(form, payload);

                match form.submit(self.transport.as_ref(), &values).await {
                    Ok(response) => {
                        if let Some(signature) = detect_sql_error(&response) {
                            return Some(
                                Finding::new(
                                    format!("SQL Injection in Form #{}", i + 1),
                                    Severity::Critical,
                                    format!("Form at {} appears vulnerable to SQL injection.", form.action),
                                    format!("Payload '{}' triggered SQL error pattern: '{}'", payload, signature),
                                    "Use parameterized queries for all database access and never concatenate user input into SQL.",
                                )
                                .with_cwe("CWE-89")
                                .with_owasp(A03),
                            );
                        }
                    }
                    Err(e) => absorbed.record(&format!("Form #{} submission", i + 1), &e),
                }
            }
        }

        None
    }

    fn not_detected_finding(absorbed: &Absorbed) -> Finding {
        let mut evidence =
            "Error-based SQL injection payloads did not trigger database errors".to_string();
        if !absorbed.is_empty() {
            evidence.push_str(&format!(". Untested: {}", absorbed.summary()));
        }

        Finding::new(
            "No SQL Injection Detected",
            Severity::Info,
            "No obvious SQL injection vulnerabilities were detected in basic testing.",
            evidence,
            "This does not guarantee absence of SQL injection. Perform comprehensive testing with advanced techniques.",
        )
    }
}

#[async_trait]
impl Probe for SqlInjectionProbe {
    fn name(&self) -> &'static str {
        "sqli"
    }

    fn label(&self) -> &'static str {
        "SQL Injection Detection"
    }

    async fn analyze(&self, target: &Url) -> Vec<Finding> {
        info!("[SQLi] Scanning: {}", target);

        let page = match self.transport.get(target.as_str()).await {
            Ok(response) => response,
            Err(e) => return vec![probe_failure_finding(self.label(), target, &e)],
        };

        let mut absorbed = Absorbed::new(self.label());

        if let Some(finding) = self.test_params(target, &mut absorbed).await {
            info!("[SQLi] Error-based injection confirmed via query parameter");
            return vec![finding];
        }

        let discovered = forms::discover_forms(&page.body, target);
        if let Some(finding) = self.test_forms(&discovered, &mut absorbed).await {
            info!("[SQLi] Error-based injection confirmed via form submission");
            return vec![finding];
        }

        info!("[SUCCESS] [SQLi] Completed scan, no database errors triggered");
        vec![Self::not_detected_finding(&absorbed)]
    }
}
