// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Reflected XSS Probe
 * Form and query parameter reflection checks plus inline handler detection
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
use crate::http_client::Transport;
use crate::types::{Finding, Severity};

pub const XSS_PAYLOAD: &str = "<script>alert(1)</script>";

const A03: &str = "A03:2021 - Injection";

const MAX_FORMS: usize = 3;
const MAX_PARAMS: usize = 3;

/// Field types never filled with the payload
const SKIPPED_KINDS: [&str; 3] = ["submit", "button", "hidden"];

pub struct XssProbe {
    transport: Arc<dyn Transport>,
}

/// What the landing page offers for testing
struct PageSurface {
    forms: Vec<Form>,
    inline_handler: Option<(&'static str, usize)>,
}

impl XssProbe {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    fn inspect_page(html: &str, target: &Url) -> PageSurface {
        PageSurface {
            forms: forms::discover_forms(html, target),
            inline_handler: forms::first_inline_handler(html),
        }
    }

    /// Payload in every eligible field; forms with none are not submitted
    fn payload_fields(form: &Form) -> Vec<(String, String)> {
        form.fields
            .iter()
            .filter(|f| !f.is_kind(&SKIPPED_KINDS))
            .map(|f| (f.name.clone(), XSS_PAYLOAD.to_string()))
            .collect()
    }

    async fn test_forms(&self, forms: &[Form], absorbed: &mut Absorbed) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (i, form) in forms.iter().take(MAX_FORMS).enumerate() {
            let fields = Self::payload_fields(form);
            if fields.is_empty() {
                debug!("[XSS] Form #{} has no injectable fields", i + 1);
                continue;
            }

            match form.submit(self.transport.as_ref(), &fields).await {
                Ok(response) if response.contains(XSS_PAYLOAD) => {
                    findings.push(
                        Finding::new(
                            format!("Reflected XSS in Form #{}", i + 1),
                            Severity::High,
                            "Form input is reflected in the response without proper encoding.",
                            format!("Form at {} reflects XSS payload", form.action),
                            "Encode all user input on output and deploy a Content-Security-Policy header.",
                        )
                        .with_cwe("CWE-79")
                        .with_owasp(A03),
                    );
                }
                Ok(_) => {}
                Err(e) => absorbed.record(&format!("Form #{} submission", i + 1), &e),
            }
        }

        findings
    }

    async fn test_params(&self, target: &Url, params: &[String], absorbed: &mut Absorbed) -> Vec<Finding> {
        let mut findings = Vec::new();

        for param in params.iter().take(MAX_PARAMS) {
            let test_url = forms::with_param(target, param, XSS_PAYLOAD);

            match self.transport.get(test_url.as_str()).await {
                Ok(response) if response.contains(XSS_PAYLOAD) => {
                    findings.push(
                        Finding::new(
                            "Reflected XSS in URL Parameter",
                            Severity::High,
                            format!(
                                "Input from parameter '{}' is reflected in the response without proper encoding.",
                                param
                            ),
                            format!("Parameter '{}' reflects input: {}", param, XSS_PAYLOAD),
                            "Encode all user input on output and deploy a Content-Security-Policy header.",
                        )
                        .with_cwe("CWE-79")
                        .with_owasp(A03),
                    );
                }
                Ok(_) => {}
                Err(e) => absorbed.record(&format!("Parameter '{}'", param), &e),
            }
        }

        findings
    }

    fn inline_handler_finding(attr: &str, count: usize) -> Finding {
        Finding::new(
            "Potential DOM-based XSS Vector",
            Severity::Medium,
            format!("Found {} elements with inline event handler '{}'.", count, attr),
            format!("Elements with {} attribute detected", attr),
            "Avoid inline event handlers. Attach listeners with addEventListener from external scripts.",
        )
        .with_cwe("CWE-79")
        .with_owasp(A03)
    }
}

#[async_trait]
impl Probe for XssProbe {
    fn name(&self) -> &'static str {
        "xss"
    }

    fn label(&self) -> &'static str {
        "XSS Detection"
    }

    async fn analyze(&self, target: &Url) -> Vec<Finding> {
        info!("[XSS] Scanning: {}", target);

        let page = match self.transport.get(target.as_str()).await {
            Ok(response) => response,
            Err(e) => return vec![probe_failure_finding(self.label(), target, &e)],
        };

        let surface = Self::inspect_page(&page.body, target);
        let mut absorbed = Absorbed::new(self.label());
        let mut findings = Vec::new();

        if !surface.forms.is_empty() {
            findings.extend(self.test_forms(&surface.forms, &mut absorbed).await);
        } else {
            let params = forms::query_param_names(target);
            if params.is_empty() {
                findings.push(Finding::new(
                    "No Forms or Parameters Found",
                    Severity::Info,
                    "No forms or URL parameters were found to test for XSS.",
                    "Page contains no testable input vectors",
                    "Manual testing may be required for XSS vulnerabilities.",
                ));
            } else {
                findings.extend(self.test_params(target, &params, &mut absorbed).await);
            }
        }

        if let Some((attr, count)) = surface.inline_handler {
            findings.push(Self::inline_handler_finding(attr, count));
        }

        findings.extend(absorbed.into_finding());

        info!(
            "[SUCCESS] [XSS] Completed scan, found {} issues",
            findings.len()
        );

        findings
    }
}
