// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Information Disclosure Probe
 * Sensitive files, directory listings, comments, error output, version
 * strings and robots.txt
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use super::forms;
use super::{probe_failure_finding, Absorbed, Probe};
use crate::http_client::Transport;
use crate::types::{Finding, Severity};

pub const SENSITIVE_PATHS: [&str; 9] = [
    ".git/config",
    ".env",
    "phpinfo.php",
    "info.php",
    ".DS_Store",
    "web.config",
    ".htaccess",
    "composer.json",
    "package.json",
];

const DIRECTORY_INDICATORS: [&str; 3] = ["index of /", "parent directory", "directory listing"];

const COMMENT_KEYWORDS: [&str; 8] = [
    "password", "secret", "key", "token", "api", "todo", "fixme", "hack",
];

const ERROR_INDICATORS: [&str; 7] = [
    "stack trace",
    "exception",
    "error in",
    "line number",
    "fatal error",
    "warning:",
    "parse error",
];

const ROBOTS_KEYWORDS: [&str; 5] = ["admin", "backup", "private", "config", ".git"];

/// More version-shaped strings than this is reported
const VERSION_THRESHOLD: usize = 3;

const A01: &str = "A01:2021 - Broken Access Control";
const A05: &str = "A05:2021 - Security Misconfiguration";

static COMMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--(.*?)-->").expect("valid comment regex"));

static VERSION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v?\d+\.\d+\.\d+").expect("valid version regex"));

pub struct InformationDisclosureProbe {
    transport: Arc<dyn Transport>,
}

impl InformationDisclosureProbe {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn check_sensitive_paths(&self, target: &Url, absorbed: &mut Absorbed) -> Vec<Finding> {
        let mut findings = Vec::new();

        for path in SENSITIVE_PATHS {
            let test_url = sensitive_path_url(target, path);

            match self.transport.get(&test_url).await {
                Ok(response) if response.is_success() => {
                    findings.push(
                        Finding::new(
                            format!("Sensitive File Accessible: {}", path),
                            Severity::High,
                            format!("The file '{}' is publicly accessible.", path),
                            format!("HTTP {} response for {}", response.status_code, test_url),
                            format!(
                                "Remove '{}' from the web root or deny access to it in the web server configuration.",
                                path
                            ),
                        )
                        .with_cwe("CWE-200")
                        .with_owasp(A01),
                    );
                }
                Ok(response) => {
                    debug!("[Info Disclosure] {} -> {}", test_url, response.status_code);
                }
                Err(e) => absorbed.record(&format!("GET {}", path), &e),
            }
        }

        findings
    }

    /// Content checks on the landing page; no I/O
    pub fn check_page(html: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        let text = forms::page_text(html);

        if DIRECTORY_INDICATORS.iter().any(|i| text.contains(i)) {
            findings.push(
                Finding::new(
                    "Directory Listing Enabled",
                    Severity::Medium,
                    "Directory listing appears to be enabled, exposing the file structure.",
                    "Page contains directory listing indicators",
                    "Disable directory listing in the web server configuration.",
                )
                .with_cwe("CWE-548")
                .with_owasp(A05),
            );
        }

        if let Some(keywords) = first_sensitive_comment(html) {
            findings.push(
                Finding::new(
                    "Sensitive Information in HTML Comments",
                    Severity::Medium,
                    "HTML comments may contain sensitive information.",
                    format!("Comment contains keywords: {}", keywords.join(", ")),
                    "Strip comments from production markup as part of the build.",
                )
                .with_cwe("CWE-615")
                .with_owasp(A05),
            );
        }

        if let Some(indicator) = ERROR_INDICATORS.iter().find(|i| text.contains(*i)) {
            findings.push(
                Finding::new(
                    "Detailed Error Messages Exposed",
                    Severity::Medium,
                    "The application exposes detailed error messages that may reveal internal structure.",
                    format!("Error indicator found: '{}'", indicator),
                    "Show generic error pages to users and keep detailed errors in server-side logs.",
                )
                .with_cwe("CWE-209")
                .with_owasp(A05),
            );
        }

        let versions = VERSION_REGEX.find_iter(html).count();
        if versions > VERSION_THRESHOLD {
            findings.push(
                Finding::new(
                    "Potential Version Information Disclosure",
                    Severity::Low,
                    "Multiple version numbers detected in page content.",
                    format!("Found {} version number patterns", versions),
                    "Avoid exposing versions of frameworks, libraries and server software.",
                )
                .with_cwe("CWE-200")
                .with_owasp(A05),
            );
        }

        findings
    }

    async fn check_robots(&self, target: &Url, absorbed: &mut Absorbed) -> Option<Finding> {
        let robots_url = match target.join("/robots.txt") {
            Ok(url) => url,
            Err(e) => {
                debug!("[Info Disclosure] Cannot build robots.txt URL: {}", e);
                return None;
            }
        };

        let response = match self.transport.get(robots_url.as_str()).await {
            Ok(response) => response,
            Err(e) => {
                absorbed.record("GET robots.txt", &e);
                return None;
            }
        };

        if response.status_code != 200 {
            return None;
        }

        let found = robots_keywords(&response.body);
        if found.is_empty() {
            return None;
        }

        Some(
            Finding::new(
                "Robots.txt Reveals Sensitive Paths",
                Severity::Info,
                "The robots.txt file discloses potentially sensitive directories.",
                format!("Sensitive paths in robots.txt: {}", found.join(", ")),
                "Do not rely on robots.txt to hide sensitive paths; protect them with access controls.",
            )
            .with_cwe("CWE-200")
            .with_owasp(A01),
        )
    }
}

/// `path` appended to the target's path; query and fragment are dropped
fn sensitive_path_url(target: &Url, path: &str) -> String {
    let mut base = target.clone();
    base.set_query(None);
    base.set_fragment(None);
    format!("{}/{}", base.as_str().trim_end_matches('/'), path)
}

/// Keywords of the first HTML comment mentioning any of them
fn first_sensitive_comment(html: &str) -> Option<Vec<&'static str>> {
    COMMENT_REGEX.captures_iter(html).find_map(|caps| {
        let comment = caps.get(1)?.as_str().to_lowercase();
        let hits: Vec<&'static str> = COMMENT_KEYWORDS
            .iter()
            .copied()
            .filter(|k| comment.contains(k))
            .collect();
        (!hits.is_empty()).then_some(hits)
    })
}

fn robots_keywords(body: &str) -> Vec<&'static str> {
    let lower = body.to_lowercase();
    ROBOTS_KEYWORDS
        .iter()
        .copied()
        .filter(|k| lower.contains(k))
        .collect()
}

#[async_trait]
impl Probe for InformationDisclosureProbe {
    fn name(&self) -> &'static str {
        "information_disclosure"
    }

    fn label(&self) -> &'static str {
        "Information Disclosure"
    }

    async fn analyze(&self, target: &Url) -> Vec<Finding> {
        info!("[Info Disclosure] Scanning: {}", target);

        let page = match self.transport.get(target.as_str()).await {
            Ok(response) => response,
            Err(e) => return vec![probe_failure_finding(self.label(), target, &e)],
        };

        let mut absorbed = Absorbed::new(self.label());
        let mut findings = self.check_sensitive_paths(target, &mut absorbed).await;
        findings.extend(Self::check_page(&page.body));
        findings.extend(self.check_robots(target, &mut absorbed).await);
        findings.extend(absorbed.into_finding());

        info!(
            "[SUCCESS] [Info Disclosure] Completed scan, found {} issues",
            findings.len()
        );

        findings
    }
}
