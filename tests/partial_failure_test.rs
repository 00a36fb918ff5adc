// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Partial Failure Tests
 * Failed sub-requests are recorded once and never stop a check
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

mod common;

use common::ScriptedTransport;
use std::sync::Arc;
use url::Url;

use vulnscan::scanners::sqli::SQL_PAYLOADS;
use vulnscan::scanners::{InformationDisclosureProbe, Probe, SqlInjectionProbe, XssProbe};
use vulnscan::types::Severity;

const LOGIN_PAGE: &str = r#"<html><body>
  <form action="/login" method="post">
    <input name="user">
    <input type="password" name="pass">
    <input type="submit" value="Sign in">
  </form>
</body></html>"#;

fn target() -> Url {
    Url::parse("http://example.test/").unwrap()
}

#[tokio::test]
async fn test_failed_sensitive_path_does_not_stop_later_checks() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .page("http://example.test/", 200, "<html><body>Welcome</body></html>")
            .page("http://example.test/package.json", 200, "{\"name\": \"shop\"}")
            .page("http://example.test/robots.txt", 200, "User-agent: *\nDisallow: /backup/\n")
            .fail("GET http://example.test/.env"),
    );

    let scanner = InformationDisclosureProbe::new(transport.clone());
    let findings = scanner.analyze(&target()).await;

    assert!(transport.requested("GET http://example.test/phpinfo.php"));
    assert!(transport.requested("GET http://example.test/robots.txt"));

    let titles: Vec<&str> = findings.iter().map(|f| f.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Sensitive File Accessible: package.json",
            "Robots.txt Reveals Sensitive Paths",
            "Information Disclosure Coverage Incomplete",
        ]
    );

    let incomplete = &findings[2];
    assert_eq!(incomplete.severity, Severity::Info);
    assert!(incomplete.evidence.starts_with("1 request(s) failed: GET .env"), "{}", incomplete.evidence);
}

#[tokio::test]
async fn test_failed_form_submission_is_reported_once_for_xss() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .page("http://example.test/", 200, LOGIN_PAGE)
            .fail("POST http://example.test/login"),
    );

    let scanner = XssProbe::new(transport.clone());
    let findings = scanner.analyze(&target()).await;

    assert_eq!(findings.len(), 1, "{:?}", findings);
    assert_eq!(findings[0].title, "XSS Detection Coverage Incomplete");
    assert_eq!(findings[0].severity, Severity::Info);
    assert!(findings[0].evidence.contains("Form #1 submission"));
}

#[tokio::test]
async fn test_sqli_failures_fold_into_single_info_finding() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .page("http://example.test/", 200, LOGIN_PAGE)
            .fail("POST http://example.test/login"),
    );

    let scanner = SqlInjectionProbe::new(transport.clone());
    let findings = scanner.analyze(&target()).await;

    // Every payload is still attempted
    assert_eq!(
        transport.submissions_to("http://example.test/login").len(),
        SQL_PAYLOADS.len()
    );

    assert_eq!(findings.len(), 1, "{:?}", findings);
    assert_eq!(findings[0].title, "No SQL Injection Detected");
    assert_eq!(findings[0].severity, Severity::Info);
    assert!(
        findings[0].evidence.contains("Untested: 3 request(s) failed"),
        "{}",
        findings[0].evidence
    );
}

#[tokio::test]
async fn test_sqli_failed_parameter_does_not_hide_later_detection() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .page("http://example.test/item?id=1", 200, "<p>Item</p>")
            .page(
                "http://example.test/item?id=1%27+OR+%271%27%3D%271",
                500,
                "Unclosed quotation mark after the character string",
            )
            .fail("GET http://example.test/item?id=%27"),
    );

    let scanner = SqlInjectionProbe::new(transport.clone());
    let target = Url::parse("http://example.test/item?id=1").unwrap();
    let findings = scanner.analyze(&target).await;

    assert_eq!(findings.len(), 1, "{:?}", findings);
    assert_eq!(findings[0].severity, Severity::Critical);
    assert!(findings[0].evidence.contains("unclosed quotation"));
}

#[tokio::test]
async fn test_sensitive_paths_ignore_target_query() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .page("http://example.test/shop?id=1", 200, "<html><body>Shop</body></html>")
            .page("http://example.test/shop/.env", 200, "APP_KEY=base64:secret"),
    );

    let scanner = InformationDisclosureProbe::new(transport.clone());
    let target = Url::parse("http://example.test/shop?id=1").unwrap();
    let findings = scanner.analyze(&target).await;

    assert!(!transport.requested("GET http://example.test/shop?id=1/.env"));
    assert_eq!(findings.len(), 1, "{:?}", findings);
    assert_eq!(findings[0].title, "Sensitive File Accessible: .env");
}
