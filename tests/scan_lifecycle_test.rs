// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Lifecycle Tests
 * Admission, probe sequencing, failure classification and report gating
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

mod common;

use common::{response, PanickingProbe, ScriptedTransport, StaticProbe};
use std::sync::Arc;
use std::time::Duration;

use vulnscan::admission::{AllowListPolicy, TargetPolicy};
use vulnscan::config::AppConfig;
use vulnscan::errors::ScanError;
use vulnscan::metrics::ScanMetrics;
use vulnscan::orchestrator::{PacingPolicy, ScanOrchestrator};
use vulnscan::registry::{InMemoryScanStore, ScanStore};
use vulnscan::scanners::sqli::SQL_PAYLOADS;
use vulnscan::scanners::xss::XSS_PAYLOAD;
use vulnscan::scanners::ProbeSet;
use vulnscan::types::{ScanStatus, Severity};
use vulnscan::ScanService;

const POLL: Duration = Duration::from_millis(5);

const SHOP_PAGE: &str = r#"<html>
<head><title>Shop</title></head>
<body>
  <h1>Product search</h1>
  <form action="/search" method="post">
    <input type="text" name="q">
    <input type="submit" value="Go">
  </form>
</body>
</html>"#;

fn test_config(allowed: &[&str]) -> AppConfig {
    let mut config = AppConfig::default();
    config.scanner.pacing_delay_ms = 0;
    config.admission.demo_mode = true;
    config.admission.allowed_targets = allowed.iter().map(|s| s.to_string()).collect();
    config
}

fn shop_transport() -> ScriptedTransport {
    ScriptedTransport::new()
        .page("http://example.test/", 200, SHOP_PAGE)
        .form("http://example.test/search", |fields| {
            let q = fields
                .iter()
                .find(|(name, _)| name == "q")
                .map(|(_, v)| v.as_str())
                .unwrap_or_default();

            if q.contains("<script>") {
                response(200, &format!("<p>Results for {}</p>", q))
            } else if q == "1' OR '1'='1" {
                response(500, "You have an error in your SQL syntax near '1'")
            } else {
                response(200, "<p>No results</p>")
            }
        })
}

fn orchestrator_with(probes: ProbeSet, allowed: &[&str]) -> ScanOrchestrator {
    paced_orchestrator(probes, allowed, PacingPolicy::disabled())
}

fn paced_orchestrator(checks: ProbeSet, allowed: &[&str], pacing: PacingPolicy) -> ScanOrchestrator {
    let policy: Arc<dyn TargetPolicy> = Arc::new(AllowListPolicy::new(
        true,
        allowed.iter().map(|s| s.to_string()).collect(),
    ));

    ScanOrchestrator::new(
        Arc::new(InMemoryScanStore::new()),
        checks,
        pacing,
        policy,
        Arc::new(ScanMetrics::new()),
    )
}

#[tokio::test]
async fn test_vulnerable_shop_end_to_end() {
    let transport = Arc::new(shop_transport());
    let service = ScanService::with_transport(&test_config(&["example.test"]), transport.clone());

    let receipt = service.admit("http://example.test").await.unwrap();
    assert_eq!(receipt.status, ScanStatus::Queued);
    assert_eq!(receipt.message, "Scan queued successfully");

    let scan = service.wait_for_terminal(&receipt.scan_id, POLL).await.unwrap();
    assert_eq!(scan.status, ScanStatus::Completed);
    assert_eq!(scan.progress, 100);
    assert_eq!(scan.current_check.as_deref(), Some("Completed"));
    assert!(scan.error.is_none());

    let missing_headers = scan
        .findings
        .iter()
        .filter(|f| f.title.starts_with("Missing Security Header: "))
        .count();
    assert_eq!(missing_headers, 7);

    let no_tls = scan
        .findings
        .iter()
        .find(|f| f.title == "HTTP Only - No SSL/TLS")
        .unwrap();
    assert_eq!(no_tls.severity, Severity::High);
    assert!(transport.handshakes.lock().is_empty());

    let xss = scan
        .findings
        .iter()
        .find(|f| f.title == "Reflected XSS in Form #1")
        .unwrap();
    assert_eq!(xss.severity, Severity::High);
    assert_eq!(xss.cwe_id.as_deref(), Some("CWE-79"));

    let sqli: Vec<_> = scan
        .findings
        .iter()
        .filter(|f| f.cwe_id.as_deref() == Some("CWE-89"))
        .collect();
    assert_eq!(sqli.len(), 1);
    assert_eq!(sqli[0].severity, Severity::Critical);
    assert!(sqli[0].evidence.contains("sql syntax"));

    // Detection stops at the second payload
    let submissions = transport.submissions_to("http://example.test/search");
    assert!(submissions
        .iter()
        .any(|fields| fields.iter().any(|(_, v)| v == XSS_PAYLOAD)));
    assert!(!submissions
        .iter()
        .any(|fields| fields.iter().any(|(_, v)| v == SQL_PAYLOADS[2])));
    assert_eq!(submissions.len(), 3);

    let summary = scan.summary.unwrap();
    assert_eq!(summary.total(), scan.findings.len());
    assert_eq!(summary.critical, 1);
    assert_eq!(summary.high, 3);
    assert_eq!(summary.medium, 2);
    assert_eq!(summary.low, 3);
    assert_eq!(summary.info, 1);

    let report = service.report(&receipt.scan_id).await.unwrap();
    assert_eq!(report.target_url, "http://example.test");
    assert_eq!(scan.target.as_str(), "http://example.test/");
    assert_eq!(report.summary, summary);
    assert_eq!(report.findings, scan.findings);

    let metrics = service.metrics();
    assert_eq!(metrics.scans_admitted, 1);
    assert_eq!(metrics.scans_completed, 1);
    assert_eq!(metrics.findings_total, scan.findings.len() as u64);
}

#[tokio::test]
async fn test_rejected_target_creates_no_scan() {
    let transport = Arc::new(ScriptedTransport::new());
    let service = ScanService::with_transport(&test_config(&["localhost"]), transport.clone());

    let err = service.admit("http://evil.example.com/").await.unwrap_err();
    match err {
        ScanError::PolicyRejection { host } => assert_eq!(host, "evil.example.com"),
        other => panic!("unexpected error: {}", other),
    }

    assert_eq!(service.orchestrator().store().len().await.unwrap(), 0);
    assert!(transport.requests.lock().is_empty());

    let metrics = service.metrics();
    assert_eq!(metrics.scans_admitted, 0);
    assert_eq!(metrics.scans_rejected, 1);
}

#[tokio::test]
async fn test_invalid_target_is_rejected_before_policy() {
    let service = ScanService::with_transport(
        &test_config(&["localhost"]),
        Arc::new(ScriptedTransport::new()),
    );

    let err = service.admit("ftp://localhost/").await.unwrap_err();
    assert!(matches!(err, ScanError::InvalidTarget { .. }));
    assert_eq!(service.metrics().scans_rejected, 0);
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let probes = ProbeSet::new()
        .with(10, Arc::new(StaticProbe::new("one", Severity::Low).delayed(Duration::from_millis(30))))
        .unwrap()
        .with(40, Arc::new(StaticProbe::new("two", Severity::Medium).delayed(Duration::from_millis(30))))
        .unwrap()
        .with(80, Arc::new(StaticProbe::new("three", Severity::High).delayed(Duration::from_millis(30))))
        .unwrap();
    let service = ScanService::new(orchestrator_with(probes, &["localhost"]));

    let receipt = service.admit("http://localhost:8080/").await.unwrap();

    let mut observed = Vec::new();
    let final_scan = loop {
        let scan = service.status(&receipt.scan_id).await.unwrap();
        observed.push(scan.progress);
        if scan.is_terminal() {
            break scan;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    };

    assert!(observed.windows(2).all(|w| w[0] <= w[1]), "{:?}", observed);
    assert_eq!(final_scan.status, ScanStatus::Completed);
    assert_eq!(final_scan.progress, 100);
    assert_eq!(final_scan.findings.len(), 3);
    assert!(observed.iter().all(|p| [0, 10, 40, 80, 100].contains(p)));
}

#[tokio::test]
async fn test_findings_keep_probe_order() {
    let probes = ProbeSet::new()
        .with(20, Arc::new(StaticProbe::new("first", Severity::Info)))
        .unwrap()
        .with(60, Arc::new(StaticProbe::new("second", Severity::Critical)))
        .unwrap();
    let orchestrator = orchestrator_with(probes, &["localhost"]);

    let lease = orchestrator.submit("http://localhost/").await.unwrap();
    let scan = orchestrator.run(lease).await.unwrap();

    let titles: Vec<&str> = scan.findings.iter().map(|f| f.title.as_str()).collect();
    assert_eq!(titles, vec!["first finding", "second finding"]);
}

#[tokio::test]
async fn test_panicking_probe_fails_scan_and_keeps_findings() {
    let probes = ProbeSet::new()
        .with(10, Arc::new(StaticProbe::new("steady", Severity::Medium)))
        .unwrap()
        .with(30, Arc::new(PanickingProbe))
        .unwrap()
        .with(50, Arc::new(StaticProbe::new("never", Severity::High)))
        .unwrap();
    let orchestrator = orchestrator_with(probes, &["localhost"]);
    let metrics = Arc::clone(orchestrator.metrics());

    let lease = orchestrator.submit("http://localhost/").await.unwrap();
    let scan_id = lease.scan_id().clone();
    let scan = orchestrator.run(lease).await.unwrap();

    assert_eq!(scan.status, ScanStatus::Failed);
    assert_eq!(scan.progress, 30);
    assert_eq!(scan.current_check.as_deref(), Some("Failed"));
    assert!(scan.summary.is_none());
    assert_eq!(scan.findings.len(), 1);
    assert_eq!(scan.findings[0].title, "steady finding");

    let error = scan.error.as_deref().unwrap();
    assert!(error.contains("explodes"), "{}", error);
    assert!(error.contains("probe blew up"), "{}", error);

    let service = ScanService::new(orchestrator);
    let err = service.report(&scan_id).await.unwrap_err();
    assert!(matches!(
        err,
        ScanError::NotReady {
            status: ScanStatus::Failed,
            ..
        }
    ));
    assert_eq!(metrics.get_metrics_summary().scans_failed, 1);
}

#[tokio::test]
async fn test_report_not_ready_while_queued_or_running() {
    let probes = ProbeSet::new()
        .with(50, Arc::new(StaticProbe::new("slow", Severity::Low).delayed(Duration::from_millis(200))))
        .unwrap();
    let orchestrator = orchestrator_with(probes, &["localhost"]);

    // Stored but never scheduled
    let lease = orchestrator.submit("http://localhost/").await.unwrap();
    let queued_id = lease.scan_id().clone();
    drop(lease);

    let service = ScanService::new(orchestrator);
    assert!(matches!(
        service.report(&queued_id).await.unwrap_err(),
        ScanError::NotReady {
            status: ScanStatus::Queued,
            ..
        }
    ));

    let receipt = service.admit("http://localhost/").await.unwrap();
    loop {
        let scan = service.status(&receipt.scan_id).await.unwrap();
        if scan.status == ScanStatus::Running {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(matches!(
        service.report(&receipt.scan_id).await.unwrap_err(),
        ScanError::NotReady {
            status: ScanStatus::Running,
            ..
        }
    ));

    let scan = service.wait_for_terminal(&receipt.scan_id, POLL).await.unwrap();
    assert_eq!(scan.status, ScanStatus::Completed);
    assert!(service.report(&receipt.scan_id).await.is_ok());
}

#[tokio::test]
async fn test_unknown_scan_is_not_found() {
    let service = ScanService::with_transport(
        &test_config(&["localhost"]),
        Arc::new(ScriptedTransport::new()),
    );

    let missing = vulnscan::types::ScanId::from("does-not-exist");
    assert!(matches!(
        service.status(&missing).await.unwrap_err(),
        ScanError::NotFound(_)
    ));
    assert!(matches!(
        service.report(&missing).await.unwrap_err(),
        ScanError::NotFound(_)
    ));
}

fn three_instant_checks() -> ProbeSet {
    ProbeSet::new()
        .with(10, Arc::new(StaticProbe::new("a", Severity::Low)))
        .unwrap()
        .with(50, Arc::new(StaticProbe::new("b", Severity::Low)))
        .unwrap()
        .with(90, Arc::new(StaticProbe::new("c", Severity::Low)))
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_pacing_pauses_between_checks_only() {
    let delay = Duration::from_millis(400);
    let orchestrator = paced_orchestrator(three_instant_checks(), &["localhost"], PacingPolicy::new(delay));

    let lease = orchestrator.submit("http://localhost/").await.unwrap();
    let started = tokio::time::Instant::now();
    let scan = orchestrator.run(lease).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(scan.status, ScanStatus::Completed);
    // Two gaps for three checks, none after the last one
    assert!(elapsed >= delay * 2, "{:?}", elapsed);
    assert!(elapsed < delay * 3, "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_single_check_is_not_paced() {
    let delay = Duration::from_millis(400);
    let probes = ProbeSet::new()
        .with(50, Arc::new(StaticProbe::new("only", Severity::Info)))
        .unwrap();
    let orchestrator = paced_orchestrator(probes, &["localhost"], PacingPolicy::new(delay));

    let lease = orchestrator.submit("http://localhost/").await.unwrap();
    let started = tokio::time::Instant::now();
    orchestrator.run(lease).await.unwrap();

    assert!(started.elapsed() < delay);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_pacing_adds_no_delay() {
    let orchestrator = paced_orchestrator(three_instant_checks(), &["localhost"], PacingPolicy::disabled());

    let lease = orchestrator.submit("http://localhost/").await.unwrap();
    let started = tokio::time::Instant::now();
    let scan = orchestrator.run(lease).await.unwrap();

    assert_eq!(scan.status, ScanStatus::Completed);
    assert_eq!(started.elapsed(), Duration::ZERO);
}
