// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HTTP API Tests
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

mod common;

use common::ScriptedTransport;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use vulnscan::api::create_router;
use vulnscan::config::AppConfig;
use vulnscan::ScanService;

async fn spawn_api() -> String {
    let mut config = AppConfig::default();
    config.scanner.pacing_delay_ms = 0;
    config.admission.demo_mode = true;
    config.admission.allowed_targets = vec!["localhost".to_string()];

    let service = Arc::new(ScanService::with_transport(
        &config,
        Arc::new(ScriptedTransport::new().page("http://localhost/", 200, "<html><body>ok</body></html>")),
    ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(service)).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health_reports_admission_settings() {
    let base = spawn_api().await;

    let response = reqwest::get(format!("{}/api/health", base)).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["demo_mode"], true);
    assert_eq!(body["allowed_targets"], json!(["localhost"]));
}

#[tokio::test]
async fn test_scan_rejections_map_to_status_codes() {
    let base = spawn_api().await;
    let client = reqwest::Client::new();

    let forbidden = client
        .post(format!("{}/api/scan", base))
        .json(&json!({ "target_url": "http://example.com/" }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);
    let body: Value = forbidden.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("example.com"));

    let invalid = client
        .post(format!("{}/api/scan", base))
        .json(&json!({ "target_url": "not a url" }))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status().as_u16(), 422);

    let missing = client
        .get(format!("{}/api/scan/unknown-id", base))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    let metrics: Value = client
        .get(format!("{}/api/metrics", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(metrics["scans_admitted"], 0);
    assert_eq!(metrics["scans_rejected"], 1);
}

#[tokio::test]
async fn test_scan_lifecycle_over_http() {
    let base = spawn_api().await;
    let client = reqwest::Client::new();

    let receipt: Value = client
        .post(format!("{}/api/scan", base))
        .json(&json!({ "target_url": "http://localhost/" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(receipt["status"], "queued");
    let scan_id = receipt["scan_id"].as_str().unwrap().to_string();

    let scan = loop {
        let scan: Value = client
            .get(format!("{}/api/scan/{}", base, scan_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if scan["status"] == "completed" || scan["status"] == "failed" {
            break scan;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    };

    assert_eq!(scan["status"], "completed");
    assert_eq!(scan["progress"], 100);
    assert_eq!(scan["target_url"], "http://localhost/");

    let report = client
        .get(format!("{}/api/scan/{}/report", base, scan_id))
        .send()
        .await
        .unwrap();
    assert_eq!(report.status().as_u16(), 200);

    let report: Value = report.json().await.unwrap();
    assert_eq!(report["scan_id"], scan_id.as_str());
    let findings = report["findings"].as_array().unwrap().len() as u64;
    let summary = &report["summary"];
    let total: u64 = ["critical", "high", "medium", "low", "info"]
        .iter()
        .map(|k| summary[*k].as_u64().unwrap())
        .sum();
    assert_eq!(total, findings);
}
