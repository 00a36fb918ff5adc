// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Lifecycle Metrics
 * Counters for admitted, rejected, completed and failed scans
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ScanMetrics {
    scans_admitted: AtomicU64,
    scans_rejected: AtomicU64,
    scans_completed: AtomicU64,
    scans_failed: AtomicU64,
    findings_total: AtomicU64,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_admitted(&self) {
        self.scans_admitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Policy rejection. Does not count as a scan.
    pub fn record_rejected(&self, host: &str) {
        self.scans_rejected.fetch_add(1, Ordering::Relaxed);
        debug!(host = host, "Scan rejected by admission policy");
    }

    pub fn record_completed(&self, findings: usize, duration: Duration) {
        self.scans_completed.fetch_add(1, Ordering::Relaxed);
        self.findings_total.fetch_add(findings as u64, Ordering::Relaxed);
        debug!(
            findings = findings,
            duration_ms = duration.as_millis() as u64,
            "Scan completed"
        );
    }

    pub fn record_failed(&self) {
        self.scans_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics_summary(&self) -> MetricsSummary {
        MetricsSummary {
            scans_admitted: self.scans_admitted.load(Ordering::Relaxed),
            scans_rejected: self.scans_rejected.load(Ordering::Relaxed),
            scans_completed: self.scans_completed.load(Ordering::Relaxed),
            scans_failed: self.scans_failed.load(Ordering::Relaxed),
            findings_total: self.findings_total.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricsSummary {
    pub scans_admitted: u64,
    pub scans_rejected: u64,
    pub scans_completed: u64,
    pub scans_failed: u64,
    pub findings_total: u64,
}
