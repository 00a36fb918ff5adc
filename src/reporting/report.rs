// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::summary::SeveritySummary;
use crate::types::{Finding, Scan, ScanId, ScanStatus, Severity};

/// Normalized report for a completed scan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanReport {
    pub scan_id: ScanId,
    pub target_url: String,
    pub scan_date: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub summary: SeveritySummary,
    pub findings: Vec<Finding>,
}

impl ScanReport {
    /// Build a report from a scan snapshot. Returns `None` unless the scan
    /// has completed.
    pub fn from_scan(scan: &Scan) -> Option<Self> {
        if scan.status != ScanStatus::Completed {
            return None;
        }

        Some(Self {
            scan_id: scan.id.clone(),
            target_url: scan.target_url.clone(),
            scan_date: scan.created_at,
            completed_at: scan.completed_at?,
            summary: scan.summary?,
            findings: scan.findings.clone(),
        })
    }

    /// Plain-text rendering used by the CLI
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        out.push_str("Security Scan Report\n");
        out.push_str("====================\n\n");
        out.push_str(&format!("Target:    {}\n", self.target_url));
        out.push_str(&format!("Scan ID:   {}\n", self.scan_id));
        out.push_str(&format!("Scan Date: {}\n", self.scan_date.to_rfc3339()));
        out.push_str(&format!("Completed: {}\n\n", self.completed_at.to_rfc3339()));

        out.push_str("Summary\n-------\n");
        for severity in Severity::ALL {
            out.push_str(&format!("  {:<9} {}\n", severity.to_string(), self.summary.count(severity)));
        }
        out.push_str(&format!("  {:<9} {}\n\n", "TOTAL", self.summary.total()));

        out.push_str("Findings\n--------\n");
        for (i, finding) in self.findings.iter().enumerate() {
            out.push_str(&format!("{}. [{}] {}\n", i + 1, finding.severity, finding.title));
            out.push_str(&format!("   {}\n", finding.description));
            if !finding.evidence.is_empty() {
                out.push_str(&format!("   Evidence: {}\n", finding.evidence));
            }
            let tags: Vec<&str> = [finding.cwe_id.as_deref(), finding.owasp_category.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if !tags.is_empty() {
                out.push_str(&format!("   Tags: {}\n", tags.join(", ")));
            }
            out.push_str(&format!("   Fix: {}\n\n", finding.remediation));
        }

        out
    }
}
