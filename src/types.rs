// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::errors::LifecycleError;
use crate::reporting::SeveritySummary;

/// Label installed in `current_check` once every probe has run.
pub const COMPLETED_LABEL: &str = "Completed";

/// Label installed in `current_check` when a scan aborts.
pub const FAILED_LABEL: &str = "Failed";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// All severities, most severe first
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// One reported observation produced by a probe. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    pub title: String,
    pub severity: Severity,
    pub description: String,
    pub evidence: String,
    pub remediation: String,
    pub cwe_id: Option<String>,
    pub owasp_category: Option<String>,
}

impl Finding {
    pub fn new(
        title: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
        evidence: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            severity,
            description: description.into(),
            evidence: evidence.into(),
            remediation: remediation.into(),
            cwe_id: None,
            owasp_category: None,
        }
    }

    pub fn with_cwe(mut self, cwe_id: &str) -> Self {
        self.cwe_id = Some(cwe_id.to_string());
        self
    }

    pub fn with_owasp(mut self, owasp_category: &str) -> Self {
        self.owasp_category = Some(owasp_category.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed)
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanStatus::Queued => write!(f, "QUEUED"),
            ScanStatus::Running => write!(f, "RUNNING"),
            ScanStatus::Completed => write!(f, "COMPLETED"),
            ScanStatus::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(String);

impl ScanId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ScanId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ScanId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stateful record of one target's probe execution.
///
/// All mutation goes through the transition methods below so that a snapshot
/// read from the store never shows a half-applied state (for example
/// `Completed` without a summary).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scan {
    #[serde(rename = "scan_id")]
    pub id: ScanId,
    /// Target as submitted
    pub target_url: String,
    /// Parsed `target_url`; what the probes run against
    #[serde(rename = "normalized_target")]
    pub target: Url,
    pub status: ScanStatus,
    pub progress: u8,
    pub current_check: Option<String>,
    pub findings: Vec<Finding>,
    pub summary: Option<SeveritySummary>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Scan {
    pub fn new(id: ScanId, target: Url) -> Self {
        Self {
            id,
            target_url: target.to_string(),
            target,
            status: ScanStatus::Queued,
            progress: 0,
            current_check: None,
            findings: Vec::new(),
            summary: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// Keep the caller's spelling of the target, e.g. without the trailing
    /// slash URL normalisation adds
    pub fn with_target_url(mut self, submitted: impl Into<String>) -> Self {
        self.target_url = submitted.into();
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn start(&mut self) -> Result<(), LifecycleError> {
        self.transition(ScanStatus::Queued, ScanStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Move to the next probe checkpoint. Progress never goes backwards and
    /// only `complete` may reach 100.
    pub fn advance(&mut self, checkpoint: u8, label: &str) -> Result<(), LifecycleError> {
        self.require_running()?;
        if checkpoint < self.progress || checkpoint >= 100 {
            return Err(LifecycleError::ProgressRegression {
                current: self.progress,
                requested: checkpoint,
            });
        }
        self.progress = checkpoint;
        self.current_check = Some(label.to_string());
        Ok(())
    }

    pub fn record_findings(&mut self, findings: Vec<Finding>) -> Result<(), LifecycleError> {
        self.require_running()?;
        self.findings.extend(findings);
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), LifecycleError> {
        self.transition(ScanStatus::Running, ScanStatus::Completed)?;
        self.progress = 100;
        self.current_check = Some(COMPLETED_LABEL.to_string());
        self.summary = Some(SeveritySummary::from_findings(&self.findings));
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Abort the scan. Findings gathered so far stay in place.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), LifecycleError> {
        self.transition(ScanStatus::Running, ScanStatus::Failed)?;
        self.current_check = Some(FAILED_LABEL.to_string());
        self.error = Some(message.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn require_running(&self) -> Result<(), LifecycleError> {
        match self.status {
            ScanStatus::Running => Ok(()),
            status if status.is_terminal() => Err(LifecycleError::Terminal(status)),
            status => Err(LifecycleError::InvalidTransition {
                from: status,
                to: ScanStatus::Running,
            }),
        }
    }

    fn transition(&mut self, from: ScanStatus, to: ScanStatus) -> Result<(), LifecycleError> {
        if self.status.is_terminal() {
            return Err(LifecycleError::Terminal(self.status));
        }
        if self.status != from {
            return Err(LifecycleError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
