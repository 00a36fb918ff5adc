// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Probe Framework
 * Probe contract, ordered probe registry and failure bookkeeping
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;
use url::Url;

use crate::errors::{ProbeSetError, TransportError};
use crate::http_client::Transport;
use crate::types::{Finding, Severity};

pub mod forms;
pub mod information_disclosure;
pub mod security_headers;
pub mod sqli;
pub mod tls;
pub mod xss;

pub use information_disclosure::InformationDisclosureProbe;
pub use security_headers::SecurityHeadersProbe;
pub use sqli::SqlInjectionProbe;
pub use tls::TlsProbe;
pub use xss::XssProbe;

/// Progress checkpoints of the standard probe set, in execution order
pub const STANDARD_CHECKPOINTS: [u8; 5] = [10, 30, 50, 70, 90];

/// A self-contained check against one target.
///
/// `analyze` never fails: transport and parsing faults are converted into
/// informational findings inside the probe. Running it twice against the
/// same target is safe.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Stable identifier, e.g. `sqli`
    fn name(&self) -> &'static str;

    /// Human-readable label shown in `current_check` while the probe runs
    fn label(&self) -> &'static str;

    async fn analyze(&self, target: &Url) -> Vec<Finding>;
}

#[derive(Clone)]
pub struct ProbeEntry {
    pub checkpoint: u8,
    pub probe: Arc<dyn Probe>,
}

/// Statically ordered list of probes with their progress checkpoints
#[derive(Clone, Default)]
pub struct ProbeSet {
    entries: Vec<ProbeEntry>,
}

impl ProbeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers, TLS, XSS, SQL injection, information disclosure
    pub fn standard(transport: Arc<dyn Transport>) -> Self {
        let probes: [Arc<dyn Probe>; 5] = [
            Arc::new(SecurityHeadersProbe::new(Arc::clone(&transport))),
            Arc::new(TlsProbe::new(Arc::clone(&transport))),
            Arc::new(XssProbe::new(Arc::clone(&transport))),
            Arc::new(SqlInjectionProbe::new(Arc::clone(&transport))),
            Arc::new(InformationDisclosureProbe::new(transport)),
        ];

        let entries = STANDARD_CHECKPOINTS
            .iter()
            .zip(probes)
            .map(|(checkpoint, probe)| ProbeEntry {
                checkpoint: *checkpoint,
                probe,
            })
            .collect();

        Self { entries }
    }

    /// Append a probe. Its checkpoint must be above every checkpoint already
    /// registered and below 100.
    pub fn register(&mut self, checkpoint: u8, probe: Arc<dyn Probe>) -> Result<(), ProbeSetError> {
        if self.entries.iter().any(|e| e.probe.name() == probe.name()) {
            return Err(ProbeSetError::Duplicate(probe.name().to_string()));
        }

        let previous = self.entries.last().map(|e| e.checkpoint).unwrap_or(0);
        if checkpoint <= previous || checkpoint >= 100 {
            return Err(ProbeSetError::InvalidCheckpoint {
                probe: probe.name().to_string(),
                checkpoint,
                previous,
            });
        }

        self.entries.push(ProbeEntry { checkpoint, probe });
        Ok(())
    }

    pub fn with(mut self, checkpoint: u8, probe: Arc<dyn Probe>) -> Result<Self, ProbeSetError> {
        self.register(checkpoint, probe)?;
        Ok(self)
    }

    pub fn entries(&self) -> &[ProbeEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.probe.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Single informational finding for a probe whose primary request failed
pub fn probe_failure_finding(probe_label: &str, target: &Url, err: &TransportError) -> Finding {
    let (title, description) = if err.is_timeout() {
        (
            format!("{} Check Timed Out", probe_label),
            format!("The target did not answer within the time limit during the {} check.", probe_label),
        )
    } else {
        (
            format!("{} Check Error", probe_label),
            format!("Unable to perform the {} check against the target.", probe_label),
        )
    };

    warn!("[{}] Check aborted for {}: {}", probe_label, target, err);

    Finding::new(
        title,
        Severity::Info,
        description,
        format!("Error: {}", err),
        "Verify the target is reachable and responding, then scan again.",
    )
}

/// Sub-request failures absorbed inside one probe run.
///
/// Individual requests are allowed to fail without stopping the probe, but
/// every failure is recorded and surfaced once at the end of the run.
#[derive(Debug)]
pub struct Absorbed {
    probe_label: &'static str,
    failures: Vec<String>,
}

impl Absorbed {
    const MAX_LISTED: usize = 5;

    pub fn new(probe_label: &'static str) -> Self {
        Self {
            probe_label,
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, context: &str, err: &TransportError) {
        warn!("[{}] {} failed: {}", self.probe_label, context, err);
        self.failures.push(format!("{}: {}", context, err));
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line account of what failed, listing at most a handful of entries
    pub fn summary(&self) -> String {
        let listed: Vec<&str> = self
            .failures
            .iter()
            .take(Self::MAX_LISTED)
            .map(String::as_str)
            .collect();

        let mut summary = format!("{} request(s) failed: {}", self.failures.len(), listed.join("; "));
        if self.failures.len() > Self::MAX_LISTED {
            summary.push_str(&format!(" (and {} more)", self.failures.len() - Self::MAX_LISTED));
        }
        summary
    }

    /// Fold the recorded failures into a single informational finding
    pub fn into_finding(self) -> Option<Finding> {
        if self.is_empty() {
            return None;
        }

        Some(Finding::new(
            format!("{} Coverage Incomplete", self.probe_label),
            Severity::Info,
            format!(
                "Some {} requests failed, so parts of the target were not tested.",
                self.probe_label
            ),
            self.summary(),
            "Re-run the scan once the target responds reliably.",
        ))
    }
}
