// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Orchestrator
 * Drives one scan through the ordered probe set and classifies its outcome
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::admission::TargetPolicy;
use crate::config::ScannerConfig;
use crate::errors::{ScanError, StoreError};
use crate::metrics::ScanMetrics;
use crate::registry::{ScanStore, WriterLease};
use crate::scanners::ProbeSet;
use crate::types::{Scan, ScanId};

/// Pause inserted between consecutive probes of one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    delay: Duration,
}

impl PacingPolicy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_enabled(&self) -> bool {
        !self.delay.is_zero()
    }

    pub async fn pause(&self) {
        if self.is_enabled() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl From<&ScannerConfig> for PacingPolicy {
    fn from(config: &ScannerConfig) -> Self {
        Self::new(config.pacing_delay())
    }
}

#[derive(Clone)]
pub struct ScanOrchestrator {
    store: Arc<dyn ScanStore>,
    probes: Arc<ProbeSet>,
    pacing: PacingPolicy,
    policy: Arc<dyn TargetPolicy>,
    metrics: Arc<ScanMetrics>,
}

impl ScanOrchestrator {
    pub fn new(
        store: Arc<dyn ScanStore>,
        probes: ProbeSet,
        pacing: PacingPolicy,
        policy: Arc<dyn TargetPolicy>,
        metrics: Arc<ScanMetrics>,
    ) -> Self {
        Self {
            store,
            probes: Arc::new(probes),
            pacing,
            policy,
            metrics,
        }
    }

    pub fn store(&self) -> &Arc<dyn ScanStore> {
        &self.store
    }

    pub fn policy(&self) -> &Arc<dyn TargetPolicy> {
        &self.policy
    }

    pub fn metrics(&self) -> &Arc<ScanMetrics> {
        &self.metrics
    }

    /// Admit `target` and schedule its scan in the background. Returns as soon
    /// as the scan is stored in QUEUED state.
    pub async fn admit(&self, target: &str) -> Result<ScanId, ScanError> {
        let lease = self.submit(target).await?;
        let scan_id = lease.scan_id().clone();

        let orchestrator = self.clone();
        tokio::spawn(async move {
            if let Err(e) = orchestrator.run(lease).await {
                error!("Scan could not reach a terminal state: {}", e);
            }
        });

        Ok(scan_id)
    }

    /// Validate and store a QUEUED scan without scheduling it. The returned
    /// lease is the only handle that may drive the scan.
    pub async fn submit(&self, target: &str) -> Result<WriterLease, ScanError> {
        let url = parse_target(target)?;

        if !self.policy.permits(&url) {
            let host = url.host_str().unwrap_or_default().to_string();
            self.metrics.record_rejected(&host);
            warn!("Admission refused for {}", url);
            return Err(ScanError::PolicyRejection { host });
        }

        let scan = Scan::new(ScanId::generate(), url).with_target_url(target.trim());
        let lease = self.store.insert(scan).await?;
        self.metrics.record_admitted();

        info!(scan_id = %lease.scan_id(), target = target, "Scan queued");
        Ok(lease)
    }

    /// Execute a queued scan to COMPLETED or FAILED and return the final
    /// snapshot. An error means the store refused the terminal write.
    pub async fn run(&self, lease: WriterLease) -> Result<Scan, StoreError> {
        let started = Instant::now();
        let scan = self
            .store
            .update(&lease, Box::new(|scan: &mut Scan| scan.start()))
            .await?;

        info!(scan_id = %scan.id, target = %scan.target, "Scan started");

        let outcome = match self.execute_probes(&lease, &scan.target).await {
            Ok(()) => self
                .store
                .update(&lease, Box::new(|scan: &mut Scan| scan.complete()))
                .await
                .map_err(|e| e.to_string()),
            Err(message) => Err(message),
        };

        match outcome {
            Ok(scan) => {
                self.metrics
                    .record_completed(scan.findings.len(), started.elapsed());
                info!(
                    scan_id = %scan.id,
                    findings = scan.findings.len(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Scan completed"
                );
                Ok(scan)
            }
            Err(message) => self.abort(&lease, message).await,
        }
    }

    async fn execute_probes(&self, lease: &WriterLease, target: &Url) -> Result<(), String> {
        let entries = self.probes.entries();

        for (i, entry) in entries.iter().enumerate() {
            let checkpoint = entry.checkpoint;
            let label = entry.probe.label();

            self.store
                .update(lease, Box::new(move |scan: &mut Scan| scan.advance(checkpoint, label)))
                .await
                .map_err(|e| e.to_string())?;

            debug!(scan_id = %lease.scan_id(), probe = entry.probe.name(), progress = checkpoint, "Probe started");

            let findings = AssertUnwindSafe(entry.probe.analyze(target))
                .catch_unwind()
                .await
                .map_err(|payload| {
                    format!(
                        "Probe '{}' panicked: {}",
                        entry.probe.name(),
                        panic_message(payload.as_ref())
                    )
                })?;

            let count = findings.len();
            self.store
                .update(lease, Box::new(move |scan: &mut Scan| scan.record_findings(findings)))
                .await
                .map_err(|e| e.to_string())?;

            info!(scan_id = %lease.scan_id(), probe = entry.probe.name(), findings = count, "Probe finished");

            if i + 1 < entries.len() {
                self.pacing.pause().await;
            }
        }

        Ok(())
    }

    async fn abort(&self, lease: &WriterLease, message: String) -> Result<Scan, StoreError> {
        error!(scan_id = %lease.scan_id(), error = %message, "Scan failed");
        self.metrics.record_failed();

        self.store
            .update(lease, Box::new(move |scan: &mut Scan| scan.fail(message)))
            .await
    }
}

/// Parse a submitted target; only absolute http(s) URLs with a host qualify
pub fn parse_target(target: &str) -> Result<Url, ScanError> {
    let invalid = |reason: String| ScanError::InvalidTarget {
        target: target.to_string(),
        reason,
    };

    let url = Url::parse(target.trim()).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
