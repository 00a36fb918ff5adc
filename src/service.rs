// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::admission::{AllowListPolicy, TargetPolicy};
use crate::config::AppConfig;
use crate::errors::ScanError;
use crate::health::{HealthChecker, HealthInfo};
use crate::http_client::{HttpClient, Transport};
use crate::metrics::{MetricsSummary, ScanMetrics};
use crate::orchestrator::{PacingPolicy, ScanOrchestrator};
use crate::registry::{InMemoryScanStore, ScanStore};
use crate::reporting::ScanReport;
use crate::scanners::ProbeSet;
use crate::types::{Scan, ScanId, ScanStatus};

/// Answer to a successful admission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanReceipt {
    pub scan_id: ScanId,
    pub status: ScanStatus,
    pub message: String,
}

/// Caller-facing operations: admission, status, report and health
#[derive(Clone)]
pub struct ScanService {
    orchestrator: ScanOrchestrator,
    health: HealthChecker,
}

impl ScanService {
    pub fn new(orchestrator: ScanOrchestrator) -> Self {
        let health = HealthChecker::new(
            env!("CARGO_PKG_VERSION").to_string(),
            Arc::clone(orchestrator.policy()),
        );
        Self {
            orchestrator,
            health,
        }
    }

    /// Production wiring: reqwest transport, standard probes, in-memory store
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(
            HttpClient::with_config(&config.scanner).context("Failed to build transport")?,
        );

        Ok(Self::with_transport(config, transport))
    }

    /// Same wiring as `from_config` over a caller-supplied transport
    pub fn with_transport(config: &AppConfig, transport: Arc<dyn Transport>) -> Self {
        let store: Arc<dyn ScanStore> = Arc::new(InMemoryScanStore::new());
        let policy: Arc<dyn TargetPolicy> = Arc::new(AllowListPolicy::from_config(&config.admission));
        let pacing = PacingPolicy::from(&config.scanner);

        info!(
            demo_mode = config.admission.demo_mode,
            pacing_ms = pacing.delay().as_millis() as u64,
            "Scan service ready"
        );

        Self::new(ScanOrchestrator::new(
            store,
            ProbeSet::standard(transport),
            pacing,
            policy,
            Arc::new(ScanMetrics::new()),
        ))
    }

    pub fn orchestrator(&self) -> &ScanOrchestrator {
        &self.orchestrator
    }

    pub async fn admit(&self, target_url: &str) -> Result<ScanReceipt, ScanError> {
        let scan_id = self.orchestrator.admit(target_url).await?;

        Ok(ScanReceipt {
            scan_id,
            status: ScanStatus::Queued,
            message: "Scan queued successfully".to_string(),
        })
    }

    pub async fn status(&self, scan_id: &ScanId) -> Result<Scan, ScanError> {
        self.orchestrator
            .store()
            .get(scan_id)
            .await?
            .ok_or_else(|| ScanError::NotFound(scan_id.clone()))
    }

    /// Report for a COMPLETED scan; any other state is `NotReady`
    pub async fn report(&self, scan_id: &ScanId) -> Result<ScanReport, ScanError> {
        let scan = self.status(scan_id).await?;

        ScanReport::from_scan(&scan).ok_or(ScanError::NotReady {
            scan_id: scan.id,
            status: scan.status,
        })
    }

    pub fn health(&self) -> HealthInfo {
        self.health.get_health()
    }

    pub fn metrics(&self) -> MetricsSummary {
        self.orchestrator.metrics().get_metrics_summary()
    }

    /// Poll until the scan is terminal and return the final snapshot
    pub async fn wait_for_terminal(&self, scan_id: &ScanId, interval: Duration) -> Result<Scan, ScanError> {
        loop {
            let scan = self.status(scan_id).await?;
            if scan.is_terminal() {
                return Ok(scan);
            }
            tokio::time::sleep(interval).await;
        }
    }
}
