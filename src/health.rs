// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Health & Capability Reporting
 * Operating mode, admission scope and uptime
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::admission::{AllowedTargets, TargetPolicy};

#[derive(Debug, Clone, Serialize)]
pub struct HealthInfo {
    pub status: &'static str,
    pub version: String,
    pub demo_mode: bool,
    pub allowed_targets: AllowedTargets,
    pub uptime_seconds: u64,
}

#[derive(Clone)]
pub struct HealthChecker {
    start_time: Instant,
    version: String,
    policy: Arc<dyn TargetPolicy>,
}

impl HealthChecker {
    pub fn new(version: String, policy: Arc<dyn TargetPolicy>) -> Self {
        Self {
            start_time: Instant::now(),
            version,
            policy,
        }
    }

    pub fn get_health(&self) -> HealthInfo {
        HealthInfo {
            status: "healthy",
            version: self.version.clone(),
            demo_mode: self.policy.demo_mode(),
            allowed_targets: self.policy.allowed_targets(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}
