// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Serialize, Serializer};
use url::Url;

use crate::config::AdmissionConfig;

/// Targets a policy will accept, as reported by the health endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedTargets {
    Any,
    Only(Vec<String>),
}

impl Serialize for AllowedTargets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AllowedTargets::Any => serializer.serialize_str("all"),
            AllowedTargets::Only(targets) => targets.serialize(serializer),
        }
    }
}

/// Decides whether a target may be scanned. Consulted before a scan exists.
pub trait TargetPolicy: Send + Sync {
    fn permits(&self, target: &Url) -> bool;

    fn demo_mode(&self) -> bool;

    fn allowed_targets(&self) -> AllowedTargets;
}

/// Hostname gate: in demo mode the lowercased host must contain one of the
/// allowed entries; otherwise everything passes.
#[derive(Debug, Clone)]
pub struct AllowListPolicy {
    demo_mode: bool,
    allowed: Vec<String>,
}

impl AllowListPolicy {
    pub fn new(demo_mode: bool, allowed: Vec<String>) -> Self {
        Self {
            demo_mode,
            allowed: allowed.into_iter().map(|a| a.to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self::new(config.demo_mode, config.allowed_targets.clone())
    }
}

impl TargetPolicy for AllowListPolicy {
    fn permits(&self, target: &Url) -> bool {
        if !self.demo_mode {
            return true;
        }

        match target.host_str() {
            Some(host) => {
                let host = host.to_lowercase();
                self.allowed.iter().any(|allowed| host.contains(allowed.as_str()))
            }
            None => false,
        }
    }

    fn demo_mode(&self) -> bool {
        self.demo_mode
    }

    fn allowed_targets(&self) -> AllowedTargets {
        if self.demo_mode {
            AllowedTargets::Only(self.allowed.clone())
        } else {
            AllowedTargets::Any
        }
    }
}
