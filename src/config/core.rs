// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::http_client::MAX_BODY_SIZE;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    #[serde(default)]
    pub server: ServerConfig,

    #[validate(nested)]
    #[serde(default)]
    pub scanner: ScannerConfig,

    #[validate(nested)]
    #[serde(default)]
    pub admission: AdmissionConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    #[serde(default = "default_host")]
    pub host: String,

    #[validate(range(min = 1))]
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScannerConfig {
    /// Per-request timeout for HTTP probes
    #[validate(range(min = 1, max = 60))]
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Connect + handshake timeout for the TLS probe
    #[validate(range(min = 1, max = 60))]
    #[serde(default = "default_timeout")]
    pub tls_timeout_secs: u64,

    /// Pause between consecutive probes; 0 disables pacing
    #[validate(range(max = 10000))]
    #[serde(default = "default_pacing_delay_ms")]
    pub pacing_delay_ms: u64,

    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,

    #[validate(range(min = 1024))]
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdmissionConfig {
    /// When set, only hostnames matching `allowed_targets` may be scanned
    #[serde(default = "default_true")]
    pub demo_mode: bool,

    #[serde(default = "default_allowed_targets")]
    pub allowed_targets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub json_logs: bool,
}

impl ScannerConfig {
    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout(),
            tls_timeout_secs: default_timeout(),
            pacing_delay_ms: default_pacing_delay_ms(),
            accept_invalid_certs: true,
            max_body_bytes: default_max_body_bytes(),
            user_agent: None,
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            demo_mode: true,
            allowed_targets: default_allowed_targets(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout() -> u64 {
    10
}

fn default_pacing_delay_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_max_body_bytes() -> usize {
    MAX_BODY_SIZE
}

fn default_allowed_targets() -> Vec<String> {
    vec![
        "localhost".to_string(),
        "127.0.0.1".to_string(),
        "dvwa".to_string(),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}
