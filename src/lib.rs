// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Vulnerability Scan Service
 * Baseline web security probes behind a polled scan lifecycle
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

pub mod admission;
pub mod api;
pub mod config;
pub mod errors;
pub mod health;
pub mod http_client;
pub mod metrics;
pub mod orchestrator;
pub mod registry;
pub mod reporting;
pub mod scanners;
pub mod service;
pub mod tls_inspector;
pub mod types;

pub use errors::ScanError;
pub use service::ScanService;
pub use types::{Finding, Scan, ScanId, ScanStatus, Severity};
