// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Error Types
 * Typed error taxonomy for admission, scan lifecycle and transport
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use std::time::Duration;
use thiserror::Error;

use crate::types::{ScanId, ScanStatus};

/// Errors surfaced to callers of the scan service
#[derive(Error, Debug)]
pub enum ScanError {
    /// Target hostname refused by the admission policy
    #[error("Target not permitted by admission policy: {host}")]
    PolicyRejection { host: String },

    #[error("Invalid target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Scan not found: {0}")]
    NotFound(ScanId),

    /// Report requested before the scan reached COMPLETED
    #[error("Scan {scan_id} not completed yet (status: {status})")]
    NotReady { scan_id: ScanId, status: ScanStatus },

    #[error("Scan store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised by a scan store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Scan {0} already exists")]
    Duplicate(ScanId),

    #[error("Scan {0} does not exist")]
    Missing(ScanId),

    /// A writer that does not hold the scan's lease attempted a mutation
    #[error("Caller does not own scan {0}")]
    NotOwner(ScanId),

    #[error("Lifecycle violation: {0}")]
    Lifecycle(#[from] LifecycleError),
}

/// Illegal scan state transitions
#[derive(Error, Debug, PartialEq)]
pub enum LifecycleError {
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: ScanStatus, to: ScanStatus },

    #[error("Progress cannot move from {current} to {requested}")]
    ProgressRegression { current: u8, requested: u8 },

    #[error("Scan is terminal ({0}) and can no longer change")]
    Terminal(ScanStatus),
}

/// Rejected probe registrations
#[derive(Error, Debug, PartialEq)]
pub enum ProbeSetError {
    #[error("Probe '{0}' is already registered")]
    Duplicate(String),

    /// Checkpoints must strictly increase and stay below 100, which is
    /// reserved for completion
    #[error("Checkpoint {checkpoint} for probe '{probe}' must be above {previous} and below 100")]
    InvalidCheckpoint {
        probe: String,
        checkpoint: u8,
        previous: u8,
    },
}

/// Transport failures. These never escape a probe: each one is converted into
/// an informational finding by the probe that hit it.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("Connection timeout after {timeout:?} to {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("Connection failed for {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("TLS handshake failed for {host}: {reason}")]
    TlsHandshake { host: String, reason: String },

    /// Server refused every protocol version offered (TLS 1.2 and 1.3)
    #[error("{host} only accepts protocol versions older than TLS 1.2: {reason}")]
    LegacyProtocolOnly { host: String, reason: String },

    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("Failed to read response body from {url}: {reason}")]
    Body { url: String, reason: String },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl TransportError {
    /// Classify a reqwest failure for the given request URL
    pub fn from_reqwest(url: &str, err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else if err.is_connect() {
            TransportError::Connect {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            TransportError::Body {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else if err.is_builder() {
            TransportError::InvalidUrl {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            TransportError::Request {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}
