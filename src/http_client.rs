// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::ScannerConfig;
use crate::errors::TransportError;
use crate::tls_inspector::{TlsInspector, TlsSession};

/// Maximum response body size (10MB) to prevent memory exhaustion
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

const DEFAULT_USER_AGENT: &str = concat!("vulnscan/", env!("CARGO_PKG_VERSION"));

/// Network operations available to probes.
///
/// Every call is bounded by the implementation's timeout and is attempted
/// exactly once.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    /// Submit `fields` as an `application/x-www-form-urlencoded` body
    async fn post_form(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<HttpResponse, TransportError>;

    /// Perform a bare TLS handshake and report what was negotiated
    async fn tls_handshake(&self, host: &str, port: u16) -> Result<TlsSession, TransportError>;
}

#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    timeout: Duration,
    max_body_size: usize,
    tls: TlsInspector,
}

impl HttpClient {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        Self::with_config(&ScannerConfig {
            request_timeout_secs: timeout_secs,
            tls_timeout_secs: timeout_secs,
            ..ScannerConfig::default()
        })
    }

    pub fn with_config(config: &ScannerConfig) -> Result<Self> {
        if config.accept_invalid_certs {
            warn!(
                "Certificate validation is disabled for HTTP probes; \
                 targets with self-signed or expired certificates will be reached"
            );
        }

        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent)
            .tcp_nodelay(true)
            .build()
            .context("Failed to create HTTP client")?;

        let tls = TlsInspector::new(Duration::from_secs(config.tls_timeout_secs))
            .context("Failed to create TLS inspector")?;

        Ok(Self {
            client: Arc::new(client),
            timeout: Duration::from_secs(config.request_timeout_secs),
            max_body_size: config.max_body_bytes.min(MAX_BODY_SIZE),
            tls,
        })
    }

    async fn read_response(
        &self,
        url: &str,
        response: reqwest::Response,
        started: Instant,
    ) -> Result<HttpResponse, TransportError> {
        let status_code = response.status().as_u16();

        let headers = {
            let headers = response.headers();
            let mut map = HashMap::with_capacity(headers.len());
            for (k, v) in headers.iter() {
                if let Ok(value_str) = v.to_str() {
                    map.insert(k.as_str().to_lowercase(), value_str.to_string());
                }
            }
            map
        };

        let body_bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e, self.timeout))?;

        // Truncate oversized responses
        let body = if body_bytes.len() > self.max_body_size {
            String::from_utf8_lossy(&body_bytes[..self.max_body_size]).to_string()
        } else {
            String::from_utf8_lossy(&body_bytes).to_string()
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        debug!(url = url, status_code = status_code, duration_ms = duration_ms, "HTTP response");

        Ok(HttpResponse {
            status_code,
            body,
            headers,
            duration_ms,
        })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e, self.timeout))?;

        self.read_response(url, response, started).await
    }

    async fn post_form(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<HttpResponse, TransportError> {
        let started = Instant::now();
        let response = self
            .client
            .post(url)
            .form(fields)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e, self.timeout))?;

        self.read_response(url, response, started).await
    }

    async fn tls_handshake(&self, host: &str, port: u16) -> Result<TlsSession, TransportError> {
        self.tls.handshake(host, port).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: String,
    /// Header names are stored lowercase
    pub headers: HashMap<String, String>,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn contains(&self, pattern: &str) -> bool {
        self.body.contains(pattern)
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_lowercase()).cloned()
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_lowercase())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
