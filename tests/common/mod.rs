// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use vulnscan::errors::TransportError;
use vulnscan::http_client::{HttpResponse, Transport};
use vulnscan::scanners::Probe;
use vulnscan::tls_inspector::TlsSession;
use vulnscan::types::{Finding, Severity};

type FormHandler = dyn Fn(&[(String, String)]) -> HttpResponse + Send + Sync;

/// In-process transport answering from fixed routes. Unknown GETs are 404.
#[derive(Default)]
pub struct ScriptedTransport {
    pages: HashMap<String, HttpResponse>,
    forms: HashMap<String, Arc<FormHandler>>,
    failing: HashSet<String>,
    pub requests: Mutex<Vec<String>>,
    pub form_submissions: Mutex<Vec<(String, Vec<(String, String)>)>>,
    pub handshakes: Mutex<Vec<(String, u16)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(url.to_string(), response(status, body));
        self
    }

    pub fn form<F>(mut self, url: &str, handler: F) -> Self
    where
        F: Fn(&[(String, String)]) -> HttpResponse + Send + Sync + 'static,
    {
        self.forms.insert(url.to_string(), Arc::new(handler));
        self
    }

    /// Make a request fail with a connect error, keyed as `"GET <url>"` or
    /// `"POST <url>"`
    pub fn fail(mut self, request: &str) -> Self {
        self.failing.insert(request.to_string());
        self
    }

    pub fn requested(&self, request: &str) -> bool {
        self.requests.lock().iter().any(|r| r == request)
    }

    fn check_failure(&self, request: &str, url: &str) -> Result<(), TransportError> {
        if self.failing.contains(request) {
            return Err(TransportError::Connect {
                url: url.to_string(),
                reason: "connection reset by peer".to_string(),
            });
        }
        Ok(())
    }

    pub fn submissions_to(&self, url: &str) -> Vec<Vec<(String, String)>> {
        self.form_submissions
            .lock()
            .iter()
            .filter(|(u, _)| u == url)
            .map(|(_, fields)| fields.clone())
            .collect()
    }
}

pub fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status_code: status,
        body: body.to_string(),
        headers: HashMap::new(),
        duration_ms: 1,
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let request = format!("GET {}", url);
        self.requests.lock().push(request.clone());
        self.check_failure(&request, url)?;

        Ok(self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| response(404, "Not Found")))
    }

    async fn post_form(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<HttpResponse, TransportError> {
        let request = format!("POST {}", url);
        self.requests.lock().push(request.clone());
        self.form_submissions
            .lock()
            .push((url.to_string(), fields.to_vec()));
        self.check_failure(&request, url)?;

        match self.forms.get(url) {
            Some(handler) => Ok(handler(fields)),
            None => Ok(response(404, "Not Found")),
        }
    }

    async fn tls_handshake(&self, host: &str, port: u16) -> Result<TlsSession, TransportError> {
        self.handshakes.lock().push((host.to_string(), port));
        Err(TransportError::TlsHandshake {
            host: host.to_string(),
            reason: "scripted transport has no TLS".to_string(),
        })
    }
}

/// Probe returning fixed findings after an optional delay
pub struct StaticProbe {
    pub name: &'static str,
    pub findings: Vec<Finding>,
    pub delay: Duration,
}

impl StaticProbe {
    pub fn new(name: &'static str, severity: Severity) -> Self {
        Self {
            name,
            findings: vec![Finding::new(
                format!("{} finding", name),
                severity,
                "static",
                "static",
                "none",
            )],
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Probe for StaticProbe {
    fn name(&self) -> &'static str {
        self.name
    }

    fn label(&self) -> &'static str {
        "Static Check"
    }

    async fn analyze(&self, _target: &Url) -> Vec<Finding> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.findings.clone()
    }
}

/// Probe that panics inside `analyze`
pub struct PanickingProbe;

#[async_trait]
impl Probe for PanickingProbe {
    fn name(&self) -> &'static str {
        "explodes"
    }

    fn label(&self) -> &'static str {
        "Exploding Check"
    }

    async fn analyze(&self, _target: &Url) -> Vec<Finding> {
        panic!("probe blew up");
    }
}
