// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::errors::ScanError;
use crate::service::ScanService;
use crate::types::ScanId;

pub fn create_router(service: Arc<ScanService>) -> Router {
    Router::new()
        .route("/api/scan", post(start_scan_handler))
        .route("/api/scan/:scan_id", get(scan_status_handler))
        .route("/api/scan/:scan_id/report", get(scan_report_handler))
        .route("/api/health", get(health_handler))
        .route("/api/metrics", get(metrics_handler))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub target_url: String,
}

pub async fn start_scan_handler(
    State(service): State<Arc<ScanService>>,
    Json(request): Json<ScanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Scan requested for {}", request.target_url);
    let receipt = service.admit(&request.target_url).await?;
    Ok(Json(receipt))
}

pub async fn scan_status_handler(
    State(service): State<Arc<ScanService>>,
    Path(scan_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let scan = service.status(&ScanId::from(scan_id)).await?;
    Ok(Json(scan))
}

pub async fn scan_report_handler(
    State(service): State<Arc<ScanService>>,
    Path(scan_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let report = service.report(&ScanId::from(scan_id)).await?;
    Ok(Json(report))
}

pub async fn health_handler(State(service): State<Arc<ScanService>>) -> impl IntoResponse {
    Json(service.health())
}

pub async fn metrics_handler(State(service): State<Arc<ScanService>>) -> impl IntoResponse {
    Json(service.metrics())
}

/// `ScanError` rendered as `{"detail": ...}` with a matching status code
#[derive(Debug)]
pub struct ApiError(pub ScanError);

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            ScanError::PolicyRejection { .. } => StatusCode::FORBIDDEN,
            ScanError::NotFound(_) => StatusCode::NOT_FOUND,
            ScanError::NotReady { .. } => StatusCode::BAD_REQUEST,
            ScanError::InvalidTarget { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ScanError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = Json(serde_json::json!({
            "detail": self.0.to_string()
        }));

        (status, body).into_response()
    }
}
