//! Health and status endpoints.
//!
//! `/health` is a plain liveness probe; `/status` adds uptime and the
//! gateway's request counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::handlers::AppState;

/// Health check response for simple liveness probes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status (always "healthy" if responding)
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Detailed server status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server version (from Cargo.toml)
    pub version: String,
    /// Server name
    pub name: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Orders created since start
    pub orders_created: u64,
    /// Webhook events that passed signature verification
    pub events_received: u64,
    /// Events that resulted in a status transition
    pub events_applied: u64,
    /// Manual reconciliation calls served
    pub reconciliations: u64,
    /// ISO8601 timestamp of when status was generated
    pub timestamp: String,
}

/// Thread-safe request counters.
///
/// Lock-free; every field is an independent atomic and reads are allowed to
/// be mutually inconsistent under concurrency.
#[derive(Debug)]
pub struct Metrics {
    start_time: Instant,
    orders_created: AtomicU64,
    events_received: AtomicU64,
    events_applied: AtomicU64,
    reconciliations: AtomicU64,
}

impl Metrics {
    /// Fresh counters; start time is now
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            orders_created: AtomicU64::new(0),
            events_received: AtomicU64::new(0),
            events_applied: AtomicU64::new(0),
            reconciliations: AtomicU64::new(0),
        }
    }

    /// Server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Count one created order
    pub fn record_order_created(&self) {
        self.orders_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one verified webhook event
    pub fn record_event_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one event that mutated order state
    pub fn record_event_applied(&self) {
        self.events_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one manual reconciliation
    pub fn record_reconciliation(&self) {
        self.reconciliations.fetch_add(1, Ordering::Relaxed);
    }

    /// Orders created since start
    pub fn orders_created(&self) -> u64 {
        self.orders_created.load(Ordering::Relaxed)
    }

    /// Verified webhook events since start
    pub fn events_received(&self) -> u64 {
        self.events_received.load(Ordering::Relaxed)
    }

    /// Mutating events since start
    pub fn events_applied(&self) -> u64 {
        self.events_applied.load(Ordering::Relaxed)
    }

    /// Manual reconciliations since start
    pub fn reconciliations(&self) -> u64 {
        self.reconciliations.load(Ordering::Relaxed)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// `GET /health`
#[instrument(skip_all)]
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse::default()))
}

/// `GET /status`
#[instrument(skip_all)]
pub async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = StatusResponse {
        version: crate::VERSION.to_string(),
        name: crate::NAME.to_string(),
        uptime_seconds: state.metrics.uptime_seconds(),
        orders_created: state.metrics.orders_created(),
        events_received: state.metrics.events_received(),
        events_applied: state.metrics.events_applied(),
        reconciliations: state.metrics.reconciliations(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(response))
}
