//! HTTP handlers and application state.
//!
//! ```text
//! POST /api/checkout                          checkout session initiation
//! POST /api/webhooks/stripe                   webhook event reconciliation
//! GET  /api/orders/:session_id                order status query
//! POST /api/orders/:session_id/reconcile     manual reconciliation fallback
//! GET  /checkout/success, /checkout/cancel    static confirmation pages
//! GET  /health, /status                       liveness and runtime counters
//! ```
//!
//! State is constructed once at process start and injected into every
//! handler; there are no module-level clients.

pub mod checkout;
pub mod orders;
pub mod pages;
pub mod status;
pub mod webhook;

pub use checkout::{CheckoutRequest, CheckoutResponse};
pub use orders::OrderStatusResponse;
pub use status::{HealthResponse, Metrics, StatusResponse};

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::reconcile::Reconciler;
use crate::store::OrderStore;
use crate::stripe::{CheckoutProcessor, SignatureVerifier};

/// Process-wide shared state
pub struct AppState {
    /// Runtime configuration
    pub config: AppConfig,
    /// Payment processor client
    pub processor: Arc<dyn CheckoutProcessor>,
    /// Status transition logic over the order store
    pub reconciler: Reconciler,
    /// Webhook signature verifier
    pub verifier: SignatureVerifier,
    /// Request counters for the status endpoint
    pub metrics: Metrics,
}

impl AppState {
    /// Wire up state from its injected collaborators
    pub fn new(
        config: AppConfig,
        store: Arc<dyn OrderStore>,
        processor: Arc<dyn CheckoutProcessor>,
    ) -> Self {
        let verifier = SignatureVerifier::new(&config.webhook_secret, config.signature_tolerance);
        Self {
            config,
            processor,
            reconciler: Reconciler::new(store),
            verifier,
            metrics: Metrics::new(),
        }
    }
}

/// Build the full application router
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/checkout", post(checkout::create_checkout_handler))
        .route("/api/webhooks/stripe", post(webhook::stripe_webhook_handler))
        .route("/api/orders/:session_id", get(orders::order_status_handler))
        .route(
            "/api/orders/:session_id/reconcile",
            post(orders::reconcile_order_handler),
        )
        .route("/checkout/success", get(pages::success_handler))
        .route("/checkout/cancel", get(pages::cancel_handler))
        .route("/health", get(status::health_handler))
        .route("/status", get(status::status_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
