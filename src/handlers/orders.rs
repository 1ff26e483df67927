//! Order status query and manual reconciliation fallback.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Error, Result};
use crate::handlers::AppState;
use crate::order::OrderStatus;

/// Order state as reported to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusResponse {
    /// Current status
    pub status: OrderStatus,
    /// Payment reference, once a payment attempt exists
    pub payment_reference: Option<String>,
}

/// `GET /api/orders/:session_id`
///
/// Read-only; used by the confirmation page and as the visibility half of
/// the manual reconciliation path.
#[instrument(skip(state))]
pub async fn order_status_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse> {
    let order = state
        .reconciler
        .store()
        .find_by_session(&session_id)
        .await?
        .ok_or_else(|| Error::not_found(&session_id))?;

    Ok(Json(OrderStatusResponse {
        status: order.status,
        payment_reference: order.payment_reference,
    }))
}

/// `POST /api/orders/:session_id/reconcile`
///
/// Pulls the session's authoritative state from the processor and applies
/// the same transition logic as the webhook path. Compensates for missed or
/// delayed webhook delivery; repeat calls are no-ops.
#[instrument(skip(state))]
pub async fn reconcile_order_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse> {
    let order = state
        .reconciler
        .reconcile_session(state.processor.as_ref(), &session_id)
        .await?;

    state.metrics.record_reconciliation();
    Ok(Json(OrderStatusResponse {
        status: order.status,
        payment_reference: order.payment_reference,
    }))
}
