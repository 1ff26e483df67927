//! Webhook event reconciliation boundary.
//!
//! The body is taken as raw [`Bytes`]: the signature covers the exact byte
//! sequence Stripe delivered, so verification runs before any parsing.
//!
//! Response policy, which Stripe's redelivery behavior depends on:
//! - signature or payload failure → 4xx, no mutation, no retry storm
//! - datastore failure during the mutation → 5xx, Stripe redelivers
//! - everything else → 200, including unknown event kinds and events whose
//!   order is missing (logged as an anomaly, acknowledged anyway)

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use tracing::instrument;

use crate::error::{Result, SignatureError};
use crate::handlers::AppState;
use crate::reconcile::EventOutcome;
use crate::stripe::{WebhookEvent, SIGNATURE_HEADER};

/// `POST /api/webhooks/stripe`
#[instrument(skip_all, fields(payload_bytes = body.len()))]
pub async fn stripe_webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(SignatureError::MissingHeader)?;

    state.verifier.verify(&body, signature)?;

    let event = WebhookEvent::from_bytes(&body)?;
    state.metrics.record_event_received();
    tracing::debug!(
        event_id = %event.id,
        event_type = %event.event_type,
        "webhook event verified"
    );

    let outcome = state.reconciler.apply_event(&event).await?;
    match &outcome {
        EventOutcome::Applied(_) => state.metrics.record_event_applied(),
        EventOutcome::Unchanged(_) | EventOutcome::NoMatch | EventOutcome::Ignored => {}
    }

    Ok(Json(serde_json::json!({ "received": true })))
}
