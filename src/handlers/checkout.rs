//! Checkout session initiation.
//!
//! Accepts a purchase request, asks the processor for a hosted checkout
//! session, and records a pending order. The order row is written only after
//! the processor confirms session creation, so rows are never inconsistent
//! with sessions that actually exist.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Error, ProcessorError, Result};
use crate::handlers::AppState;
use crate::order::NewOrder;
use crate::stripe::CreateSessionRequest;

/// Inbound purchase request
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    /// Customer name; must be non-empty
    pub customer_name: String,
    /// Customer email; must be non-empty
    pub customer_email: String,
    /// Amount in the smallest currency unit; must be positive
    pub amount: i64,
}

impl CheckoutRequest {
    fn validate(&self) -> Result<()> {
        if self.customer_name.trim().is_empty() {
            return Err(Error::validation("customer_name must not be empty"));
        }
        if self.customer_email.trim().is_empty() {
            return Err(Error::validation("customer_email must not be empty"));
        }
        if self.amount <= 0 {
            return Err(Error::validation("amount must be a positive integer"));
        }
        Ok(())
    }
}

/// Response to a successful initiation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    /// Hosted checkout page the caller should redirect to
    pub redirect_url: String,
    /// Processor-issued session id, usable with the status endpoint
    pub session_id: String,
}

/// `POST /api/checkout`
#[instrument(skip_all, fields(amount = request.amount))]
pub async fn create_checkout_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    request.validate()?;

    let session = state
        .processor
        .create_session(CreateSessionRequest {
            customer_email: request.customer_email.clone(),
            product_name: format!("Order for {}", request.customer_name.trim()),
            amount: request.amount,
        })
        .await?;

    let redirect_url = session
        .url
        .clone()
        .ok_or_else(|| Error::Processor(ProcessorError::MissingRedirect(session.id.clone())))?;

    let order = state
        .reconciler
        .store()
        .insert(NewOrder {
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            amount: request.amount,
            currency: state.config.currency.clone(),
            checkout_session_id: session.id.clone(),
        })
        .await?;

    state.metrics.record_order_created();
    tracing::info!(
        order_id = %order.id,
        session_id = %session.id,
        amount = order.amount,
        "order created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            redirect_url,
            session_id: session.id,
        }),
    ))
}
