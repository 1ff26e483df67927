//! Order entity and its status state machine.
//!
//! An `Order` tracks one checkout attempt from creation (`Pending`) to its
//! resolution (`Paid` or `Failed`). Status only moves forward:
//!
//! ```text
//!            checkout.session.completed
//!            payment_intent.succeeded
//!   Pending ───────────────────────────▶ Paid
//!      │
//!      │     payment_intent.payment_failed
//!      └────────────────────────────────▶ Failed
//! ```
//!
//! Terminal states are frozen. Re-applying the same terminal status is an
//! accepted no-op (webhook redelivery must be idempotent); any other
//! transition out of a terminal state is refused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Payment resolution state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
pub enum OrderStatus {
    /// Checkout session created, payment outcome unknown
    Pending,
    /// Processor confirmed payment
    Paid,
    /// Processor reported a failed payment attempt
    Failed,
}

impl OrderStatus {
    /// Whether a transition to `next` is accepted.
    ///
    /// `Pending` accepts anything; a terminal state accepts only itself.
    /// The self-transition makes redelivered events naturally idempotent
    /// without a deduplication store.
    pub fn accepts(self, next: OrderStatus) -> bool {
        self == OrderStatus::Pending || self == next
    }

    /// Whether this status is terminal
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    /// Lowercase wire representation
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Failed => "failed",
        }
    }
}

/// The persistent record tracking one checkout attempt
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    /// System-generated identifier
    pub id: Uuid,
    /// Customer name, captured verbatim from the initiating request
    pub customer_name: String,
    /// Customer email, captured verbatim
    pub customer_email: String,
    /// Amount in the smallest currency unit (cents for usd)
    pub amount: i64,
    /// Three-letter currency code
    pub currency: String,
    /// Processor-issued checkout session id; set once at creation
    pub checkout_session_id: String,
    /// Processor payment reference (`pi_...`); absent until a payment
    /// attempt is associated with the session, written at most once
    pub payment_reference: Option<String>,
    /// Current state in the order state machine
    pub status: OrderStatus,
    /// Creation timestamp, immutable
    pub created_at: DateTime<Utc>,
}

/// Fields required to persist a new order
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Customer name (non-empty, already validated at the boundary)
    pub customer_name: String,
    /// Customer email
    pub customer_email: String,
    /// Amount in the smallest currency unit
    pub amount: i64,
    /// Three-letter currency code
    pub currency: String,
    /// Session id confirmed by the processor before this row is written
    pub checkout_session_id: String,
}

impl NewOrder {
    /// Materialize a full `Order` row with a fresh id, `Pending` status,
    /// and the current timestamp.
    pub fn into_order(self) -> Order {
        Order {
            id: Uuid::new_v4(),
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            amount: self.amount,
            currency: self.currency,
            checkout_session_id: self.checkout_session_id,
            payment_reference: None,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
