//! Stripe event types.
//!
//! Strongly-typed representations of the webhook events that drive order
//! reconciliation. Event discrimination is a closed enum with an explicit
//! `Unknown` catch-all, so the no-op-on-unknown policy is a visible branch
//! rather than an implicit fallthrough.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Event types the reconciler handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutEventKind {
    /// Customer finished the hosted checkout page
    CheckoutSessionCompleted,
    /// A payment attempt on the session succeeded
    PaymentIntentSucceeded,
    /// A payment attempt on the session failed
    PaymentIntentFailed,
    /// Anything else; always acknowledged, never acted on
    Unknown,
}

impl FromStr for CheckoutEventKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_event_type(s))
    }
}

impl CheckoutEventKind {
    /// Classify a raw `type` field; anything unrecognized is `Unknown`
    pub fn from_event_type(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentIntentFailed,
            _ => Self::Unknown,
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::PaymentIntentSucceeded => "payment_intent.succeeded",
            Self::PaymentIntentFailed => "payment_intent.payment_failed",
            Self::Unknown => "unknown",
        }
    }

    /// Check if this is a known event type
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Generic Stripe event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Unique identifier for the event
    pub id: String,

    /// Type of event
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time of event creation (Unix timestamp)
    pub created: i64,

    /// Whether this is a live mode event
    #[serde(default)]
    pub livemode: bool,

    /// Object containing event data
    pub data: EventData,
}

/// Event data container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    /// The actual event object (checkout session or payment intent)
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// Parse from raw JSON bytes.
    ///
    /// Only called after signature verification; the raw bytes are what the
    /// signature covers.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::InvalidPayload(e.to_string()))
    }

    /// Get the typed event kind
    pub fn kind(&self) -> CheckoutEventKind {
        CheckoutEventKind::from_event_type(&self.event_type)
    }

    /// Extract the checkout session from event data
    pub fn as_checkout_session(&self) -> Result<CheckoutSession> {
        match self.kind() {
            CheckoutEventKind::CheckoutSessionCompleted => {
                serde_json::from_value(self.data.object.clone())
                    .map_err(|e| Error::InvalidPayload(e.to_string()))
            }
            _ => Err(Error::InvalidPayload(format!(
                "event {} is not a checkout session event",
                self.event_type
            ))),
        }
    }

    /// Extract the payment intent from event data
    pub fn as_payment_intent(&self) -> Result<PaymentIntent> {
        match self.kind() {
            CheckoutEventKind::PaymentIntentSucceeded | CheckoutEventKind::PaymentIntentFailed => {
                serde_json::from_value(self.data.object.clone())
                    .map_err(|e| Error::InvalidPayload(e.to_string()))
            }
            _ => Err(Error::InvalidPayload(format!(
                "event {} is not a payment intent event",
                self.event_type
            ))),
        }
    }
}

// =============================================================================
// Checkout Session
// =============================================================================

/// Stripe checkout session object.
///
/// Appears both inside `checkout.session.completed` events and as the
/// response body of the `/v1/checkout/sessions` API, so one type serves the
/// webhook path and the REST client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Session ID (cs_...)
    pub id: String,
    /// Hosted checkout page URL; present on freshly created sessions
    #[serde(default)]
    pub url: Option<String>,
    /// Payment intent ID (pi_...) once a payment attempt exists
    #[serde(default)]
    pub payment_intent: Option<String>,
    /// Whether the session has been paid
    #[serde(default = "PaymentStatus::unpaid")]
    pub payment_status: PaymentStatus,
    /// Customer email as supplied at session creation
    #[serde(default)]
    pub customer_email: Option<String>,
    /// Session amount in the smallest currency unit
    #[serde(default)]
    pub amount_total: Option<i64>,
    /// Three-letter currency code
    #[serde(default)]
    pub currency: Option<String>,
}

/// Payment status of a checkout session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment collected
    Paid,
    /// No payment attempt has succeeded yet
    Unpaid,
    /// Session completed without requiring payment
    NoPaymentRequired,
    /// Forward compatibility for statuses added by the processor
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    fn unpaid() -> Self {
        PaymentStatus::Unpaid
    }

    /// Whether this status settles the order as paid
    pub fn is_settled(self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::NoPaymentRequired)
    }
}

// =============================================================================
// Payment Intent
// =============================================================================

/// Stripe payment intent object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Payment intent ID (pi_...)
    pub id: String,
    /// Amount in the smallest currency unit
    #[serde(default)]
    pub amount: Option<i64>,
    /// Three-letter currency code
    #[serde(default)]
    pub currency: Option<String>,
    /// Metadata attached to the intent
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl PaymentIntent {
    /// Checkout session id carried in metadata, when the processor includes
    /// one. Used as the fallback lookup key for intents whose reference was
    /// never recorded.
    pub fn checkout_session_id(&self) -> Option<&str> {
        self.metadata
            .get("checkout_session_id")
            .and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_parsing() {
        assert_eq!(
            CheckoutEventKind::from_str("checkout.session.completed").unwrap(),
            CheckoutEventKind::CheckoutSessionCompleted
        );
        assert_eq!(
            CheckoutEventKind::from_str("payment_intent.succeeded").unwrap(),
            CheckoutEventKind::PaymentIntentSucceeded
        );
        assert_eq!(
            CheckoutEventKind::from_str("invoice.payment_succeeded").unwrap(),
            CheckoutEventKind::Unknown
        );
        assert!(!CheckoutEventKind::Unknown.is_known());
    }

    #[test]
    fn test_parse_checkout_session_event() {
        let json = r#"{
            "id": "evt_1234567890",
            "type": "checkout.session.completed",
            "created": 1614556800,
            "livemode": false,
            "data": {
                "object": {
                    "id": "cs_test_1",
                    "payment_intent": "pi_abc",
                    "payment_status": "paid",
                    "customer_email": "ada@example.com",
                    "amount_total": 2000,
                    "currency": "usd"
                }
            }
        }"#;

        let event = WebhookEvent::from_bytes(json.as_bytes()).unwrap();
        assert_eq!(event.id, "evt_1234567890");
        assert_eq!(event.kind(), CheckoutEventKind::CheckoutSessionCompleted);

        let session = event.as_checkout_session().unwrap();
        assert_eq!(session.id, "cs_test_1");
        assert_eq!(session.payment_intent.as_deref(), Some("pi_abc"));
        assert_eq!(session.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_parse_payment_intent_event() {
        let json = r#"{
            "id": "evt_pi_1",
            "type": "payment_intent.payment_failed",
            "created": 1614556800,
            "livemode": false,
            "data": {
                "object": {
                    "id": "pi_xyz",
                    "amount": 2000,
                    "currency": "usd",
                    "metadata": {"checkout_session_id": "cs_test_2"}
                }
            }
        }"#;

        let event = WebhookEvent::from_bytes(json.as_bytes()).unwrap();
        assert_eq!(event.kind(), CheckoutEventKind::PaymentIntentFailed);

        let intent = event.as_payment_intent().unwrap();
        assert_eq!(intent.id, "pi_xyz");
        assert_eq!(intent.checkout_session_id(), Some("cs_test_2"));
    }

    #[test]
    fn test_extractor_refuses_wrong_kind() {
        let json = r#"{
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "created": 1614556800,
            "livemode": false,
            "data": { "object": { "id": "pi_1" } }
        }"#;

        let event = WebhookEvent::from_bytes(json.as_bytes()).unwrap();
        assert!(event.as_checkout_session().is_err());
        assert!(event.as_payment_intent().is_ok());
    }

    #[test]
    fn test_unknown_payment_status_tolerated() {
        let json = r#"{"id": "cs_1", "payment_status": "something_new"}"#;
        let session: CheckoutSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.payment_status, PaymentStatus::Unknown);
        assert!(!session.payment_status.is_settled());
    }
}
