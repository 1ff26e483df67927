//! Stripe integration.
//!
//! Everything that touches the payment processor lives here:
//!
//! - **Signature verification**: HMAC-SHA256 validation of the
//!   `stripe-signature` header over the raw request body
//! - **Event types**: typed envelope and object extraction for the webhook
//!   events that drive order reconciliation
//! - **REST client**: checkout session creation and retrieval, behind the
//!   [`CheckoutProcessor`] trait for dependency injection
//!
//! # Security
//!
//! - Webhook signing secret and API key are loaded from the environment
//! - Constant-time signature comparison to prevent timing attacks
//! - Signatures are verified against the raw delivered bytes, before any
//!   JSON parsing

pub mod client;
pub mod events;
pub mod signature;

pub use client::{CheckoutProcessor, CreateSessionRequest, FixedSessionProcessor, StripeClient};
pub use events::{CheckoutEventKind, CheckoutSession, PaymentIntent, PaymentStatus, WebhookEvent};
pub use signature::{SignatureVerifier, SIGNATURE_HEADER};
