//! Ordergate - Hosted-Checkout Order Gateway
//!
//! A small axum service wrapping a hosted-checkout payment flow: an endpoint
//! creates Stripe checkout sessions and records pending orders, a webhook
//! endpoint consumes signed processor events to settle them, and a manual
//! reconciliation endpoint covers missed webhook delivery.
//!
//! # Architecture
//!
//! ```text
//! Customer ──▶ POST /api/checkout ──▶ Stripe (create session)
//!                      │                      │
//!                      ▼                      ▼
//!               Order (pending)        hosted checkout page
//!                      ▲                      │
//!                      │ status transition    ▼ pays / fails
//!               Reconciler ◀── POST /api/webhooks/stripe (signed events)
//!                      ▲
//!                      └──── POST /api/orders/:id/reconcile (pull fallback)
//! ```
//!
//! The interesting part is the order state machine (`pending → paid|failed`,
//! terminal states frozen) and the reconciliation logic feeding it; the rest
//! is boundary glue around the processor and the datastore, both injected
//! behind traits.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod order;
pub mod reconcile;
pub mod store;
pub mod stripe;

// Re-exports for convenience
pub use config::AppConfig;
pub use error::{Error, Result};
pub use handlers::{app_router, AppState};
pub use order::{NewOrder, Order, OrderStatus};
pub use reconcile::{EventOutcome, Reconciler};
pub use store::{InMemoryOrderStore, OrderStore, PgOrderStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
