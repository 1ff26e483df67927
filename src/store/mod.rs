//! Order persistence.
//!
//! All shared state lives behind the [`OrderStore`] trait so handlers take an
//! explicitly constructed, process-wide store instead of a module-level
//! global, and tests substitute [`InMemoryOrderStore`] for Postgres.
//!
//! The store owns the state-machine guard: [`OrderStore::transition`] applies
//! a status change only when [`crate::order::OrderStatus::accepts`] allows it,
//! and writes the payment reference at most once. Both implementations make
//! that guard a single atomic step (one `UPDATE ... WHERE` statement in
//! Postgres, one write-lock section in memory), which is the only concurrency
//! discipline this design relies on.

mod memory;
mod postgres;

pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;

use uuid::Uuid;

use crate::error::Result;
use crate::order::{NewOrder, Order, OrderStatus};

/// Row-level create/read/update access to orders
#[async_trait::async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Persist a new order. The checkout session id must already be
    /// confirmed by the processor; rows are never written speculatively.
    async fn insert(&self, new: NewOrder) -> Result<Order>;

    /// Point lookup by processor checkout session id
    async fn find_by_session(&self, session_id: &str) -> Result<Option<Order>>;

    /// Point lookup by processor payment reference
    async fn find_by_payment_reference(&self, reference: &str) -> Result<Option<Order>>;

    /// Apply a status transition, returning the order's post-transition row.
    ///
    /// The transition is applied only if the current status accepts it;
    /// otherwise the row is returned unchanged. `payment_reference` is a
    /// first-write: once set it is never overwritten, even when a later
    /// event carries a different reference.
    async fn transition(
        &self,
        id: Uuid,
        next: OrderStatus,
        payment_reference: Option<&str>,
    ) -> Result<Order>;
}
