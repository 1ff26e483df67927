//! In-memory order store for tests and `--memory-store` local runs.

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::order::{NewOrder, Order, OrderStatus};
use crate::store::OrderStore;

/// Thread-safe in-memory implementation of [`OrderStore`].
///
/// Lookups by session id and payment reference scan the map; order counts in
/// a single process never justify secondary indexes here.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders
    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    /// Whether the store holds no orders
    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }

    /// Snapshot of all orders, for test assertions
    pub fn all(&self) -> Vec<Order> {
        self.orders.read().values().cloned().collect()
    }
}

#[async_trait::async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, new: NewOrder) -> Result<Order> {
        let order = new.into_order();
        self.orders.write().insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_by_session(&self, session_id: &str) -> Result<Option<Order>> {
        Ok(self
            .orders
            .read()
            .values()
            .find(|o| o.checkout_session_id == session_id)
            .cloned())
    }

    async fn find_by_payment_reference(&self, reference: &str) -> Result<Option<Order>> {
        Ok(self
            .orders
            .read()
            .values()
            .find(|o| o.payment_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn transition(
        &self,
        id: Uuid,
        next: OrderStatus,
        payment_reference: Option<&str>,
    ) -> Result<Order> {
        let mut orders = self.orders.write();
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(id.to_string()))?;

        if order.status.accepts(next) {
            order.status = next;
            if order.payment_reference.is_none() {
                order.payment_reference = payment_reference.map(String::from);
            }
        }
        Ok(order.clone())
    }
}
