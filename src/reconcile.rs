//! Order reconciliation.
//!
//! Maps verified processor events onto order status transitions, and backs
//! the manual fallback that pulls session state directly from the processor
//! when webhook delivery was missed or delayed.
//!
//! ```text
//! Webhook (pushed)                     Manual fallback (pulled)
//!       │                                      │
//!       ▼                                      ▼
//! [verify signature]                 [GET /v1/checkout/sessions/:id]
//!       │                                      │
//!       ▼                                      ▼
//! [typed event kind] ──────────────▶ [same transition logic]
//!       │
//!       ▼
//! [OrderStore::transition]
//! ```
//!
//! All transitions are set-to-value, so redelivered or repeated inputs reach
//! the same end state without a deduplication store.

use std::sync::Arc;

use crate::error::Result;
use crate::order::{Order, OrderStatus};
use crate::store::OrderStore;
use crate::stripe::{CheckoutEventKind, CheckoutProcessor, PaymentIntent, WebhookEvent};

/// What applying an event did to the order book
#[derive(Debug, Clone)]
pub enum EventOutcome {
    /// The order's status moved to the event's target
    Applied(Order),
    /// The order was already settled; nothing changed (redelivery, or a
    /// refused transition out of a terminal state)
    Unchanged(Order),
    /// Verified event, but no order matches its identifiers. Acknowledged
    /// anyway; retrying a permanently-missing row has no recovery value.
    NoMatch,
    /// Event kind outside the reconciler's vocabulary; deliberate no-op
    Ignored,
}

impl EventOutcome {
    /// Whether the event mutated an order
    pub fn mutated(&self) -> bool {
        matches!(self, EventOutcome::Applied(_))
    }
}

/// Applies processor-reported payment outcomes to stored orders
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn OrderStore>,
}

impl Reconciler {
    /// Build a reconciler over the given store
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Access the underlying store
    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    /// Apply a verified webhook event.
    ///
    /// Dispatches on the typed event kind; unknown kinds are acknowledged
    /// without touching the store so new processor event types never turn
    /// into failure responses and endless redelivery.
    pub async fn apply_event(&self, event: &WebhookEvent) -> Result<EventOutcome> {
        match event.kind() {
            CheckoutEventKind::CheckoutSessionCompleted => {
                let session = event.as_checkout_session()?;
                let Some(order) = self.store.find_by_session(&session.id).await? else {
                    tracing::warn!(
                        event_id = %event.id,
                        session_id = %session.id,
                        "completed session matches no order"
                    );
                    return Ok(EventOutcome::NoMatch);
                };
                self.settle(order, OrderStatus::Paid, session.payment_intent.as_deref())
                    .await
            }
            CheckoutEventKind::PaymentIntentSucceeded => {
                let intent = event.as_payment_intent()?;
                match self.resolve_intent_order(&intent).await? {
                    Some(order) => {
                        self.settle(order, OrderStatus::Paid, Some(&intent.id)).await
                    }
                    None => {
                        tracing::warn!(
                            event_id = %event.id,
                            payment_reference = %intent.id,
                            "succeeded payment intent matches no order"
                        );
                        Ok(EventOutcome::NoMatch)
                    }
                }
            }
            CheckoutEventKind::PaymentIntentFailed => {
                let intent = event.as_payment_intent()?;
                match self.resolve_intent_order(&intent).await? {
                    Some(order) => {
                        self.settle(order, OrderStatus::Failed, Some(&intent.id))
                            .await
                    }
                    None => {
                        tracing::warn!(
                            event_id = %event.id,
                            payment_reference = %intent.id,
                            "failed payment intent matches no order"
                        );
                        Ok(EventOutcome::NoMatch)
                    }
                }
            }
            CheckoutEventKind::Unknown => {
                tracing::debug!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "ignoring unknown event type"
                );
                Ok(EventOutcome::Ignored)
            }
        }
    }

    /// Pull-based fallback for missed webhook delivery.
    ///
    /// Fetches the session's authoritative state from the processor and, if
    /// it reports the session settled, applies the same transition as the
    /// `checkout.session.completed` branch. An unsettled session mutates
    /// nothing; the caller sees the order as it stands.
    pub async fn reconcile_session(
        &self,
        processor: &dyn CheckoutProcessor,
        session_id: &str,
    ) -> Result<Order> {
        let order = self
            .store
            .find_by_session(session_id)
            .await?
            .ok_or_else(|| crate::error::Error::not_found(session_id))?;

        let session = processor.retrieve_session(session_id).await?;
        if !session.payment_status.is_settled() {
            tracing::info!(
                session_id,
                status = ?session.payment_status,
                "session not settled; order left as-is"
            );
            return Ok(order);
        }

        let outcome = self
            .settle(order, OrderStatus::Paid, session.payment_intent.as_deref())
            .await?;
        match outcome {
            EventOutcome::Applied(order) | EventOutcome::Unchanged(order) => Ok(order),
            // settle only returns the two variants above
            EventOutcome::NoMatch | EventOutcome::Ignored => unreachable!(),
        }
    }

    /// Lookup precedence for payment intent events: the recorded payment
    /// reference wins; the session id carried in metadata is only consulted
    /// when the reference lookup misses.
    async fn resolve_intent_order(&self, intent: &PaymentIntent) -> Result<Option<Order>> {
        if let Some(order) = self.store.find_by_payment_reference(&intent.id).await? {
            return Ok(Some(order));
        }
        match intent.checkout_session_id() {
            Some(session_id) => self.store.find_by_session(session_id).await,
            None => Ok(None),
        }
    }

    async fn settle(
        &self,
        order: Order,
        next: OrderStatus,
        payment_reference: Option<&str>,
    ) -> Result<EventOutcome> {
        let before = order.status;
        let after = self
            .store
            .transition(order.id, next, payment_reference)
            .await?;

        if after.status == next && before != next {
            tracing::info!(
                order_id = %after.id,
                session_id = %after.checkout_session_id,
                from = before.as_str(),
                to = next.as_str(),
                "order status updated"
            );
            Ok(EventOutcome::Applied(after))
        } else {
            if after.status != next {
                tracing::warn!(
                    order_id = %after.id,
                    current = after.status.as_str(),
                    requested = next.as_str(),
                    "transition refused; order already terminal"
                );
            }
            Ok(EventOutcome::Unchanged(after))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::NewOrder;
    use crate::store::InMemoryOrderStore;
    use crate::stripe::{CheckoutSession, FixedSessionProcessor, PaymentStatus};

    async fn store_with_order(session_id: &str) -> (Arc<InMemoryOrderStore>, Reconciler) {
        let store = Arc::new(InMemoryOrderStore::new());
        let reconciler = Reconciler::new(store.clone());
        store
            .insert(NewOrder {
                customer_name: "Ada Lovelace".to_string(),
                customer_email: "ada@example.com".to_string(),
                amount: 2000,
                currency: "usd".to_string(),
                checkout_session_id: session_id.to_string(),
            })
            .await
            .unwrap();
        (store, reconciler)
    }

    fn completed_event(session_id: &str, payment_ref: &str) -> WebhookEvent {
        let json = serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "created": 1614556800,
            "livemode": false,
            "data": { "object": {
                "id": session_id,
                "payment_intent": payment_ref,
                "payment_status": "paid"
            }}
        });
        serde_json::from_value(json).unwrap()
    }

    fn intent_event(kind: &str, intent_id: &str, session_id: Option<&str>) -> WebhookEvent {
        let mut object = serde_json::json!({ "id": intent_id, "metadata": {} });
        if let Some(sid) = session_id {
            object["metadata"]["checkout_session_id"] = serde_json::json!(sid);
        }
        let json = serde_json::json!({
            "id": "evt_2",
            "type": kind,
            "created": 1614556800,
            "livemode": false,
            "data": { "object": object }
        });
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn test_completed_event_marks_order_paid() {
        let (store, reconciler) = store_with_order("cs_test_1").await;
        let outcome = reconciler
            .apply_event(&completed_event("cs_test_1", "pi_abc"))
            .await
            .unwrap();
        assert!(outcome.mutated());

        let order = store.find_by_session("cs_test_1").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_reference.as_deref(), Some("pi_abc"));
    }

    #[tokio::test]
    async fn test_redelivered_completed_event_is_noop() {
        let (store, reconciler) = store_with_order("cs_test_1").await;
        let event = completed_event("cs_test_1", "pi_abc");
        reconciler.apply_event(&event).await.unwrap();
        let second = reconciler.apply_event(&event).await.unwrap();

        assert!(!second.mutated());
        let order = store.find_by_session("cs_test_1").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_reference.as_deref(), Some("pi_abc"));
    }

    #[tokio::test]
    async fn test_failed_intent_by_session_fallback() {
        let (store, reconciler) = store_with_order("cs_test_2").await;
        // No payment reference recorded yet; metadata session id resolves it
        let event = intent_event("payment_intent.payment_failed", "pi_xyz", Some("cs_test_2"));
        let outcome = reconciler.apply_event(&event).await.unwrap();
        assert!(outcome.mutated());

        let order = store.find_by_session("cs_test_2").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(order.payment_reference.as_deref(), Some("pi_xyz"));
    }

    #[tokio::test]
    async fn test_intent_without_match_is_acknowledged_anomaly() {
        let (store, reconciler) = store_with_order("cs_test_1").await;
        let event = intent_event("payment_intent.payment_failed", "pi_unknown", None);
        let outcome = reconciler.apply_event(&event).await.unwrap();
        assert!(matches!(outcome, EventOutcome::NoMatch));

        let order = store.find_by_session("cs_test_1").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_unknown_event_is_ignored() {
        let (store, reconciler) = store_with_order("cs_test_1").await;
        let json = serde_json::json!({
            "id": "evt_9",
            "type": "customer.created",
            "created": 1614556800,
            "livemode": false,
            "data": { "object": {} }
        });
        let event: WebhookEvent = serde_json::from_value(json).unwrap();
        let outcome = reconciler.apply_event(&event).await.unwrap();

        assert!(matches!(outcome, EventOutcome::Ignored));
        let order = store.find_by_session("cs_test_1").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_failed_order_not_resurrected_by_success_event() {
        let (store, reconciler) = store_with_order("cs_test_1").await;
        reconciler
            .apply_event(&intent_event(
                "payment_intent.payment_failed",
                "pi_1",
                Some("cs_test_1"),
            ))
            .await
            .unwrap();
        let outcome = reconciler
            .apply_event(&intent_event(
                "payment_intent.succeeded",
                "pi_1",
                Some("cs_test_1"),
            ))
            .await
            .unwrap();

        assert!(!outcome.mutated());
        let order = store.find_by_session("cs_test_1").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Failed);
    }

    #[tokio::test]
    async fn test_manual_reconcile_paid_session() {
        let (store, reconciler) = store_with_order("cs_test_1").await;
        let processor = FixedSessionProcessor::new(CheckoutSession {
            id: "cs_test_1".to_string(),
            url: None,
            payment_intent: Some("pi_abc".to_string()),
            payment_status: PaymentStatus::Paid,
            customer_email: None,
            amount_total: Some(2000),
            currency: Some("usd".to_string()),
        });

        let order = reconciler
            .reconcile_session(&processor, "cs_test_1")
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_reference.as_deref(), Some("pi_abc"));

        // Safe to call repeatedly
        let again = reconciler
            .reconcile_session(&processor, "cs_test_1")
            .await
            .unwrap();
        assert_eq!(again.status, OrderStatus::Paid);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_manual_reconcile_unpaid_session_leaves_pending() {
        let (_store, reconciler) = store_with_order("cs_test_2").await;
        let processor = FixedSessionProcessor::new(CheckoutSession {
            id: "cs_test_2".to_string(),
            url: None,
            payment_intent: None,
            payment_status: PaymentStatus::Unpaid,
            customer_email: None,
            amount_total: None,
            currency: None,
        });

        let order = reconciler
            .reconcile_session(&processor, "cs_test_2")
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_manual_reconcile_unknown_session_is_not_found() {
        let (_store, reconciler) = store_with_order("cs_test_1").await;
        let processor = FixedSessionProcessor::new(CheckoutSession {
            id: "cs_missing".to_string(),
            url: None,
            payment_intent: None,
            payment_status: PaymentStatus::Paid,
            customer_email: None,
            amount_total: None,
            currency: None,
        });

        let err = reconciler
            .reconcile_session(&processor, "cs_missing")
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::NotFound(_)));
    }
}
