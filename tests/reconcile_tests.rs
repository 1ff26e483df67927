//! State-machine properties of order reconciliation across event sequences:
//! terminal statuses stay frozen, repeated inputs converge, the first payment
//! reference wins, and intent lookups prefer the recorded reference over the
//! metadata session id.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use ordergate::stripe::{CheckoutSession, FixedSessionProcessor, PaymentStatus, WebhookEvent};
use ordergate::{InMemoryOrderStore, NewOrder, OrderStatus, OrderStore, Reconciler};

async fn seeded(session_ids: &[&str]) -> (Arc<InMemoryOrderStore>, Reconciler) {
    let store = Arc::new(InMemoryOrderStore::new());
    for session_id in session_ids {
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
    }
    let reconciler = Reconciler::new(store.clone() as Arc<dyn OrderStore>);
    (store, reconciler)
}

fn event(event_type: &str, object: serde_json::Value) -> WebhookEvent {
    let json = serde_json::json!({
        "id": "evt_test",
        "type": event_type,
        "created": chrono::Utc::now().timestamp(),
        "livemode": false,
        "data": { "object": object }
    });
    WebhookEvent::from_bytes(json.to_string().as_bytes()).unwrap()
}

fn completed(session_id: &str, payment_intent: &str) -> WebhookEvent {
    event(
        "checkout.session.completed",
        serde_json::json!({
            "id": session_id,
            "payment_intent": payment_intent,
            "payment_status": "paid"
        }),
    )
}

fn intent_event(event_type: &str, intent_id: &str, metadata: serde_json::Value) -> WebhookEvent {
    event(
        event_type,
        serde_json::json!({ "id": intent_id, "metadata": metadata }),
    )
}

#[tokio::test]
async fn paid_order_survives_a_late_failure_event() {
    let (store, reconciler) = seeded(&["cs_a"]).await;

    reconciler
        .apply_event(&completed("cs_a", "pi_1"))
        .await
        .unwrap();
    let outcome = reconciler
        .apply_event(&intent_event(
            "payment_intent.payment_failed",
            "pi_1",
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    assert!(!outcome.mutated());
    let order = store.find_by_session("cs_a").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.payment_reference.as_deref(), Some("pi_1"));
}

#[tokio::test]
async fn failed_order_survives_a_late_success_event() {
    let (store, reconciler) = seeded(&["cs_a"]).await;

    reconciler
        .apply_event(&intent_event(
            "payment_intent.payment_failed",
            "pi_1",
            serde_json::json!({ "checkout_session_id": "cs_a" }),
        ))
        .await
        .unwrap();
    reconciler
        .apply_event(&intent_event(
            "payment_intent.succeeded",
            "pi_1",
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    let order = store.find_by_session("cs_a").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Failed);
}

#[tokio::test]
async fn reference_lookup_beats_metadata_session_id() {
    // Two orders; pi_1 is recorded on cs_a, while the event metadata points
    // at cs_b. The recorded reference must win.
    let (store, reconciler) = seeded(&["cs_a", "cs_b"]).await;

    reconciler
        .apply_event(&completed("cs_a", "pi_1"))
        .await
        .unwrap();
    reconciler
        .apply_event(&intent_event(
            "payment_intent.succeeded",
            "pi_1",
            serde_json::json!({ "checkout_session_id": "cs_b" }),
        ))
        .await
        .unwrap();

    let other = store.find_by_session("cs_b").await.unwrap().unwrap();
    assert_eq!(other.status, OrderStatus::Pending);
    assert!(other.payment_reference.is_none());
}

#[tokio::test]
async fn first_payment_reference_is_never_overwritten() {
    let (store, reconciler) = seeded(&["cs_a"]).await;

    reconciler
        .apply_event(&completed("cs_a", "pi_first"))
        .await
        .unwrap();
    reconciler
        .apply_event(&intent_event(
            "payment_intent.succeeded",
            "pi_second",
            serde_json::json!({ "checkout_session_id": "cs_a" }),
        ))
        .await
        .unwrap();

    let order = store.find_by_session("cs_a").await.unwrap().unwrap();
    assert_eq!(order.payment_reference.as_deref(), Some("pi_first"));
}

#[tokio::test]
async fn webhook_then_manual_reconcile_converge() {
    let (store, reconciler) = seeded(&["cs_a"]).await;
    let processor = FixedSessionProcessor::new(CheckoutSession {
        id: "cs_a".to_string(),
        url: None,
        payment_intent: Some("pi_pull".to_string()),
        payment_status: PaymentStatus::Paid,
        customer_email: None,
        amount_total: Some(2000),
        currency: Some("usd".to_string()),
    });

    reconciler
        .apply_event(&completed("cs_a", "pi_push"))
        .await
        .unwrap();
    let order = reconciler
        .reconcile_session(&processor, "cs_a")
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Paid);
    // The webhook got there first; the pulled reference does not replace it.
    assert_eq!(order.payment_reference.as_deref(), Some("pi_push"));
    assert_eq!(
        store
            .find_by_session("cs_a")
            .await
            .unwrap()
            .unwrap()
            .payment_reference
            .as_deref(),
        Some("pi_push")
    );
}

#[tokio::test]
async fn repeated_event_sequences_reach_one_end_state() {
    let (store, reconciler) = seeded(&["cs_a"]).await;
    let delivery = completed("cs_a", "pi_1");

    for _ in 0..3 {
        reconciler.apply_event(&delivery).await.unwrap();
    }

    let order = store.find_by_session("cs_a").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.payment_reference.as_deref(), Some("pi_1"));
}
