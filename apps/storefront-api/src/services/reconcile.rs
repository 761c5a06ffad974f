//! # Payment Reconciliation
//!
//! Applies a processor notification to the order it refers to.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/payments/webhook                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  parse_notification ──── not a payment ───────────────► ignored (200)   │
//! │       │ payment id            no id ──────────────────► 400             │
//! │       ▼                                                                 │
//! │  gateway.get_payment ─── unreachable / 5xx ───────────► 502 (retried)   │
//! │       │                  404 ─────────────────────────► ignored         │
//! │       ▼                                                                 │
//! │  order by external_reference ── none ─────────────────► ignored         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  map status ─── unknown ──────────────────────────────► ignored         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  transition guard ─── same status ────────────────────► unchanged       │
//! │       │               forbidden ──────────────────────► rejected        │
//! │       ▼                                                                 │
//! │  UPDATE ... WHERE id = ? AND status = <read status>                     │
//! │       ├── 1 row ──────────────────────────────────────► updated         │
//! │       └── 0 rows (another delivery won) ──────────────► unchanged       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every branch except transport failures answers 2xx, so the processor
//! stops redelivering notifications that can never apply.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use lumen_core::{OrderStatus, StatusChange};
use lumen_payments::{parse_notification, Notification, Payment};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// What a webhook delivery did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The order moved to a new status.
    Updated,
    /// The order already had the mapped status.
    Unchanged,
    /// The move is not allowed from the order's current status.
    RejectedTransition,
    /// Nothing to apply (other topic, unknown order or status).
    Ignored,
}

/// Webhook response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReconcileOutcome {
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl ReconcileOutcome {
    fn ignored() -> Self {
        ReconcileOutcome {
            outcome: Outcome::Ignored,
            order_id: None,
            status: None,
        }
    }

    fn for_order(outcome: Outcome, order_id: &str, status: OrderStatus) -> Self {
        ReconcileOutcome {
            outcome,
            order_id: Some(order_id.to_string()),
            status: Some(status),
        }
    }
}

/// Entry point for a raw webhook delivery.
pub async fn handle_notification(
    state: &AppState,
    body: &[u8],
    query: &HashMap<String, String>,
) -> ApiResult<ReconcileOutcome> {
    match parse_notification(body, query)? {
        Notification::Payment { id } => reconcile_payment(state, &id).await,
        Notification::Other { topic } => {
            debug!(topic = ?topic, "Ignoring non-payment notification");
            Ok(ReconcileOutcome::ignored())
        }
    }
}

/// Re-fetches a payment and applies its status to the referenced order.
pub async fn reconcile_payment(state: &AppState, payment_id: &str) -> ApiResult<ReconcileOutcome> {
    if !is_payment_id(payment_id) {
        return Err(ApiError::validation(format!(
            "Malformed payment id: {payment_id:?}"
        )));
    }

    let payment = match state.gateway.get_payment(payment_id).await {
        Ok(payment) => payment,
        Err(e) if e.is_not_found() => {
            warn!(payment_id = %payment_id, "Processor does not know this payment");
            return Ok(ReconcileOutcome::ignored());
        }
        Err(e) => return Err(e.into()),
    };

    let Some(reference) = payment.reference() else {
        info!(payment_id = %payment.id, "Payment has no external reference");
        return Ok(ReconcileOutcome::ignored());
    };

    let Some(order) = state.db.orders().get_by_external_reference(reference).await? else {
        warn!(
            payment_id = %payment.id,
            external_reference = %reference,
            "No order for external reference"
        );
        return Ok(ReconcileOutcome::ignored());
    };

    let Some(target) = payment.status.order_status() else {
        info!(
            order_id = %order.id,
            payment_id = %payment.id,
            status = %payment.status,
            "Unmapped payment status, leaving order as is"
        );
        return Ok(ReconcileOutcome::for_order(Outcome::Ignored, &order.id, order.status));
    };

    if target == OrderStatus::Paid {
        check_amount(&payment, order.total_cents, &order.currency, &order.id);
    }

    let (from, to) = match order.status.transition_to(target) {
        Ok(StatusChange::Unchanged) => {
            debug!(order_id = %order.id, status = %order.status, "Duplicate notification");
            return Ok(ReconcileOutcome::for_order(Outcome::Unchanged, &order.id, order.status));
        }
        Ok(StatusChange::Changed { from, to }) => (from, to),
        Err(e) => {
            warn!(
                order_id = %order.id,
                payment_id = %payment.id,
                error = %e,
                "Rejected order status transition"
            );
            return Ok(ReconcileOutcome::for_order(
                Outcome::RejectedTransition,
                &order.id,
                order.status,
            ));
        }
    };

    let applied = state
        .db
        .orders()
        .update_status_if(&order.id, from, to, Some(&payment.id))
        .await?;

    if applied {
        info!(
            order_id = %order.id,
            payment_id = %payment.id,
            from = %from,
            to = %to,
            "Order status reconciled"
        );
        return Ok(ReconcileOutcome::for_order(Outcome::Updated, &order.id, to));
    }

    // A concurrent delivery changed the row between our read and write.
    let current = state
        .db
        .orders()
        .get_by_id(&order.id)
        .await?
        .map(|o| o.status)
        .unwrap_or(from);
    debug!(order_id = %order.id, status = %current, "Lost reconciliation race");
    Ok(ReconcileOutcome::for_order(Outcome::Unchanged, &order.id, current))
}

/// Warns when an approved payment doesn't cover the order. The update still applies.
fn check_amount(payment: &Payment, total_cents: i64, currency: &str, order_id: &str) {
    if let Some(amount) = payment.amount() {
        if amount.cents() != total_cents {
            warn!(
                order_id = %order_id,
                payment_id = %payment.id,
                paid_cents = amount.cents(),
                total_cents,
                "Payment amount differs from order total"
            );
        }
    }

    if let Some(paid_currency) = payment.currency_id.as_deref() {
        if paid_currency != currency {
            warn!(
                order_id = %order_id,
                payment_id = %payment.id,
                paid_currency,
                currency,
                "Payment currency differs from order currency"
            );
        }
    }
}

fn is_payment_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 64 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{
        customer, payment, place_order, seed_product, test_state, FakeGateway,
    };
    use lumen_core::PaymentStatus;
    use std::sync::Arc;

    fn webhook(id: &str) -> Vec<u8> {
        format!(r#"{{"type":"payment","action":"payment.updated","data":{{"id":"{id}"}}}}"#)
            .into_bytes()
    }

    async fn order_status(state: &AppState, order_id: &str) -> OrderStatus {
        state.db.orders().get_by_id(order_id).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_approved_payment_marks_order_paid() {
        let gateway = Arc::new(FakeGateway::default());
        let state = test_state(gateway.clone()).await;
        let user = customer(&state, "ana@example.com").await;
        let product = seed_product(&state, "Lake", 1500).await;
        let order = place_order(&state, &user, &product).await;

        gateway.put_payment(payment("1001", PaymentStatus::Approved, &order.external_reference, 15.0));

        let outcome = handle_notification(&state, &webhook("1001"), &HashMap::new())
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::for_order(Outcome::Updated, &order.id, OrderStatus::Paid));

        let stored = state.db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
        assert_eq!(stored.payment_id.as_deref(), Some("1001"));
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_a_no_op() {
        let gateway = Arc::new(FakeGateway::default());
        let state = test_state(gateway.clone()).await;
        let user = customer(&state, "ana@example.com").await;
        let product = seed_product(&state, "Lake", 1500).await;
        let order = place_order(&state, &user, &product).await;
        gateway.put_payment(payment("1001", PaymentStatus::Approved, &order.external_reference, 15.0));

        let first = reconcile_payment(&state, "1001").await.unwrap();
        let second = reconcile_payment(&state, "1001").await.unwrap();

        assert_eq!(first.outcome, Outcome::Updated);
        assert_eq!(second.outcome, Outcome::Unchanged);
        assert_eq!(second.status, Some(OrderStatus::Paid));
    }

    #[tokio::test]
    async fn test_late_pending_does_not_downgrade_paid() {
        let gateway = Arc::new(FakeGateway::default());
        let state = test_state(gateway.clone()).await;
        let user = customer(&state, "ana@example.com").await;
        let product = seed_product(&state, "Lake", 1500).await;
        let order = place_order(&state, &user, &product).await;

        gateway.put_payment(payment("1001", PaymentStatus::Approved, &order.external_reference, 15.0));
        reconcile_payment(&state, "1001").await.unwrap();

        gateway.put_payment(payment("1001", PaymentStatus::InProcess, &order.external_reference, 15.0));
        let outcome = reconcile_payment(&state, "1001").await.unwrap();

        assert_eq!(outcome.outcome, Outcome::RejectedTransition);
        assert_eq!(order_status(&state, &order.id).await, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_rejected_then_approved_retry() {
        let gateway = Arc::new(FakeGateway::default());
        let state = test_state(gateway.clone()).await;
        let user = customer(&state, "ana@example.com").await;
        let product = seed_product(&state, "Lake", 1500).await;
        let order = place_order(&state, &user, &product).await;

        gateway.put_payment(payment("1", PaymentStatus::Rejected, &order.external_reference, 15.0));
        reconcile_payment(&state, "1").await.unwrap();
        assert_eq!(order_status(&state, &order.id).await, OrderStatus::Failed);

        gateway.put_payment(payment("2", PaymentStatus::Approved, &order.external_reference, 15.0));
        reconcile_payment(&state, "2").await.unwrap();

        let stored = state.db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
        assert_eq!(stored.payment_id.as_deref(), Some("2"));

        gateway.put_payment(payment("2", PaymentStatus::ChargedBack, &order.external_reference, 15.0));
        reconcile_payment(&state, "2").await.unwrap();
        assert_eq!(order_status(&state, &order.id).await, OrderStatus::Refunded);
    }

    #[tokio::test]
    async fn test_amount_mismatch_still_applies() {
        let gateway = Arc::new(FakeGateway::default());
        let state = test_state(gateway.clone()).await;
        let user = customer(&state, "ana@example.com").await;
        let product = seed_product(&state, "Lake", 1500).await;
        let order = place_order(&state, &user, &product).await;
        gateway.put_payment(payment("7", PaymentStatus::Approved, &order.external_reference, 1.0));

        let outcome = reconcile_payment(&state, "7").await.unwrap();
        assert_eq!(outcome.outcome, Outcome::Updated);
    }

    #[tokio::test]
    async fn test_unmatched_payments_are_ignored() {
        let gateway = Arc::new(FakeGateway::default());
        let state = test_state(gateway.clone()).await;
        let user = customer(&state, "ana@example.com").await;
        let product = seed_product(&state, "Lake", 1500).await;
        let order = place_order(&state, &user, &product).await;

        gateway.put_payment(payment("1", PaymentStatus::Approved, "no-such-order", 15.0));
        assert_eq!(reconcile_payment(&state, "1").await.unwrap(), ReconcileOutcome::ignored());

        gateway.put_payment(payment("2", PaymentStatus::Approved, "  ", 15.0));
        assert_eq!(reconcile_payment(&state, "2").await.unwrap(), ReconcileOutcome::ignored());

        // Unknown to the processor.
        assert_eq!(reconcile_payment(&state, "404").await.unwrap(), ReconcileOutcome::ignored());

        gateway.put_payment(payment("3", PaymentStatus::Unknown, &order.external_reference, 15.0));
        let outcome = reconcile_payment(&state, "3").await.unwrap();
        assert_eq!(outcome.outcome, Outcome::Ignored);
        assert_eq!(order_status(&state, &order.id).await, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_notification_shapes() {
        let state = test_state(Arc::new(FakeGateway::default())).await;

        let outcome = handle_notification(&state, br#"{"topic":"merchant_order"}"#, &HashMap::new())
            .await
            .unwrap();
        assert_eq!(outcome.outcome, Outcome::Ignored);

        let err = handle_notification(&state, br#"{"type":"payment","data":{}}"#, &HashMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = reconcile_payment(&state, "../v1/users").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_processor_outage_is_bad_gateway() {
        let state = test_state(Arc::new(FakeGateway::failing_payments())).await;
        let err = reconcile_payment(&state, "1001").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentProviderError);
    }

    #[tokio::test]
    async fn test_concurrent_deliveries_update_once() {
        let gateway = Arc::new(FakeGateway::default());
        let state = test_state(gateway.clone()).await;
        let user = customer(&state, "ana@example.com").await;
        let product = seed_product(&state, "Lake", 1500).await;
        let order = place_order(&state, &user, &product).await;
        gateway.put_payment(payment("1001", PaymentStatus::Approved, &order.external_reference, 15.0));

        let (a, b) = tokio::join!(
            reconcile_payment(&state, "1001"),
            reconcile_payment(&state, "1001")
        );
        let outcomes = [a.unwrap().outcome, b.unwrap().outcome];

        assert_eq!(outcomes.iter().filter(|o| **o == Outcome::Updated).count(), 1);
        assert_eq!(outcomes.iter().filter(|o| **o == Outcome::Unchanged).count(), 1);
        assert_eq!(order_status(&state, &order.id).await, OrderStatus::Paid);
    }
}
