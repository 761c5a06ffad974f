//! # Checkout Service
//!
//! Turns a list of product ids into a pending order and a hosted-checkout
//! preference at the processor.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. validate request         1..=MAX_CART_ITEMS lines                  │
//! │  2. load products            missing → 404, inactive → 422             │
//! │  3. price cart               catalog prices, one currency              │
//! │  4. insert order + items     ONE transaction, status = pending         │
//! │  5. create preference        X-Idempotency-Key = external_reference    │
//! │       │                                                                 │
//! │       ├── ok  → store preference_id, 201 {init_point, ...}             │
//! │       └── err → order → cancelled, 502                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use lumen_core::{
    Cart, CoreError, CoreResult, Order, OrderItem, OrderStatus, Product, MAX_CART_ITEMS,
};
use lumen_payments::{PreferenceItem, PreferencePayer, PreferenceRequest};

use crate::auth::AuthUser;
use crate::dto::{CheckoutRequest, CheckoutResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Sends the buyer straight back after an approved payment.
const AUTO_RETURN_APPROVED: &str = "approved";

/// Runs a checkout for `user`.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    request: CheckoutRequest,
) -> ApiResult<CheckoutResponse> {
    let (cart, products) = price_cart(state, &request).await?;
    let currency = cart.currency().unwrap_or(&state.config.payments.currency).to_string();

    if currency != state.config.payments.currency {
        return Err(CoreError::CurrencyMismatch {
            expected: state.config.payments.currency.clone(),
            found: currency,
        }
        .into());
    }

    let (order, items) = build_order(user, &cart, &currency)?;
    state.db.orders().create_with_items(&order, &items).await?;

    info!(
        order_id = %order.id,
        external_reference = %order.external_reference,
        total_cents = order.total_cents,
        items = items.len(),
        "Order created"
    );

    let preference_request = PreferenceRequest {
        items: cart
            .lines()
            .iter()
            .map(|line| {
                let item = PreferenceItem::new(
                    line.product_id.clone(),
                    line.title.clone(),
                    line.quantity,
                    line.unit_price(),
                    currency.clone(),
                );
                match products.get(&line.product_id) {
                    Some(product) => item.with_picture(product.preview_url.clone()),
                    None => item,
                }
            })
            .collect(),
        payer: PreferencePayer {
            email: user.email.clone(),
            name: None,
        },
        external_reference: order.external_reference.clone(),
        back_urls: state.config.back_urls(),
        auto_return: Some(AUTO_RETURN_APPROVED.to_string()),
        notification_url: state.config.notification_url(),
        statement_descriptor: None,
    };

    let preference = match state
        .gateway
        .create_preference(&preference_request, &order.external_reference)
        .await
    {
        Ok(preference) => preference,
        Err(e) => {
            warn!(order_id = %order.id, error = %e, "Preference creation failed, cancelling order");
            match state
                .db
                .orders()
                .update_status_if(&order.id, OrderStatus::Pending, OrderStatus::Cancelled, None)
                .await
            {
                Ok(true) => {}
                Ok(false) => warn!(order_id = %order.id, "Order was no longer pending"),
                Err(db_err) => {
                    error!(order_id = %order.id, error = %db_err, "Failed to cancel order")
                }
            }
            return Err(ApiError::from(e));
        }
    };

    state
        .db
        .orders()
        .set_preference(&order.id, &preference.id)
        .await?;

    let init_point = if state.config.payments.sandbox {
        preference
            .sandbox_init_point
            .clone()
            .unwrap_or_else(|| preference.init_point.clone())
    } else {
        preference.init_point.clone()
    };

    info!(
        order_id = %order.id,
        preference_id = %preference.id,
        "Checkout handed off to processor"
    );

    Ok(CheckoutResponse {
        order_id: order.id,
        external_reference: order.external_reference,
        preference_id: preference.id,
        init_point,
        total_cents: order.total_cents,
        currency,
    })
}

/// Validates the request and prices it from the catalog.
async fn price_cart(
    state: &AppState,
    request: &CheckoutRequest,
) -> ApiResult<(Cart, HashMap<String, Product>)> {
    if request.items.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }
    if request.items.len() > MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        }
        .into());
    }

    let mut ids: Vec<String> = request
        .items
        .iter()
        .map(|item| item.product_id.trim().to_string())
        .collect();
    ids.sort();
    ids.dedup();

    let products: HashMap<String, Product> = state
        .db
        .products()
        .get_many(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    let mut cart = Cart::new();
    for item in &request.items {
        let id = item.product_id.trim();
        let product = products
            .get(id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        cart.add(product, item.quantity)?;
    }
    cart.ensure_not_empty()?;

    Ok((cart, products))
}

/// Snapshots the cart into a pending order.
fn build_order(
    user: &AuthUser,
    cart: &Cart,
    currency: &str,
) -> CoreResult<(Order, Vec<OrderItem>)> {
    let now = Utc::now();
    let order_id = Uuid::new_v4().to_string();

    let items = cart
        .lines()
        .iter()
        .map(|line| {
            Ok(OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                product_id: line.product_id.clone(),
                title_snapshot: line.title.clone(),
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
                line_total_cents: line.line_total()?.cents(),
                created_at: now,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let order = Order {
        id: order_id,
        user_id: Some(user.id.clone()),
        payer_email: user.email.clone(),
        status: OrderStatus::Pending,
        total_cents: cart.total()?.cents(),
        currency: currency.to_string(),
        external_reference: Uuid::new_v4().to_string(),
        preference_id: None,
        payment_id: None,
        created_at: now,
        updated_at: now,
    };

    Ok((order, items))
}
