//! Fixtures shared by service and route tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use lumen_core::{Order, OrderItem, OrderStatus, PaymentStatus, Product, Role, User};
use lumen_db::{Database, DbConfig};
use lumen_payments::{
    Payment, PaymentError, PaymentGateway, PaymentResult, Preference, PreferenceRequest,
};

use crate::auth::AuthUser;
use crate::config::StorefrontConfig;
use crate::state::AppState;

/// Bootstrap admin email configured in [`test_state`].
pub const OWNER_EMAIL: &str = "owner@example.com";

/// In-process stand-in for the processor.
#[derive(Default)]
pub struct FakeGateway {
    preferences: Mutex<Vec<(PreferenceRequest, String)>>,
    payments: Mutex<HashMap<String, Payment>>,
    fail_preferences: bool,
    fail_payments: bool,
}

impl FakeGateway {
    pub fn failing_preferences() -> Self {
        FakeGateway {
            fail_preferences: true,
            ..FakeGateway::default()
        }
    }

    pub fn failing_payments() -> Self {
        FakeGateway {
            fail_payments: true,
            ..FakeGateway::default()
        }
    }

    /// Sets what `get_payment` returns for the payment's id.
    pub fn put_payment(&self, payment: Payment) {
        self.payments
            .lock()
            .unwrap()
            .insert(payment.id.clone(), payment);
    }

    /// Every preference request received, with its idempotency key.
    pub fn preference_requests(&self) -> Vec<(PreferenceRequest, String)> {
        self.preferences.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
        idempotency_key: &str,
    ) -> PaymentResult<Preference> {
        let mut requests = self.preferences.lock().unwrap();
        requests.push((request.clone(), idempotency_key.to_string()));

        if self.fail_preferences {
            return Err(PaymentError::Api {
                status: 500,
                body: "internal error".to_string(),
            });
        }

        let id = format!("pref-{}", requests.len());
        Ok(Preference {
            init_point: format!("https://pay.example.com/checkout?pref_id={id}"),
            sandbox_init_point: Some(format!(
                "https://sandbox.pay.example.com/checkout?pref_id={id}"
            )),
            id,
        })
    }

    async fn get_payment(&self, payment_id: &str) -> PaymentResult<Payment> {
        if self.fail_payments {
            return Err(PaymentError::Api {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or(PaymentError::Api {
                status: 404,
                body: "not found".to_string(),
            })
    }
}

pub fn test_config() -> StorefrontConfig {
    let mut config = StorefrontConfig::default();
    config.jwt_secret = "test-secret".to_string();
    config.public_base_url = Some("https://api.shop.example.com".to_string());
    config.bootstrap_admin_email = Some(OWNER_EMAIL.to_string());
    config.payments.access_token = "TEST-token".to_string();
    config.validate().unwrap()
}

pub async fn test_state(gateway: Arc<FakeGateway>) -> AppState {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    AppState::new(db, gateway, test_config())
}

async fn insert_user(state: &AppState, email: &str, role: Role) -> AuthUser {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$fixture".to_string(),
        full_name: None,
        role,
        created_at: now,
        updated_at: now,
    };
    state.db.users().insert(&user).await.unwrap();

    AuthUser {
        id: user.id,
        email: user.email,
        role,
    }
}

pub async fn customer(state: &AppState, email: &str) -> AuthUser {
    insert_user(state, email, Role::Customer).await
}

pub async fn admin(state: &AppState, email: &str) -> AuthUser {
    insert_user(state, email, Role::Admin).await
}

/// `Authorization` header value for `user`.
pub fn bearer(state: &AppState, user: &AuthUser) -> String {
    let now = Utc::now();
    let user = User {
        id: user.id.clone(),
        email: user.email.clone(),
        password_hash: String::new(),
        full_name: None,
        role: user.role,
        created_at: now,
        updated_at: now,
    };
    format!("Bearer {}", state.jwt.issue(&user).unwrap().access_token)
}

pub async fn seed_product(state: &AppState, title: &str, price_cents: i64) -> Product {
    let now = Utc::now();
    let id = Uuid::new_v4().to_string();
    let product = Product {
        preview_url: format!("https://cdn.example.com/preview/{id}.jpg"),
        asset_url: format!("https://cdn.example.com/full/{id}.tiff"),
        id,
        category_id: None,
        title: title.to_string(),
        description: None,
        price_cents,
        currency: "ARS".to_string(),
        width_px: Some(6000),
        height_px: Some(4000),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.db.products().insert(&product).await.unwrap();
    product
}

/// A pending single-item order, as checkout would leave it.
pub async fn place_order(state: &AppState, user: &AuthUser, product: &Product) -> Order {
    let now = Utc::now();
    let order = Order {
        id: Uuid::new_v4().to_string(),
        user_id: Some(user.id.clone()),
        payer_email: user.email.clone(),
        status: OrderStatus::Pending,
        total_cents: product.price_cents,
        currency: product.currency.clone(),
        external_reference: Uuid::new_v4().to_string(),
        preference_id: Some("pref-fixture".to_string()),
        payment_id: None,
        created_at: now,
        updated_at: now,
    };
    let item = OrderItem {
        id: Uuid::new_v4().to_string(),
        order_id: order.id.clone(),
        product_id: product.id.clone(),
        title_snapshot: product.title.clone(),
        unit_price_cents: product.price_cents,
        quantity: 1,
        line_total_cents: product.price_cents,
        created_at: now,
    };
    state.db.orders().create_with_items(&order, &[item]).await.unwrap();
    order
}

pub fn payment(id: &str, status: PaymentStatus, reference: &str, amount: f64) -> Payment {
    Payment {
        id: id.to_string(),
        status,
        status_detail: None,
        external_reference: Some(reference.to_string()),
        transaction_amount: Some(amount),
        currency_id: Some("ARS".to_string()),
    }
}

// =============================================================================
// HTTP helpers
// =============================================================================

/// Sends one request through the router and decodes the JSON body.
///
/// Empty bodies decode to `Value::Null`.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1_000_000)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, body)
}

pub fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method("GET").uri(uri), auth)
        .body(Body::empty())
        .unwrap()
}

pub fn delete(uri: &str, auth: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method("DELETE").uri(uri), auth)
        .body(Body::empty())
        .unwrap()
}

pub fn json(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    with_auth(Request::builder().method(method).uri(uri), auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_auth(builder: axum::http::request::Builder, auth: Option<&str>) -> axum::http::request::Builder {
    match auth {
        Some(value) => builder.header(header::AUTHORIZATION, value),
        None => builder,
    }
}
