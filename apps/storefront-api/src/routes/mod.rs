//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  /api                                                                   │
//! │  ├── GET    /health                                  public             │
//! │  ├── GET    /categories, /products, /products/{id}   public             │
//! │  ├── POST   /auth/signup, /auth/login, /auth/refresh public             │
//! │  ├── GET    /auth/me                                 customer           │
//! │  ├── GET    /orders, /orders/{id}                    customer           │
//! │  ├── *      /favorites[/{product_id}]                customer           │
//! │  ├── GET    /purchases[/{product_id}/download]       customer           │
//! │  ├── POST   /checkout                                customer           │
//! │  ├── POST   /payments/webhook                        processor          │
//! │  └── *      /admin/...                               admin              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod purchases;
pub mod webhook;

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use lumen_db::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

use crate::config::StorefrontConfig;
use crate::state::SharedState;

/// Builds the full application router.
pub fn app(state: SharedState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn api_routes() -> Router<SharedState> {
    Router::new()
        .merge(health::routes())
        .merge(catalog::routes())
        .merge(auth::routes())
        .merge(orders::routes())
        .merge(favorites::routes())
        .merge(purchases::routes())
        .merge(checkout::routes())
        .merge(webhook::routes())
        .nest("/admin", admin::routes())
}

/// Only the configured origins may call the API from a browser.
fn cors_layer(config: &StorefrontConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}

/// `?limit=&offset=` for listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// `(limit, offset)` clamped to the allowed page size.
    pub fn clamped(&self) -> (i64, i64) {
        (
            self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            self.offset.unwrap_or(0).max(0),
        )
    }
}
