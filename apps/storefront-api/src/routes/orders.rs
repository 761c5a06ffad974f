//! A customer's own order history.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use lumen_core::{Order, OrderWithItems};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
}

async fn list_orders(
    State(state): State<SharedState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.db.orders().list_for_user(&user.id).await?))
}

/// Someone else's order is reported as missing.
async fn get_order(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderWithItems>> {
    match state.db.orders().get_with_items(&id).await? {
        Some(found) if found.order.user_id.as_deref() == Some(user.id.as_str()) => Ok(Json(found)),
        _ => Err(ApiError::not_found("Order", &id)),
    }
}

#[cfg(test)]
mod tests {
    use crate::routes::app;
    use crate::test_support::{bearer, customer, get, place_order, seed_product, send, test_state, FakeGateway};
    use axum::http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_orders_are_scoped_to_owner() {
        let state = Arc::new(test_state(Arc::new(FakeGateway::default())).await);
        let ana = customer(&state, "ana@example.com").await;
        let bob = customer(&state, "bob@example.com").await;
        let lake = seed_product(&state, "Lake", 1500).await;
        let order = place_order(&state, &ana, &lake).await;
        let ana_auth = bearer(&state, &ana);
        let bob_auth = bearer(&state, &bob);
        let app = app(state);

        let (status, body) = send(&app, get("/api/orders", Some(&ana_auth))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["status"], "pending");

        let (_, body) = send(&app, get("/api/orders", Some(&bob_auth))).await;
        assert!(body.as_array().unwrap().is_empty());

        let uri = format!("/api/orders/{}", order.id);
        let (status, body) = send(&app, get(&uri, Some(&ana_auth))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], order.id);
        assert_eq!(body["items"][0]["title_snapshot"], "Lake");

        let (status, _) = send(&app, get(&uri, Some(&bob_auth))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, get("/api/orders", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
