use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::auth::AuthUser;
use crate::dto::{CheckoutRequest, CheckoutResponse};
use crate::error::ApiResult;
use crate::services::checkout::checkout;
use crate::state::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new().route("/checkout", post(create_checkout))
}

/// Creates a pending order and its hosted-checkout preference.
async fn create_checkout(
    State(state): State<SharedState>,
    user: AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<CheckoutResponse>)> {
    let response = checkout(&state, &user, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
