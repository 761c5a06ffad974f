//! Processor notifications.
//!
//! The body is read as raw bytes: deliveries arrive with inconsistent
//! content types and sometimes carry everything in the query string.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use tracing::debug;

use crate::error::ApiResult;
use crate::services::reconcile::{handle_notification, ReconcileOutcome};
use crate::state::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new().route("/payments/webhook", post(webhook))
}

async fn webhook(
    State(state): State<SharedState>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> ApiResult<Json<ReconcileOutcome>> {
    debug!(bytes = body.len(), query = ?query, "Webhook delivery");
    Ok(Json(handle_notification(&state, &body, &query).await?))
}
