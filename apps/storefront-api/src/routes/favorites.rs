//! Bookmarked products.
//!
//! `PUT` and `DELETE` are idempotent and both answer `204 No Content`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use tracing::debug;

use crate::auth::AuthUser;
use crate::dto::ProductDto;
use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/favorites", get(list_favorites))
        .route(
            "/favorites/{product_id}",
            put(add_favorite).delete(remove_favorite),
        )
}

async fn list_favorites(
    State(state): State<SharedState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<ProductDto>>> {
    let products = state.db.favorites().list_for_user(&user.id).await?;
    Ok(Json(products.into_iter().map(ProductDto::from).collect()))
}

async fn add_favorite(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(product_id): Path<String>,
) -> ApiResult<StatusCode> {
    match state.db.products().get_by_id(&product_id).await? {
        Some(product) if product.is_active => {}
        _ => return Err(ApiError::not_found("Product", &product_id)),
    }

    state.db.favorites().add(&user.id, &product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_favorite(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(product_id): Path<String>,
) -> ApiResult<StatusCode> {
    let existed = state.db.favorites().remove(&user.id, &product_id).await?;
    debug!(user_id = %user.id, product_id = %product_id, existed, "Favorite removed");
    Ok(StatusCode::NO_CONTENT)
}
