//! # Purchases
//!
//! Products the customer has paid for, and the full-resolution download
//! link that only a paid order unlocks.
//!
//! ```text
//! GET /api/purchases                          → [ProductDto]
//! GET /api/purchases/{product_id}/download    → {url}   (403 without a paid order)
//! ```

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::dto::{DownloadResponse, ProductDto};
use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/purchases", get(list_purchases))
        .route("/purchases/{product_id}/download", get(download))
}

async fn list_purchases(
    State(state): State<SharedState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<ProductDto>>> {
    let products = state.db.orders().purchased_products(&user.id).await?;
    Ok(Json(products.into_iter().map(ProductDto::from).collect()))
}

/// Works for products that were later hidden from the catalog.
async fn download(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(product_id): Path<String>,
) -> ApiResult<Json<DownloadResponse>> {
    if !state
        .db
        .orders()
        .has_paid_purchase(&user.id, &product_id)
        .await?
    {
        warn!(user_id = %user.id, product_id = %product_id, "Download without paid order");
        return Err(ApiError::forbidden("No paid order includes this product"));
    }

    let product = state
        .db
        .products()
        .get_by_id(&product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &product_id))?;

    info!(user_id = %user.id, product_id = %product_id, "Download link issued");

    Ok(Json(DownloadResponse {
        url: product.asset_url,
    }))
}
