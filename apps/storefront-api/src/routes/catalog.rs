//! # Catalog Routes
//!
//! Public, read-only views of categories and active products.
//!
//! `GET /api/products?q=lake&category=landscapes&limit=24&offset=0`
//! runs an FTS5 prefix search when `q` is present.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use lumen_core::validation::validate_search_query;
use lumen_core::Category;
use lumen_db::ProductQuery;

use crate::dto::{ProductDto, ProductPage};
use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
}

#[derive(Debug, Deserialize)]
pub struct ProductsParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

async fn list_categories(State(state): State<SharedState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

async fn list_products(
    State(state): State<SharedState>,
    Query(params): Query<ProductsParams>,
) -> ApiResult<Json<ProductPage>> {
    let text = params
        .q
        .as_deref()
        .map(validate_search_query)
        .transpose()?;

    let query = ProductQuery::new(text, params.category, params.limit, params.offset);
    let products = state.db.products().search(&query).await?;

    debug!(count = products.len(), "Catalog page");

    Ok(Json(ProductPage {
        items: products.into_iter().map(ProductDto::from).collect(),
        limit: query.limit,
        offset: query.offset,
    }))
}

async fn get_product(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductDto>> {
    match state.db.products().get_by_id(&id).await? {
        Some(product) if product.is_active => Ok(Json(product.into())),
        _ => Err(ApiError::not_found("Product", &id)),
    }
}
