//! # Back Office
//!
//! Catalog, order and user management. Every handler takes [`AdminUser`],
//! which re-reads the caller's role from the database.
//!
//! ```text
//! /api/admin
//! ├── GET, POST          /products
//! ├── GET, PUT, DELETE   /products/{id}         DELETE hides the product
//! ├── GET, POST          /categories
//! ├── PUT, DELETE        /categories/{id}
//! ├── GET                /orders?status=&limit=&offset=
//! ├── GET                /orders/{id}
//! ├── PATCH              /orders/{id}/status    {status}
//! ├── GET                /users
//! └── PATCH              /users/{id}/role       {role}
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use lumen_core::{Category, Order, OrderStatus, OrderWithItems, Product, StatusChange, User};

use crate::auth::AdminUser;
use crate::dto::{CategoryInput, ProductInput, RoleUpdate, StatusUpdate};
use crate::error::{ApiError, ApiResult};
use crate::routes::Pagination;
use crate::state::{AppState, SharedState};

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            put(update_category).delete(delete_category),
        )
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/users", get(list_users))
        .route("/users/{id}/role", patch(update_user_role))
}

// =============================================================================
// Products
// =============================================================================

/// Includes hidden products.
async fn list_products(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Product>>> {
    let (limit, offset) = page.clamped();
    Ok(Json(state.db.products().list_all(limit, offset).await?))
}

async fn get_product(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &id))
}

async fn create_product(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Json(input): Json<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    input.validate()?;
    ensure_category(&state, input.category_id.as_deref()).await?;

    let product = input.into_product(
        Uuid::new_v4().to_string(),
        Utc::now(),
        &state.config.payments.currency,
    );
    state.db.products().insert(&product).await?;

    info!(admin = %admin.id, product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Full replacement; `id` and `created_at` are kept.
async fn update_product(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Json<Product>> {
    input.validate()?;
    ensure_category(&state, input.category_id.as_deref()).await?;

    let existing = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    let product = input.into_product(
        existing.id,
        existing.created_at,
        &state.config.payments.currency,
    );
    let updated = state.db.products().update(&product).await?;

    info!(admin = %admin.id, product_id = %id, "Product updated");
    Ok(Json(updated))
}

async fn delete_product(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.products().soft_delete(&id).await?;
    info!(admin = %admin.id, product_id = %id, "Product hidden");
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_category(state: &AppState, category_id: Option<&str>) -> ApiResult<()> {
    let Some(id) = category_id.map(str::trim).filter(|id| !id.is_empty()) else {
        return Ok(());
    };

    match state.db.categories().get_by_id(id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::validation(format!("Unknown category: {id}"))),
    }
}

// =============================================================================
// Categories
// =============================================================================

async fn list_categories(
    State(state): State<SharedState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

async fn create_category(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Json(input): Json<CategoryInput>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let slug = input.validate()?;
    let now = Utc::now();
    let category = Category {
        id: Uuid::new_v4().to_string(),
        name: input.name.trim().to_string(),
        slug,
        description: input.description.filter(|d| !d.trim().is_empty()),
        created_at: now,
        updated_at: now,
    };

    state.db.categories().insert(&category).await?;

    info!(admin = %admin.id, slug = %category.slug, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<Json<Category>> {
    let slug = input.validate()?;

    let existing = state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", &id))?;

    let category = Category {
        name: input.name.trim().to_string(),
        slug,
        description: input.description.filter(|d| !d.trim().is_empty()),
        ..existing
    };
    let updated = state.db.categories().update(&category).await?;

    info!(admin = %admin.id, category_id = %id, "Category updated");
    Ok(Json(updated))
}

async fn delete_category(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.categories().delete(&id).await?;
    info!(admin = %admin.id, category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

async fn list_orders(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Query(filter): Query<OrderFilter>,
) -> ApiResult<Json<Vec<Order>>> {
    let status = filter
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<OrderStatus>)
        .transpose()?;

    let (limit, offset) = Pagination {
        limit: filter.limit,
        offset: filter.offset,
    }
    .clamped();

    Ok(Json(state.db.orders().list_all(status, limit, offset).await?))
}

async fn get_order(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderWithItems>> {
    state
        .db
        .orders()
        .get_with_items(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Order", &id))
}

/// Manual moves obey the same transition table as webhooks.
async fn update_order_status(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<Order>> {
    let order = state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", &id))?;

    if let StatusChange::Changed { from, to } = order.status.transition_to(update.status)? {
        let applied = state.db.orders().update_status_if(&id, from, to, None).await?;
        if !applied {
            warn!(order_id = %id, from = %from, to = %to, "Order changed during manual update");
            return Err(ApiError::conflict("Order status changed concurrently, reload and retry"));
        }
        info!(admin = %admin.id, order_id = %id, from = %from, to = %to, "Order status set manually");
    }

    state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Order", &id))
}

// =============================================================================
// Users
// =============================================================================

async fn list_users(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<User>>> {
    let (limit, offset) = page.clamped();
    Ok(Json(state.db.users().list(limit, offset).await?))
}

/// Refuses to demote the last remaining admin.
async fn update_user_role(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(update): Json<RoleUpdate>,
) -> ApiResult<Json<User>> {
    let user = state
        .db
        .users()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &id))?;

    if user.role != update.role {
        if !state.db.users().set_role(&id, update.role).await? {
            return Err(ApiError::conflict("Cannot demote the last admin"));
        }
        info!(admin = %admin.id, user_id = %id, role = %update.role, "Role changed");
    }

    state
        .db
        .users()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User", &id))
}
