//! # Request and Response Bodies
//!
//! Data Transfer Objects for the JSON API.
//!
//! Domain types that are safe to expose (`Category`, `Order`, `User`) are
//! returned as-is. `Product` goes through [`ProductDto`] on public routes so
//! the full-resolution `asset_url` stays private until purchase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use lumen_core::validation::{
    slugify, validate_currency, validate_dimension, validate_password, validate_price_cents,
    validate_slug, validate_title, validate_url, ValidationResult,
};
use lumen_core::{OrderStatus, Product, Role, User};

use crate::auth::TokenPair;

// =============================================================================
// Catalog
// =============================================================================

/// Public view of a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductDto {
    pub id: String,
    pub category_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub currency: String,
    pub preview_url: String,
    pub width_px: Option<i64>,
    pub height_px: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            id: p.id,
            category_id: p.category_id,
            title: p.title,
            description: p.description,
            price_cents: p.price_cents,
            currency: p.currency,
            preview_url: p.preview_url,
            width_px: p.width_px,
            height_px: p.height_px,
            created_at: p.created_at,
        }
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPage {
    pub items: Vec<ProductDto>,
    pub limit: i64,
    pub offset: i64,
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct AuthResponse {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

impl SignupRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_password(&self.password)?;
        if let Some(name) = &self.full_name {
            validate_title("full_name", name)?;
        }
        Ok(())
    }
}

// =============================================================================
// Checkout
// =============================================================================

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutItem {
    pub product_id: String,
    pub quantity: i64,
}

/// Only ids and quantities; prices always come from the catalog.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutResponse {
    pub order_id: String,
    pub external_reference: String,
    pub preference_id: String,
    /// Hosted checkout URL to redirect the buyer to.
    pub init_point: String,
    pub total_cents: i64,
    pub currency: String,
}

// =============================================================================
// Purchases
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DownloadResponse {
    pub url: String,
}

// =============================================================================
// Admin
// =============================================================================

/// Create or replace a product.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    #[serde(default)]
    pub category_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub currency: Option<String>,
    pub preview_url: String,
    pub asset_url: String,
    #[serde(default)]
    pub width_px: Option<i64>,
    #[serde(default)]
    pub height_px: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl ProductInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_title("title", &self.title)?;
        validate_price_cents(self.price_cents)?;
        if let Some(currency) = &self.currency {
            validate_currency(currency)?;
        }
        validate_url("preview_url", &self.preview_url)?;
        validate_url("asset_url", &self.asset_url)?;
        validate_dimension("width_px", self.width_px)?;
        validate_dimension("height_px", self.height_px)?;
        Ok(())
    }

    /// Builds the stored product, keeping `id` and `created_at`.
    pub fn into_product(
        self,
        id: String,
        created_at: DateTime<Utc>,
        default_currency: &str,
    ) -> Product {
        Product {
            id,
            category_id: self.category_id.filter(|c| !c.trim().is_empty()),
            title: self.title.trim().to_string(),
            description: self.description.filter(|d| !d.trim().is_empty()),
            price_cents: self.price_cents,
            currency: self.currency.unwrap_or_else(|| default_currency.to_string()),
            preview_url: self.preview_url.trim().to_string(),
            asset_url: self.asset_url.trim().to_string(),
            width_px: self.width_px,
            height_px: self.height_px,
            is_active: self.is_active,
            created_at,
            updated_at: created_at,
        }
    }
}

/// Create or replace a category. The slug defaults to the slugified name.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CategoryInput {
    /// Validates and returns the effective slug.
    pub fn validate(&self) -> ValidationResult<String> {
        validate_title("name", &self.name)?;
        let slug = match &self.slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => slugify(&self.name),
        };
        validate_slug(&slug)?;
        Ok(slug)
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct RoleUpdate {
    pub role: Role,
}
