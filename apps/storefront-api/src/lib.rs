//! # Lumen Storefront API
//!
//! JSON API for a digital photo store: a public catalog, customer accounts,
//! hosted checkout through a payment processor, and a back office.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront API                                   │
//! │                                                                         │
//! │  Browser ──► axum routes ──► services ──► lumen-db (SQLite)             │
//! │                 │               │                                       │
//! │                 │               └──────► lumen-payments ──► processor  │
//! │                 │                                                       │
//! │  Processor ─────┘ POST /api/payments/webhook                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`] for keys. The most common environment variables:
//! - `LUMEN_PORT` - HTTP port (default: 8080)
//! - `LUMEN_DATABASE_PATH` - SQLite file (default: ./lumen.db)
//! - `LUMEN_JWT_SECRET` - Secret for JWT signing
//! - `LUMEN_PUBLIC_BASE_URL` - Public URL the processor posts webhooks to
//! - `LUMEN_PAYMENTS__ACCESS_TOKEN` - Processor credentials (required)

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;

// Re-exports
pub use config::StorefrontConfig;
pub use error::{ApiError, ApiResult};
pub use routes::app;
pub use state::{AppState, SharedState};
