//! # lumen-core: Pure Business Logic for the Lumen Storefront
//!
//! This crate holds the storefront's domain rules as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lumen Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Storefront client / Payment processor              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP (JSON)                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  storefront-api (axum)                          │   │
//! │  │    catalog, checkout, webhook, auth, admin                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ lumen-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │  payment  │  │   │
//! │  │   │  Product  │  │   Money   │  │  pricing  │  │  status   │  │   │
//! │  │   │  Order    │  │           │  │           │  │  mapping  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼──────────┐  ┌────────────────────┐   │
//! │  │        lumen-db (Database Layer)       │  │   lumen-payments   │   │
//! │  └────────────────────────────────────────┘  └────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Category, Order, User, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Server-side cart pricing for checkout
//! - [`payment`] - Processor payment statuses and their order-status mapping
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use lumen_core::money::Money;
//! use lumen_core::payment::PaymentStatus;
//! use lumen_core::OrderStatus;
//!
//! let price = Money::from_cents(1099);
//! assert_eq!(price.to_string(), "10.99");
//!
//! assert_eq!(PaymentStatus::Approved.order_status(), Some(OrderStatus::Paid));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod payment;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use payment::PaymentStatus;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products allowed in a single checkout.
pub const MAX_CART_ITEMS: usize = 50;

/// Maximum quantity of a single product in a checkout.
///
/// Digital images are licensed per copy; large quantities are almost always
/// a client bug.
pub const MAX_ITEM_QUANTITY: i64 = 20;

/// Highest catalog price in cents (100,000,000.00 in major units).
///
/// Together with the cart limits this keeps every order total far inside
/// `i64`.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Currency used when a product doesn't specify one.
pub const DEFAULT_CURRENCY: &str = "ARS";
