//! # Repository Module
//!
//! Table-level data access for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler / service                                                │
//! │       │                                                                 │
//! │       │  state.db.orders().get_by_external_reference(ext_ref)          │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── create_with_items(&self, order, items)   (one transaction)        │
//! │  ├── get_by_external_reference(&self, ext_ref)                         │
//! │  └── update_status_if(&self, id, expected, next, payment_id)           │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Accounts and roles
//! - [`CategoryRepository`](category::CategoryRepository) - Catalog groupings
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD and FTS5 search
//! - [`OrderRepository`](order::OrderRepository) - Orders, items, purchases
//! - [`FavoriteRepository`](favorite::FavoriteRepository) - Bookmarks

pub mod category;
pub mod favorite;
pub mod order;
pub mod product;
pub mod user;
