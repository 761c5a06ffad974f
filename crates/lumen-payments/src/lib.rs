//! # lumen-payments: Payment Processor Bridge
//!
//! Talks to a hosted-checkout payment processor (Mercado Pago style API).
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout                        Processor                              │
//! │  ────────                        ─────────                              │
//! │  create_preference(items,   ───► POST /checkout/preferences             │
//! │    external_reference)      ◄─── {id, init_point}                       │
//! │                                                                         │
//! │  Buyer pays on init_point ...                                           │
//! │                                                                         │
//! │  Webhook                                                                │
//! │  parse_notification(body,   ◄─── POST /api/payments/webhook             │
//! │    query) → payment id                                                  │
//! │  get_payment(id)            ───► GET /v1/payments/{id}                  │
//! │                             ◄─── {status, external_reference, amount}   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Notifications are never trusted for the status itself; the payment is
//! always re-fetched with the merchant's credentials.

pub mod client;
pub mod error;
pub mod notification;
pub mod types;

pub use client::{PaymentGateway, ProcessorClient, ProcessorSettings, IDEMPOTENCY_HEADER};
pub use error::{PaymentError, PaymentResult};
pub use notification::{parse_notification, Notification, NotificationError};
pub use types::{BackUrls, Payment, Preference, PreferenceItem, PreferencePayer, PreferenceRequest};
