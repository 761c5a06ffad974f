//! Business workflows that span the database and the payment processor.
//!
//! Route handlers stay thin: they extract, call into here, and serialize.

pub mod checkout;
pub mod reconcile;
