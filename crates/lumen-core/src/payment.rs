//! # Payment Status
//!
//! Statuses reported by the payment processor and how each one maps onto
//! an [`OrderStatus`].
//!
//! ## Mapping
//! ```text
//! ┌──────────────────────────────────────┬──────────────────────────────┐
//! │ Processor status                     │ Order status                 │
//! ├──────────────────────────────────────┼──────────────────────────────┤
//! │ approved                             │ paid                         │
//! │ pending, in_process, authorized,     │ pending                      │
//! │ in_mediation                         │                              │
//! │ rejected                             │ failed                       │
//! │ cancelled                            │ cancelled                    │
//! │ refunded, charged_back               │ refunded                     │
//! │ anything else                        │ (no update)                  │
//! └──────────────────────────────────────┴──────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::OrderStatus;

/// Payment status as reported by the processor's payments API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Authorized,
    InProcess,
    InMediation,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    /// Any status this build doesn't know about.
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// The order status this payment status implies, if any.
    pub fn order_status(&self) -> Option<OrderStatus> {
        match self {
            PaymentStatus::Approved => Some(OrderStatus::Paid),
            PaymentStatus::Pending
            | PaymentStatus::InProcess
            | PaymentStatus::Authorized
            | PaymentStatus::InMediation => Some(OrderStatus::Pending),
            PaymentStatus::Rejected => Some(OrderStatus::Failed),
            PaymentStatus::Cancelled => Some(OrderStatus::Cancelled),
            PaymentStatus::Refunded | PaymentStatus::ChargedBack => Some(OrderStatus::Refunded),
            PaymentStatus::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Authorized => "authorized",
            PaymentStatus::InProcess => "in_process",
            PaymentStatus::InMediation => "in_mediation",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::ChargedBack => "charged_back",
            PaymentStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
