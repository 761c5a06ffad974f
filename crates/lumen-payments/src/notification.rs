//! # Webhook Notification Parsing
//!
//! The processor announces payment changes in a few shapes, sometimes
//! more than one at once:
//!
//! ```text
//! Webhook body   {"type": "payment", "action": "payment.updated", "data": {"id": "123"}}
//! Legacy body    {"topic": "payment", "resource": "https://.../payments/123"}
//! Query string   ?type=payment&data.id=123        ?topic=payment&id=123
//! ```
//!
//! The body wins over the query string. A top-level `id` in the body is the
//! notification's own id, not the payment's, so it is never used.

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::types::string_or_number;

/// Topic of payment notifications.
pub const PAYMENT_TOPIC: &str = "payment";

/// What a notification is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A payment changed; fetch it by id to learn its status.
    Payment { id: String },
    /// Anything else (merchant orders, chargebacks feed, unknown topics).
    Other { topic: Option<String> },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("payment notification carries no payment id")]
    MissingPaymentId,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    topic: Option<String>,
    action: Option<String>,
    data: Option<NotificationData>,
    resource: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationData {
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<String>,
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "string_or_number")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}

/// Parses a webhook delivery from its raw body and query parameters.
///
/// ## Returns
/// * `Ok(Notification::Payment { id })` - payment topic with an id
/// * `Ok(Notification::Other { .. })` - not about a payment
/// * `Err(MissingPaymentId)` - payment topic without a usable id
pub fn parse_notification(
    body: &[u8],
    query: &HashMap<String, String>,
) -> Result<Notification, NotificationError> {
    let body = parse_body(body);

    let topic = non_blank(body.kind)
        .or_else(|| non_blank(body.topic))
        .or_else(|| non_blank(query.get("type").cloned()))
        .or_else(|| non_blank(query.get("topic").cloned()))
        .or_else(|| {
            body.action
                .as_deref()
                .and_then(|a| a.split('.').next())
                .and_then(|t| non_blank(Some(t.to_string())))
        })
        .map(|t| t.to_ascii_lowercase());

    if topic.as_deref() != Some(PAYMENT_TOPIC) {
        return Ok(Notification::Other { topic });
    }

    let id = body
        .data
        .and_then(|d| non_blank(d.id))
        .or_else(|| body.resource.as_deref().and_then(resource_id))
        .or_else(|| non_blank(query.get("data.id").cloned()))
        .or_else(|| non_blank(query.get("id").cloned()))
        .ok_or(NotificationError::MissingPaymentId)?;

    Ok(Notification::Payment { id })
}

fn parse_body(body: &[u8]) -> NotificationBody {
    if body.iter().all(u8::is_ascii_whitespace) {
        return NotificationBody::default();
    }

    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!(error = %e, "Notification body is not JSON, falling back to query");
        NotificationBody::default()
    })
}

/// Last path segment of a legacy `resource`, when it is an id.
fn resource_id(resource: &str) -> Option<String> {
    let last = resource.trim().trim_end_matches('/').rsplit('/').next()?;
    if !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()) {
        Some(last.to_string())
    } else {
        None
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
