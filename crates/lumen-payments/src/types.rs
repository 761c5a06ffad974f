//! # Processor Wire Types
//!
//! Request and response bodies of the processor's REST API.
//!
//! Amounts are decimal numbers on the wire (`15.5` = 15.50). This is the
//! only place the storefront leaves integer cents.

use serde::{Deserialize, Deserializer, Serialize};

use lumen_core::{Money, PaymentStatus};

// =============================================================================
// Preference (hosted checkout session)
// =============================================================================

/// Body of `POST /checkout/preferences`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    pub payer: PreferencePayer,
    /// Order lookup key echoed back on every payment.
    pub external_reference: String,
    pub back_urls: BackUrls,
    /// `"approved"` sends the buyer straight back after a successful payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_return: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement_descriptor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceItem {
    pub id: String,
    pub title: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub currency_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
}

impl PreferenceItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        quantity: i64,
        unit_price: Money,
        currency: impl Into<String>,
    ) -> Self {
        PreferenceItem {
            id: id.into(),
            title: title.into(),
            quantity,
            unit_price: unit_price.to_major_units(),
            currency_id: currency.into(),
            picture_url: None,
        }
    }

    pub fn with_picture(mut self, url: impl Into<String>) -> Self {
        self.picture_url = Some(url.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferencePayer {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Where the hosted page sends the buyer when it's done.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

/// A created preference.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Preference {
    pub id: String,
    /// Hosted checkout URL for live credentials.
    pub init_point: String,
    /// Hosted checkout URL for test credentials.
    #[serde(default)]
    pub sandbox_init_point: Option<String>,
}

// =============================================================================
// Payment
// =============================================================================

/// A payment as returned by `GET /v1/payments/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Payment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub transaction_amount: Option<f64>,
    #[serde(default)]
    pub currency_id: Option<String>,
}

impl Payment {
    /// `transaction_amount` in cents, when reported.
    pub fn amount(&self) -> Option<Money> {
        self.transaction_amount.map(Money::from_major_units)
    }

    /// External reference with blank values treated as absent.
    pub fn reference(&self) -> Option<&str> {
        self.external_reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

/// Accepts `"123"` or `123` and yields `"123"`.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Int(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preference_request_wire_format() {
        let request = PreferenceRequest {
            items: vec![PreferenceItem::new("p1", "Lake at dawn", 2, Money::from_cents(1550), "ARS")],
            payer: PreferencePayer {
                email: "ana@example.com".to_string(),
                name: None,
            },
            external_reference: "ref-1".to_string(),
            back_urls: BackUrls {
                success: "https://shop.example.com/ok".to_string(),
                failure: "https://shop.example.com/fail".to_string(),
                pending: "https://shop.example.com/wait".to_string(),
            },
            auto_return: Some("approved".to_string()),
            notification_url: None,
            statement_descriptor: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["items"][0]["unit_price"], json!(15.5));
        assert_eq!(value["items"][0]["currency_id"], json!("ARS"));
        assert_eq!(value["external_reference"], json!("ref-1"));
        assert_eq!(value["auto_return"], json!("approved"));
        assert!(value.get("notification_url").is_none());
        assert!(value["items"][0].get("picture_url").is_none());
    }

    #[test]
    fn test_payment_with_numeric_id() {
        let payment: Payment = serde_json::from_value(json!({
            "id": 1234567890u64,
            "status": "approved",
            "status_detail": "accredited",
            "external_reference": "ref-1",
            "transaction_amount": 30.1,
            "currency_id": "ARS",
            "payer": { "email": "ana@example.com" }
        }))
        .unwrap();

        assert_eq!(payment.id, "1234567890");
        assert_eq!(payment.status, PaymentStatus::Approved);
        assert_eq!(payment.amount(), Some(Money::from_cents(3010)));
        assert_eq!(payment.reference(), Some("ref-1"));
    }

    #[test]
    fn test_payment_with_missing_optionals() {
        let payment: Payment = serde_json::from_value(json!({
            "id": "99",
            "status": "brand_new_status",
            "external_reference": "  "
        }))
        .unwrap();

        assert_eq!(payment.status, PaymentStatus::Unknown);
        assert_eq!(payment.reference(), None);
        assert_eq!(payment.amount(), None);
    }
}
