//! # Processor Client
//!
//! The [`PaymentGateway`] trait is the seam between the storefront and the
//! processor. [`ProcessorClient`] is the REST implementation; tests in the
//! API crate swap in a fake.
//!
//! ## Endpoints
//! ```text
//! POST {api_base_url}/checkout/preferences   Authorization: Bearer <token>
//!                                            X-Idempotency-Key: <external_reference>
//! GET  {api_base_url}/v1/payments/{id}       Authorization: Bearer <token>
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{PaymentError, PaymentResult};
use crate::types::{Payment, Preference, PreferenceRequest};

/// Header the processor uses to deduplicate retried creations.
pub const IDEMPOTENCY_HEADER: &str = "X-Idempotency-Key";

/// Public API of the processor when no override is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://api.mercadopago.com";

/// Operations the storefront needs from a payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a hosted-checkout preference.
    ///
    /// `idempotency_key` makes a retried request return the same preference.
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
        idempotency_key: &str,
    ) -> PaymentResult<Preference>;

    /// Fetches the processor's current view of a payment.
    async fn get_payment(&self, payment_id: &str) -> PaymentResult<Payment>;
}

/// Settings for [`ProcessorClient`].
#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    pub api_base_url: String,
    pub access_token: String,
    pub timeout: Duration,
}

impl ProcessorSettings {
    pub fn new(access_token: impl Into<String>) -> Self {
        ProcessorSettings {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            access_token: access_token.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// REST client for the processor API.
#[derive(Debug, Clone)]
pub struct ProcessorClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ProcessorClient {
    /// Builds a client with the bearer token baked into default headers.
    ///
    /// ## Errors
    /// `InvalidConfig` when the base URL doesn't parse or the token can't
    /// be sent as a header.
    pub fn new(settings: ProcessorSettings) -> PaymentResult<Self> {
        let base_url = parse_base_url(&settings.api_base_url)?;

        if settings.access_token.trim().is_empty() {
            return Err(PaymentError::InvalidConfig(
                "access token is empty".to_string(),
            ));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", settings.access_token.trim()))
            .map_err(|e| PaymentError::InvalidConfig(format!("invalid access token: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        let _ = headers.insert(AUTHORIZATION, auth);
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()?;

        info!(base_url = %base_url, "Payment processor client ready");

        Ok(ProcessorClient { client, base_url })
    }

    fn endpoint(&self, path: &str) -> PaymentResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| PaymentError::InvalidConfig(format!("bad endpoint {path}: {e}")))
    }

    /// Turns a response into `T`, mapping non-2xx to `PaymentError::Api`.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> PaymentResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Payment processor error response");
            return Err(PaymentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| PaymentError::Decode(e.to_string()))
    }
}

/// Normalizes the base URL so `join` keeps any path prefix.
fn parse_base_url(raw: &str) -> PaymentResult<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url = Url::parse(&raw)
        .map_err(|e| PaymentError::InvalidConfig(format!("invalid api_base_url: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(PaymentError::InvalidConfig(format!(
            "api_base_url must be http(s), got {}",
            url.scheme()
        )));
    }
    Ok(url)
}

#[async_trait]
impl PaymentGateway for ProcessorClient {
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
        idempotency_key: &str,
    ) -> PaymentResult<Preference> {
        let url = self.endpoint("checkout/preferences")?;

        debug!(
            external_reference = %request.external_reference,
            items = request.items.len(),
            "Creating payment preference"
        );

        let response = self
            .client
            .post(url)
            .header(IDEMPOTENCY_HEADER, idempotency_key)
            .json(request)
            .send()
            .await?;

        let preference: Preference = Self::decode(response).await?;

        info!(
            preference_id = %preference.id,
            external_reference = %request.external_reference,
            "Payment preference created"
        );
        Ok(preference)
    }

    async fn get_payment(&self, payment_id: &str) -> PaymentResult<Payment> {
        if payment_id.is_empty() || !payment_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(PaymentError::InvalidConfig(format!(
                "refusing to fetch malformed payment id {payment_id:?}"
            )));
        }

        let url = self.endpoint(&format!("v1/payments/{payment_id}"))?;
        debug!(payment_id = %payment_id, "Fetching payment");

        let response = self.client.get(url).send().await?;
        let payment: Payment = Self::decode(response).await?;

        debug!(payment_id = %payment.id, status = %payment.status, "Fetched payment");
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BackUrls, PreferenceItem, PreferencePayer};
    use lumen_core::{Money, PaymentStatus};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ProcessorClient {
        ProcessorClient::new(ProcessorSettings::new("TEST-token").api_base_url(server.uri())).unwrap()
    }

    fn sample_request() -> PreferenceRequest {
        PreferenceRequest {
            items: vec![PreferenceItem::new("p1", "Lake at dawn", 1, Money::from_cents(1500), "ARS")],
            payer: PreferencePayer {
                email: "ana@example.com".to_string(),
                name: None,
            },
            external_reference: "ref-123".to_string(),
            back_urls: BackUrls {
                success: "https://shop.example.com/checkout/success".to_string(),
                failure: "https://shop.example.com/checkout/failure".to_string(),
                pending: "https://shop.example.com/checkout/pending".to_string(),
            },
            auto_return: Some("approved".to_string()),
            notification_url: Some("https://api.example.com/api/payments/webhook".to_string()),
            statement_descriptor: None,
        }
    }

    #[tokio::test]
    async fn test_create_preference_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/checkout/preferences"))
            .and(header("authorization", "Bearer TEST-token"))
            .and(header("x-idempotency-key", "ref-123"))
            .and(body_partial_json(json!({
                "external_reference": "ref-123",
                "items": [{ "id": "p1", "unit_price": 15.0, "quantity": 1 }]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "pref-1",
                "init_point": "https://pay.example.com/checkout?pref_id=pref-1",
                "sandbox_init_point": "https://sandbox.pay.example.com/checkout?pref_id=pref-1",
                "collector_id": 42
            })))
            .expect(1)
            .mount(&server)
            .await;

        let preference = client_for(&server)
            .create_preference(&sample_request(), "ref-123")
            .await
            .unwrap();

        assert_eq!(preference.id, "pref-1");
        assert!(preference.init_point.contains("pref-1"));
        assert!(preference.sandbox_init_point.is_some());
    }

    #[tokio::test]
    async fn test_create_preference_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/checkout/preferences"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid items"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_preference(&sample_request(), "ref-123")
            .await
            .unwrap_err();

        match err {
            PaymentError::Api { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "invalid items");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_payment_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/payments/555"))
            .and(header("authorization", "Bearer TEST-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 555,
                "status": "approved",
                "status_detail": "accredited",
                "external_reference": "ref-123",
                "transaction_amount": 15.0,
                "currency_id": "ARS"
            })))
            .mount(&server)
            .await;

        let payment = client_for(&server).get_payment("555").await.unwrap();
        assert_eq!(payment.id, "555");
        assert_eq!(payment.status, PaymentStatus::Approved);
        assert_eq!(payment.reference(), Some("ref-123"));
    }

    #[tokio::test]
    async fn test_get_payment_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/payments/404404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "not found" })))
            .mount(&server)
            .await;

        let err = client_for(&server).get_payment("404404").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_payment_undecodable_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/payments/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_payment("1").await.unwrap_err();
        assert!(matches!(err, PaymentError::Decode(_)));
    }

    #[tokio::test]
    async fn test_get_payment_rejects_path_injection() {
        let server = MockServer::start().await;
        let err = client_for(&server).get_payment("../users/me").await.unwrap_err();
        assert!(matches!(err, PaymentError::InvalidConfig(_)));
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let url = parse_base_url("http://localhost:9000/mock").unwrap();
        assert_eq!(
            url.join("v1/payments/1").unwrap().as_str(),
            "http://localhost:9000/mock/v1/payments/1"
        );
        assert!(parse_base_url("ftp://example.com").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_empty_access_token_is_rejected() {
        let err = ProcessorClient::new(ProcessorSettings::new("  ")).unwrap_err();
        assert!(matches!(err, PaymentError::InvalidConfig(_)));
    }
}
