//! # Payment Error Types

use thiserror::Error;

/// Failures when talking to the payment processor.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Transport failure: DNS, TLS, timeout, connection reset.
    #[error("HTTP error talking to payment processor: {0}")]
    Http(#[from] reqwest::Error),

    /// The processor answered with a non-success status.
    #[error("Payment processor returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The processor answered 2xx with a body we couldn't understand.
    #[error("Unexpected payment processor response: {0}")]
    Decode(String),

    /// Client misconfiguration (bad base URL, unusable access token).
    #[error("Invalid payment configuration: {0}")]
    InvalidConfig(String),
}

impl PaymentError {
    /// Whether the processor reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PaymentError::Api { status: 404, .. })
    }
}

/// Result type for processor operations.
pub type PaymentResult<T> = Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message() {
        let err = PaymentError::Api {
            status: 401,
            body: "invalid access token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Payment processor returned 401: invalid access token"
        );
        assert!(!err.is_not_found());

        let err = PaymentError::Api {
            status: 404,
            body: String::new(),
        };
        assert!(err.is_not_found());
    }
}
