//! Storefront API configuration module.
//!
//! Configuration is layered with the `config` crate:
//!
//! ```text
//! built-in defaults  →  storefront.toml (optional)  →  LUMEN_* environment
//! ```
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `LUMEN_PAYMENTS__ACCESS_TOKEN` sets `payments.access_token`.

use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::warn;

use lumen_core::validation::{validate_currency, validate_email, validate_url};
use lumen_core::DEFAULT_CURRENCY;
use lumen_payments::client::DEFAULT_API_BASE_URL;
use lumen_payments::{BackUrls, ProcessorSettings};

/// Optional config file, looked up in the working directory.
pub const CONFIG_FILE: &str = "storefront";

/// Path of the processor webhook, appended to `public_base_url`.
pub const WEBHOOK_PATH: &str = "/api/payments/webhook";

const DEV_JWT_SECRET: &str = "lumen-dev-secret-change-in-production";

/// Storefront API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Upper bound of the connection pool
    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// JWT refresh token lifetime in seconds
    pub jwt_refresh_lifetime_secs: i64,

    /// Signing up with this email grants the admin role
    pub bootstrap_admin_email: Option<String>,

    /// Allowed browser origins; empty means same-origin only
    pub cors_origins: Vec<String>,

    /// Publicly reachable URL of this API, used for the webhook URL
    pub public_base_url: Option<String>,

    pub payments: PaymentsConfig,
}

/// Payment processor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentsConfig {
    pub api_base_url: String,

    /// Merchant access token (bearer)
    pub access_token: String,

    /// Currency of every preference
    pub currency: String,

    /// Where the hosted page sends the buyer afterwards
    pub success_url: String,
    pub failure_url: String,
    pub pending_url: String,

    /// Request timeout for processor calls
    pub timeout_secs: u64,

    /// Hand out `sandbox_init_point` instead of `init_point`
    pub sandbox: bool,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        StorefrontConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path: "./lumen.db".to_string(),
            db_max_connections: 10,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_access_lifetime_secs: 3600,     // 1 hour
            jwt_refresh_lifetime_secs: 604_800, // 7 days
            bootstrap_admin_email: None,
            cors_origins: Vec::new(),
            public_base_url: None,
            payments: PaymentsConfig::default(),
        }
    }
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        PaymentsConfig {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            access_token: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            success_url: "http://localhost:3000/checkout/success".to_string(),
            failure_url: "http://localhost:3000/checkout/failure".to_string(),
            pending_url: "http://localhost:3000/checkout/pending".to_string(),
            timeout_secs: 10,
            sandbox: false,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from defaults, `storefront.toml` and `LUMEN_*`.
    pub fn load() -> Result<Self, ConfigError> {
        let config: StorefrontConfig = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix("LUMEN")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()
    }

    /// Checks values that serde can't, normalizing where needed.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port".to_string()));
        }

        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("db_max_connections".to_string()));
        }

        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.jwt_secret == DEV_JWT_SECRET {
            warn!("Using the development JWT secret; set LUMEN_JWT_SECRET in production");
        }

        if self.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_access_lifetime_secs".to_string()));
        }
        if self.jwt_refresh_lifetime_secs <= self.jwt_access_lifetime_secs {
            return Err(ConfigError::InvalidValue("jwt_refresh_lifetime_secs".to_string()));
        }

        self.bootstrap_admin_email = match self.bootstrap_admin_email.take() {
            Some(email) if !email.trim().is_empty() => Some(
                validate_email(&email)
                    .map_err(|_| ConfigError::InvalidValue("bootstrap_admin_email".to_string()))?,
            ),
            _ => None,
        };

        if let Some(base) = &self.public_base_url {
            validate_url("public_base_url", base)
                .map_err(|_| ConfigError::InvalidValue("public_base_url".to_string()))?;
        }

        let payments = &self.payments;
        if payments.access_token.trim().is_empty() {
            return Err(ConfigError::MissingRequired("payments.access_token".to_string()));
        }
        validate_currency(&payments.currency)
            .map_err(|_| ConfigError::InvalidValue("payments.currency".to_string()))?;
        for (key, value) in [
            ("payments.api_base_url", &payments.api_base_url),
            ("payments.success_url", &payments.success_url),
            ("payments.failure_url", &payments.failure_url),
            ("payments.pending_url", &payments.pending_url),
        ] {
            validate_url(key, value).map_err(|_| ConfigError::InvalidValue(key.to_string()))?;
        }
        if payments.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("payments.timeout_secs".to_string()));
        }

        Ok(self)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Webhook URL handed to the processor, when a public URL is known.
    pub fn notification_url(&self) -> Option<String> {
        self.public_base_url
            .as_deref()
            .map(|base| format!("{}{}", base.trim_end_matches('/'), WEBHOOK_PATH))
    }

    pub fn back_urls(&self) -> BackUrls {
        BackUrls {
            success: self.payments.success_url.clone(),
            failure: self.payments.failure_url.clone(),
            pending: self.payments.pending_url.clone(),
        }
    }

    pub fn processor_settings(&self) -> ProcessorSettings {
        ProcessorSettings::new(self.payments.access_token.clone())
            .api_base_url(self.payments.api_base_url.clone())
            .timeout(Duration::from_secs(self.payments.timeout_secs))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
