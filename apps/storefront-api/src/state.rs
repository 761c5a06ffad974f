//! Shared application state.

use std::sync::Arc;

use lumen_db::Database;
use lumen_payments::PaymentGateway;

use crate::auth::JwtManager;
use crate::config::StorefrontConfig;

/// Everything a handler needs, shared read-only behind an `Arc`.
pub struct AppState {
    pub db: Database,
    pub gateway: Arc<dyn PaymentGateway>,
    pub jwt: JwtManager,
    pub config: StorefrontConfig,
}

impl AppState {
    pub fn new(db: Database, gateway: Arc<dyn PaymentGateway>, config: StorefrontConfig) -> Self {
        let jwt = JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        );

        AppState {
            db,
            gateway,
            jwt,
            config,
        }
    }
}

pub type SharedState = Arc<AppState>;
