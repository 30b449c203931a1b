//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::services::payment_gateway::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            pool,
            config,
            gateway,
        }
    }
}
