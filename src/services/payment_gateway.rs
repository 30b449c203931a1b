//! Pasarela de pagos
//!
//! Este módulo define el trait PaymentGateway y sus dos implementaciones:
//! el cliente HTTP de Stripe y un mock determinista para desarrollo y tests.
//! El libro de pagos nunca reintenta; la política de reintentos queda del
//! lado del llamador según GatewayError::is_retryable.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;

/// Errores tipados de la pasarela
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Card declined: {0}")]
    Declined(String),

    #[error("Gateway rate limit reached")]
    RateLimited,

    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),

    #[error("Gateway authentication failed")]
    AuthFailure,

    #[error("Gateway network error: {0}")]
    Network(String),
}

impl GatewayError {
    /// Un error es reintentable cuando el cargo no llegó a evaluarse
    /// (límite de tasa o fallo de red). Un rechazo o una petición inválida
    /// no deben reintentarse tal cual.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::RateLimited | GatewayError::Network(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Declined(_) => "PAYMENT_DECLINED",
            GatewayError::RateLimited => "PAYMENT_RATE_LIMITED",
            GatewayError::InvalidRequest(_) => "PAYMENT_INVALID_REQUEST",
            GatewayError::AuthFailure => "PAYMENT_AUTH_FAILED",
            GatewayError::Network(_) => "PAYMENT_NETWORK_ERROR",
        }
    }
}

/// Cargo a ejecutar contra la pasarela
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub amount: Decimal,
    pub currency: String,
    pub payment_method_id: String,
    pub booking_id: String,
    pub customer_email: String,
}

/// Resultado de un cargo aceptado
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    pub transaction_id: String,
    pub raw_response: serde_json::Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct StripeIntent {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: Option<String>,
}

/// Cliente de la API de Stripe (payment intents con confirmación inmediata)
pub struct StripeGateway {
    client: Client,
    secret_key: String,
    api_base: String,
}

impl StripeGateway {
    pub fn new(secret_key: String, api_base: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            secret_key,
            api_base,
        })
    }

    /// Stripe autentica con Basic auth: la secret key como usuario sin password
    fn auth_header(&self) -> String {
        format!("Basic {}", BASE64.encode(format!("{}:", self.secret_key)))
    }

    /// Convertir el monto a unidades menores (centavos/paisa)
    fn minor_units(amount: Decimal) -> Result<i64, GatewayError> {
        (amount * Decimal::from(100))
            .round()
            .to_i64()
            .ok_or_else(|| GatewayError::InvalidRequest("amount out of range".to_string()))
    }

    fn map_error(status: reqwest::StatusCode, body: serde_json::Value) -> GatewayError {
        let detail = match serde_json::from_value::<StripeErrorBody>(body) {
            Ok(parsed) => parsed.error,
            Err(_) => {
                return GatewayError::Network(format!(
                    "unexpected gateway response (HTTP {})",
                    status.as_u16()
                ))
            }
        };

        let message = detail
            .message
            .unwrap_or_else(|| "payment could not be processed".to_string());

        match detail.error_type.as_str() {
            "card_error" => GatewayError::Declined(message),
            "rate_limit_error" => GatewayError::RateLimited,
            "invalid_request_error" => GatewayError::InvalidRequest(message),
            "authentication_error" => GatewayError::AuthFailure,
            _ => GatewayError::Network(message),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, GatewayError> {
        let amount = Self::minor_units(request.amount)?;
        let currency = request.currency.to_lowercase();

        let params = [
            ("amount", amount.to_string()),
            ("currency", currency),
            ("payment_method", request.payment_method_id.clone()),
            ("confirm", "true".to_string()),
            ("metadata[booking_id]", request.booking_id.clone()),
            ("metadata[customer_email]", request.customer_email.clone()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .header("Authorization", self.auth_header())
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(Self::map_error(status, body));
        }

        let intent: StripeIntent = serde_json::from_value(body.clone())
            .map_err(|e| GatewayError::Network(format!("malformed gateway response: {}", e)))?;

        if intent.status != "succeeded" {
            warn!(
                "Pago no completado para reserva {}: intent {} en estado {}",
                request.booking_id, intent.id, intent.status
            );
            return Err(GatewayError::Declined(format!(
                "payment intent ended in status '{}'",
                intent.status
            )));
        }

        Ok(ChargeOutcome {
            transaction_id: intent.id,
            raw_response: body,
        })
    }
}

/// Mock determinista de la pasarela
///
/// El resultado depende únicamente del payment_method_id recibido, para que
/// los tests y el entorno de desarrollo sean reproducibles:
/// - "tok_declined"      -> tarjeta rechazada
/// - "tok_rate_limited"  -> límite de tasa
/// - "tok_invalid"       -> petición inválida
/// - "tok_network"       -> fallo de red
/// - cualquier otro      -> cargo aceptado
pub struct MockGateway;

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, GatewayError> {
        match request.payment_method_id.as_str() {
            "tok_declined" => Err(GatewayError::Declined("Your card was declined".to_string())),
            "tok_rate_limited" => Err(GatewayError::RateLimited),
            "tok_invalid" => Err(GatewayError::InvalidRequest(
                "unknown payment method".to_string(),
            )),
            "tok_network" => Err(GatewayError::Network("connection reset".to_string())),
            _ => {
                let entropy = Uuid::new_v4().simple().to_string();
                let transaction_id = format!("pi_mock_{}", &entropy[..24]);
                let raw_response = json!({
                    "id": transaction_id,
                    "status": "succeeded",
                    "amount": request.amount.to_string(),
                    "currency": request.currency,
                    "metadata": { "booking_id": request.booking_id },
                    "mock": true,
                });

                Ok(ChargeOutcome {
                    transaction_id,
                    raw_response,
                })
            }
        }
    }
}

/// Construir la pasarela configurada por entorno
pub fn gateway_from_config(config: &EnvironmentConfig) -> anyhow::Result<Arc<dyn PaymentGateway>> {
    match config.payment_gateway_provider.as_str() {
        "stripe" => {
            let secret_key = config
                .stripe_secret_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("STRIPE_SECRET_KEY must be set for the stripe gateway"))?;
            info!("💳 Pasarela de pagos: stripe");
            Ok(Arc::new(StripeGateway::new(
                secret_key,
                config.stripe_api_base.clone(),
            )?))
        }
        "mock" => {
            info!("💳 Pasarela de pagos: mock (determinista)");
            Ok(Arc::new(MockGateway))
        }
        other => Err(anyhow::anyhow!("unknown payment gateway provider: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge_request(token: &str) -> ChargeRequest {
        ChargeRequest {
            amount: Decimal::from(20_000),
            currency: "PKR".to_string(),
            payment_method_id: token.to_string(),
            booking_id: "BK20240601120000ABC123".to_string(),
            customer_email: "ayesha@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_gateway_succeeds_by_default() {
        let outcome = MockGateway.charge(&charge_request("pm_card_visa")).await.unwrap();

        assert!(outcome.transaction_id.starts_with("pi_mock_"));
        assert_eq!(outcome.raw_response["status"], "succeeded");
    }

    #[tokio::test]
    async fn test_mock_gateway_declines_magic_token() {
        let err = MockGateway.charge(&charge_request("tok_declined")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Declined(_)));
    }

    #[tokio::test]
    async fn test_mock_gateway_is_deterministic() {
        for _ in 0..3 {
            let err = MockGateway
                .charge(&charge_request("tok_rate_limited"))
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::RateLimited));
        }
    }

    #[test]
    fn test_retryability_by_kind() {
        assert!(GatewayError::RateLimited.is_retryable());
        assert!(GatewayError::Network("timeout".to_string()).is_retryable());
        assert!(!GatewayError::Declined("declined".to_string()).is_retryable());
        assert!(!GatewayError::InvalidRequest("bad".to_string()).is_retryable());
        assert!(!GatewayError::AuthFailure.is_retryable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(GatewayError::RateLimited.code(), "PAYMENT_RATE_LIMITED");
        assert_eq!(
            GatewayError::Declined("x".to_string()).code(),
            "PAYMENT_DECLINED"
        );
    }

    #[test]
    fn test_minor_units_conversion() {
        assert_eq!(
            StripeGateway::minor_units("49.99".parse().unwrap()).unwrap(),
            4999
        );
        assert_eq!(
            StripeGateway::minor_units(Decimal::from(20_000)).unwrap(),
            2_000_000
        );
    }

    #[test]
    fn test_stripe_error_mapping() {
        let body = json!({ "error": { "type": "card_error", "message": "Your card was declined." } });
        let err = StripeGateway::map_error(reqwest::StatusCode::PAYMENT_REQUIRED, body);
        assert!(matches!(err, GatewayError::Declined(_)));

        let body = json!({ "error": { "type": "rate_limit_error" } });
        let err = StripeGateway::map_error(reqwest::StatusCode::TOO_MANY_REQUESTS, body);
        assert!(matches!(err, GatewayError::RateLimited));

        let body = json!({ "error": { "type": "authentication_error" } });
        let err = StripeGateway::map_error(reqwest::StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, GatewayError::AuthFailure));

        let body = json!({ "unexpected": true });
        let err = StripeGateway::map_error(reqwest::StatusCode::BAD_GATEWAY, body);
        assert!(matches!(err, GatewayError::Network(_)));
    }
}
