//! Servicio de pagos
//!
//! Orquesta el libro de pagos: registra intentos de pago, invoca la pasarela
//! para cargos con tarjeta y recalcula el estado de pago agregado de la
//! reserva. El recálculo solo avanza (pending -> partial -> paid); una suma en
//! cero nunca retrocede el estado actual.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::booking::{
    Booking, BookingPayment, PaymentMethod, PaymentStatus, PaymentType,
};
use crate::repositories::booking_repository::BookingRepository;
use crate::services::payment_gateway::{ChargeRequest, PaymentGateway};
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::validation::validate_payment_amount;

/// Datos de un pago a registrar en el libro
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    pub amount: Decimal,
    pub currency: String,
    pub transaction_id: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
    pub is_successful: bool,
}

/// Resultado de un cargo procesado por la pasarela
#[derive(Debug, Serialize)]
pub struct PaymentResult {
    pub payment: BookingPayment,
    pub payment_status: PaymentStatus,
    pub transaction_id: String,
}

/// Estado de pago agregado a partir de la suma de pagos exitosos. Una suma
/// en cero conserva el estado vigente; a partir de ahí el estado solo avanza
/// hacia partial o paid.
fn aggregate_status(
    total_paid: Decimal,
    total_amount: Decimal,
    current: PaymentStatus,
) -> PaymentStatus {
    if total_paid == Decimal::ZERO {
        current
    } else if total_paid >= total_amount {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    }
}

pub struct PaymentService {
    bookings: BookingRepository,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(pool: PgPool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            bookings: BookingRepository::new(pool),
            gateway,
        }
    }

    /// Registrar un pago en el libro (append-only) y, si fue exitoso,
    /// recalcular el estado de pago de la reserva.
    pub async fn record_payment(
        &self,
        booking: &Booking,
        new_payment: NewPayment,
    ) -> AppResult<(BookingPayment, PaymentStatus)> {
        if validate_payment_amount(new_payment.amount).is_err() {
            return Err(validation_error(
                "amount",
                "Payment amount must be positive and within the accepted maximum",
            ));
        }

        let now = Utc::now();
        let payment = BookingPayment {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            payment_method: new_payment.payment_method,
            payment_type: new_payment.payment_type,
            amount: new_payment.amount,
            currency: new_payment.currency,
            transaction_id: new_payment.transaction_id,
            gateway_response: new_payment.gateway_response,
            is_successful: new_payment.is_successful,
            processed_at: new_payment.is_successful.then_some(now),
            created_at: now,
        };

        let inserted = self.bookings.insert_payment(&payment).await?;

        let status = if inserted.is_successful {
            self.recompute_payment_status(booking).await?
        } else {
            warn!(
                "Pago fallido registrado para reserva {}: {} {}",
                booking.booking_id, inserted.amount, inserted.currency
            );
            booking.payment_status
        };

        Ok((inserted, status))
    }

    /// Recalcular el estado de pago sumando los pagos exitosos contra el
    /// total de la reserva. Con suma cero el estado actual se conserva.
    pub async fn recompute_payment_status(&self, booking: &Booking) -> AppResult<PaymentStatus> {
        let total_paid = self.bookings.successful_payment_total(booking.id).await?;
        let status = aggregate_status(total_paid, booking.total_amount, booking.payment_status);

        if status != booking.payment_status {
            self.bookings
                .set_payment_status(booking.id, status, Utc::now())
                .await?;
        }

        Ok(status)
    }

    /// Cargar un pago a través de la pasarela externa.
    ///
    /// El cargo ocurre fuera de cualquier transacción de base de datos; el
    /// libro y el estado de pago solo se tocan después de que la pasarela
    /// confirma el resultado. Un fallo de la pasarela sube como error tipado
    /// sin dejar la reserva a medio actualizar.
    pub async fn process_gateway_payment(
        &self,
        booking: &Booking,
        payment_method_id: &str,
        amount: Decimal,
        currency: &str,
    ) -> AppResult<PaymentResult> {
        if validate_payment_amount(amount).is_err() {
            return Err(validation_error(
                "amount",
                "Payment amount must be positive and within the accepted maximum",
            ));
        }

        let request = ChargeRequest {
            amount,
            currency: currency.to_string(),
            payment_method_id: payment_method_id.to_string(),
            booking_id: booking.booking_id.clone(),
            customer_email: booking.customer_email.clone(),
        };

        let outcome = self.gateway.charge(&request).await?;

        info!(
            "Cargo aceptado para reserva {}: {} {} (tx {})",
            booking.booking_id, amount, currency, outcome.transaction_id
        );

        let (payment, payment_status) = self
            .record_payment(
                booking,
                NewPayment {
                    payment_method: PaymentMethod::Stripe,
                    payment_type: PaymentType::FullPayment,
                    amount,
                    currency: currency.to_string(),
                    transaction_id: Some(outcome.transaction_id.clone()),
                    gateway_response: Some(outcome.raw_response),
                    is_successful: true,
                },
            )
            .await?;

        Ok(PaymentResult {
            payment,
            payment_status,
            transaction_id: outcome.transaction_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_status_paid_when_total_covered() {
        let status = aggregate_status(
            Decimal::from(25_000),
            Decimal::from(25_000),
            PaymentStatus::Partial,
        );
        assert_eq!(status, PaymentStatus::Paid);

        let overpaid = aggregate_status(
            Decimal::from(30_000),
            Decimal::from(25_000),
            PaymentStatus::Pending,
        );
        assert_eq!(overpaid, PaymentStatus::Paid);
    }

    #[test]
    fn test_aggregate_status_partial_below_total() {
        let status = aggregate_status(
            Decimal::from(10_000),
            Decimal::from(25_000),
            PaymentStatus::Pending,
        );
        assert_eq!(status, PaymentStatus::Partial);
    }

    #[test]
    fn test_aggregate_status_zero_sum_keeps_current() {
        // Sin pagos exitosos el estado no retrocede: una reserva pending
        // sigue pending y una failed sigue failed.
        assert_eq!(
            aggregate_status(Decimal::ZERO, Decimal::from(25_000), PaymentStatus::Pending),
            PaymentStatus::Pending
        );
        assert_eq!(
            aggregate_status(Decimal::ZERO, Decimal::from(25_000), PaymentStatus::Failed),
            PaymentStatus::Failed
        );
    }
}
