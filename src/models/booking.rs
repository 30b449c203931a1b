//! Modelo de Booking
//!
//! Este módulo contiene la entidad Booking con su máquina de estados,
//! el pipeline de pre-guardado (identificador + montos derivados) y las
//! entidades asociadas de cancelación y pagos.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::services::pricing_service::PricingService;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::ids::generate_booking_id;
use crate::utils::validation::MAX_RENTAL_DAYS;

/// Motivo por defecto cuando el cliente no indica uno al cancelar
pub const DEFAULT_CANCELLATION_REASON: &str = "Cancelled by customer";

/// Moneda por defecto de los pagos
pub const DEFAULT_CURRENCY: &str = "PKR";

/// Estado de la reserva - mapea al ENUM booking_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Ongoing,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Ongoing => "ongoing",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }
}

/// Estado de pago agregado de la reserva - mapea al ENUM payment_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Partial,
    Refunded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
        }
    }
}

/// Método de pago - mapea al ENUM payment_method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    BankTransfer,
    Cash,
    Stripe,
}

/// Tipo de pago - mapea al ENUM payment_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Deposit,
    FullPayment,
    PartialPayment,
    Refund,
}

/// Hora de recogida por defecto (09:00)
pub fn default_start_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
}

/// Hora de devolución por defecto (18:00)
pub fn default_end_time() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default()
}

/// Booking principal - mapea exactamente a la tabla bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub booking_id: String,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub daily_rate: Decimal,
    pub total_days: i32,
    pub subtotal: Decimal,
    pub deposit_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub driver_license_number: Option<String>,
    pub pickup_location: String,
    pub return_location: String,
    pub pickup_notes: Option<String>,
    pub return_notes: Option<String>,
    pub special_requests: Option<String>,
    pub terms_accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Pipeline de pre-guardado: asigna el booking_id si aún no existe y
    /// recalcula los montos derivados. Se aplica en cada guardado de contenido;
    /// el identificador nunca se regenera.
    pub fn prepare_for_save(&mut self, now: DateTime<Utc>) {
        if self.booking_id.is_empty() {
            self.booking_id = generate_booking_id(now);
        }

        let quote = PricingService::quote(
            self.daily_rate,
            self.start_date,
            self.end_date,
            self.deposit_amount,
            self.discount_amount,
        );
        self.total_days = quote.total_days;
        self.subtotal = quote.subtotal;
        self.total_amount = quote.total_amount;
    }

    /// Validación de fechas y montos antes de persistir contenido.
    ///
    /// Debe ejecutarse después de `prepare_for_save` para que los montos
    /// derivados estén al día. Las transiciones de estado no pasan por aquí.
    pub fn validate_dates(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.end_date <= self.start_date {
            let mut error = ValidationError::new("after_start");
            error.add_param("start_date".into(), &self.start_date.to_string());
            errors.add("end_date", error);
        } else {
            let duration = (self.end_date - self.start_date).num_days();
            if duration > MAX_RENTAL_DAYS {
                let mut error = ValidationError::new("max_duration");
                error.add_param("days".into(), &duration);
                error.add_param("max".into(), &MAX_RENTAL_DAYS);
                errors.add("end_date", error);
            }
        }

        if self.start_date < today {
            let mut error = ValidationError::new("past_date");
            error.add_param("value".into(), &self.start_date.to_string());
            errors.add("start_date", error);
        }

        if self.discount_amount < Decimal::ZERO {
            let error = ValidationError::new("non_negative");
            errors.add("discount_amount", error);
        } else if self.discount_amount > self.subtotal + self.deposit_amount {
            let mut error = ValidationError::new("exceeds_total");
            error.add_param("subtotal".into(), &self.subtotal.to_string());
            error.add_param("deposit".into(), &self.deposit_amount.to_string());
            errors.add("discount_amount", error);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Una reserva puede cancelarse si no está en un estado terminal y faltan
    /// más de 24 horas para la fecha de inicio.
    pub fn can_be_cancelled(&self, today: NaiveDate) -> bool {
        match self.status {
            BookingStatus::Cancelled | BookingStatus::Completed | BookingStatus::NoShow => {
                return false;
            }
            _ => {}
        }
        self.start_date > today + Duration::days(1)
    }

    /// Una reserva puede modificarse mientras esté pendiente o confirmada
    /// y todavía sea cancelable.
    pub fn can_be_modified(&self, today: NaiveDate) -> bool {
        matches!(
            self.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) && self.can_be_cancelled(today)
    }

    /// pending -> confirmed; fija confirmed_at una única vez
    pub fn confirm(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        if self.status != BookingStatus::Pending {
            return Err(AppError::illegal_transition("confirm", self.status.as_str()));
        }
        self.status = BookingStatus::Confirmed;
        self.confirmed_at = Some(now);
        Ok(())
    }

    /// confirmed -> ongoing
    pub fn start_rental(&mut self) -> AppResult<()> {
        if self.status != BookingStatus::Confirmed {
            return Err(AppError::illegal_transition(
                "start rental for",
                self.status.as_str(),
            ));
        }
        self.status = BookingStatus::Ongoing;
        Ok(())
    }

    /// ongoing -> completed
    pub fn complete_rental(&mut self) -> AppResult<()> {
        if self.status != BookingStatus::Ongoing {
            return Err(AppError::illegal_transition(
                "complete rental for",
                self.status.as_str(),
            ));
        }
        self.status = BookingStatus::Completed;
        Ok(())
    }

    /// pending/confirmed -> cancelled; fija cancelled_at una única vez
    pub fn cancel(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        match self.status {
            BookingStatus::Pending | BookingStatus::Confirmed => {
                self.status = BookingStatus::Cancelled;
                self.cancelled_at = Some(now);
                Ok(())
            }
            other => Err(AppError::illegal_transition("cancel", other.as_str())),
        }
    }

    /// confirmed -> no_show (acción del operador)
    pub fn mark_no_show(&mut self) -> AppResult<()> {
        if self.status != BookingStatus::Confirmed {
            return Err(AppError::illegal_transition(
                "mark no-show for",
                self.status.as_str(),
            ));
        }
        self.status = BookingStatus::NoShow;
        Ok(())
    }
}

/// Registro de cancelación - mapea a la tabla booking_cancellations
///
/// Inmutable una vez creado; se inserta en la misma transacción que el
/// cambio de estado de la reserva.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingCancellation {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reason: String,
    pub cancelled_by: Uuid,
    pub refund_amount: Decimal,
    pub cancellation_fee: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Pago registrado contra una reserva - mapea a la tabla booking_payments
///
/// El libro de pagos es append-only: los reintentos generan filas nuevas.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingPayment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    pub amount: Decimal,
    pub currency: String,
    pub transaction_id: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
    pub is_successful: bool,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        fixed_now().date_naive()
    }

    fn sample_booking() -> Booking {
        let now = fixed_now();
        Booking {
            id: Uuid::new_v4(),
            booking_id: String::new(),
            customer_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            start_date: today() + Duration::days(5),
            end_date: today() + Duration::days(7),
            start_time: default_start_time(),
            end_time: default_end_time(),
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            daily_rate: Decimal::from(5000),
            total_days: 0,
            subtotal: Decimal::ZERO,
            deposit_amount: Decimal::from(10_000),
            discount_amount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            customer_name: "Ayesha Khan".to_string(),
            customer_email: "ayesha@example.com".to_string(),
            customer_phone: Some("+923001234567".to_string()),
            customer_address: None,
            driver_license_number: Some("DL-4411".to_string()),
            pickup_location: "Karachi Airport".to_string(),
            return_location: "Karachi Airport".to_string(),
            pickup_notes: None,
            return_notes: None,
            special_requests: None,
            terms_accepted: true,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn test_prepare_for_save_assigns_id_and_amounts() {
        let mut booking = sample_booking();
        booking.prepare_for_save(fixed_now());

        assert_eq!(booking.booking_id.len(), 22);
        assert!(booking.booking_id.starts_with("BK"));
        assert_eq!(booking.total_days, 2);
        assert_eq!(booking.subtotal, Decimal::from(10_000));
        assert_eq!(booking.total_amount, Decimal::from(20_000));
    }

    #[test]
    fn test_prepare_for_save_keeps_existing_booking_id() {
        let mut booking = sample_booking();
        booking.prepare_for_save(fixed_now());
        let assigned = booking.booking_id.clone();

        // Cambiar fechas y volver a preparar no regenera el identificador
        booking.end_date = booking.end_date + Duration::days(3);
        booking.prepare_for_save(fixed_now());

        assert_eq!(booking.booking_id, assigned);
        assert_eq!(booking.total_days, 5);
    }

    #[test]
    fn test_validate_dates_rejects_inverted_range() {
        let mut booking = sample_booking();
        booking.end_date = booking.start_date;
        booking.prepare_for_save(fixed_now());

        let errors = booking.validate_dates(today()).unwrap_err();
        assert!(errors.field_errors().contains_key("end_date"));
    }

    #[test]
    fn test_validate_dates_rejects_past_start() {
        let mut booking = sample_booking();
        booking.start_date = today() - Duration::days(1);
        booking.end_date = today() + Duration::days(1);
        booking.prepare_for_save(fixed_now());

        let errors = booking.validate_dates(today()).unwrap_err();
        assert!(errors.field_errors().contains_key("start_date"));
    }

    #[test]
    fn test_validate_dates_rejects_excessive_duration() {
        let mut booking = sample_booking();
        booking.end_date = booking.start_date + Duration::days(MAX_RENTAL_DAYS + 1);
        booking.prepare_for_save(fixed_now());

        let errors = booking.validate_dates(today()).unwrap_err();
        assert!(errors.field_errors().contains_key("end_date"));
    }

    #[test]
    fn test_validate_dates_rejects_discount_over_total() {
        let mut booking = sample_booking();
        booking.discount_amount = Decimal::from(100_000);
        booking.prepare_for_save(fixed_now());

        let errors = booking.validate_dates(today()).unwrap_err();
        assert!(errors.field_errors().contains_key("discount_amount"));
    }

    #[test]
    fn test_validate_dates_accepts_valid_booking() {
        let mut booking = sample_booking();
        booking.prepare_for_save(fixed_now());

        assert!(booking.validate_dates(today()).is_ok());
    }

    #[test]
    fn test_confirm_from_pending() {
        let mut booking = sample_booking();
        booking.confirm(fixed_now()).unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(booking.confirmed_at.is_some());
    }

    #[test]
    fn test_start_rental_requires_confirmed() {
        let mut booking = sample_booking();
        let err = booking.start_rental().unwrap_err();

        assert!(matches!(err, AppError::IllegalTransition { .. }));
        // La transición fallida no toca el estado
        assert_eq!(booking.status, BookingStatus::Pending);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut booking = sample_booking();
        booking.confirm(fixed_now()).unwrap();
        booking.start_rental().unwrap();
        booking.complete_rental().unwrap();

        assert_eq!(booking.status, BookingStatus::Completed);
    }

    #[test]
    fn test_complete_requires_ongoing() {
        let mut booking = sample_booking();
        booking.confirm(fixed_now()).unwrap();

        assert!(booking.complete_rental().is_err());
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_cancel_sets_timestamp() {
        let mut booking = sample_booking();
        booking.confirm(fixed_now()).unwrap();
        booking.cancel(fixed_now()).unwrap();

        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert!(booking.cancelled_at.is_some());
    }

    #[test]
    fn test_cancel_rejected_after_completion() {
        let mut booking = sample_booking();
        booking.confirm(fixed_now()).unwrap();
        booking.start_rental().unwrap();
        booking.complete_rental().unwrap();

        let err = booking.cancel(fixed_now()).unwrap_err();
        assert!(matches!(err, AppError::IllegalTransition { .. }));
    }

    #[test]
    fn test_mark_no_show_only_from_confirmed() {
        let mut booking = sample_booking();
        assert!(booking.mark_no_show().is_err());

        booking.confirm(fixed_now()).unwrap();
        booking.mark_no_show().unwrap();
        assert_eq!(booking.status, BookingStatus::NoShow);
    }

    #[test]
    fn test_can_be_cancelled_cutoff() {
        let mut booking = sample_booking();

        booking.start_date = today() + Duration::days(2);
        assert!(booking.can_be_cancelled(today()));

        // Exactamente 24 horas antes ya no es cancelable
        booking.start_date = today() + Duration::days(1);
        assert!(!booking.can_be_cancelled(today()));

        booking.start_date = today() - Duration::days(1);
        assert!(!booking.can_be_cancelled(today()));
    }

    #[test]
    fn test_can_be_cancelled_terminal_states() {
        let mut booking = sample_booking();
        booking.status = BookingStatus::Completed;
        assert!(!booking.can_be_cancelled(today()));

        booking.status = BookingStatus::Cancelled;
        assert!(!booking.can_be_cancelled(today()));

        booking.status = BookingStatus::NoShow;
        assert!(!booking.can_be_cancelled(today()));
    }

    #[test]
    fn test_can_be_modified() {
        let mut booking = sample_booking();
        assert!(booking.can_be_modified(today()));

        booking.status = BookingStatus::Confirmed;
        assert!(booking.can_be_modified(today()));

        booking.status = BookingStatus::Ongoing;
        assert!(!booking.can_be_modified(today()));

        // Pendiente pero demasiado cerca de la fecha de inicio
        booking.status = BookingStatus::Pending;
        booking.start_date = today();
        assert!(!booking.can_be_modified(today()));
    }

    #[test]
    fn test_status_as_str_uses_snake_case() {
        assert_eq!(BookingStatus::NoShow.as_str(), "no_show");
        assert_eq!(BookingStatus::Pending.as_str(), "pending");
        assert_eq!(PaymentStatus::Partial.as_str(), "partial");
    }
}
