//! DTOs de reservas y pagos

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::booking::{
    Booking, BookingCancellation, BookingPayment, BookingStatus, PaymentMethod, PaymentStatus,
    PaymentType,
};
use crate::repositories::booking_repository::BookingSearch;
use crate::utils::validation::{validate_non_negative, validate_phone_number};

fn terms_are_accepted(value: &bool) -> Result<(), ValidationError> {
    if !*value {
        return Err(ValidationError::new("terms_accepted"));
    }
    Ok(())
}

fn discount_is_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(*value)
}

// Alta de reserva. Los datos de contacto viajan en el request y quedan como
// snapshot en la reserva, independientes de ediciones posteriores del perfil.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,

    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,

    #[validate(email)]
    pub customer_email: String,

    #[validate(custom = "validate_phone_number")]
    pub customer_phone: String,

    #[validate(length(min = 1, max = 255))]
    pub customer_address: String,

    #[validate(length(min = 1, max = 50))]
    pub driver_license_number: String,

    // En blanco se usa la ubicación del vehículo
    #[validate(length(max = 255))]
    pub pickup_location: Option<String>,

    #[validate(length(max = 255))]
    pub return_location: Option<String>,

    #[validate(length(max = 1000))]
    pub pickup_notes: Option<String>,

    #[validate(length(max = 1000))]
    pub return_notes: Option<String>,

    #[validate(length(max = 1000))]
    pub special_requests: Option<String>,

    #[validate(custom = "discount_is_non_negative")]
    pub discount_amount: Option<Decimal>,

    #[validate(custom = "terms_are_accepted")]
    pub terms_accepted: bool,
}

// Modificación de una reserva todavía modificable
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBookingRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,

    #[validate(length(min = 1, max = 255))]
    pub pickup_location: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub return_location: Option<String>,

    #[validate(length(max = 1000))]
    pub pickup_notes: Option<String>,

    #[validate(length(max = 1000))]
    pub return_notes: Option<String>,

    #[validate(length(max = 1000))]
    pub special_requests: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

// Registro manual de pago (mostrador / transferencia)
#[derive(Debug, Deserialize, Validate)]
pub struct AddPaymentRequest {
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    pub amount: Decimal,

    #[validate(length(min = 3, max = 3))]
    pub currency: Option<String>,

    #[validate(length(max = 100))]
    pub transaction_id: Option<String>,

    pub is_successful: Option<bool>,
}

// Cargo por pasarela
#[derive(Debug, Deserialize, Validate)]
pub struct ProcessPaymentRequest {
    #[validate(length(min = 1, max = 100))]
    pub payment_method_id: String,

    pub amount: Decimal,

    #[validate(length(min = 3, max = 3))]
    pub currency: Option<String>,
}

// Consulta de disponibilidad (query params)
#[derive(Debug, Deserialize)]
pub struct BookingAvailabilityQuery {
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

// Filtros del listado de reservas (query params)
#[derive(Debug, Deserialize, Default)]
pub struct BookingListQuery {
    pub vehicle_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub start_date_from: Option<NaiveDate>,
    pub start_date_to: Option<NaiveDate>,
    pub min_total: Option<Decimal>,
    pub max_total: Option<Decimal>,
    pub search: Option<String>,
    pub active: Option<bool>,
    pub upcoming: Option<bool>,
    pub past: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl BookingListQuery {
    /// Filtro de repositorio acotado al cliente autenticado
    pub fn into_search(self, customer_id: Uuid) -> BookingSearch {
        BookingSearch {
            customer_id: Some(customer_id),
            vehicle_id: self.vehicle_id,
            status: self.status,
            payment_status: self.payment_status,
            start_date_from: self.start_date_from,
            start_date_to: self.start_date_to,
            min_total: self.min_total,
            max_total: self.max_total,
            search: self.search,
            active: self.active.unwrap_or(false),
            upcoming: self.upcoming.unwrap_or(false),
            past: self.past.unwrap_or(false),
            limit: self.limit.unwrap_or(50).clamp(1, 200),
            offset: self.offset.unwrap_or(0).max(0),
        }
    }
}

// Response completa de reserva
#[derive(Debug, Serialize)]
pub struct BookingResponse {
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
    pub can_be_cancelled: bool,
    pub can_be_modified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        let today = Utc::now().date_naive();
        let can_be_cancelled = booking.can_be_cancelled(today);
        let can_be_modified = booking.can_be_modified(today);

        Self {
            id: booking.id,
            booking_id: booking.booking_id,
            customer_id: booking.customer_id,
            vehicle_id: booking.vehicle_id,
            start_date: booking.start_date,
            end_date: booking.end_date,
            start_time: booking.start_time,
            end_time: booking.end_time,
            status: booking.status,
            payment_status: booking.payment_status,
            daily_rate: booking.daily_rate,
            total_days: booking.total_days,
            subtotal: booking.subtotal,
            deposit_amount: booking.deposit_amount,
            discount_amount: booking.discount_amount,
            total_amount: booking.total_amount,
            customer_name: booking.customer_name,
            customer_email: booking.customer_email,
            customer_phone: booking.customer_phone,
            customer_address: booking.customer_address,
            driver_license_number: booking.driver_license_number,
            pickup_location: booking.pickup_location,
            return_location: booking.return_location,
            pickup_notes: booking.pickup_notes,
            return_notes: booking.return_notes,
            special_requests: booking.special_requests,
            terms_accepted: booking.terms_accepted,
            can_be_cancelled,
            can_be_modified,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
            confirmed_at: booking.confirmed_at,
            cancelled_at: booking.cancelled_at,
        }
    }
}

// Response reducida para listados
#[derive(Debug, Serialize)]
pub struct BookingListItem {
    pub id: Uuid,
    pub booking_id: String,
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub total_days: i32,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingListItem {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            booking_id: booking.booking_id,
            vehicle_id: booking.vehicle_id,
            start_date: booking.start_date,
            end_date: booking.end_date,
            status: booking.status,
            payment_status: booking.payment_status,
            total_days: booking.total_days,
            total_amount: booking.total_amount,
            created_at: booking.created_at,
        }
    }
}

// Response de pago
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    pub amount: Decimal,
    pub currency: String,
    pub transaction_id: Option<String>,
    pub is_successful: bool,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<BookingPayment> for PaymentResponse {
    fn from(payment: BookingPayment) -> Self {
        Self {
            id: payment.id,
            booking_id: payment.booking_id,
            payment_method: payment.payment_method,
            payment_type: payment.payment_type,
            amount: payment.amount,
            currency: payment.currency,
            transaction_id: payment.transaction_id,
            is_successful: payment.is_successful,
            processed_at: payment.processed_at,
            created_at: payment.created_at,
        }
    }
}

// Pago registrado junto con el estado de pago resultante de la reserva
#[derive(Debug, Serialize)]
pub struct RecordedPaymentResponse {
    pub payment: PaymentResponse,
    pub payment_status: PaymentStatus,
}

// Response del registro de cancelación
#[derive(Debug, Serialize)]
pub struct CancellationResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reason: String,
    pub cancelled_by: Uuid,
    pub refund_amount: Decimal,
    pub cancellation_fee: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<BookingCancellation> for CancellationResponse {
    fn from(record: BookingCancellation) -> Self {
        Self {
            id: record.id,
            booking_id: record.booking_id,
            reason: record.reason,
            cancelled_by: record.cancelled_by,
            refund_amount: record.refund_amount,
            cancellation_fee: record.cancellation_fee,
            created_at: record.created_at,
        }
    }
}

// Reserva cancelada junto con su registro de auditoría
#[derive(Debug, Serialize)]
pub struct CancelledBookingResponse {
    pub booking: BookingResponse,
    pub cancellation: CancellationResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> CreateBookingRequest {
        CreateBookingRequest {
            vehicle_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
            start_time: None,
            end_time: None,
            customer_name: "Ayesha Khan".to_string(),
            customer_email: "ayesha@example.com".to_string(),
            customer_phone: "+923001234567".to_string(),
            customer_address: "Clifton Block 2, Karachi".to_string(),
            driver_license_number: "DL-4411".to_string(),
            pickup_location: None,
            return_location: None,
            pickup_notes: None,
            return_notes: None,
            special_requests: None,
            discount_amount: None,
            terms_accepted: true,
        }
    }

    #[test]
    fn test_create_request_valid() {
        assert!(sample_request().validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_unaccepted_terms() {
        let mut request = sample_request();
        request.terms_accepted = false;

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("terms_accepted"));
    }

    #[test]
    fn test_create_request_rejects_bad_email() {
        let mut request = sample_request();
        request.customer_email = "not-an-email".to_string();

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("customer_email"));
    }

    #[test]
    fn test_list_query_scopes_to_customer_and_clamps_limit() {
        let customer_id = Uuid::new_v4();
        let query = BookingListQuery {
            limit: Some(5000),
            ..Default::default()
        };

        let search = query.into_search(customer_id);
        assert_eq!(search.customer_id, Some(customer_id));
        assert_eq!(search.limit, 200);
        assert_eq!(search.offset, 0);
    }
}
