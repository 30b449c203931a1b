use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::booking_dto::{
    AddPaymentRequest, BookingAvailabilityQuery, BookingListItem, BookingListQuery,
    BookingResponse, CancelBookingRequest, CancelledBookingResponse, CancellationResponse,
    CreateBookingRequest, PaymentResponse, ProcessPaymentRequest, RecordedPaymentResponse,
    UpdateBookingRequest,
};
use crate::dto::common_dto::ApiResponse;
use crate::models::booking::{
    default_end_time, default_start_time, Booking, BookingStatus, PaymentStatus,
    DEFAULT_CANCELLATION_REASON, DEFAULT_CURRENCY,
};
use crate::models::vehicle::VehicleStatus;
use crate::repositories::booking_repository::BookingRepository;
use crate::repositories::vehicle_repository::{VehicleRepository, VehicleStatePort};
use crate::services::availability_service::{AvailabilityReport, AvailabilityService};
use crate::services::payment_gateway::PaymentGateway;
use crate::services::payment_service::{NewPayment, PaymentResult, PaymentService};
use crate::utils::errors::{not_found_error, AppError, AppResult};

pub struct BookingController {
    repository: BookingRepository,
    vehicles: VehicleRepository,
    availability: AvailabilityService,
    payments: PaymentService,
}

impl BookingController {
    pub fn new(pool: PgPool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            repository: BookingRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            availability: AvailabilityService::new(pool.clone()),
            payments: PaymentService::new(pool, gateway),
        }
    }

    /// Buscar una reserva del cliente autenticado. Las reservas ajenas se
    /// reportan como inexistentes.
    async fn find_own_booking(&self, id: Uuid, customer_id: Uuid) -> AppResult<Booking> {
        let booking = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &id.to_string()))?;

        if booking.customer_id != customer_id {
            return Err(not_found_error("Booking", &id.to_string()));
        }

        Ok(booking)
    }

    pub async fn create(
        &self,
        customer_id: Uuid,
        request: CreateBookingRequest,
    ) -> AppResult<ApiResponse<BookingResponse>> {
        request.validate()?;

        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &request.vehicle_id.to_string()))?;

        if !vehicle.is_available() {
            return Err(AppError::Conflict(
                "Vehicle is not available for booking".to_string(),
            ));
        }

        let now = Utc::now();
        let today = now.date_naive();

        // La tarifa y el depósito quedan congelados al momento de reservar;
        // los cambios posteriores del catálogo no afectan reservas existentes
        let mut booking = Booking {
            id: Uuid::new_v4(),
            booking_id: String::new(),
            customer_id,
            vehicle_id: vehicle.id,
            start_date: request.start_date,
            end_date: request.end_date,
            start_time: request.start_time.unwrap_or_else(default_start_time),
            end_time: request.end_time.unwrap_or_else(default_end_time),
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            daily_rate: vehicle.daily_rate,
            total_days: 0,
            subtotal: Decimal::ZERO,
            deposit_amount: vehicle.deposit_amount,
            discount_amount: request.discount_amount.unwrap_or(Decimal::ZERO),
            total_amount: Decimal::ZERO,
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            customer_phone: Some(request.customer_phone),
            customer_address: Some(request.customer_address),
            driver_license_number: Some(request.driver_license_number),
            pickup_location: request
                .pickup_location
                .unwrap_or_else(|| vehicle.pickup_location.clone()),
            return_location: request
                .return_location
                .unwrap_or_else(|| vehicle.pickup_location.clone()),
            pickup_notes: request.pickup_notes,
            return_notes: request.return_notes,
            special_requests: request.special_requests,
            terms_accepted: request.terms_accepted,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            cancelled_at: None,
        };

        booking.prepare_for_save(now);
        booking.validate_dates(today)?;

        // El chequeo de solapamiento definitivo ocurre dentro de la
        // transacción del repositorio, bajo el lock del vehículo
        let saved = self.repository.create(&booking).await?;

        Ok(ApiResponse::success_with_message(
            BookingResponse::from(saved),
            "Reserva creada exitosamente".to_string(),
        ))
    }

    pub async fn get(
        &self,
        id: Uuid,
        customer_id: Uuid,
    ) -> AppResult<ApiResponse<BookingResponse>> {
        let booking = self.find_own_booking(id, customer_id).await?;
        Ok(ApiResponse::success(BookingResponse::from(booking)))
    }

    pub async fn list(
        &self,
        customer_id: Uuid,
        query: BookingListQuery,
    ) -> AppResult<ApiResponse<Vec<BookingListItem>>> {
        let today = Utc::now().date_naive();
        let bookings = self
            .repository
            .search(&query.into_search(customer_id), today)
            .await?;

        let responses = bookings.into_iter().map(BookingListItem::from).collect();
        Ok(ApiResponse::success(responses))
    }

    /// Modificar fechas, ubicaciones o notas de una reserva todavía
    /// modificable. Los montos derivados se recalculan con la tarifa
    /// congelada al crear.
    pub async fn update(
        &self,
        id: Uuid,
        customer_id: Uuid,
        request: UpdateBookingRequest,
    ) -> AppResult<ApiResponse<BookingResponse>> {
        request.validate()?;

        let mut booking = self.find_own_booking(id, customer_id).await?;

        let now = Utc::now();
        let today = now.date_naive();

        if !booking.can_be_modified(today) {
            return Err(AppError::BookingNotModifiable(
                "only pending or confirmed bookings more than 24 hours before pickup can be modified"
                    .to_string(),
            ));
        }

        if let Some(start_date) = request.start_date {
            booking.start_date = start_date;
        }
        if let Some(end_date) = request.end_date {
            booking.end_date = end_date;
        }
        if let Some(start_time) = request.start_time {
            booking.start_time = start_time;
        }
        if let Some(end_time) = request.end_time {
            booking.end_time = end_time;
        }
        if let Some(pickup_location) = request.pickup_location {
            booking.pickup_location = pickup_location;
        }
        if let Some(return_location) = request.return_location {
            booking.return_location = return_location;
        }
        if request.pickup_notes.is_some() {
            booking.pickup_notes = request.pickup_notes;
        }
        if request.return_notes.is_some() {
            booking.return_notes = request.return_notes;
        }
        if request.special_requests.is_some() {
            booking.special_requests = request.special_requests;
        }

        booking.prepare_for_save(now);
        booking.validate_dates(today)?;

        let saved = self.repository.update_content(&booking, now).await?;

        Ok(ApiResponse::success_with_message(
            BookingResponse::from(saved),
            "Reserva actualizada exitosamente".to_string(),
        ))
    }

    pub async fn confirm(
        &self,
        id: Uuid,
        customer_id: Uuid,
    ) -> AppResult<ApiResponse<BookingResponse>> {
        let mut booking = self.find_own_booking(id, customer_id).await?;

        let now = Utc::now();
        booking.confirm(now)?;

        // El repositorio repite el chequeo de solapamiento bajo lock antes
        // de volcar el nuevo estado
        let saved = self.repository.confirm(&booking, now).await?;

        Ok(ApiResponse::success_with_message(
            BookingResponse::from(saved),
            "Reserva confirmada exitosamente".to_string(),
        ))
    }

    pub async fn cancel(
        &self,
        id: Uuid,
        customer_id: Uuid,
        request: CancelBookingRequest,
    ) -> AppResult<ApiResponse<CancelledBookingResponse>> {
        let mut booking = self.find_own_booking(id, customer_id).await?;

        let now = Utc::now();
        let today = now.date_naive();

        if !booking.can_be_cancelled(today) {
            return Err(AppError::BookingNotCancellable(
                "bookings can only be cancelled more than 24 hours before the start date"
                    .to_string(),
            ));
        }

        booking.cancel(now)?;

        let reason = request
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CANCELLATION_REASON.to_string());

        let (cancelled, record) = self
            .repository
            .cancel(&booking, &reason, customer_id, now)
            .await?;

        Ok(ApiResponse::success_with_message(
            CancelledBookingResponse {
                booking: BookingResponse::from(cancelled),
                cancellation: CancellationResponse::from(record),
            },
            "Reserva cancelada exitosamente".to_string(),
        ))
    }

    /// Inicio del alquiler: la reserva pasa a ongoing y el vehículo a rented
    pub async fn start_rental(
        &self,
        id: Uuid,
        customer_id: Uuid,
    ) -> AppResult<ApiResponse<BookingResponse>> {
        let mut booking = self.find_own_booking(id, customer_id).await?;

        booking.start_rental()?;

        let saved = self
            .repository
            .update_status(&booking, BookingStatus::Confirmed, "start rental for", Utc::now())
            .await?;
        self.vehicles
            .set_vehicle_status(booking.vehicle_id, VehicleStatus::Rented)
            .await?;

        Ok(ApiResponse::success(BookingResponse::from(saved)))
    }

    /// Fin del alquiler: la reserva pasa a completed y el vehículo vuelve
    /// a available
    pub async fn complete_rental(
        &self,
        id: Uuid,
        customer_id: Uuid,
    ) -> AppResult<ApiResponse<BookingResponse>> {
        let mut booking = self.find_own_booking(id, customer_id).await?;

        booking.complete_rental()?;

        let saved = self
            .repository
            .update_status(&booking, BookingStatus::Ongoing, "complete rental for", Utc::now())
            .await?;
        self.vehicles
            .set_vehicle_status(booking.vehicle_id, VehicleStatus::Available)
            .await?;

        Ok(ApiResponse::success(BookingResponse::from(saved)))
    }

    /// Marcar no-show. Lo ejecuta el propietario del vehículo cuando el
    /// cliente no se presenta a retirar.
    pub async fn mark_no_show(
        &self,
        id: Uuid,
        actor_id: Uuid,
    ) -> AppResult<ApiResponse<BookingResponse>> {
        let mut booking = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &id.to_string()))?;

        let vehicle = self
            .vehicles
            .find_by_id(booking.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &booking.vehicle_id.to_string()))?;

        if vehicle.owner_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the vehicle owner can mark a booking as no-show".to_string(),
            ));
        }

        booking.mark_no_show()?;

        let saved = self
            .repository
            .update_status(&booking, BookingStatus::Confirmed, "mark no-show for", Utc::now())
            .await?;

        Ok(ApiResponse::success(BookingResponse::from(saved)))
    }

    pub async fn check_availability(
        &self,
        query: BookingAvailabilityQuery,
    ) -> AppResult<ApiResponse<AvailabilityReport>> {
        if query.end_date <= query.start_date {
            return Err(AppError::BadRequest(
                "end_date must be after start_date".to_string(),
            ));
        }

        let report = self
            .availability
            .check_vehicle(query.vehicle_id, query.start_date, query.end_date, None)
            .await?;

        Ok(ApiResponse::success(report))
    }

    /// Registrar un pago fuera de la pasarela (efectivo, transferencia)
    pub async fn add_payment(
        &self,
        id: Uuid,
        customer_id: Uuid,
        request: AddPaymentRequest,
    ) -> AppResult<ApiResponse<RecordedPaymentResponse>> {
        request.validate()?;

        let booking = self.find_own_booking(id, customer_id).await?;

        let new_payment = NewPayment {
            payment_method: request.payment_method,
            payment_type: request.payment_type,
            amount: request.amount,
            currency: request
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            transaction_id: request.transaction_id,
            gateway_response: None,
            is_successful: request.is_successful.unwrap_or(true),
        };

        let (payment, payment_status) =
            self.payments.record_payment(&booking, new_payment).await?;

        Ok(ApiResponse::success_with_message(
            RecordedPaymentResponse {
                payment: PaymentResponse::from(payment),
                payment_status,
            },
            "Pago registrado exitosamente".to_string(),
        ))
    }

    pub async fn list_payments(
        &self,
        id: Uuid,
        customer_id: Uuid,
    ) -> AppResult<ApiResponse<Vec<PaymentResponse>>> {
        let booking = self.find_own_booking(id, customer_id).await?;

        let payments = self.repository.list_payments(booking.id).await?;
        let responses = payments.into_iter().map(PaymentResponse::from).collect();
        Ok(ApiResponse::success(responses))
    }

    /// Cargar un pago a través de la pasarela externa
    pub async fn process_payment(
        &self,
        id: Uuid,
        customer_id: Uuid,
        request: ProcessPaymentRequest,
    ) -> AppResult<ApiResponse<PaymentResult>> {
        request.validate()?;

        let booking = self.find_own_booking(id, customer_id).await?;

        let currency = request
            .currency
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let result = self
            .payments
            .process_gateway_payment(&booking, &request.payment_method_id, request.amount, &currency)
            .await?;

        Ok(ApiResponse::success_with_message(
            result,
            "Pago procesado exitosamente".to_string(),
        ))
    }
}
