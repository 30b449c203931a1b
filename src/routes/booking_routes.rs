use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::booking_controller::BookingController;
use crate::dto::booking_dto::{
    AddPaymentRequest, BookingAvailabilityQuery, BookingListItem, BookingListQuery,
    BookingResponse, CancelBookingRequest, CancelledBookingResponse, CreateBookingRequest,
    PaymentResponse, ProcessPaymentRequest, RecordedPaymentResponse, UpdateBookingRequest,
};
use crate::dto::common_dto::ApiResponse;
use crate::middleware::auth::auth_middleware;
use crate::models::auth::AuthUser;
use crate::services::availability_service::AvailabilityReport;
use crate::services::payment_service::PaymentResult;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Rutas de reservas y pagos. Todas requieren autenticación.
pub fn create_booking_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route("/check-availability", get(check_availability))
        .route("/:id", get(get_booking).put(update_booking))
        .route("/:id/confirm", post(confirm_booking))
        .route("/:id/cancel", post(cancel_booking))
        .route("/:id/start", post(start_rental))
        .route("/:id/complete", post(complete_rental))
        .route("/:id/no-show", post(mark_no_show))
        .route("/:id/payments", get(list_payments).post(add_payment))
        .route("/:id/payments/process", post(process_payment))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn controller(state: &AppState) -> BookingController {
    BookingController::new(state.pool.clone(), state.gateway.clone())
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let response = controller(&state).create(user.id, request).await?;
    Ok(Json(response))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<ApiResponse<Vec<BookingListItem>>>, AppError> {
    let response = controller(&state).list(user.id, query).await?;
    Ok(Json(response))
}

async fn check_availability(
    State(state): State<AppState>,
    Query(query): Query<BookingAvailabilityQuery>,
) -> Result<Json<ApiResponse<AvailabilityReport>>, AppError> {
    let response = controller(&state).check_availability(query).await?;
    Ok(Json(response))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let response = controller(&state).get(id, user.id).await?;
    Ok(Json(response))
}

async fn update_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookingRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let response = controller(&state).update(id, user.id, request).await?;
    Ok(Json(response))
}

async fn confirm_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let response = controller(&state).confirm(id, user.id).await?;
    Ok(Json(response))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<ApiResponse<CancelledBookingResponse>>, AppError> {
    let response = controller(&state).cancel(id, user.id, request).await?;
    Ok(Json(response))
}

async fn start_rental(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let response = controller(&state).start_rental(id, user.id).await?;
    Ok(Json(response))
}

async fn complete_rental(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let response = controller(&state).complete_rental(id, user.id).await?;
    Ok(Json(response))
}

async fn mark_no_show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let response = controller(&state).mark_no_show(id, user.id).await?;
    Ok(Json(response))
}

async fn list_payments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PaymentResponse>>>, AppError> {
    let response = controller(&state).list_payments(id, user.id).await?;
    Ok(Json(response))
}

async fn add_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddPaymentRequest>,
) -> Result<Json<ApiResponse<RecordedPaymentResponse>>, AppError> {
    let response = controller(&state).add_payment(id, user.id, request).await?;
    Ok(Json(response))
}

async fn process_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<ProcessPaymentRequest>,
) -> Result<Json<ApiResponse<PaymentResult>>, AppError> {
    let response = controller(&state).process_payment(id, user.id, request).await?;
    Ok(Json(response))
}
