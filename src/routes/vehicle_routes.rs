use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{delete, get, patch, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::common_dto::ApiResponse;
use crate::dto::vehicle_dto::{
    AvailabilityQuery, CreateReviewRequest, CreateVehicleRequest, ReviewResponse,
    UpdateVehicleRequest, VehicleListQuery, VehicleResponse, VehicleStatusRequest,
};
use crate::middleware::auth::auth_middleware;
use crate::models::auth::AuthUser;
use crate::services::availability_service::AvailabilityReport;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Rutas del catálogo de vehículos. La consulta es pública; las altas,
/// ediciones y reseñas requieren autenticación.
pub fn create_vehicle_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_vehicle))
        .route("/mine", get(my_vehicles))
        .route("/:id", put(update_vehicle))
        .route("/:id", delete(delete_vehicle))
        .route("/:id/status", patch(set_vehicle_status))
        .route("/:id/reviews", post(add_review))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_vehicles))
        .route("/:id", get(get_vehicle))
        .route("/:id/availability", get(check_availability))
        .route("/:id/reviews", get(list_reviews))
        .merge(protected)
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.create(user.id, request).await?;
    Ok(Json(response))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<VehicleListQuery>,
) -> Result<Json<ApiResponse<Vec<VehicleResponse>>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.list(query).await?;
    Ok(Json(response))
}

async fn my_vehicles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<VehicleResponse>>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.my_vehicles(user.id).await?;
    Ok(Json(response))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.get(id).await?;
    Ok(Json(response))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.update(id, user.id, request).await?;
    Ok(Json(response))
}

async fn set_vehicle_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<VehicleStatusRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.set_status(id, user.id, request).await?;
    Ok(Json(response))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.delete(id, user.id).await?;
    Ok(Json(response))
}

async fn check_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<ApiResponse<AvailabilityReport>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.check_availability(id, query).await?;
    Ok(Json(response))
}

async fn add_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<ApiResponse<ReviewResponse>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.add_review(id, user.id, request).await?;
    Ok(Json(response))
}

async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ReviewResponse>>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.list_reviews(id).await?;
    Ok(Json(response))
}
