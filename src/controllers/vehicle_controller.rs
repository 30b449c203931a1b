use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::ApiResponse;
use crate::dto::vehicle_dto::{
    AvailabilityQuery, CreateReviewRequest, CreateVehicleRequest, ReviewResponse,
    UpdateVehicleRequest, VehicleListQuery, VehicleResponse, VehicleStatusRequest,
};
use crate::models::vehicle::VehicleReview;
use crate::repositories::booking_repository::BookingRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::availability_service::{AvailabilityReport, AvailabilityService};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

pub struct VehicleController {
    repository: VehicleRepository,
    bookings: BookingRepository,
    availability: AvailabilityService,
}

impl VehicleController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: VehicleRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool.clone()),
            availability: AvailabilityService::new(pool),
        }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        request: CreateVehicleRequest,
    ) -> AppResult<ApiResponse<VehicleResponse>> {
        request.validate()?;

        // La matrícula es única en todo el catálogo
        if self
            .repository
            .plate_number_exists(&request.plate_number)
            .await?
        {
            return Err(conflict_error(
                "Vehicle",
                "plate number",
                &request.plate_number,
            ));
        }

        let vehicle = request.into_vehicle(owner_id, Utc::now());
        let saved = self.repository.create(&vehicle).await?;

        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(saved),
            "Vehículo registrado exitosamente".to_string(),
        ))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ApiResponse<VehicleResponse>> {
        let vehicle = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        Ok(ApiResponse::success(VehicleResponse::from(vehicle)))
    }

    pub async fn list(
        &self,
        query: VehicleListQuery,
    ) -> AppResult<ApiResponse<Vec<VehicleResponse>>> {
        let vehicles = self.repository.search(&query.into()).await?;
        let responses = vehicles.into_iter().map(VehicleResponse::from).collect();
        Ok(ApiResponse::success(responses))
    }

    pub async fn my_vehicles(
        &self,
        owner_id: Uuid,
    ) -> AppResult<ApiResponse<Vec<VehicleResponse>>> {
        let vehicles = self.repository.find_by_owner(owner_id).await?;
        let responses = vehicles.into_iter().map(VehicleResponse::from).collect();
        Ok(ApiResponse::success(responses))
    }

    pub async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        request: UpdateVehicleRequest,
    ) -> AppResult<ApiResponse<VehicleResponse>> {
        request.validate()?;

        let updated = self
            .repository
            .update(id, owner_id, request.into(), Utc::now())
            .await?;

        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(updated),
            "Vehículo actualizado exitosamente".to_string(),
        ))
    }

    pub async fn set_status(
        &self,
        id: Uuid,
        owner_id: Uuid,
        request: VehicleStatusRequest,
    ) -> AppResult<ApiResponse<VehicleResponse>> {
        let updated = self
            .repository
            .set_status_by_owner(id, owner_id, request.status, Utc::now())
            .await?;

        Ok(ApiResponse::success(VehicleResponse::from(updated)))
    }

    /// Baja del catálogo. Se rechaza mientras existan reservas bloqueantes
    /// (confirmed/ongoing) contra el vehículo.
    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> AppResult<ApiResponse<()>> {
        if self.bookings.has_blocking_for_vehicle(id).await? {
            return Err(AppError::Conflict(
                "Vehicle has confirmed or ongoing bookings and cannot be deleted".to_string(),
            ));
        }

        self.repository.delete(id, owner_id).await?;

        Ok(ApiResponse::success_with_message(
            (),
            "Vehículo eliminado exitosamente".to_string(),
        ))
    }

    /// Disponibilidad del vehículo para una ventana de fechas
    pub async fn check_availability(
        &self,
        id: Uuid,
        query: AvailabilityQuery,
    ) -> AppResult<ApiResponse<AvailabilityReport>> {
        if query.end_date <= query.start_date {
            return Err(AppError::BadRequest(
                "end_date must be after start_date".to_string(),
            ));
        }

        // Verificar que el vehículo exista antes de consultar sus reservas
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        let report = self
            .availability
            .check_vehicle(id, query.start_date, query.end_date, None)
            .await?;

        Ok(ApiResponse::success(report))
    }

    pub async fn add_review(
        &self,
        vehicle_id: Uuid,
        reviewer_id: Uuid,
        request: CreateReviewRequest,
    ) -> AppResult<ApiResponse<ReviewResponse>> {
        request.validate()?;

        self.repository
            .find_by_id(vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;

        let review = VehicleReview {
            id: Uuid::new_v4(),
            vehicle_id,
            reviewer_id,
            rating: request.rating,
            comment: request.comment,
            created_at: Utc::now(),
        };

        let saved = self.repository.add_review(&review).await?;

        Ok(ApiResponse::success_with_message(
            ReviewResponse::from(saved),
            "Reseña publicada exitosamente".to_string(),
        ))
    }

    pub async fn list_reviews(
        &self,
        vehicle_id: Uuid,
    ) -> AppResult<ApiResponse<Vec<ReviewResponse>>> {
        let reviews = self.repository.list_reviews(vehicle_id).await?;
        let responses = reviews.into_iter().map(ReviewResponse::from).collect();
        Ok(ApiResponse::success(responses))
    }
}
