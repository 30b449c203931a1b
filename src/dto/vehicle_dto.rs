//! DTOs de vehículos y reseñas

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::vehicle::{
    BodyType, FuelType, Transmission, Vehicle, VehicleReview, VehicleStatus, DEFAULT_MILEAGE_LIMIT,
};
use crate::repositories::vehicle_repository::{VehicleSearch, VehicleUpdate};
use crate::utils::validation::{
    validate_deposit_amount, validate_model_year, validate_plate_number, validate_positive,
};

fn year_in_range(value: i32) -> Result<(), ValidationError> {
    validate_model_year(value)
}

fn rate_is_positive(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive(*value)
}

fn deposit_within_limits(value: &Decimal) -> Result<(), ValidationError> {
    validate_deposit_amount(*value)
}

// Alta de vehículo en el catálogo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 50))]
    pub make: String,

    #[validate(length(min = 1, max = 50))]
    pub model: String,

    #[validate(custom = "year_in_range")]
    pub year: i32,

    #[validate(custom = "validate_plate_number")]
    pub plate_number: String,

    #[validate(length(min = 1, max = 30))]
    pub color: String,

    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub body_type: BodyType,

    pub engine_capacity: Option<Decimal>,

    #[validate(range(min = 1, max = 20))]
    pub seating_capacity: Option<i32>,

    pub features: Option<Vec<String>>,

    #[validate(custom = "rate_is_positive")]
    pub daily_rate: Decimal,

    #[validate(custom = "deposit_within_limits")]
    pub deposit_amount: Decimal,

    #[validate(range(min = 1))]
    pub mileage_limit: Option<i32>,

    #[validate(length(min = 1, max = 255))]
    pub pickup_location: String,

    pub insurance_expiry: Option<NaiveDate>,
    pub registration_expiry: Option<NaiveDate>,
    pub last_service_date: Option<NaiveDate>,
}

impl CreateVehicleRequest {
    /// Construir la entidad con los defaults del catálogo
    pub fn into_vehicle(self, owner_id: Uuid, now: DateTime<Utc>) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            owner_id,
            make: self.make,
            model: self.model,
            year: self.year,
            plate_number: self.plate_number,
            color: self.color,
            fuel_type: self.fuel_type,
            transmission: self.transmission,
            body_type: self.body_type,
            engine_capacity: self.engine_capacity,
            seating_capacity: self.seating_capacity.unwrap_or(4),
            features: serde_json::json!(self.features.unwrap_or_default()),
            daily_rate: self.daily_rate,
            deposit_amount: self.deposit_amount,
            mileage_limit: self.mileage_limit.unwrap_or(DEFAULT_MILEAGE_LIMIT),
            status: VehicleStatus::Available,
            is_active: true,
            insurance_expiry: self.insurance_expiry,
            registration_expiry: self.registration_expiry,
            last_service_date: self.last_service_date,
            pickup_location: self.pickup_location,
            created_at: now,
            updated_at: now,
        }
    }
}

// Edición por el propietario
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 30))]
    pub color: Option<String>,

    #[validate(custom = "rate_is_positive")]
    pub daily_rate: Option<Decimal>,

    #[validate(custom = "deposit_within_limits")]
    pub deposit_amount: Option<Decimal>,

    #[validate(range(min = 1))]
    pub mileage_limit: Option<i32>,

    pub features: Option<Vec<String>>,

    #[validate(length(min = 1, max = 255))]
    pub pickup_location: Option<String>,

    pub insurance_expiry: Option<NaiveDate>,
    pub registration_expiry: Option<NaiveDate>,
    pub last_service_date: Option<NaiveDate>,
}

impl From<UpdateVehicleRequest> for VehicleUpdate {
    fn from(request: UpdateVehicleRequest) -> Self {
        Self {
            color: request.color,
            daily_rate: request.daily_rate,
            deposit_amount: request.deposit_amount,
            mileage_limit: request.mileage_limit,
            features: request.features.map(|f| serde_json::json!(f)),
            pickup_location: request.pickup_location,
            insurance_expiry: request.insurance_expiry,
            registration_expiry: request.registration_expiry,
            last_service_date: request.last_service_date,
        }
    }
}

// Cambio de estado por el propietario
#[derive(Debug, Deserialize)]
pub struct VehicleStatusRequest {
    pub status: VehicleStatus,
}

// Filtros del catálogo (query params)
#[derive(Debug, Deserialize, Default)]
pub struct VehicleListQuery {
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub fuel_type: Option<FuelType>,
    pub transmission: Option<Transmission>,
    pub body_type: Option<BodyType>,
    pub seats_min: Option<i32>,
    pub seats_max: Option<i32>,
    pub rate_min: Option<Decimal>,
    pub rate_max: Option<Decimal>,
    pub status: Option<VehicleStatus>,
    pub available: Option<bool>,
    pub pickup_location: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<VehicleListQuery> for VehicleSearch {
    fn from(query: VehicleListQuery) -> Self {
        Self {
            make: query.make,
            model: query.model,
            color: query.color,
            year_min: query.year_min,
            year_max: query.year_max,
            fuel_type: query.fuel_type,
            transmission: query.transmission,
            body_type: query.body_type,
            seats_min: query.seats_min,
            seats_max: query.seats_max,
            rate_min: query.rate_min,
            rate_max: query.rate_max,
            status: query.status,
            available_only: query.available.unwrap_or(false),
            pickup_location: query.pickup_location,
            limit: query.limit.unwrap_or(50).clamp(1, 200),
            offset: query.offset.unwrap_or(0).max(0),
        }
    }
}

// Ventana de disponibilidad (query params)
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

// Alta de reseña
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,

    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

// Response de vehículo
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub display_name: String,
    pub plate_number: String,
    pub color: String,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub body_type: BodyType,
    pub engine_capacity: Option<Decimal>,
    pub seating_capacity: i32,
    pub features: serde_json::Value,
    pub daily_rate: Decimal,
    pub deposit_amount: Decimal,
    pub mileage_limit: i32,
    pub status: VehicleStatus,
    pub is_available: bool,
    pub pickup_location: String,
    pub created_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        let display_name = vehicle.display_name();
        let is_available = vehicle.is_available();

        Self {
            id: vehicle.id,
            owner_id: vehicle.owner_id,
            make: vehicle.make,
            model: vehicle.model,
            year: vehicle.year,
            display_name,
            plate_number: vehicle.plate_number,
            color: vehicle.color,
            fuel_type: vehicle.fuel_type,
            transmission: vehicle.transmission,
            body_type: vehicle.body_type,
            engine_capacity: vehicle.engine_capacity,
            seating_capacity: vehicle.seating_capacity,
            features: vehicle.features,
            daily_rate: vehicle.daily_rate,
            deposit_amount: vehicle.deposit_amount,
            mileage_limit: vehicle.mileage_limit,
            status: vehicle.status,
            is_available,
            pickup_location: vehicle.pickup_location,
            created_at: vehicle.created_at,
        }
    }
}

// Response de reseña
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub reviewer_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<VehicleReview> for ReviewResponse {
    fn from(review: VehicleReview) -> Self {
        Self {
            id: review.id,
            vehicle_id: review.vehicle_id,
            reviewer_id: review.reviewer_id,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}
