//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle, sus ENUMs de catálogo y el modelo
//! de reseñas. Mapea exactamente al schema PostgreSQL con primary key 'id'.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del vehículo - mapea al ENUM vehicle_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    Rented,
    Maintenance,
    Inactive,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Rented => "rented",
            VehicleStatus::Maintenance => "maintenance",
            VehicleStatus::Inactive => "inactive",
        }
    }
}

/// Tipo de combustible - mapea al ENUM fuel_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "fuel_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Petrol,
    Diesel,
    Hybrid,
    Electric,
    Cng,
}

/// Transmisión - mapea al ENUM transmission_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "transmission_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Transmission {
    Manual,
    Automatic,
    SemiAutomatic,
}

/// Carrocería - mapea al ENUM body_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "body_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    Sedan,
    Hatchback,
    Suv,
    Coupe,
    Convertible,
    Wagon,
    Pickup,
    Van,
}

/// Kilometraje diario incluido por defecto
pub const DEFAULT_MILEAGE_LIMIT: i32 = 100;

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
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
    pub is_active: bool,
    pub insurance_expiry: Option<NaiveDate>,
    pub registration_expiry: Option<NaiveDate>,
    pub last_service_date: Option<NaiveDate>,
    pub pickup_location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// Un vehículo es reservable si está disponible y activo en el catálogo
    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available && self.is_active
    }

    /// Nombre visible del vehículo, p.ej. "Toyota Corolla 2022"
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.make, self.model, self.year)
    }
}

/// Reseña de un vehículo - mapea a la tabla vehicle_reviews
///
/// Única por (vehicle_id, reviewer_id).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VehicleReview {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub reviewer_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vehicle() -> Vehicle {
        let now = Utc::now();
        Vehicle {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            make: "Toyota".to_string(),
            model: "Corolla".to_string(),
            year: 2022,
            plate_number: "LEB-9031".to_string(),
            color: "White".to_string(),
            fuel_type: FuelType::Petrol,
            transmission: Transmission::Automatic,
            body_type: BodyType::Sedan,
            engine_capacity: None,
            seating_capacity: 4,
            features: serde_json::json!(["AC", "Bluetooth"]),
            daily_rate: Decimal::from(5000),
            deposit_amount: Decimal::from(10_000),
            mileage_limit: DEFAULT_MILEAGE_LIMIT,
            status: VehicleStatus::Available,
            is_active: true,
            insurance_expiry: None,
            registration_expiry: None,
            last_service_date: None,
            pickup_location: "Karachi Airport".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_is_available() {
        let mut vehicle = sample_vehicle();
        assert!(vehicle.is_available());

        vehicle.status = VehicleStatus::Rented;
        assert!(!vehicle.is_available());

        vehicle.status = VehicleStatus::Available;
        vehicle.is_active = false;
        assert!(!vehicle.is_available());

        vehicle.status = VehicleStatus::Maintenance;
        assert!(!vehicle.is_available());
    }

    #[test]
    fn test_display_name() {
        let vehicle = sample_vehicle();
        assert_eq!(vehicle.display_name(), "Toyota Corolla 2022");
    }
}
