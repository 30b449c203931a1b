//! Repositorio de vehículos
//!
//! CRUD del catálogo, búsqueda filtrada, reseñas y el port de estado de
//! vehículo que usa la máquina de estados de reservas.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::vehicle::{
    BodyType, FuelType, Transmission, Vehicle, VehicleReview, VehicleStatus,
};
use crate::utils::errors::{AppError, AppResult};

/// Un borrado rechazado por la referencia desde bookings se reporta como
/// conflicto: el historial de reservas conserva su vehículo aunque estén
/// todas completadas o canceladas.
fn map_delete_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::Conflict(
            "Vehicle has booking history and cannot be deleted".to_string(),
        ),
        _ => AppError::Database(e),
    }
}

/// Port de estado del vehículo
///
/// La máquina de estados de reservas cambia el estado del vehículo a través
/// de esta interfaz, no tocando la entidad directamente.
#[async_trait]
pub trait VehicleStatePort: Send + Sync {
    async fn set_vehicle_status(&self, vehicle_id: Uuid, status: VehicleStatus) -> AppResult<()>;
}

/// Filtros de búsqueda del catálogo
#[derive(Debug, Clone, Default)]
pub struct VehicleSearch {
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
    pub available_only: bool,
    pub pickup_location: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Campos editables por el propietario
#[derive(Debug, Clone, Default)]
pub struct VehicleUpdate {
    pub color: Option<String>,
    pub daily_rate: Option<Decimal>,
    pub deposit_amount: Option<Decimal>,
    pub mileage_limit: Option<i32>,
    pub features: Option<serde_json::Value>,
    pub pickup_location: Option<String>,
    pub insurance_expiry: Option<NaiveDate>,
    pub registration_expiry: Option<NaiveDate>,
    pub last_service_date: Option<NaiveDate>,
}

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        let created = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (
                id, owner_id, make, model, year, plate_number, color,
                fuel_type, transmission, body_type, engine_capacity,
                seating_capacity, features, daily_rate, deposit_amount,
                mileage_limit, status, is_active, insurance_expiry,
                registration_expiry, last_service_date, pickup_location,
                created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
            )
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(vehicle.owner_id)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.plate_number)
        .bind(&vehicle.color)
        .bind(vehicle.fuel_type)
        .bind(vehicle.transmission)
        .bind(vehicle.body_type)
        .bind(vehicle.engine_capacity)
        .bind(vehicle.seating_capacity)
        .bind(&vehicle.features)
        .bind(vehicle.daily_rate)
        .bind(vehicle.deposit_amount)
        .bind(vehicle.mileage_limit)
        .bind(vehicle.status)
        .bind(vehicle.is_active)
        .bind(vehicle.insurance_expiry)
        .bind(vehicle.registration_expiry)
        .bind(vehicle.last_service_date)
        .bind(&vehicle.pickup_location)
        .bind(vehicle.created_at)
        .bind(vehicle.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    pub async fn plate_number_exists(&self, plate_number: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM vehicles WHERE plate_number = $1)")
                .bind(plate_number)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    /// Actualizar campos editables; solo el propietario puede hacerlo
    pub async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        update: VehicleUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Vehicle> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        if current.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Vehicle does not belong to this user".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles SET
                color = $2, daily_rate = $3, deposit_amount = $4,
                mileage_limit = $5, features = $6, pickup_location = $7,
                insurance_expiry = $8, registration_expiry = $9,
                last_service_date = $10, updated_at = $11
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.color.unwrap_or(current.color))
        .bind(update.daily_rate.unwrap_or(current.daily_rate))
        .bind(update.deposit_amount.unwrap_or(current.deposit_amount))
        .bind(update.mileage_limit.unwrap_or(current.mileage_limit))
        .bind(update.features.unwrap_or(current.features))
        .bind(update.pickup_location.unwrap_or(current.pickup_location))
        .bind(update.insurance_expiry.or(current.insurance_expiry))
        .bind(update.registration_expiry.or(current.registration_expiry))
        .bind(update.last_service_date.or(current.last_service_date))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Cambio de estado iniciado por el propietario (maintenance/inactive/...)
    pub async fn set_status_by_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
        status: VehicleStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Vehicle> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        if current.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Vehicle does not belong to this user".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, Vehicle>(
            "UPDATE vehicles SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> AppResult<()> {
        let vehicle = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        if vehicle.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Vehicle does not belong to this user".to_string(),
            ));
        }

        sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_delete_error)?;

        Ok(())
    }

    /// Búsqueda filtrada sobre el catálogo público
    pub async fn search(&self, filter: &VehicleSearch) -> AppResult<Vec<Vehicle>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM vehicles WHERE is_active = TRUE");

        if let Some(make) = &filter.make {
            query.push(" AND make ILIKE ").push_bind(format!("%{}%", make));
        }
        if let Some(model) = &filter.model {
            query.push(" AND model ILIKE ").push_bind(format!("%{}%", model));
        }
        if let Some(color) = &filter.color {
            query.push(" AND color ILIKE ").push_bind(format!("%{}%", color));
        }
        if let Some(year_min) = filter.year_min {
            query.push(" AND year >= ").push_bind(year_min);
        }
        if let Some(year_max) = filter.year_max {
            query.push(" AND year <= ").push_bind(year_max);
        }
        if let Some(fuel_type) = filter.fuel_type {
            query.push(" AND fuel_type = ").push_bind(fuel_type);
        }
        if let Some(transmission) = filter.transmission {
            query.push(" AND transmission = ").push_bind(transmission);
        }
        if let Some(body_type) = filter.body_type {
            query.push(" AND body_type = ").push_bind(body_type);
        }
        if let Some(seats_min) = filter.seats_min {
            query.push(" AND seating_capacity >= ").push_bind(seats_min);
        }
        if let Some(seats_max) = filter.seats_max {
            query.push(" AND seating_capacity <= ").push_bind(seats_max);
        }
        if let Some(rate_min) = filter.rate_min {
            query.push(" AND daily_rate >= ").push_bind(rate_min);
        }
        if let Some(rate_max) = filter.rate_max {
            query.push(" AND daily_rate <= ").push_bind(rate_max);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if filter.available_only {
            query.push(" AND status = 'available'");
        }
        if let Some(location) = &filter.pickup_location {
            query
                .push(" AND pickup_location ILIKE ")
                .push_bind(format!("%{}%", location));
        }

        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit.max(1))
            .push(" OFFSET ")
            .push_bind(filter.offset.max(0));

        let vehicles = query
            .build_query_as::<Vehicle>()
            .fetch_all(&self.pool)
            .await?;

        Ok(vehicles)
    }

    pub async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    /// Insertar una reseña; una por (vehicle, reviewer)
    pub async fn add_review(&self, review: &VehicleReview) -> AppResult<VehicleReview> {
        let inserted = sqlx::query_as::<_, VehicleReview>(
            r#"
            INSERT INTO vehicle_reviews (id, vehicle_id, reviewer_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(review.id)
        .bind(review.vehicle_id)
        .bind(review.reviewer_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(
                "You have already reviewed this vehicle".to_string(),
            ),
            _ => AppError::Database(e),
        })?;

        Ok(inserted)
    }

    pub async fn list_reviews(&self, vehicle_id: Uuid) -> AppResult<Vec<VehicleReview>> {
        let reviews = sqlx::query_as::<_, VehicleReview>(
            "SELECT * FROM vehicle_reviews WHERE vehicle_id = $1 ORDER BY created_at DESC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }
}

#[async_trait]
impl VehicleStatePort for VehicleRepository {
    /// Cambio de estado disparado por el ciclo de vida de una reserva
    /// (rented al iniciar, available al completar)
    async fn set_vehicle_status(&self, vehicle_id: Uuid, status: VehicleStatus) -> AppResult<()> {
        let result = sqlx::query("UPDATE vehicles SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(vehicle_id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vehicle not found".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_delete_error_passes_through_other_errors() {
        assert!(matches!(
            map_delete_error(sqlx::Error::RowNotFound),
            AppError::Database(_)
        ));
    }
}
