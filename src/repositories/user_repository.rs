//! Repositorio de usuarios
//!
//! Altas y consultas de cuentas, más la edición de perfil.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::User;
use crate::utils::errors::{AppError, AppResult};

/// Campos de perfil editables por el propio usuario
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub driver_license_number: Option<String>,
    pub address: Option<String>,
}

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> AppResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, email, username, first_name, last_name, password_hash,
                phone_number, date_of_birth, driver_license_number, address,
                is_verified, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(&user.phone_number)
        .bind(user.date_of_birth)
        .bind(&user.driver_license_number)
        .bind(&user.address)
        .bind(user.is_verified)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                first_name = $2, last_name = $3, phone_number = $4,
                date_of_birth = $5, driver_license_number = $6, address = $7,
                updated_at = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.first_name.unwrap_or(current.first_name))
        .bind(update.last_name.unwrap_or(current.last_name))
        .bind(update.phone_number.or(current.phone_number))
        .bind(update.date_of_birth.or(current.date_of_birth))
        .bind(update.driver_license_number.or(current.driver_license_number))
        .bind(update.address.or(current.address))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }
}
