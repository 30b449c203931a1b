//! DTOs de autenticación y perfil

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::TokenPair;
use crate::models::user::User;
use crate::utils::validation::validate_phone_number;

// Registro de cuenta
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 3, max = 30))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 100))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100))]
    pub last_name: String,

    #[validate(custom = "validate_phone_number")]
    pub phone_number: Option<String>,
}

// Login por email
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// Edición de perfil
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,

    #[validate(custom = "validate_phone_number")]
    pub phone_number: Option<String>,

    pub date_of_birth: Option<NaiveDate>,

    #[validate(length(min = 1, max = 50))]
    pub driver_license_number: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub address: Option<String>,
}

// Response de usuario (sin password_hash)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub driver_license_number: Option<String>,
    pub address: Option<String>,
    pub is_verified: bool,
    pub is_profile_complete: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let full_name = user.full_name();
        let is_profile_complete = user.is_profile_complete();

        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            full_name,
            phone_number: user.phone_number,
            date_of_birth: user.date_of_birth,
            driver_license_number: user.driver_license_number,
            address: user.address,
            is_verified: user.is_verified,
            is_profile_complete,
            created_at: user.created_at,
        }
    }
}

// Usuario + tokens, devuelto por register/login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}
