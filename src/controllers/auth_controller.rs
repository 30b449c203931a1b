use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::auth_dto::{
    AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, UpdateProfileRequest,
    UserResponse,
};
use crate::dto::common_dto::ApiResponse;
use crate::models::auth::TokenPair;
use crate::models::user::User;
use crate::repositories::user_repository::{ProfileUpdate, UserRepository};
use crate::services::jwt_service::JwtService;
use crate::utils::errors::{conflict_error, AppError, AppResult};

pub struct AuthController {
    repository: UserRepository,
    jwt: JwtService,
}

impl AuthController {
    pub fn new(pool: PgPool, jwt: JwtService) -> Self {
        Self {
            repository: UserRepository::new(pool),
            jwt,
        }
    }

    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> AppResult<ApiResponse<AuthResponse>> {
        request.validate()?;

        // Verificar que el email no exista
        if self.repository.email_exists(&request.email).await? {
            return Err(conflict_error("User", "email", &request.email));
        }

        // Verificar que el username no exista
        if self.repository.username_exists(&request.username).await? {
            return Err(conflict_error("User", "username", &request.username));
        }

        // Hash de la contraseña
        let password_hash = hash(&request.password, DEFAULT_COST)
            .map_err(|e| AppError::Hash(format!("Error hashing password: {}", e)))?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: request.email,
            username: request.username,
            first_name: request.first_name,
            last_name: request.last_name,
            password_hash,
            phone_number: request.phone_number,
            date_of_birth: None,
            driver_license_number: None,
            address: None,
            is_verified: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let saved = self.repository.create(&user).await?;
        let tokens = self.jwt.generate_token_pair(&saved)?;

        Ok(ApiResponse::success_with_message(
            AuthResponse {
                user: UserResponse::from(saved),
                tokens,
            },
            "Usuario registrado exitosamente".to_string(),
        ))
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<ApiResponse<AuthResponse>> {
        request.validate()?;

        let user = self
            .repository
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Credenciales inválidas".to_string()))?;

        if !user.is_active {
            return Err(AppError::Unauthorized(
                "La cuenta está desactivada".to_string(),
            ));
        }

        let valid = verify(&request.password, &user.password_hash)
            .map_err(|e| AppError::Hash(format!("Error verifying password: {}", e)))?;

        if !valid {
            return Err(AppError::Unauthorized("Credenciales inválidas".to_string()));
        }

        let tokens = self.jwt.generate_token_pair(&user)?;

        Ok(ApiResponse::success(AuthResponse {
            user: UserResponse::from(user),
            tokens,
        }))
    }

    /// Emitir un par de tokens nuevo a partir de un refresh token válido
    pub async fn refresh(&self, request: RefreshRequest) -> AppResult<ApiResponse<TokenPair>> {
        let tokens = self.jwt.refresh_token_pair(&request.refresh_token)?;
        Ok(ApiResponse::success(tokens))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<ApiResponse<UserResponse>> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(ApiResponse::success(UserResponse::from(user)))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> AppResult<ApiResponse<UserResponse>> {
        request.validate()?;

        let update = ProfileUpdate {
            first_name: request.first_name,
            last_name: request.last_name,
            phone_number: request.phone_number,
            date_of_birth: request.date_of_birth,
            driver_license_number: request.driver_license_number,
            address: request.address,
        };

        let updated = self
            .repository
            .update_profile(user_id, update, Utc::now())
            .await?;

        Ok(ApiResponse::success_with_message(
            UserResponse::from(updated),
            "Perfil actualizado exitosamente".to_string(),
        ))
    }
}
