//! Servicio JWT
//!
//! Emisión y validación de tokens de acceso (24 horas) y refresh (7 días)
//! firmados con HS256.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::models::auth::{JwtClaims, TokenPair, TOKEN_TYPE_ACCESS, TOKEN_TYPE_REFRESH};
use crate::models::user::User;
use crate::utils::errors::{AppError, AppResult};

/// Configuración JWT
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_token_duration: Duration,
    pub refresh_token_duration: Duration,
}

impl JwtConfig {
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            algorithm: Algorithm::HS256,
            access_token_duration: Duration::hours(24),
            refresh_token_duration: Duration::days(7),
        }
    }
}

/// Servicio JWT
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        let config = JwtConfig::new(secret.to_string());
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn generate_token(
        &self,
        user_id: &str,
        email: &str,
        token_type: &str,
        duration: Duration,
    ) -> AppResult<String> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            token_type: token_type.to_string(),
            exp: (now + duration).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(self.config.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Jwt(format!("Error generating token: {}", e)))
    }

    /// Genera un token de acceso
    pub fn generate_access_token(&self, user_id: &str, email: &str) -> AppResult<String> {
        self.generate_token(
            user_id,
            email,
            TOKEN_TYPE_ACCESS,
            self.config.access_token_duration,
        )
    }

    /// Genera un token de refresh
    pub fn generate_refresh_token(&self, user_id: &str, email: &str) -> AppResult<String> {
        self.generate_token(
            user_id,
            email,
            TOKEN_TYPE_REFRESH,
            self.config.refresh_token_duration,
        )
    }

    /// Emitir el par access + refresh para un usuario
    pub fn generate_token_pair(&self, user: &User) -> AppResult<TokenPair> {
        let user_id = user.id.to_string();

        Ok(TokenPair {
            access_token: self.generate_access_token(&user_id, &user.email)?,
            refresh_token: self.generate_refresh_token(&user_id, &user.email)?,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_duration.num_seconds(),
        })
    }

    /// Valida y decodifica un token
    pub fn validate_token(&self, token: &str) -> AppResult<JwtClaims> {
        let validation = Validation::new(self.config.algorithm);

        decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Jwt(format!("Invalid token: {}", e)))
    }

    /// Valida un token de acceso; rechaza tokens de refresh
    pub fn validate_access_token(&self, token: &str) -> AppResult<JwtClaims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TOKEN_TYPE_ACCESS {
            return Err(AppError::Jwt("Access token required".to_string()));
        }
        Ok(claims)
    }

    /// Emite un nuevo par de tokens a partir de un refresh token válido
    pub fn refresh_token_pair(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.validate_token(refresh_token)?;

        if claims.token_type != TOKEN_TYPE_REFRESH {
            return Err(AppError::Jwt("Refresh token required".to_string()));
        }

        Ok(TokenPair {
            access_token: self.generate_access_token(&claims.sub, &claims.email)?,
            refresh_token: self.generate_refresh_token(&claims.sub, &claims.email)?,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_duration.num_seconds(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "ayesha@example.com".to_string(),
            username: "ayesha".to_string(),
            first_name: "Ayesha".to_string(),
            last_name: "Khan".to_string(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            phone_number: Some("+923001234567".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1995, 4, 12),
            driver_license_number: None,
            address: None,
            is_verified: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_generate_and_validate_token_pair() {
        let service = JwtService::new("test-secret");
        let user = sample_user();

        let pair = service.generate_token_pair(&user).unwrap();
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 24 * 3600);

        let claims = service.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let service = JwtService::new("test-secret");
        let pair = service.generate_token_pair(&sample_user()).unwrap();

        assert!(service.validate_access_token(&pair.refresh_token).is_err());
    }

    #[test]
    fn test_refresh_pair_requires_refresh_token() {
        let service = JwtService::new("test-secret");
        let pair = service.generate_token_pair(&sample_user()).unwrap();

        assert!(service.refresh_token_pair(&pair.access_token).is_err());

        let renewed = service.refresh_token_pair(&pair.refresh_token).unwrap();
        let claims = service.validate_access_token(&renewed.access_token).unwrap();
        assert_eq!(claims.email, "ayesha@example.com");
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = JwtService::new("secret-a");
        let verifier = JwtService::new("secret-b");

        let pair = issuer.generate_token_pair(&sample_user()).unwrap();
        assert!(verifier.validate_token(&pair.access_token).is_err());
    }
}
