//! Modelos de autenticación
//!
//! Claims JWT y la identidad autenticada que viaja como extensión de request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tipo de token emitido
pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// Claims del JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Identificador del usuario (uuid en texto)
    pub sub: String,
    pub email: String,
    /// "access" o "refresh"
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
}

/// Par de tokens devuelto en login/registro/refresh
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Segundos de vida del access token
    pub expires_in: i64,
}

/// Usuario autenticado extraído del Bearer token por el middleware
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}
