//! Modelo de User
//!
//! Cuentas de clientes y propietarios. El login es por email; el perfil
//! extendido alimenta el snapshot de cliente de cada reserva.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User principal - mapea exactamente a la tabla users
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub driver_license_number: Option<String>,
    pub address: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Nombre completo, con fallback al username si no hay nombres cargados
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let trimmed = full.trim();
        if trimmed.is_empty() {
            self.username.clone()
        } else {
            trimmed.to_string()
        }
    }

    /// El perfil está completo cuando todos los datos necesarios para
    /// alquilar están cargados
    pub fn is_profile_complete(&self) -> bool {
        let has = |value: &Option<String>| value.as_deref().map_or(false, |v| !v.trim().is_empty());

        !self.first_name.trim().is_empty()
            && !self.last_name.trim().is_empty()
            && has(&self.phone_number)
            && self.date_of_birth.is_some()
            && has(&self.driver_license_number)
            && has(&self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
            driver_license_number: Some("DL-4411".to_string()),
            address: Some("Clifton Block 2, Karachi".to_string()),
            is_verified: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_full_name() {
        let mut user = sample_user();
        assert_eq!(user.full_name(), "Ayesha Khan");

        user.first_name = String::new();
        user.last_name = String::new();
        assert_eq!(user.full_name(), "ayesha");
    }

    #[test]
    fn test_is_profile_complete() {
        let mut user = sample_user();
        assert!(user.is_profile_complete());

        user.driver_license_number = None;
        assert!(!user.is_profile_complete());

        user.driver_license_number = Some("  ".to_string());
        assert!(!user.is_profile_complete());
    }
}
