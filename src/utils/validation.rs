//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y los patrones compartidos por los DTOs.

use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::ValidationError;

/// Límite de duración de una reserva en días
pub const MAX_RENTAL_DAYS: i64 = 365;

/// Monto máximo aceptado por pago
pub const MAX_PAYMENT_AMOUNT: i64 = 1_000_000;

/// Depósito máximo aceptado por vehículo
pub const MAX_DEPOSIT_AMOUNT: i64 = 50_000;

lazy_static! {
    /// Teléfono en formato internacional: prefijo opcional '+', 1-16 dígitos
    pub static ref PHONE_RE: Regex = Regex::new(r"^\+?[1-9]\d{0,15}$").expect("valid phone regex");

    /// Matrícula: mayúsculas, dígitos y guiones
    pub static ref PLATE_RE: Regex = Regex::new(r"^[A-Z0-9\-]+$").expect("valid plate regex");
}

/// Validar y convertir string a UUID
pub fn validate_uuid(value: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(value).map_err(|_| {
        let mut error = ValidationError::new("uuid");
        error.add_param("value".into(), &value.to_string());
        error
    })
}

/// Validar y convertir string a fecha
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        let mut error = ValidationError::new("date");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"YYYY-MM-DD".to_string());
        error
    })
}

/// Validar y convertir string a hora
pub fn validate_time(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S").map_err(|_| {
        let mut error = ValidationError::new("time");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"HH:MM:SS".to_string());
        error
    })
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + std::fmt::Display + num_traits::Zero + serde::Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + serde::Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar formato de teléfono internacional
pub fn validate_phone_number(value: &str) -> Result<(), ValidationError> {
    if !PHONE_RE.is_match(value) {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"+999999999".to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de matrícula (3-10 caracteres, mayúsculas/dígitos/guiones)
pub fn validate_plate_number(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < 3 || len > 10 || !PLATE_RE.is_match(value) {
        let mut error = ValidationError::new("plate_number");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar año de fabricación: 1900 hasta el año próximo
pub fn validate_model_year(value: i32) -> Result<(), ValidationError> {
    let max_year = Utc::now().year() + 1;
    if value < 1900 || value > max_year {
        let mut error = ValidationError::new("model_year");
        error.add_param("value".into(), &value);
        error.add_param("min".into(), &1900);
        error.add_param("max".into(), &max_year);
        return Err(error);
    }
    Ok(())
}

/// Validar monto de pago: positivo y dentro del máximo aceptado
pub fn validate_payment_amount(value: Decimal) -> Result<(), ValidationError> {
    if value <= Decimal::ZERO || value > Decimal::from(MAX_PAYMENT_AMOUNT) {
        let mut error = ValidationError::new("payment_amount");
        error.add_param("value".into(), &value);
        error.add_param("max".into(), &MAX_PAYMENT_AMOUNT);
        return Err(error);
    }
    Ok(())
}

/// Validar depósito: no negativo y dentro del máximo aceptado
pub fn validate_deposit_amount(value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO || value > Decimal::from(MAX_DEPOSIT_AMOUNT) {
        let mut error = ValidationError::new("deposit_amount");
        error.add_param("value".into(), &value);
        error.add_param("max".into(), &MAX_DEPOSIT_AMOUNT);
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_uuid() {
        let valid_uuid = "550e8400-e29b-41d4-a716-446655440000";
        assert!(validate_uuid(valid_uuid).is_ok());

        let invalid_uuid = "invalid-uuid";
        assert!(validate_uuid(invalid_uuid).is_err());
    }

    #[test]
    fn test_validate_date() {
        let valid_date = "2024-01-15";
        assert!(validate_date(valid_date).is_ok());

        let invalid_date = "2024/01/15";
        assert!(validate_date(invalid_date).is_err());
    }

    #[test]
    fn test_validate_time() {
        assert!(validate_time("09:00:00").is_ok());
        assert!(validate_time("9am").is_err());
    }

    #[test]
    fn test_validate_not_empty() {
        assert!(validate_not_empty("ok").is_ok());
        assert!(validate_not_empty("   ").is_err());
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(5).is_ok());
        assert!(validate_positive(0).is_err());
        assert!(validate_positive(-5).is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative(0).is_ok());
        assert!(validate_non_negative(-1).is_err());
    }

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("+923001234567").is_ok());
        assert!(validate_phone_number("3001234567").is_ok());
        assert!(validate_phone_number("0300123").is_err());
        assert!(validate_phone_number("+92-300").is_err());
        assert!(validate_phone_number("").is_err());
    }

    #[test]
    fn test_validate_plate_number() {
        assert!(validate_plate_number("ABC-123").is_ok());
        assert!(validate_plate_number("LEB9031").is_ok());
        assert!(validate_plate_number("ab-123").is_err());
        assert!(validate_plate_number("AB").is_err());
        assert!(validate_plate_number("ABCDEFGHIJK").is_err());
    }

    #[test]
    fn test_validate_model_year() {
        let next_year = Utc::now().year() + 1;
        assert!(validate_model_year(2020).is_ok());
        assert!(validate_model_year(next_year).is_ok());
        assert!(validate_model_year(next_year + 1).is_err());
        assert!(validate_model_year(1899).is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(Decimal::from(5000)).is_ok());
        assert!(validate_payment_amount(Decimal::ZERO).is_err());
        assert!(validate_payment_amount(Decimal::from(1_000_001)).is_err());
    }

    #[test]
    fn test_validate_deposit_amount() {
        assert!(validate_deposit_amount(Decimal::ZERO).is_ok());
        assert!(validate_deposit_amount(Decimal::from(50_000)).is_ok());
        assert!(validate_deposit_amount(Decimal::from(50_001)).is_err());
        assert!(validate_deposit_amount(Decimal::from(-1)).is_err());
    }
}
