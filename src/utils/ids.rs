//! Generación de identificadores de reserva
//!
//! Este módulo genera los identificadores legibles de reservas (booking_id).

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generar un booking_id legible: "BK" + timestamp + sufijo aleatorio
///
/// Formato: BK + 14 dígitos (%Y%m%d%H%M%S) + 6 caracteres hex en mayúsculas.
/// El timestamp se recibe como parámetro para mantener la función determinista
/// respecto al reloj.
pub fn generate_booking_id(now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y%m%d%H%M%S");
    let entropy = Uuid::new_v4().simple().to_string();
    let suffix = entropy[..6].to_uppercase();
    format!("BK{}{}", stamp, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 45).unwrap()
    }

    #[test]
    fn test_booking_id_format() {
        let id = generate_booking_id(fixed_now());

        assert_eq!(id.len(), 22);
        assert!(id.starts_with("BK"));
        assert_eq!(&id[2..16], "20240315103045");
        assert!(id[16..].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_booking_id_timestamp_segment_is_numeric() {
        let id = generate_booking_id(Utc::now());
        assert!(id[2..16].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_booking_ids_are_unique() {
        let now = fixed_now();
        let first = generate_booking_id(now);
        let second = generate_booking_id(now);

        // Mismo timestamp, sufijo aleatorio distinto
        assert_eq!(&first[..16], &second[..16]);
        assert_ne!(first, second);
    }
}
