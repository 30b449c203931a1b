//! Servicio de disponibilidad
//!
//! Detección de conflictos de reserva sobre rangos de fechas inclusivos.
//! Siempre consulta el estado confirmado en base de datos; no hay caché.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repositories::booking_repository::BookingRepository;
use crate::utils::errors::AppResult;

/// Dos rangos inclusivos [a_start, a_end] y [b_start, b_end] entran en
/// conflicto si se intersecan en al menos un día. Una reserva que termina el
/// día N conflictúa con otra que empieza el día N.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// Resultado de una consulta de disponibilidad
#[derive(Debug, Serialize)]
pub struct AvailabilityReport {
    pub is_available: bool,
    pub conflicting_bookings: i64,
}

pub struct AvailabilityService {
    bookings: BookingRepository,
}

impl AvailabilityService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            bookings: BookingRepository::new(pool),
        }
    }

    /// Verificar la ventana solicitada contra las reservas bloqueantes
    /// (confirmed/ongoing) del vehículo. `exclude` omite una reserva propia
    /// al evaluar una modificación.
    pub async fn check_vehicle(
        &self,
        vehicle_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        exclude: Option<Uuid>,
    ) -> AppResult<AvailabilityReport> {
        let blocking = self
            .bookings
            .find_blocking_for_vehicle(vehicle_id, exclude)
            .await?;

        let conflicting = blocking
            .iter()
            .filter(|b| ranges_overlap(b.start_date, b.end_date, start_date, end_date))
            .count() as i64;

        Ok(AvailabilityReport {
            is_available: conflicting == 0,
            conflicting_bookings: conflicting,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_overlap_is_symmetric() {
        assert!(ranges_overlap(date(1), date(5), date(4), date(10)));
        assert!(ranges_overlap(date(4), date(10), date(1), date(5)));
    }

    #[test]
    fn test_abutting_ranges_conflict() {
        // Termina el día 5 y la otra empieza el día 5: conflicto (inclusivo)
        assert!(ranges_overlap(date(1), date(5), date(5), date(8)));
        assert!(ranges_overlap(date(5), date(8), date(1), date(5)));
    }

    #[test]
    fn test_disjoint_ranges_do_not_conflict() {
        assert!(!ranges_overlap(date(1), date(4), date(5), date(8)));
        assert!(!ranges_overlap(date(5), date(8), date(1), date(4)));
    }

    #[test]
    fn test_contained_range_conflicts() {
        assert!(ranges_overlap(date(1), date(10), date(3), date(4)));
        assert!(ranges_overlap(date(3), date(4), date(1), date(10)));
    }

    #[test]
    fn test_single_day_ranges() {
        assert!(ranges_overlap(date(3), date(3), date(3), date(3)));
        assert!(!ranges_overlap(date(3), date(3), date(4), date(4)));
    }
}
