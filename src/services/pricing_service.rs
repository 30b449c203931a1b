//! Servicio de pricing
//!
//! Cálculo puro de montos de reserva sobre Decimal. No aplica redondeos ni
//! pisos sobre el total; un total negativo es representable y se rechaza en
//! la validación de la reserva, no aquí.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Resultado del cálculo de montos de una reserva
#[derive(Debug, Clone, PartialEq)]
pub struct PricingQuote {
    pub total_days: i32,
    pub subtotal: Decimal,
    pub total_amount: Decimal,
}

pub struct PricingService;

impl PricingService {
    /// Días facturables entre dos fechas, con piso de 1 día
    pub fn rental_days(start_date: NaiveDate, end_date: NaiveDate) -> i32 {
        let days = (end_date - start_date).num_days();
        days.max(1) as i32
    }

    /// Calcular los montos derivados de una reserva:
    /// subtotal = tarifa diaria * días, total = subtotal + depósito - descuento
    pub fn quote(
        daily_rate: Decimal,
        start_date: NaiveDate,
        end_date: NaiveDate,
        deposit_amount: Decimal,
        discount_amount: Decimal,
    ) -> PricingQuote {
        let total_days = Self::rental_days(start_date, end_date);
        let subtotal = daily_rate * Decimal::from(total_days);
        let total_amount = subtotal + deposit_amount - discount_amount;

        PricingQuote {
            total_days,
            subtotal,
            total_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_three_day_rental_with_deposit() {
        let quote = PricingService::quote(
            Decimal::from(5000),
            date(2024, 6, 10),
            date(2024, 6, 13),
            Decimal::from(10_000),
            Decimal::ZERO,
        );

        assert_eq!(quote.total_days, 3);
        assert_eq!(quote.subtotal, Decimal::from(15_000));
        assert_eq!(quote.total_amount, Decimal::from(25_000));
    }

    #[test]
    fn test_same_day_floors_to_one_day() {
        let quote = PricingService::quote(
            Decimal::from(5000),
            date(2024, 6, 10),
            date(2024, 6, 10),
            Decimal::ZERO,
            Decimal::ZERO,
        );

        assert_eq!(quote.total_days, 1);
        assert_eq!(quote.subtotal, Decimal::from(5000));
    }

    #[test]
    fn test_discount_is_subtracted() {
        let quote = PricingService::quote(
            Decimal::from(4500),
            date(2024, 6, 10),
            date(2024, 6, 12),
            Decimal::from(5000),
            Decimal::from(1500),
        );

        assert_eq!(quote.total_days, 2);
        assert_eq!(quote.total_amount, Decimal::from(12_500));
    }

    #[test]
    fn test_quote_is_deterministic() {
        let run = || {
            PricingService::quote(
                Decimal::new(499_950, 2),
                date(2024, 6, 1),
                date(2024, 6, 8),
                Decimal::from(7500),
                Decimal::ZERO,
            )
        };

        assert_eq!(run(), run());
        assert_eq!(run().subtotal, Decimal::new(3_499_650, 2));
    }

    #[test]
    fn test_oversized_discount_yields_negative_total() {
        // El piso no se aplica aquí; la validación de la reserva lo rechaza
        let quote = PricingService::quote(
            Decimal::from(1000),
            date(2024, 6, 10),
            date(2024, 6, 11),
            Decimal::ZERO,
            Decimal::from(2000),
        );

        assert_eq!(quote.total_amount, Decimal::from(-1000));
    }
}
