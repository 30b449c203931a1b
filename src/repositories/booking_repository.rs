//! Repositorio de reservas
//!
//! Toda mutación de una reserva corre dentro de una transacción SQLx. El punto
//! de serialización contra dobles reservas es un advisory lock transaccional
//! por vehículo, sostenido desde el chequeo de solapamiento hasta el commit.
//! Las transiciones de estado repiten el estado de origen en el WHERE del
//! UPDATE, de modo que dos transiciones concurrentes nunca se pisan.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::booking::{
    Booking, BookingCancellation, BookingPayment, BookingStatus, PaymentStatus,
};
use crate::utils::errors::{AppError, AppResult};

/// Filtros de búsqueda sobre reservas
#[derive(Debug, Clone, Default)]
pub struct BookingSearch {
    pub customer_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub start_date_from: Option<NaiveDate>,
    pub start_date_to: Option<NaiveDate>,
    pub min_total: Option<Decimal>,
    pub max_total: Option<Decimal>,
    /// Busca por booking_id, nombre o email del cliente
    pub search: Option<String>,
    pub active: bool,
    pub upcoming: bool,
    pub past: bool,
    pub limit: i64,
    pub offset: i64,
}

/// Tomar el advisory lock transaccional del vehículo. Se libera solo al
/// terminar la transacción, por lo que dos peticiones concurrentes sobre el
/// mismo vehículo se serializan entre chequeo y commit.
async fn acquire_vehicle_lock(conn: &mut PgConnection, vehicle_id: Uuid) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
        .bind(vehicle_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Contar reservas bloqueantes (confirmed/ongoing) del vehículo que se
/// solapan con [start_date, end_date], rango inclusivo en ambos extremos.
async fn count_conflicts(
    conn: &mut PgConnection,
    vehicle_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    exclude: Option<Uuid>,
) -> AppResult<i64> {
    let conflicts: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM bookings
        WHERE vehicle_id = $1
          AND status IN ('confirmed', 'ongoing')
          AND start_date <= $2
          AND end_date >= $3
          AND ($4::uuid IS NULL OR id <> $4)
        "#,
    )
    .bind(vehicle_id)
    .bind(end_date)
    .bind(start_date)
    .bind(exclude)
    .fetch_one(conn)
    .await?;

    Ok(conflicts)
}

/// Leer el estado persistido de una reserva (para reportar una transición
/// que perdió la carrera contra otra mutación)
async fn current_status(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<BookingStatus>> {
    let status = sqlx::query_scalar::<_, BookingStatus>("SELECT status FROM bookings WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(status)
}

/// El UPDATE condicionado no encontró la fila en el estado esperado: si la
/// fila existe, otra transición ganó y la acción es ilegal contra el estado
/// realmente persistido; si no existe, la reserva desapareció.
fn stale_transition_error(action: &str, found: Option<BookingStatus>) -> AppError {
    match found {
        Some(status) => AppError::illegal_transition(action, status.as_str()),
        None => AppError::NotFound("Booking not found".to_string()),
    }
}

pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    /// Reservas bloqueantes del vehículo, opcionalmente excluyendo una
    /// reserva propia (al validar una modificación)
    pub async fn find_blocking_for_vehicle(
        &self,
        vehicle_id: Uuid,
        exclude: Option<Uuid>,
    ) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE vehicle_id = $1
              AND status IN ('confirmed', 'ongoing')
              AND ($2::uuid IS NULL OR id <> $2)
            ORDER BY start_date
            "#,
        )
        .bind(vehicle_id)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Existe al menos una reserva bloqueante para el vehículo (usado para
    /// impedir el borrado de vehículos con reservas activas)
    pub async fn has_blocking_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bookings
                WHERE vehicle_id = $1 AND status IN ('confirmed', 'ongoing')
            )
            "#,
        )
        .bind(vehicle_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Insertar una reserva nueva. Lock del vehículo + chequeo de solapamiento
    /// + insert en una sola transacción.
    pub async fn create(&self, booking: &Booking) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        acquire_vehicle_lock(&mut tx, booking.vehicle_id).await?;
        let conflicts = count_conflicts(
            &mut tx,
            booking.vehicle_id,
            booking.start_date,
            booking.end_date,
            None,
        )
        .await?;
        if conflicts > 0 {
            return Err(AppError::booking_overlap(conflicts));
        }

        let created = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                id, booking_id, customer_id, vehicle_id,
                start_date, end_date, start_time, end_time,
                status, payment_status,
                daily_rate, total_days, subtotal, deposit_amount,
                discount_amount, total_amount,
                customer_name, customer_email, customer_phone,
                customer_address, driver_license_number,
                pickup_location, return_location, pickup_notes,
                return_notes, special_requests, terms_accepted,
                created_at, updated_at, confirmed_at, cancelled_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20,
                $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31
            )
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(&booking.booking_id)
        .bind(booking.customer_id)
        .bind(booking.vehicle_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.status)
        .bind(booking.payment_status)
        .bind(booking.daily_rate)
        .bind(booking.total_days)
        .bind(booking.subtotal)
        .bind(booking.deposit_amount)
        .bind(booking.discount_amount)
        .bind(booking.total_amount)
        .bind(&booking.customer_name)
        .bind(&booking.customer_email)
        .bind(&booking.customer_phone)
        .bind(&booking.customer_address)
        .bind(&booking.driver_license_number)
        .bind(&booking.pickup_location)
        .bind(&booking.return_location)
        .bind(&booking.pickup_notes)
        .bind(&booking.return_notes)
        .bind(&booking.special_requests)
        .bind(booking.terms_accepted)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .bind(booking.confirmed_at)
        .bind(booking.cancelled_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Guardar una modificación de contenido (fechas, ubicaciones, notas y
    /// montos rederivados). Vuelve a validar solapamiento excluyéndose a sí
    /// misma, bajo el mismo lock que el insert.
    pub async fn update_content(&self, booking: &Booking, now: DateTime<Utc>) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        acquire_vehicle_lock(&mut tx, booking.vehicle_id).await?;
        let conflicts = count_conflicts(
            &mut tx,
            booking.vehicle_id,
            booking.start_date,
            booking.end_date,
            Some(booking.id),
        )
        .await?;
        if conflicts > 0 {
            return Err(AppError::booking_overlap(conflicts));
        }

        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings SET
                start_date = $2, end_date = $3, start_time = $4, end_time = $5,
                total_days = $6, subtotal = $7, discount_amount = $8,
                total_amount = $9, pickup_location = $10, return_location = $11,
                pickup_notes = $12, return_notes = $13, special_requests = $14,
                updated_at = $15
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.total_days)
        .bind(booking.subtotal)
        .bind(booking.discount_amount)
        .bind(booking.total_amount)
        .bind(&booking.pickup_location)
        .bind(&booking.return_location)
        .bind(&booking.pickup_notes)
        .bind(&booking.return_notes)
        .bind(&booking.special_requests)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Persistir la confirmación. Al entrar al conjunto bloqueante la reserva
    /// revalida el solapamiento bajo el lock del vehículo.
    pub async fn confirm(&self, booking: &Booking, now: DateTime<Utc>) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        acquire_vehicle_lock(&mut tx, booking.vehicle_id).await?;
        let conflicts = count_conflicts(
            &mut tx,
            booking.vehicle_id,
            booking.start_date,
            booking.end_date,
            Some(booking.id),
        )
        .await?;
        if conflicts > 0 {
            return Err(AppError::booking_overlap(conflicts));
        }

        let confirmed = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $2, confirmed_at = $3, updated_at = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(booking.status)
        .bind(booking.confirmed_at)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let confirmed = match confirmed {
            Some(row) => row,
            None => {
                let found = current_status(&mut tx, booking.id).await?;
                return Err(stale_transition_error("confirm", found));
            }
        };

        tx.commit().await?;
        Ok(confirmed)
    }

    /// Persistir una transición que solo toca el estado (start/complete/no-show).
    /// El UPDATE exige el estado de origen; si la fila ya no está en `expected`
    /// la transición se reporta como ilegal contra el estado persistido.
    pub async fn update_status(
        &self,
        booking: &Booking,
        expected: BookingStatus,
        action: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $2, updated_at = $3
            WHERE id = $1 AND status = $4
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(booking.status)
        .bind(now)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => Ok(row),
            None => {
                let mut conn = self.pool.acquire().await?;
                let found = current_status(&mut conn, booking.id).await?;
                Err(stale_transition_error(action, found))
            }
        }
    }

    /// Persistir la cancelación junto con su registro de auditoría. El cambio
    /// de estado y el insert del registro comparten transacción: o persisten
    /// ambos o ninguno.
    pub async fn cancel(
        &self,
        booking: &Booking,
        reason: &str,
        cancelled_by: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<(Booking, BookingCancellation)> {
        let mut tx = self.pool.begin().await?;

        let cancelled = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $2, cancelled_at = $3, updated_at = $4
            WHERE id = $1 AND status IN ('pending', 'confirmed')
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(booking.status)
        .bind(booking.cancelled_at)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let cancelled = match cancelled {
            Some(row) => row,
            None => {
                let found = current_status(&mut tx, booking.id).await?;
                return Err(stale_transition_error("cancel", found));
            }
        };

        let record = sqlx::query_as::<_, BookingCancellation>(
            r#"
            INSERT INTO booking_cancellations (
                id, booking_id, reason, cancelled_by,
                refund_amount, cancellation_fee, created_at
            )
            VALUES ($1, $2, $3, $4, 0, 0, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking.id)
        .bind(reason)
        .bind(cancelled_by)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((cancelled, record))
    }

    pub async fn find_cancellation(
        &self,
        booking_id: Uuid,
    ) -> AppResult<Option<BookingCancellation>> {
        let record = sqlx::query_as::<_, BookingCancellation>(
            "SELECT * FROM booking_cancellations WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Agregar una fila al libro de pagos (append-only)
    pub async fn insert_payment(&self, payment: &BookingPayment) -> AppResult<BookingPayment> {
        let inserted = sqlx::query_as::<_, BookingPayment>(
            r#"
            INSERT INTO booking_payments (
                id, booking_id, payment_method, payment_type, amount,
                currency, transaction_id, gateway_response, is_successful,
                processed_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(payment.payment_method)
        .bind(payment.payment_type)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(&payment.transaction_id)
        .bind(&payment.gateway_response)
        .bind(payment.is_successful)
        .bind(payment.processed_at)
        .bind(payment.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    pub async fn list_payments(&self, booking_id: Uuid) -> AppResult<Vec<BookingPayment>> {
        let payments = sqlx::query_as::<_, BookingPayment>(
            "SELECT * FROM booking_payments WHERE booking_id = $1 ORDER BY created_at",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Suma de los pagos exitosos de la reserva
    pub async fn successful_payment_total(&self, booking_id: Uuid) -> AppResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0) FROM booking_payments
            WHERE booking_id = $1 AND is_successful = TRUE
            "#,
        )
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    pub async fn set_payment_status(
        &self,
        booking_id: Uuid,
        status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET payment_status = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(status)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Búsqueda filtrada sobre reservas
    pub async fn search(&self, filter: &BookingSearch, today: NaiveDate) -> AppResult<Vec<Booking>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM bookings WHERE 1=1");

        if let Some(customer_id) = filter.customer_id {
            query.push(" AND customer_id = ").push_bind(customer_id);
        }
        if let Some(vehicle_id) = filter.vehicle_id {
            query.push(" AND vehicle_id = ").push_bind(vehicle_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(payment_status) = filter.payment_status {
            query.push(" AND payment_status = ").push_bind(payment_status);
        }
        if let Some(from) = filter.start_date_from {
            query.push(" AND start_date >= ").push_bind(from);
        }
        if let Some(to) = filter.start_date_to {
            query.push(" AND start_date <= ").push_bind(to);
        }
        if let Some(min_total) = filter.min_total {
            query.push(" AND total_amount >= ").push_bind(min_total);
        }
        if let Some(max_total) = filter.max_total {
            query.push(" AND total_amount <= ").push_bind(max_total);
        }
        if let Some(term) = &filter.search {
            let pattern = format!("%{}%", term);
            query
                .push(" AND (booking_id ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR customer_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR customer_email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if filter.active {
            query.push(" AND status IN ('confirmed', 'ongoing')");
        }
        if filter.upcoming {
            query
                .push(" AND start_date >= ")
                .push_bind(today)
                .push(" AND status IN ('pending', 'confirmed')");
        }
        if filter.past {
            query
                .push(" AND end_date < ")
                .push_bind(today)
                .push(" AND status IN ('completed', 'cancelled')");
        }

        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit.max(1))
            .push(" OFFSET ")
            .push_bind(filter.offset.max(0));

        let bookings = query
            .build_query_as::<Booking>()
            .fetch_all(&self.pool)
            .await?;

        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lost_transition_reports_persisted_status() {
        // Un confirm que llega después de un cancel concurrente debe fallar
        // contra el estado que quedó en la base, no sobreescribirlo.
        match stale_transition_error("confirm", Some(BookingStatus::Cancelled)) {
            AppError::IllegalTransition { action, current } => {
                assert_eq!(action, "confirm");
                assert_eq!(current, "cancelled");
            }
            other => panic!("error inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_lost_transition_on_ongoing_booking() {
        match stale_transition_error("cancel", Some(BookingStatus::Ongoing)) {
            AppError::IllegalTransition { action, current } => {
                assert_eq!(action, "cancel");
                assert_eq!(current, "ongoing");
            }
            other => panic!("error inesperado: {:?}", other),
        }
    }

    #[test]
    fn test_lost_transition_on_missing_row() {
        assert!(matches!(
            stale_transition_error("confirm", None),
            AppError::NotFound(_)
        ));
    }
}
