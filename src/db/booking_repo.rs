// src/db/booking_repo.rs

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::booking::{Booking, BookingDetail, BookingKind, BookingStatus, BookingWindow, PaymentStatus},
};

// Reserva ainda não persistida
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub room_id: i32,
    pub guest_id: i32,
    pub staff_id: i32,
    pub owner_user_id: Option<i32>,
    pub kind: BookingKind,
    pub check_in_at: NaiveDateTime,
    pub expected_check_in: Option<NaiveDate>,
    pub expected_check_out: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

// Valores gravados no fechamento da conta
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementUpdate {
    pub check_out_at: Option<NaiveDateTime>,
    pub billed_units: i32,
    pub room_charge: Decimal,
    pub service_charge: Decimal,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
}

#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i32) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(booking)
    }

    /// Lê e trava a linha até o fim da transação (evita fechamento duplo).
    pub async fn find_for_update<'e, E>(&self, executor: E, id: i32) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(booking)
    }

    pub async fn find_detail(&self, id: i32) -> Result<Option<BookingDetail>, AppError> {
        let detail = sqlx::query_as::<_, BookingDetail>(
            r#"
            SELECT b.*, r.room_number, g.full_name AS guest_name
            FROM bookings b
            JOIN rooms r ON r.id = b.room_id
            JOIN guests g ON g.id = b.guest_id
            WHERE b.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(detail)
    }

    /// Janelas de todas as reservas não canceladas do quarto.
    pub async fn live_windows_for_room<'e, E>(&self, executor: E, room_id: i32) -> Result<Vec<BookingWindow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let windows = sqlx::query_as::<_, BookingWindow>(
            r#"
            SELECT id, check_in_at, expected_check_out, check_out_at
            FROM bookings
            WHERE room_id = $1 AND status IS DISTINCT FROM 'CANCELLED'
            "#,
        )
        .bind(room_id)
        .fetch_all(executor)
        .await?;

        Ok(windows)
    }

    pub async fn count_live_for_room<'e, E>(&self, executor: E, room_id: i32) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE room_id = $1 AND status IS DISTINCT FROM 'CANCELLED'",
        )
        .bind(room_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    pub async fn insert<'e, E>(&self, executor: E, new: &NewBooking) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                room_id, guest_id, staff_id, owner_user_id, kind,
                check_in_at, expected_check_in, expected_check_out,
                status, payment_status, tenancy_report_status,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8,
                    'CHECKED_IN', 'UNPAID', 'NOT_REPORTED', $9, $9)
            RETURNING *
            "#,
        )
        .bind(new.room_id)
        .bind(new.guest_id)
        .bind(new.staff_id)
        .bind(new.owner_user_id)
        .bind(new.kind)
        .bind(new.check_in_at)
        .bind(new.expected_check_in)
        .bind(new.expected_check_out)
        .bind(new.created_at)
        .fetch_one(executor)
        .await?;

        Ok(booking)
    }

    /// Troca manual de status. `stamp_check_out` grava a saída se ainda estiver vazia.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: i32,
        status: BookingStatus,
        stamp_check_out: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings SET
                status = $2,
                check_out_at = COALESCE(check_out_at, $3),
                updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(stamp_check_out)
        .bind(now)
        .fetch_one(executor)
        .await?;

        Ok(booking)
    }

    /// Grava o fechamento e desfaz o vínculo com o grupo.
    pub async fn apply_settlement<'e, E>(
        &self,
        executor: E,
        id: i32,
        update: &SettlementUpdate,
        now: NaiveDateTime,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings SET
                check_out_at = COALESCE($2, check_out_at),
                billed_units = $3,
                room_charge = $4,
                service_charge = $5,
                status = $6,
                payment_status = $7,
                group_id = NULL,
                updated_at = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.check_out_at)
        .bind(update.billed_units)
        .bind(update.room_charge)
        .bind(update.service_charge)
        .bind(update.status)
        .bind(update.payment_status)
        .bind(now)
        .fetch_one(executor)
        .await?;

        Ok(booking)
    }

    pub async fn set_payment_status<'e, E>(
        &self,
        executor: E,
        id: i32,
        status: PaymentStatus,
        now: NaiveDateTime,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE bookings SET payment_status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status)
            .bind(now)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Solta reservas do grupo sem mexer no resto.
    pub async fn detach_from_group<'e, E>(
        &self,
        executor: E,
        ids: &[i32],
        now: NaiveDateTime,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if ids.is_empty() {
            return Ok(());
        }
        sqlx::query("UPDATE bookings SET group_id = NULL, updated_at = $2 WHERE id = ANY($1)")
            .bind(ids)
            .bind(now)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn set_group<'e, E>(
        &self,
        executor: E,
        id: i32,
        group_id: i32,
        now: NaiveDateTime,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET group_id = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(group_id)
        .bind(now)
        .fetch_one(executor)
        .await?;

        Ok(booking)
    }

    /// Membros do grupo, travados para o fechamento.
    pub async fn members_of_group<'e, E>(&self, executor: E, group_id: i32) -> Result<Vec<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let members = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE group_id = $1 ORDER BY id FOR UPDATE",
        )
        .bind(group_id)
        .fetch_all(executor)
        .await?;

        Ok(members)
    }
}
