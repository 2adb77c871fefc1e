// src/db/room_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::{map_unique_violation, AppError},
    models::room::{Room, RoomDetail, RoomType},
};

#[derive(Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  TIPOS DE QUARTO (Tarifas)
    // =========================================================================

    pub async fn list_room_types(&self) -> Result<Vec<RoomType>, AppError> {
        let types = sqlx::query_as::<_, RoomType>(
            "SELECT id, name, hourly_rate, daily_rate, description FROM room_types ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(types)
    }

    pub async fn find_room_type<'e, E>(&self, executor: E, id: i32) -> Result<Option<RoomType>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room_type = sqlx::query_as::<_, RoomType>(
            "SELECT id, name, hourly_rate, daily_rate, description FROM room_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(room_type)
    }

    pub async fn create_room_type<'e, E>(
        &self,
        executor: E,
        name: &str,
        hourly_rate: Decimal,
        daily_rate: Decimal,
        description: Option<&str>,
    ) -> Result<RoomType, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room_type = sqlx::query_as::<_, RoomType>(
            r#"
            INSERT INTO room_types (name, hourly_rate, daily_rate, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, hourly_rate, daily_rate, description
            "#,
        )
        .bind(name)
        .bind(hourly_rate)
        .bind(daily_rate)
        .bind(description)
        .fetch_one(executor)
        .await?;

        Ok(room_type)
    }

    /// Atualização parcial: campos `None` mantêm o valor atual.
    pub async fn update_room_type<'e, E>(
        &self,
        executor: E,
        id: i32,
        name: Option<&str>,
        hourly_rate: Option<Decimal>,
        daily_rate: Option<Decimal>,
        description: Option<&str>,
    ) -> Result<Option<RoomType>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room_type = sqlx::query_as::<_, RoomType>(
            r#"
            UPDATE room_types SET
                name = COALESCE($2, name),
                hourly_rate = COALESCE($3, hourly_rate),
                daily_rate = COALESCE($4, daily_rate),
                description = COALESCE($5, description)
            WHERE id = $1
            RETURNING id, name, hourly_rate, daily_rate, description
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(hourly_rate)
        .bind(daily_rate)
        .bind(description)
        .fetch_optional(executor)
        .await?;

        Ok(room_type)
    }

    pub async fn delete_room_type<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM room_types WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_rooms_of_type<'e, E>(&self, executor: E, room_type_id: i32) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE room_type_id = $1")
            .bind(room_type_id)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    // =========================================================================
    //  QUARTOS
    // =========================================================================

    pub async fn list_rooms(&self) -> Result<Vec<RoomDetail>, AppError> {
        let rooms = sqlx::query_as::<_, RoomDetail>(
            r#"
            SELECT r.id, r.room_number, r.room_type_id, r.in_use, r.description,
                   t.name AS type_name, t.hourly_rate, t.daily_rate
            FROM rooms r
            JOIN room_types t ON t.id = r.room_type_id
            ORDER BY r.room_number
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }

    /// Quarto com as tarifas do tipo. `None` se o quarto ou o tipo não existir.
    pub async fn find_detail<'e, E>(&self, executor: E, room_id: i32) -> Result<Option<RoomDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room = sqlx::query_as::<_, RoomDetail>(
            r#"
            SELECT r.id, r.room_number, r.room_type_id, r.in_use, r.description,
                   t.name AS type_name, t.hourly_rate, t.daily_rate
            FROM rooms r
            JOIN room_types t ON t.id = r.room_type_id
            WHERE r.id = $1
            "#,
        )
        .bind(room_id)
        .fetch_optional(executor)
        .await?;

        Ok(room)
    }

    pub async fn create_room<'e, E>(
        &self,
        executor: E,
        room_number: &str,
        room_type_id: i32,
        description: Option<&str>,
    ) -> Result<Room, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (room_number, room_type_id, description)
            VALUES ($1, $2, $3)
            RETURNING id, room_number, room_type_id, in_use, description
            "#,
        )
        .bind(room_number)
        .bind(room_type_id)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, &format!("room {room_number}")))
    }

    pub async fn update_room<'e, E>(
        &self,
        executor: E,
        id: i32,
        room_number: Option<&str>,
        room_type_id: Option<i32>,
        description: Option<&str>,
    ) -> Result<Option<Room>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Room>(
            r#"
            UPDATE rooms SET
                room_number = COALESCE($2, room_number),
                room_type_id = COALESCE($3, room_type_id),
                description = COALESCE($4, description)
            WHERE id = $1
            RETURNING id, room_number, room_type_id, in_use, description
            "#,
        )
        .bind(id)
        .bind(room_number)
        .bind(room_type_id)
        .bind(description)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, &format!("room {}", room_number.unwrap_or_default())))
    }

    pub async fn delete_room<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_in_use<'e, E>(&self, executor: E, room_id: i32, in_use: bool) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE rooms SET in_use = $2 WHERE id = $1")
            .bind(room_id)
            .bind(in_use)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Marca como ocupados os quartos com reserva em check-in cuja entrada já chegou.
    pub async fn promote_due_rooms<'e, E>(&self, executor: E, today: NaiveDate) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE rooms SET in_use = TRUE
            WHERE NOT in_use
              AND id IN (
                SELECT room_id FROM bookings
                WHERE (status IS NULL OR status = 'CHECKED_IN')
                  AND COALESCE(expected_check_in, check_in_at::date) <= $1
              )
            "#,
        )
        .bind(today)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
