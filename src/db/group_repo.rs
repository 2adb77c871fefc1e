// src/db/group_repo.rs

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::group::{GroupBooking, GroupStatus},
};

// Dados editáveis de um grupo
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFields {
    pub name: String,
    pub representative_name: String,
    pub representative_phone: String,
    pub representative_user_id: Option<i32>,
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<GroupBooking>, AppError> {
        let groups = sqlx::query_as::<_, GroupBooking>(
            "SELECT * FROM group_bookings ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i32) -> Result<Option<GroupBooking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let group = sqlx::query_as::<_, GroupBooking>("SELECT * FROM group_bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(group)
    }

    /// Grupo não cancelado com o mesmo nome (o nome identifica o grupo na recepção).
    pub async fn find_open_by_name<'e, E>(&self, executor: E, name: &str) -> Result<Option<GroupBooking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let group = sqlx::query_as::<_, GroupBooking>(
            r#"
            SELECT * FROM group_bookings
            WHERE name = $1 AND status <> 'CANCELLED'
            ORDER BY id DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(name)
        .fetch_optional(executor)
        .await?;

        Ok(group)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        fields: &GroupFields,
        staff_id: i32,
        now: NaiveDateTime,
    ) -> Result<GroupBooking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let group = sqlx::query_as::<_, GroupBooking>(
            r#"
            INSERT INTO group_bookings (
                name, representative_name, representative_phone, staff_id,
                representative_user_id, check_in_date, check_out_date, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'PROCESSING', $8)
            RETURNING *
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.representative_name)
        .bind(&fields.representative_phone)
        .bind(staff_id)
        .bind(fields.representative_user_id)
        .bind(fields.check_in_date)
        .bind(fields.check_out_date)
        .bind(now)
        .fetch_one(executor)
        .await?;

        Ok(group)
    }

    pub async fn update_details<'e, E>(&self, executor: E, id: i32, fields: &GroupFields) -> Result<GroupBooking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let group = sqlx::query_as::<_, GroupBooking>(
            r#"
            UPDATE group_bookings SET
                representative_name = $2,
                representative_phone = $3,
                representative_user_id = COALESCE($4, representative_user_id),
                check_in_date = $5,
                check_out_date = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.representative_name)
        .bind(&fields.representative_phone)
        .bind(fields.representative_user_id)
        .bind(fields.check_in_date)
        .bind(fields.check_out_date)
        .fetch_one(executor)
        .await?;

        Ok(group)
    }

    pub async fn set_status<'e, E>(&self, executor: E, id: i32, status: GroupStatus) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE group_bookings SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(executor)
            .await?;

        Ok(())
    }

    // =========================================================================
    //  QUARTOS DO GRUPO
    // =========================================================================

    pub async fn clear_rooms<'e, E>(&self, executor: E, group_id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM group_rooms WHERE group_id = $1")
            .bind(group_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn add_rooms<'e, E>(&self, executor: E, group_id: i32, room_ids: &[i32]) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO group_rooms (group_id, room_id)
            SELECT $1, room_id FROM UNNEST($2::INT[]) AS t(room_id)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(room_ids)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn room_ids<'e, E>(&self, executor: E, group_id: i32) -> Result<Vec<i32>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT room_id FROM group_rooms WHERE group_id = $1 ORDER BY room_id",
        )
        .bind(group_id)
        .fetch_all(executor)
        .await?;

        Ok(ids)
    }

    pub async fn booking_ids<'e, E>(&self, executor: E, group_id: i32) -> Result<Vec<i32>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT id FROM bookings WHERE group_id = $1 ORDER BY id",
        )
        .bind(group_id)
        .fetch_all(executor)
        .await?;

        Ok(ids)
    }
}
