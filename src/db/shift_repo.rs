// src/db/shift_repo.rs

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::shift::{Shift, ShiftAction, ShiftActionKind},
};

// Valores gravados ao encerrar um turno
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftClosing {
    pub ended_at: NaiveDateTime,
    pub collected_total: Decimal,
    pub invoiced_total: Decimal,
    pub handoff_amount: Option<Decimal>,
    pub successor_id: Option<i32>,
    pub note: Option<String>,
}

#[derive(Clone)]
pub struct ShiftRepository {
    pool: PgPool,
}

impl ShiftRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Turno ativo mais recente do funcionário.
    pub async fn find_active_for_staff<'e, E>(&self, executor: E, staff_id: i32) -> Result<Option<Shift>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let shift = sqlx::query_as::<_, Shift>(
            r#"
            SELECT * FROM shifts
            WHERE staff_id = $1 AND status = 'ACTIVE'
            ORDER BY started_at DESC
            LIMIT 1
            "#,
        )
        .bind(staff_id)
        .fetch_optional(executor)
        .await?;

        Ok(shift)
    }

    pub async fn open<'e, E>(
        &self,
        executor: E,
        staff_id: i32,
        started_at: NaiveDateTime,
        opening_amount: Option<Decimal>,
    ) -> Result<Shift, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Shift>(
            r#"
            INSERT INTO shifts (staff_id, started_at, status, opening_amount)
            VALUES ($1, $2, 'ACTIVE', $3)
            RETURNING *
            "#,
        )
        .bind(staff_id)
        .bind(started_at)
        .bind(opening_amount)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // O índice parcial garante um único turno ativo por funcionário
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::ShiftAlreadyActive(staff_id);
                }
            }
            e.into()
        })
    }

    pub async fn close<'e, E>(&self, executor: E, id: i32, closing: &ShiftClosing) -> Result<Shift, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let shift = sqlx::query_as::<_, Shift>(
            r#"
            UPDATE shifts SET
                ended_at = $2,
                status = 'ENDED',
                collected_total = $3,
                invoiced_total = $4,
                handoff_amount = $5,
                successor_id = $6,
                note = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(closing.ended_at)
        .bind(closing.collected_total)
        .bind(closing.invoiced_total)
        .bind(closing.handoff_amount)
        .bind(closing.successor_id)
        .bind(&closing.note)
        .fetch_one(executor)
        .await?;

        Ok(shift)
    }

    pub async fn record_action<'e, E>(
        &self,
        executor: E,
        shift_id: i32,
        staff_id: i32,
        kind: ShiftActionKind,
        detail: Option<&str>,
        occurred_at: NaiveDateTime,
    ) -> Result<ShiftAction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let action = sqlx::query_as::<_, ShiftAction>(
            r#"
            INSERT INTO shift_actions (shift_id, staff_id, kind, detail, occurred_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(shift_id)
        .bind(staff_id)
        .bind(kind)
        .bind(detail)
        .bind(occurred_at)
        .fetch_one(executor)
        .await?;

        Ok(action)
    }

    /// Turnos ativos abertos antes do corte.
    pub async fn find_started_before(&self, cutoff: NaiveDateTime) -> Result<Vec<Shift>, AppError> {
        let shifts = sqlx::query_as::<_, Shift>(
            "SELECT * FROM shifts WHERE status = 'ACTIVE' AND started_at < $1 ORDER BY started_at",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(shifts)
    }
}
