// src/db/invoice_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::{
        booking::PaymentStatus,
        invoice::{Invoice, NewInvoice},
    },
};

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices ORDER BY issued_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    pub async fn insert<'e, E>(&self, executor: E, new: &NewInvoice) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                shift_id, booking_id, group_id, issued_at, total,
                payment_method, payment_status, note
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(new.shift_id)
        .bind(new.booking_id)
        .bind(new.group_id)
        .bind(new.issued_at)
        .bind(new.total)
        .bind(new.payment_method)
        .bind(new.payment_status)
        .bind(&new.note)
        .fetch_one(executor)
        .await?;

        Ok(invoice)
    }

    pub async fn latest_for_booking<'e, E>(&self, executor: E, booking_id: i32) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE booking_id = $1 ORDER BY issued_at DESC, id DESC LIMIT 1",
        )
        .bind(booking_id)
        .fetch_optional(executor)
        .await?;

        Ok(invoice)
    }

    /// Único campo mutável de uma fatura.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: i32,
        status: PaymentStatus,
    ) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            "UPDATE invoices SET payment_status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;

        Ok(invoice)
    }

    /// Soma das faturas pagas do turno (conferência de caixa).
    pub async fn paid_total_for_shift<'e, E>(&self, executor: E, shift_id: i32) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total), 0) FROM invoices WHERE shift_id = $1 AND payment_status = 'PAID'",
        )
        .bind(shift_id)
        .fetch_one(executor)
        .await?;

        Ok(total)
    }
}
