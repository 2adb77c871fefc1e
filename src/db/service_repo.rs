// src/db/service_repo.rs

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::booking::{Service, ServiceCharge},
};

// Catálogo de serviços (frigobar, lavanderia...) e consumo por reserva
#[derive(Clone)]
pub struct ServiceCatalogRepository {
    pool: PgPool,
}

impl ServiceCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_active(&self) -> Result<Vec<Service>, AppError> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT id, name, price, is_active FROM services WHERE is_active ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    pub async fn find_service<'e, E>(&self, executor: E, id: i32) -> Result<Option<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>(
            "SELECT id, name, price, is_active FROM services WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(service)
    }

    pub async fn insert_charge<'e, E>(
        &self,
        executor: E,
        booking_id: i32,
        service_id: i32,
        quantity: i32,
        unit_price: Decimal,
        line_total: Decimal,
        now: NaiveDateTime,
    ) -> Result<ServiceCharge, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let charge = sqlx::query_as::<_, ServiceCharge>(
            r#"
            INSERT INTO service_charges (booking_id, service_id, quantity, unit_price, line_total, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, booking_id, service_id, quantity, unit_price, line_total, created_at
            "#,
        )
        .bind(booking_id)
        .bind(service_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(line_total)
        .bind(now)
        .fetch_one(executor)
        .await?;

        Ok(charge)
    }

    pub async fn charges_for_booking<'e, E>(&self, executor: E, booking_id: i32) -> Result<Vec<ServiceCharge>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let charges = sqlx::query_as::<_, ServiceCharge>(
            r#"
            SELECT id, booking_id, service_id, quantity, unit_price, line_total, created_at
            FROM service_charges WHERE booking_id = $1 ORDER BY created_at
            "#,
        )
        .bind(booking_id)
        .fetch_all(executor)
        .await?;

        Ok(charges)
    }
}
