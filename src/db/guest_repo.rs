// src/db/guest_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::guest::{Guest, GuestInput},
};

#[derive(Clone)]
pub struct GuestRepository {
    pool: PgPool,
}

impl GuestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_document(&self, document_number: &str) -> Result<Option<Guest>, AppError> {
        let guest = sqlx::query_as::<_, Guest>(
            r#"
            SELECT id, full_name, document_type, document_number, address, nationality
            FROM guests WHERE document_number = $1
            "#,
        )
        .bind(document_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(guest)
    }

    /// Cria o hóspede ou atualiza nome/endereço/nacionalidade pelo número do documento.
    pub async fn upsert<'e, E>(&self, executor: E, input: &GuestInput) -> Result<Guest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let guest = sqlx::query_as::<_, Guest>(
            r#"
            INSERT INTO guests (full_name, document_type, document_number, address, nationality)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (document_number) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                address = COALESCE(EXCLUDED.address, guests.address),
                nationality = COALESCE(EXCLUDED.nationality, guests.nationality)
            RETURNING id, full_name, document_type, document_number, address, nationality
            "#,
        )
        .bind(&input.full_name)
        .bind(&input.document_type)
        .bind(&input.document_number)
        .bind(&input.address)
        .bind(&input.nationality)
        .fetch_one(executor)
        .await?;

        Ok(guest)
    }
}
