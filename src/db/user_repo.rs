// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::auth::{StaffSummary, User},
};

// Leitura de usuários. O cadastro é responsabilidade do provedor de identidade.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i32) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, full_name, email, phone, role, status, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    pub async fn list_active_admins<'e, E>(&self, executor: E) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let admins = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, phone, role, status, created_at
            FROM users WHERE role = 'ADMIN' AND status = 'ACTIVE'
            ORDER BY id
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(admins)
    }

    /// Funcionários ativos que podem assumir um turno.
    pub async fn list_available_staff(&self, excluding: Option<i32>) -> Result<Vec<StaffSummary>, AppError> {
        let staff = sqlx::query_as::<_, StaffSummary>(
            r#"
            SELECT id, full_name, role FROM users
            WHERE role IN ('STAFF', 'ADMIN')
              AND status = 'ACTIVE'
              AND ($1::INT IS NULL OR id <> $1)
            ORDER BY full_name
            "#,
        )
        .bind(excluding)
        .fetch_all(&self.pool)
        .await?;

        Ok(staff)
    }
}
