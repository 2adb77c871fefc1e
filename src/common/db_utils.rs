// src/common/db_utils.rs

use sqlx::{Executor, Postgres};

use crate::common::error::AppError;

// Namespaces dos advisory locks (primeira chave de pg_advisory_xact_lock).
#[derive(Debug, Clone, Copy)]
#[repr(i32)]
pub enum LockScope {
    Room = 1,
    Staff = 2,
}

// ---
// Lock transacional: serializa escritas concorrentes sobre o mesmo quarto/funcionário.
// ---
/// Liberado automaticamente no commit ou rollback da transação.
pub(crate) async fn lock_for_update<'e, E>(
    executor: E,
    scope: LockScope,
    id: i32,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
        .bind(scope as i32)
        .bind(id)
        .execute(executor)
        .await?;

    Ok(())
}
