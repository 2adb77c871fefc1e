// src/db/notification_repo.rs

use chrono::NaiveDateTime;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::notification::{Notification, NotificationDraft},
};

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        draft: &NotificationDraft,
        sent_at: NaiveDateTime,
    ) -> Result<Notification, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (sender_id, recipient_id, title, body, category, sent_at, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'UNREAD')
            RETURNING *
            "#,
        )
        .bind(draft.sender_id)
        .bind(draft.recipient_id)
        .bind(&draft.title)
        .bind(&draft.body)
        .bind(draft.category)
        .bind(sent_at)
        .fetch_one(executor)
        .await?;

        Ok(notification)
    }

    /// Mais recentes primeiro. `unread_only` filtra as não lidas.
    pub async fn list_for(&self, recipient_id: i32, unread_only: bool) -> Result<Vec<Notification>, AppError> {
        let items = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE recipient_id = $1 AND (NOT $2 OR status = 'UNREAD')
            ORDER BY sent_at DESC, id DESC
            "#,
        )
        .bind(recipient_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn count_unread<'e, E>(&self, executor: E, recipient_id: i32) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND status = 'UNREAD'",
        )
        .bind(recipient_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    /// Marca como lida apenas se pertencer ao destinatário. `false` se não achou.
    pub async fn mark_read<'e, E>(&self, executor: E, id: i32, recipient_id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE notifications SET status = 'READ' WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id)
        .bind(recipient_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
