// src/services/notification_service.rs

use sqlx::{Acquire, Postgres};

use crate::{
    common::error::AppError,
    db::NotificationRepository,
    models::notification::NotificationFeed,
};

#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
}

impl NotificationService {
    pub fn new(notification_repo: NotificationRepository) -> Self {
        Self { notification_repo }
    }

    /// Caixa de entrada do usuário com o contador de não lidas.
    pub async fn feed<'a, A>(&self, executor: A, user_id: i32, unread_only: bool) -> Result<NotificationFeed, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let items = self.notification_repo.list_for(user_id, unread_only).await?;
        let unread_count = self.notification_repo.count_unread(&mut *conn, user_id).await?;

        Ok(NotificationFeed { items, unread_count })
    }

    /// Marca como lida e devolve quantas ainda faltam.
    pub async fn mark_read<'a, A>(&self, executor: A, notification_id: i32, user_id: i32) -> Result<i64, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let found = self
            .notification_repo
            .mark_read(&mut *tx, notification_id, user_id)
            .await?;
        if !found {
            // Notificação de outro usuário é tratada como inexistente
            return Err(AppError::ResourceNotFound("notification".to_string()));
        }

        let unread = self.notification_repo.count_unread(&mut *tx, user_id).await?;
        tx.commit().await?;

        Ok(unread)
    }
}
