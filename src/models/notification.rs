// src/models/notification.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_category", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    Handoff,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "read_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadStatus {
    Unread,
    Read,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i32,
    /// `None` = mensagem do sistema.
    pub sender_id: Option<i32>,
    pub recipient_id: i32,
    pub title: String,
    pub body: String,
    pub category: NotificationCategory,
    pub sent_at: NaiveDateTime,
    pub status: ReadStatus,
}

// Notificação a ser gravada (sempre nasce como não lida)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub sender_id: Option<i32>,
    pub recipient_id: i32,
    pub title: String,
    pub body: String,
    pub category: NotificationCategory,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    pub items: Vec<Notification>,
    pub unread_count: i64,
}
