// src/handlers/notifications.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::notification::NotificationFeed,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FeedQuery {
    /// Só as não lidas
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub unread_count: i64,
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    params(FeedQuery),
    responses(
        (status = 200, description = "Notificações do usuário (mais recentes primeiro)", body = NotificationFeed)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let feed = app_state
        .notification_service
        .feed(&app_state.db_pool, user.0.id, query.unread)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(feed)))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    tag = "Notifications",
    responses(
        (status = 200, description = "Marcada como lida; devolve o restante não lido", body = UnreadCount),
        (status = 404, description = "Notificação não encontrada")
    ),
    params(("id" = i32, Path, description = "ID da notificação")),
    security(("api_jwt" = []))
)]
pub async fn mark_read(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let unread_count = app_state
        .notification_service
        .mark_read(&app_state.db_pool, id, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(UnreadCount { unread_count })))
}
